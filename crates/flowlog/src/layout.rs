//! Layout: positional token → field table for whitespace-separated lines.
//!
//! Alternate log formats are supported by substituting a layout in the
//! configuration rather than touching the parser.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{Field, FieldCatalog};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Field {0} is not mapped to any token")]
    Unmapped(Field),

    #[error("Field {0} is mapped more than once")]
    Duplicate(Field),

    #[error("Field {field} reads token {index} but lines only need {min_tokens} tokens; add a default or raise min_tokens")]
    BeyondMinimum {
        field: Field,
        index: usize,
        min_tokens: usize,
    },

    #[error("min_tokens must be > 0")]
    ZeroMinimum,
}

/// One entry of the layout table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSlot {
    pub field: Field,
    pub index: usize,
    /// Used when the line has no token at `index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldSlot {
    fn at(field: Field, index: usize) -> Self {
        Self { field, index, default: None }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineLayout {
    /// Lines with fewer tokens are dropped.
    pub min_tokens: usize,
    pub slots: Vec<FieldSlot>,
}

impl Default for LineLayout {
    fn default() -> Self {
        // token 2 is unused; token 9 feeds both counters
        Self {
            min_tokens: 14,
            slots: vec![
                FieldSlot::at(Field::Serialno, 0),
                FieldSlot::at(Field::Version, 1),
                FieldSlot::at(Field::InstanceId, 3),
                FieldSlot::at(Field::Srcaddr, 4),
                FieldSlot::at(Field::Dstaddr, 5),
                FieldSlot::at(Field::Srcport, 6),
                FieldSlot::at(Field::Dstport, 7),
                FieldSlot::at(Field::Protocol, 8),
                FieldSlot::at(Field::Packets, 9),
                FieldSlot::at(Field::Bytes, 9),
                FieldSlot::at(Field::AccountId, 10),
                FieldSlot::at(Field::Starttime, 11),
                FieldSlot::at(Field::Endtime, 12),
                FieldSlot::at(Field::Action, 13),
                FieldSlot {
                    field: Field::LogStatus,
                    index: 14,
                    default: Some("UNKNOWN".to_string()),
                },
            ],
        }
    }
}

impl LineLayout {
    /// Check the table covers every catalog field exactly once and that
    /// mandatory tokens fall inside the minimum line width.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.min_tokens == 0 {
            return Err(LayoutError::ZeroMinimum);
        }

        for field in FieldCatalog::global().fields() {
            match self.slots.iter().filter(|s| s.field == *field).count() {
                0 => return Err(LayoutError::Unmapped(*field)),
                1 => {}
                _ => return Err(LayoutError::Duplicate(*field)),
            }
        }

        for slot in &self.slots {
            if slot.default.is_none() && slot.index >= self.min_tokens {
                return Err(LayoutError::BeyondMinimum {
                    field: slot.field,
                    index: slot.index,
                    min_tokens: self.min_tokens,
                });
            }
        }

        Ok(())
    }

    pub fn slot(&self, field: Field) -> Option<&FieldSlot> {
        self.slots.iter().find(|s| s.field == field)
    }

    /// The token feeding `field`, falling back to the slot default.
    pub fn token<'a>(&'a self, field: Field, tokens: &[&'a str]) -> Option<&'a str> {
        let slot = self.slot(field)?;
        tokens
            .get(slot.index)
            .copied()
            .or(slot.default.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout_is_valid() {
        let layout = LineLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.min_tokens, 14);
    }

    #[test]
    fn test_default_layout_positions() {
        let layout = LineLayout::default();
        assert_eq!(layout.slot(Field::AccountId).unwrap().index, 10);
        assert_eq!(layout.slot(Field::InstanceId).unwrap().index, 3);
        assert_eq!(layout.slot(Field::Packets).unwrap().index, 9);
        assert_eq!(layout.slot(Field::Bytes).unwrap().index, 9);
        assert!(layout.slots.iter().all(|s| s.index != 2));
    }

    #[test]
    fn test_token_falls_back_to_default() {
        let layout = LineLayout::default();
        let short: Vec<&str> = (0..14).map(|_| "x").collect();
        assert_eq!(layout.token(Field::LogStatus, &short), Some("UNKNOWN"));

        let mut long = short.clone();
        long.push("OK");
        assert_eq!(layout.token(Field::LogStatus, &long), Some("OK"));
    }

    #[test]
    fn test_zero_minimum_rejected() {
        let layout = LineLayout {
            min_tokens: 0,
            ..LineLayout::default()
        };
        assert_eq!(layout.validate(), Err(LayoutError::ZeroMinimum));
    }

    #[test]
    fn test_unmapped_field_rejected() {
        let mut layout = LineLayout::default();
        layout.slots.retain(|s| s.field != Field::Action);
        assert_eq!(layout.validate(), Err(LayoutError::Unmapped(Field::Action)));
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let mut layout = LineLayout::default();
        layout.slots.push(FieldSlot::at(Field::Version, 2));
        assert_eq!(layout.validate(), Err(LayoutError::Duplicate(Field::Version)));
    }

    #[test]
    fn test_mandatory_slot_beyond_minimum_rejected() {
        let mut layout = LineLayout::default();
        layout.min_tokens = 13;
        assert!(matches!(
            layout.validate(),
            Err(LayoutError::BeyondMinimum { field: Field::Action, index: 13, .. })
        ));
    }

    #[test]
    fn test_layout_from_toml() {
        let toml_str = r#"
            min_tokens = 3
            slots = [
                { field = "serialno", index = 0 },
                { field = "version", index = 0 },
                { field = "account_id", index = 0 },
                { field = "instance_id", index = 1 },
                { field = "srcaddr", index = 2 },
                { field = "dstaddr", index = 2 },
                { field = "srcport", index = 0 },
                { field = "dstport", index = 0 },
                { field = "protocol", index = 0 },
                { field = "packets", index = 0 },
                { field = "bytes", index = 0 },
                { field = "starttime", index = 0 },
                { field = "endtime", index = 0 },
                { field = "action", index = 3, default = "ACCEPT" },
                { field = "log_status", index = 4, default = "OK" },
            ]
        "#;
        let layout: LineLayout = toml::from_str(toml_str).expect("layout should parse");
        assert!(layout.validate().is_ok());
        assert_eq!(layout.slot(Field::Action).unwrap().default.as_deref(), Some("ACCEPT"));
    }
}
