//! Model: FlowlogConfig and related structs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::layout::{LayoutError, LineLayout};
use crate::parser::DEFAULT_MAX_LINE_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid line layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowlogConfig {
    pub ingest: IngestLimits,
    pub layout: LineLayout,
}

/// Size caps for in-memory archive handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestLimits {
    /// Compressed upload size
    pub max_archive_bytes: usize,
    /// Decompressed size of a single archive member
    pub max_member_bytes: usize,
    /// Decompressed size of all members read from one archive
    pub max_total_bytes: usize,
    pub max_line_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_archive_bytes: 256 * 1024 * 1024,
            max_member_bytes: 64 * 1024 * 1024,
            max_total_bytes: 1024 * 1024 * 1024,
            max_line_bytes: DEFAULT_MAX_LINE_SIZE,
        }
    }
}

impl IngestLimits {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_archive_bytes == 0 {
            return Err(ConfigError::Invalid("ingest.max_archive_bytes must be > 0".to_string()));
        }
        if self.max_member_bytes == 0 {
            return Err(ConfigError::Invalid("ingest.max_member_bytes must be > 0".to_string()));
        }
        if self.max_total_bytes == 0 {
            return Err(ConfigError::Invalid("ingest.max_total_bytes must be > 0".to_string()));
        }
        if self.max_line_bytes == 0 {
            return Err(ConfigError::Invalid("ingest.max_line_bytes must be > 0".to_string()));
        }
        Ok(())
    }
}

impl FlowlogConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.ingest.validate()?;
        self.layout.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = IngestLimits::default();
        assert_eq!(limits.max_archive_bytes, 256 * 1024 * 1024);
        assert_eq!(limits.max_member_bytes, 64 * 1024 * 1024);
        assert_eq!(limits.max_total_bytes, 1024 * 1024 * 1024);
        assert_eq!(limits.max_line_bytes, DEFAULT_MAX_LINE_SIZE);
    }

    #[test]
    fn test_default_config_validates() {
        assert!(FlowlogConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let cfg = FlowlogConfig {
            ingest: IngestLimits { max_member_bytes: 0, ..Default::default() },
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_member_bytes"), "{}", err);

        let cfg = FlowlogConfig {
            ingest: IngestLimits { max_total_bytes: 0, ..Default::default() },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_broken_layout_rejected() {
        let mut cfg = FlowlogConfig::default();
        cfg.layout.slots.pop();
        assert!(matches!(cfg.validate(), Err(ConfigError::Layout(_))));
    }

    #[test]
    fn test_deserialize_partial_toml() {
        let toml_str = r#"
            [ingest]
            max_line_bytes = 1024
        "#;
        let cfg: FlowlogConfig = toml::from_str(toml_str).expect("Should accept partial TOML");
        assert_eq!(cfg.ingest.max_line_bytes, 1024);
        assert_eq!(cfg.ingest.max_archive_bytes, 256 * 1024 * 1024); // default
        assert_eq!(cfg.layout, LineLayout::default());
    }
}
