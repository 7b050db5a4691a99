//! Validate: field and cross-field checks for one candidate record.
//!
//! Every rule is evaluated on every call; the error side carries all
//! violations found, never just the first one.

use std::collections::BTreeMap;
use std::net::IpAddr;

use serde::Serialize;
use thiserror::Error;

use crate::record::{Field, FieldKind, FlowCandidate, FlowRecord};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("Start time must be before end time.")]
    TimeRange,

    #[error("{0} must be a valid IP address.")]
    InvalidAddress(Field),

    #[error("{0} must be non-negative.")]
    Negative(Field),

    #[error("{0} must be at most {1} characters.")]
    TooLong(Field, usize),
}

impl Violation {
    /// Key the violation is reported under.
    pub fn key(&self) -> &'static str {
        match self {
            Violation::TimeRange => "time_range",
            Violation::InvalidAddress(field)
            | Violation::Negative(field)
            | Violation::TooLong(field, _) => field.name(),
        }
    }
}

/// Non-empty set of violations for one candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", render(.0))]
pub struct Violations(Vec<Violation>);

fn render(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.key(), v))
        .collect::<Vec<_>>()
        .join("; ")
}

impl Violations {
    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.iter().any(|v| v.key() == key)
    }

    /// Field name (or `time_range`) to human-readable reason.
    pub fn to_map(&self) -> BTreeMap<&'static str, String> {
        self.0.iter().map(|v| (v.key(), v.to_string())).collect()
    }
}

impl Serialize for Violations {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Check a candidate and, if every rule passes, produce the record.
pub fn validate(candidate: FlowCandidate) -> Result<FlowRecord, Violations> {
    let mut violations = Vec::new();

    if candidate.starttime > candidate.endtime {
        violations.push(Violation::TimeRange);
    }

    let srcaddr = parse_address(&candidate.srcaddr, Field::Srcaddr, &mut violations);
    let dstaddr = parse_address(&candidate.dstaddr, Field::Dstaddr, &mut violations);

    if candidate.bytes < 0 {
        violations.push(Violation::Negative(Field::Bytes));
    }
    if candidate.packets < 0 {
        violations.push(Violation::Negative(Field::Packets));
    }

    for (field, value) in [
        (Field::InstanceId, &candidate.instance_id),
        (Field::Action, &candidate.action),
        (Field::LogStatus, &candidate.log_status),
    ] {
        if let FieldKind::Text { max_len } = field.kind() {
            if value.chars().count() > max_len {
                violations.push(Violation::TooLong(field, max_len));
            }
        }
    }

    match (srcaddr, dstaddr) {
        (Some(src), Some(dst)) if violations.is_empty() => {
            Ok(FlowRecord::from_checked(candidate, src, dst))
        }
        _ => Err(Violations(violations)),
    }
}

fn parse_address(raw: &str, field: Field, violations: &mut Vec<Violation>) -> Option<IpAddr> {
    match raw.parse::<IpAddr>() {
        Ok(addr) => Some(addr),
        Err(_) => {
            violations.push(Violation::InvalidAddress(field));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::model::sample_candidate;

    #[test]
    fn test_valid_candidate_passes() {
        let record = validate(sample_candidate()).expect("sample should be valid");
        assert_eq!(record.srcaddr().to_string(), "172.31.16.139");
        assert_eq!(record.log_status(), "OK");
    }

    #[test]
    fn test_time_range_violation() {
        let mut c = sample_candidate();
        c.starttime = 2000;
        c.endtime = 1000;
        let err = validate(c).unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.contains_key("time_range"));
    }

    #[test]
    fn test_equal_times_are_valid() {
        let mut c = sample_candidate();
        c.starttime = 1500;
        c.endtime = 1500;
        assert!(validate(c).is_ok());
    }

    #[test]
    fn test_invalid_addresses_keyed_by_field() {
        for bad in ["999.999.1.1", "not-an-ip", ""] {
            let mut c = sample_candidate();
            c.srcaddr = bad.to_string();
            let err = validate(c).unwrap_err();
            assert!(err.contains_key("srcaddr"), "{} should be rejected", bad);
            assert!(!err.contains_key("dstaddr"));
        }

        let mut c = sample_candidate();
        c.dstaddr = "not-an-ip".to_string();
        let err = validate(c).unwrap_err();
        assert_eq!(err.to_map()["dstaddr"], "dstaddr must be a valid IP address.");
    }

    #[test]
    fn test_ipv4_and_ipv6_accepted() {
        let mut c = sample_candidate();
        c.srcaddr = "10.0.0.1".to_string();
        c.dstaddr = "::1".to_string();
        let record = validate(c).unwrap();
        assert!(record.srcaddr().is_ipv4());
        assert!(record.dstaddr().is_ipv6());
    }

    #[test]
    fn test_negative_counters() {
        let mut c = sample_candidate();
        c.packets = -1;
        c.bytes = -5;
        let err = validate(c).unwrap_err();
        assert!(err.contains_key("packets"));
        assert!(err.contains_key("bytes"));
    }

    #[test]
    fn test_collects_every_violation() {
        let mut c = sample_candidate();
        c.starttime = 10;
        c.endtime = 5;
        c.srcaddr = "999.999.1.1".to_string();
        c.dstaddr = "nope".to_string();
        c.packets = -1;
        c.bytes = -1;
        let err = validate(c).unwrap_err();

        let map = err.to_map();
        assert_eq!(map.len(), 5);
        for key in ["time_range", "srcaddr", "dstaddr", "packets", "bytes"] {
            assert!(map.contains_key(key), "missing {}", key);
        }
    }

    #[test]
    fn test_text_length_limits() {
        let mut c = sample_candidate();
        c.instance_id = "i".repeat(256);
        c.action = "A".repeat(51);
        let err = validate(c).unwrap_err();
        assert!(err.contains_key("instance_id"));
        assert!(err.contains_key("action"));

        let mut c = sample_candidate();
        c.instance_id = "i".repeat(255);
        c.action = "A".repeat(50);
        assert!(validate(c).is_ok());
    }

    #[test]
    fn test_display_lists_all() {
        let mut c = sample_candidate();
        c.packets = -1;
        c.srcaddr = "x".to_string();
        let text = validate(c).unwrap_err().to_string();
        assert!(text.contains("srcaddr: srcaddr must be a valid IP address."));
        assert!(text.contains("packets: packets must be non-negative."));
    }
}
