use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::record::Field;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid format '{0}', expected 'key=value'")]
    InvalidFormat(String),

    #[error("Invalid column name '{key}', must be one of {allowed:?}")]
    UnknownColumn {
        key: String,
        allowed: Vec<&'static str>,
    },

    #[error("No value provided for column '{0}'")]
    MissingValue(Field),

    #[error("Invalid value for '{0}', must be an integer.")]
    InvalidInteger(Field),

    #[error("Invalid time format. Please provide valid integer timestamps.")]
    InvalidTimeFormat,

    #[error("Start time must be before end time.")]
    TimeRange,
}

impl QueryError {
    /// Group the error is reported under.
    pub fn category(&self) -> &'static str {
        match self {
            QueryError::InvalidFormat(_)
            | QueryError::UnknownColumn { .. }
            | QueryError::MissingValue(_) => "search_params",
            QueryError::InvalidInteger(field) => field.name(),
            QueryError::InvalidTimeFormat | QueryError::TimeRange => "time",
        }
    }
}

/// Every problem found in one search request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid search: {}", render(.0))]
pub struct QueryErrors(pub(crate) Vec<QueryError>);

fn render(errors: &[QueryError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl QueryErrors {
    pub fn iter(&self) -> impl Iterator<Item = &QueryError> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Category to messages, messages in the order they were found.
    pub fn grouped(&self) -> BTreeMap<&'static str, Vec<String>> {
        let mut groups: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
        for error in &self.0 {
            groups.entry(error.category()).or_default().push(error.to_string());
        }
        groups
    }
}

impl Serialize for QueryErrors {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.grouped().serialize(serializer)
    }
}
