use thiserror::Error;

use crate::record::{Field, FlowCandidate};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid integer for {field}: '{token}'")]
    InvalidInteger { field: Field, token: String },

    #[error("no token for {0}")]
    MissingToken(Field),

    #[error("Line too large: {0} bytes (max: {1} bytes)")]
    LineTooLarge(usize, usize),

    #[error("Parser panic: {0}")]
    ParserPanic(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// All mapped tokens read and converted
    Candidate(FlowCandidate),
    /// Fewer tokens than the layout requires; dropped without a report entry
    TooShort { tokens: usize },
}
