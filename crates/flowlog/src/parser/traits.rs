pub use super::model::{LineOutcome, ParseError};

pub trait LineParser: Send + Sync {
    /// parse one decoded line into typed field values
    fn parse(&self, line: &str) -> Result<LineOutcome, ParseError>;
    fn name(&self) -> &'static str;
}
