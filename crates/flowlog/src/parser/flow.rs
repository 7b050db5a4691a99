use std::str::FromStr;

use crate::layout::LineLayout;
use crate::parser::traits::*;
use crate::parser::DEFAULT_MAX_LINE_SIZE;
use crate::record::{Field, FlowCandidate};

/// Layout-driven parser for whitespace-separated flow-log lines.
pub struct FlowLineParser {
    layout: LineLayout,
    max_line_bytes: usize,
}

impl FlowLineParser {
    pub fn new(layout: LineLayout, max_line_bytes: usize) -> Self {
        Self { layout, max_line_bytes }
    }

    fn text(&self, field: Field, tokens: &[&str]) -> Result<String, ParseError> {
        self.layout
            .token(field, tokens)
            .map(str::to_string)
            .ok_or(ParseError::MissingToken(field))
    }

    fn int<T: FromStr>(&self, field: Field, tokens: &[&str]) -> Result<T, ParseError> {
        let token = self
            .layout
            .token(field, tokens)
            .ok_or(ParseError::MissingToken(field))?;
        token.parse().map_err(|_| ParseError::InvalidInteger {
            field,
            token: token.to_string(),
        })
    }
}

impl Default for FlowLineParser {
    fn default() -> Self {
        Self::new(LineLayout::default(), DEFAULT_MAX_LINE_SIZE)
    }
}

impl LineParser for FlowLineParser {
    fn parse(&self, line: &str) -> Result<LineOutcome, ParseError> {
        if line.len() > self.max_line_bytes {
            return Err(ParseError::LineTooLarge(line.len(), self.max_line_bytes));
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < self.layout.min_tokens {
            return Ok(LineOutcome::TooShort { tokens: tokens.len() });
        }

        Ok(LineOutcome::Candidate(FlowCandidate {
            serialno: self.int(Field::Serialno, &tokens)?,
            version: self.int(Field::Version, &tokens)?,
            account_id: self.int(Field::AccountId, &tokens)?,
            instance_id: self.text(Field::InstanceId, &tokens)?,
            srcaddr: self.text(Field::Srcaddr, &tokens)?,
            dstaddr: self.text(Field::Dstaddr, &tokens)?,
            srcport: self.int(Field::Srcport, &tokens)?,
            dstport: self.int(Field::Dstport, &tokens)?,
            protocol: self.int(Field::Protocol, &tokens)?,
            packets: self.int(Field::Packets, &tokens)?,
            bytes: self.int(Field::Bytes, &tokens)?,
            starttime: self.int(Field::Starttime, &tokens)?,
            endtime: self.int(Field::Endtime, &tokens)?,
            action: self.text(Field::Action, &tokens)?,
            log_status: self.text(Field::LogStatus, &tokens)?,
        }))
    }

    fn name(&self) -> &'static str {
        "flow"
    }
}
