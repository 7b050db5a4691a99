//! Report: per-upload ingestion outcome.

use std::collections::BTreeMap;

use serde::Serialize;

/// One failed line, failed member, or top-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<String>,
    pub error: String,
    /// Field name (or `time_range`) to reason, for validator rejections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violations: Option<BTreeMap<&'static str, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ErrorEntry {
    pub fn line(filename: &str, line: &str, error: String) -> Self {
        Self {
            filename: Some(filename.to_string()),
            line: Some(line.to_string()),
            error,
            violations: None,
            traceback: None,
        }
    }

    pub fn file(filename: &str, error: String) -> Self {
        Self {
            filename: Some(filename.to_string()),
            line: None,
            error,
            violations: None,
            traceback: None,
        }
    }

    pub fn fatal(error: String, traceback: Option<String>) -> Self {
        Self {
            filename: None,
            line: None,
            error,
            violations: None,
            traceback,
        }
    }

    pub fn with_violations(mut self, violations: BTreeMap<&'static str, String>) -> Self {
        self.violations = Some(violations);
        self
    }

    pub fn with_traceback(mut self, traceback: String) -> Self {
        self.traceback = Some(traceback);
        self
    }
}

/// A member skipped because its bytes are not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IgnoredContent {
    pub filename: String,
    pub error: String,
    /// Lossy re-decoding of the member so operators can see what broke
    pub line: String,
}

/// How an upload should be acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    /// Every member decoded (individual lines may still have failed)
    Created,
    /// At least one member was ignored as undecodable
    PartialContent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    /// Archive members seen, directories included
    pub files_processed: usize,
    pub valid_entries: usize,
    /// Lines with too few tokens; never listed individually
    pub dropped_lines: usize,
    pub errors: Vec<ErrorEntry>,
    pub ignored_lines: Vec<IgnoredContent>,
}

impl IngestionReport {
    pub fn status(&self) -> IngestStatus {
        if self.ignored_lines.is_empty() {
            IngestStatus::Created
        } else {
            IngestStatus::PartialContent
        }
    }
}
