//! Ingestor: drives archive → lines → records → one bulk insert.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;
use tokio::task;
use tracing::{debug, error, info, warn};

use super::archive::{read_members, ArchiveError, MemberBody};
use super::report::{ErrorEntry, IgnoredContent, IngestionReport};
use crate::conf::{FlowlogConfig, IngestLimits};
use crate::parser::{FlowLineParser, IngestMetrics, LineOutcome, LineParser, MetricErrorType, ParseError};
use crate::record::FlowRecord;
use crate::store::RecordStore;
use crate::validate::validate;

pub struct ArchiveIngestor<S: ?Sized> {
    store: Arc<S>,
    parser: Arc<dyn LineParser>,
    limits: IngestLimits,
    metrics: Arc<IngestMetrics>,
}

impl<S: RecordStore + ?Sized> ArchiveIngestor<S> {
    pub fn new(store: Arc<S>, config: &FlowlogConfig) -> Self {
        let parser = FlowLineParser::new(config.layout.clone(), config.ingest.max_line_bytes);
        Self::with_parser(store, Arc::new(parser), config.ingest.clone())
    }

    pub fn with_parser(store: Arc<S>, parser: Arc<dyn LineParser>, limits: IngestLimits) -> Self {
        Self {
            store,
            parser,
            limits,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Share a metrics sink with other components.
    pub fn with_metrics(mut self, metrics: Arc<IngestMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<IngestMetrics> {
        &self.metrics
    }

    /// Ingest one `.tgz` upload.
    ///
    /// Never fails: an unreadable archive or a store failure becomes a
    /// single top-level entry in `errors`, and everything else is
    /// recorded per line or per member.
    ///
    /// Decompression and parsing run on the blocking pool; only the bulk
    /// insert is awaited here. Dropping the returned future before the
    /// decode finishes means nothing is written.
    pub async fn ingest(&self, archive: impl Into<Bytes>) -> IngestionReport {
        let archive = archive.into();
        let decoder = BatchDecoder {
            parser: Arc::clone(&self.parser),
            limits: self.limits.clone(),
            metrics: Arc::clone(&self.metrics),
        };

        let decoded = match task::spawn_blocking(move || decoder.decode(&archive)).await {
            Ok(Ok(decoded)) => decoded,
            Ok(Err(report)) => return report,
            Err(e) => {
                error!("Archive decode task failed: {}", e);
                self.metrics.record_archive(0, true);
                let mut report = IngestionReport::default();
                report.errors.push(ErrorEntry::fatal(
                    format!("Error processing TGZ file: {}", e),
                    Some(format!("{:?}", e)),
                ));
                return report;
            }
        };

        let Decoded { mut report, batch, members } = decoded;

        if !batch.is_empty() {
            let count = batch.len();
            if let Err(e) = self.store.bulk_insert(batch).await {
                error!("Bulk insert of {} records failed: {}", count, e);
                report.errors.push(ErrorEntry::fatal(
                    format!("Error processing TGZ file: {}", e),
                    Some(format!("{:?}", e)),
                ));
                self.metrics.record_archive(members as u64, true);
                return report;
            }
            self.metrics.record_accepted(count as u64);
            report.valid_entries = count;
        }

        report.files_processed = members;
        self.metrics.record_archive(members as u64, false);

        info!(
            files = report.files_processed,
            valid = report.valid_entries,
            errors = report.errors.len(),
            ignored = report.ignored_lines.len(),
            dropped = report.dropped_lines,
            "Ingested archive"
        );
        report
    }
}

/// Output of the blocking half of an ingestion.
struct Decoded {
    report: IngestionReport,
    batch: Vec<FlowRecord>,
    members: usize,
}

/// Owned copy of what decoding needs, so it can move to the blocking pool.
struct BatchDecoder {
    parser: Arc<dyn LineParser>,
    limits: IngestLimits,
    metrics: Arc<IngestMetrics>,
}

impl BatchDecoder {
    /// `Err` carries a finished report when the archive as a whole is rejected.
    fn decode(&self, archive: &[u8]) -> Result<Decoded, IngestionReport> {
        let mut report = IngestionReport::default();

        if archive.len() > self.limits.max_archive_bytes {
            let e = ArchiveError::TooLarge(archive.len(), self.limits.max_archive_bytes);
            warn!("Rejected archive: {}", e);
            report.errors.push(ErrorEntry::fatal(format!("Error processing TGZ file: {}", e), None));
            self.metrics.record_archive(0, true);
            return Err(report);
        }

        let members = match read_members(archive, &self.limits) {
            Ok(members) => members,
            Err(e) => {
                error!("Failed to open archive: {}", e);
                report.errors.push(ErrorEntry::fatal(
                    format!("Error processing TGZ file: {}", e),
                    Some(format!("{:?}", e)),
                ));
                self.metrics.record_archive(0, true);
                return Err(report);
            }
        };

        let mut batch = Vec::new();
        for member in &members {
            match &member.body {
                MemberBody::File(data) => {
                    self.process_file(&member.name, data, &mut batch, &mut report);
                }
                MemberBody::Oversized(size) => {
                    warn!(file = %member.name, size, "Skipping oversized archive member");
                    report.errors.push(ErrorEntry::file(
                        &member.name,
                        format!(
                            "Error reading file: member is {} bytes (max: {} bytes)",
                            size, self.limits.max_member_bytes
                        ),
                    ));
                }
                MemberBody::Directory | MemberBody::Other => {}
            }
        }

        Ok(Decoded {
            report,
            batch,
            members: members.len(),
        })
    }

    fn process_file(
        &self,
        filename: &str,
        data: &[u8],
        batch: &mut Vec<FlowRecord>,
        report: &mut IngestionReport,
    ) {
        let text = match std::str::from_utf8(data) {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %filename, "Ignoring undecodable archive member: {}", e);
                self.metrics.record_error(MetricErrorType::NonUtf8);
                report.ignored_lines.push(IgnoredContent {
                    filename: filename.to_string(),
                    error: format!("Utf8Error: {}", e),
                    line: String::from_utf8_lossy(data).into_owned(),
                });
                return;
            }
        };

        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            self.metrics.record_line();

            match self.process_line(line) {
                Ok(Some(record)) => batch.push(record),
                Ok(None) => {
                    self.metrics.record_dropped();
                    report.dropped_lines += 1;
                }
                Err(entry) => report.errors.push(entry.in_file(filename, line)),
            }
        }
    }

    fn process_line(&self, line: &str) -> Result<Option<FlowRecord>, LineFailure> {
        let parser = &self.parser;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| parser.parse(line)))
            .unwrap_or_else(|payload| Err(ParseError::ParserPanic(panic_message(&*payload))));

        let candidate = match outcome {
            Ok(LineOutcome::Candidate(candidate)) => candidate,
            Ok(LineOutcome::TooShort { tokens }) => {
                debug!(tokens, parser = self.parser.name(), "Dropping short line");
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_error(match e {
                    ParseError::LineTooLarge(..) => MetricErrorType::TooLarge,
                    ParseError::ParserPanic(_) => MetricErrorType::Panic,
                    _ => MetricErrorType::Parse,
                });
                return Err(LineFailure::Parse(e));
            }
        };

        validate(candidate).map(Some).map_err(|violations| {
            self.metrics.record_error(MetricErrorType::Validation);
            LineFailure::Invalid(violations.to_map(), violations.to_string())
        })
    }
}

enum LineFailure {
    Parse(ParseError),
    Invalid(BTreeMap<&'static str, String>, String),
}

impl LineFailure {
    fn in_file(self, filename: &str, line: &str) -> ErrorEntry {
        match self {
            LineFailure::Parse(ParseError::ParserPanic(msg)) => {
                ErrorEntry::line(filename, line, "Error reading line: parser panicked".to_string())
                    .with_traceback(msg)
            }
            LineFailure::Parse(e) => ErrorEntry::line(filename, line, e.to_string()),
            LineFailure::Invalid(violations, message) => {
                ErrorEntry::line(filename, line, message).with_violations(violations)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
