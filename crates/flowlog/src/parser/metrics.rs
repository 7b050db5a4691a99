use std::sync::atomic::{AtomicU64, Ordering};
use serde::Serialize;

/// Error categories for metrics recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricErrorType {
    /// Non-numeric or out-of-range integer token
    Parse,
    /// Candidate rejected by the validator
    Validation,
    /// Line exceeded the configured size limit
    TooLarge,
    /// Parser panicked (caught via catch_unwind)
    Panic,
    /// Archive member was not valid UTF-8
    NonUtf8,
}

/// A wrapper that forces the wrapped data onto its own cache line(s).
///
/// Uploads can be ingested concurrently by several request handlers, all
/// bumping the same counters; separate lines keep them from false sharing.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct CacheAligned<T>(pub T);

/// Per-line counters (updated once per non-blank line)
#[derive(Debug, Default)]
pub struct LineMetrics {
    pub scanned: AtomicU64,
    pub accepted: AtomicU64,
    pub dropped_short: AtomicU64,
}

/// Error counters by type
#[derive(Debug, Default)]
pub struct ErrorMetrics {
    pub parse: AtomicU64,
    pub validation: AtomicU64,
    pub too_large: AtomicU64,
    pub panic: AtomicU64,
    pub non_utf8: AtomicU64,
}

/// Archive-level counters
#[derive(Debug, Default)]
pub struct ArchiveMetrics {
    pub ingested: AtomicU64,
    pub failed: AtomicU64,
    pub members: AtomicU64,
}

/// Process-wide ingestion metrics.
///
/// All operations use `Ordering::Relaxed`; `snapshot()` is not
/// transactional across fields.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    pub lines: CacheAligned<LineMetrics>,
    pub errors: CacheAligned<ErrorMetrics>,
    pub archives: CacheAligned<ArchiveMetrics>,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_line(&self) {
        self.lines.0.scanned.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_accepted(&self, count: u64) {
        self.lines.0.accepted.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self) {
        self.lines.0.dropped_short.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_error(&self, error_type: MetricErrorType) {
        match error_type {
            MetricErrorType::Parse => self.errors.0.parse.fetch_add(1, Ordering::Relaxed),
            MetricErrorType::Validation => self.errors.0.validation.fetch_add(1, Ordering::Relaxed),
            MetricErrorType::TooLarge => self.errors.0.too_large.fetch_add(1, Ordering::Relaxed),
            MetricErrorType::Panic => self.errors.0.panic.fetch_add(1, Ordering::Relaxed),
            MetricErrorType::NonUtf8 => self.errors.0.non_utf8.fetch_add(1, Ordering::Relaxed),
        };
    }

    /// Record the end of one ingestion call.
    pub fn record_archive(&self, members: u64, failed: bool) {
        self.archives.0.members.fetch_add(members, Ordering::Relaxed);
        if failed {
            self.archives.0.failed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.archives.0.ingested.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let lines_scanned = self.lines.0.scanned.load(Ordering::Relaxed);
        let lines_accepted = self.lines.0.accepted.load(Ordering::Relaxed);

        MetricsSnapshot {
            lines_scanned,
            lines_accepted,
            lines_dropped_short: self.lines.0.dropped_short.load(Ordering::Relaxed),

            parse_errors: self.errors.0.parse.load(Ordering::Relaxed),
            validation_errors: self.errors.0.validation.load(Ordering::Relaxed),
            lines_too_large: self.errors.0.too_large.load(Ordering::Relaxed),
            parse_panics: self.errors.0.panic.load(Ordering::Relaxed),
            non_utf8_files: self.errors.0.non_utf8.load(Ordering::Relaxed),

            archives_ingested: self.archives.0.ingested.load(Ordering::Relaxed),
            archives_failed: self.archives.0.failed.load(Ordering::Relaxed),
            archive_members: self.archives.0.members.load(Ordering::Relaxed),

            acceptance_rate: if lines_scanned > 0 {
                lines_accepted as f64 / lines_scanned as f64
            } else {
                1.0
            },
        }
    }
}

/// A read-only snapshot of ingestion metrics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub lines_scanned: u64,
    pub lines_accepted: u64,
    pub lines_dropped_short: u64,

    pub parse_errors: u64,
    pub validation_errors: u64,
    pub lines_too_large: u64,
    pub parse_panics: u64,
    pub non_utf8_files: u64,

    pub archives_ingested: u64,
    pub archives_failed: u64,
    pub archive_members: u64,

    pub acceptance_rate: f64,
}
