/// Line parsing for whitespace-separated flow logs
///
/// Turns one decoded text line into a typed [`FlowCandidate`] according to a
/// [`crate::layout::LineLayout`]. Validation happens afterwards, in
/// [`crate::validate`].
///
/// # Architecture
///
/// - `traits.rs`: the `LineParser` seam
/// - `model.rs`: parse outcomes and errors
/// - `flow.rs`: layout-driven parser implementation
/// - `metrics.rs`: ingestion counters
///
/// [`FlowCandidate`]: crate::record::FlowCandidate

pub mod traits;
pub mod model;
pub mod flow;
pub mod metrics;

pub use traits::LineParser;
pub use model::{LineOutcome, ParseError};
pub use flow::FlowLineParser;
pub use metrics::{IngestMetrics, MetricErrorType};

// Constants
pub const DEFAULT_MAX_LINE_SIZE: usize = 65_536; // 64KB
