use std::sync::Arc;

use flowlog::conf::FlowlogConfig;
use flowlog::parser::IngestMetrics;
use flowlog::{ArchiveIngestor, MemoryStore, RecordStore};
use tracing::info;

use crate::config::ServerConfig;

/// Shared application state (thread-safe)
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub flowlog: Arc<FlowlogConfig>,
    pub store: Arc<dyn RecordStore>,
    pub ingestor: Arc<ArchiveIngestor<dyn RecordStore>>,
    pub metrics: Arc<IngestMetrics>,
}

impl AppState {
    /// State backed by a fresh in-memory store.
    pub fn new(config: ServerConfig, flowlog: FlowlogConfig) -> Self {
        Self::with_store(config, flowlog, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(config: ServerConfig, flowlog: FlowlogConfig, store: Arc<dyn RecordStore>) -> Self {
        let metrics = Arc::new(IngestMetrics::new());
        let ingestor = ArchiveIngestor::new(Arc::clone(&store), &flowlog).with_metrics(Arc::clone(&metrics));

        info!(
            max_archive_bytes = flowlog.ingest.max_archive_bytes,
            min_tokens = flowlog.layout.min_tokens,
            "Application state initialized"
        );

        Self {
            config: Arc::new(config),
            flowlog: Arc::new(flowlog),
            store,
            ingestor: Arc::new(ingestor),
            metrics,
        }
    }
}
