// Domain-driven module structure for the flowlog core.

// Data model
pub mod record;
pub mod validate;

// Core infrastructure
pub mod conf;
pub mod layout;
pub mod parser;
pub mod store;

// Domain modules
pub mod ingest;
pub mod query;

pub use ingest::{ArchiveIngestor, IngestionReport};
pub use query::{QueryFilter, QueryFilterBuilder};
pub use record::{Field, FieldCatalog, FlowRecord};
pub use store::{MemoryStore, RecordStore};
