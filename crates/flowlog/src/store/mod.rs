//! Store: abstract record store consumed by ingestion and search.
//!
//! Every caller goes through [`RecordStore`]; `memory.rs` provides the
//! in-process implementation used by the server and the tests.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::query::QueryFilter;
use crate::record::FlowRecord;

pub mod memory;

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Store capacity exceeded: {stored} stored + {incoming} incoming > {capacity}")]
    CapacityExceeded {
        stored: usize,
        incoming: usize,
        capacity: usize,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Bulk-insert / filter-query interface over record persistence.
///
/// Object-safe thanks to `Pin<Box<…>>` returns; implementations must be
/// `Send + Sync` so they can live inside shared server state.
pub trait RecordStore: Send + Sync {
    /// Persist the whole batch, or nothing.
    fn bulk_insert(
        &self,
        records: Vec<FlowRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>>;

    fn filter_query<'a>(
        &'a self,
        filter: &'a QueryFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FlowRecord>, StoreError>> + Send + 'a>>;
}
