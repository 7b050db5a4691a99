//! Memory: in-process record store.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use super::{RecordStore, StoreError};
use crate::query::QueryFilter;
use crate::record::FlowRecord;

/// Records held in insertion order behind a single lock, so a bulk insert
/// is visible all at once or not at all.
pub struct MemoryStore {
    records: RwLock<Vec<FlowRecord>>,
    capacity: Option<usize>,
    bulk_inserts: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            capacity: None,
            bulk_inserts: AtomicU64::new(0),
        }
    }

    /// A store that refuses batches pushing it past `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Number of bulk insert calls received, successful or not.
    pub fn bulk_insert_calls(&self) -> u64 {
        self.bulk_inserts.load(Ordering::Relaxed)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn bulk_insert(
        &self,
        records: Vec<FlowRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<usize, StoreError>> + Send + '_>> {
        Box::pin(async move {
            self.bulk_inserts.fetch_add(1, Ordering::Relaxed);
            let mut stored = self.records.write().await;

            if let Some(capacity) = self.capacity {
                if stored.len() + records.len() > capacity {
                    return Err(StoreError::CapacityExceeded {
                        stored: stored.len(),
                        incoming: records.len(),
                        capacity,
                    });
                }
            }

            let count = records.len();
            stored.extend(records);
            Ok(count)
        })
    }

    fn filter_query<'a>(
        &'a self,
        filter: &'a QueryFilter,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<FlowRecord>, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let stored = self.records.read().await;
            Ok(stored.iter().filter(|r| filter.matches(r)).cloned().collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::model::sample_candidate;
    use crate::validate::validate;

    fn record(account_id: i64, protocol: i32) -> FlowRecord {
        let mut c = sample_candidate();
        c.account_id = account_id;
        c.protocol = protocol;
        validate(c).unwrap()
    }

    #[tokio::test]
    async fn test_bulk_insert_and_query_all() {
        let store = MemoryStore::new();
        let inserted = store.bulk_insert(vec![record(1, 6), record(2, 17)]).await.unwrap();
        assert_eq!(inserted, 2);
        assert_eq!(store.len().await, 2);
        assert_eq!(store.bulk_insert_calls(), 1);

        let all = store.filter_query(&QueryFilter::all()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].account_id(), 1);
    }

    #[tokio::test]
    async fn test_filter_applies_predicate() {
        let store = MemoryStore::new();
        store.bulk_insert(vec![record(1, 6), record(2, 17), record(1, 17)]).await.unwrap();

        let filter = crate::query::QueryFilterBuilder::global()
            .build("account_id=1,protocol=17", None, None)
            .unwrap();
        let found = store.filter_query(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].protocol(), 17);
    }

    #[tokio::test]
    async fn test_capacity_is_all_or_nothing() {
        let store = MemoryStore::with_capacity(2);
        store.bulk_insert(vec![record(1, 6)]).await.unwrap();

        let err = store.bulk_insert(vec![record(2, 6), record(3, 6)]).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::CapacityExceeded { stored: 1, incoming: 2, capacity: 2 }
        );
        assert_eq!(store.len().await, 1);
        assert_eq!(store.bulk_insert_calls(), 2);
    }

    #[tokio::test]
    async fn test_ipv6_search_matches_any_spelling() {
        let store = MemoryStore::new();
        let mut c = sample_candidate();
        c.srcaddr = "FE80::1".to_string();
        store.bulk_insert(vec![validate(c).unwrap(), record(2, 6)]).await.unwrap();

        for search in ["srcaddr=FE80::1", "srcaddr=fe80:0:0:0:0:0:0:1"] {
            let filter = crate::query::QueryFilterBuilder::global()
                .build(search, None, None)
                .unwrap();
            let found = store.filter_query(&filter).await.unwrap();
            assert_eq!(found.len(), 1, "{}", search);
            assert_eq!(found[0].srcaddr().to_string(), "fe80::1");
        }
    }
}
