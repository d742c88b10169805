#![cfg(test)]

use std::sync::Arc;

use async_trait::async_trait;

use super::{resolve_range, MemoryStore, MetricsStore, RollingStore, HISTORY_CAPACITY};
use crate::error::StoreError;

/// Backend that fails every call, like a redis that went away.
pub(crate) struct UnreachableStore;

#[async_trait]
impl MetricsStore for UnreachableStore {
    async fn push_front(&self, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn trim(&self, _start: isize, _stop: isize) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn range(&self, _start: isize, _stop: isize) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

fn rolling() -> (Arc<MemoryStore>, RollingStore) {
    let backend = Arc::new(MemoryStore::new());
    let store = RollingStore::new(backend.clone());
    (backend, store)
}

#[test]
fn range_resolution_follows_list_semantics() {
    assert_eq!(resolve_range(0, 0, -1), None);
    assert_eq!(resolve_range(5, 0, -1), Some((0, 4)));
    assert_eq!(resolve_range(5, 1, 2), Some((1, 2)));
    assert_eq!(resolve_range(5, -2, -1), Some((3, 4)));
    assert_eq!(resolve_range(5, -10, 1), Some((0, 1)));
    assert_eq!(resolve_range(5, 2, 100), Some((2, 4)));
    assert_eq!(resolve_range(5, 5, 10), None);
    assert_eq!(resolve_range(5, 3, 1), None);
    assert_eq!(resolve_range(5, 0, -6), None);
}

#[tokio::test]
async fn append_keeps_newest_first() {
    let (_, store) = rolling();
    for name in ["A", "B", "C"] {
        store.append(name).await.unwrap();
    }
    assert_eq!(store.range_query(0, -1).await.unwrap(), vec!["C", "B", "A"]);
}

#[tokio::test]
async fn append_caps_history() {
    let (backend, store) = rolling();
    for i in 0..(HISTORY_CAPACITY + 50) {
        store.append(&i.to_string()).await.unwrap();
        assert!(backend.len().await <= HISTORY_CAPACITY);
    }
    let all = store.range_query(0, -1).await.unwrap();
    assert_eq!(all.len(), HISTORY_CAPACITY);
    assert_eq!(all.first().map(String::as_str), Some("149"));
    assert_eq!(all.last().map(String::as_str), Some("50"));
}

#[tokio::test]
async fn default_cap_path_matches_override() {
    // The trait's default push-then-trim must leave the same list as the
    // single-lock override.
    struct Plain(MemoryStore);

    #[async_trait]
    impl MetricsStore for Plain {
        async fn push_front(&self, value: String) -> Result<(), StoreError> {
            self.0.push_front(value).await
        }
        async fn trim(&self, start: isize, stop: isize) -> Result<(), StoreError> {
            self.0.trim(start, stop).await
        }
        async fn range(&self, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
            self.0.range(start, stop).await
        }
    }

    let plain = Plain(MemoryStore::new());
    for i in 0..5 {
        plain.push_front_capped(i.to_string(), 3).await.unwrap();
    }
    assert_eq!(plain.range(0, -1).await.unwrap(), vec!["4", "3", "2"]);
}

#[tokio::test]
async fn sample_round_trips_through_the_store() {
    let (_, store) = rolling();
    let value = serde_json::json!({"cpu_usage": 42.5, "memory": {"total": 1}});
    store.append(&value.to_string()).await.unwrap();

    let back = store.range_query(0, 0).await.unwrap();
    assert_eq!(back.len(), 1);
    let decoded: serde_json::Value = serde_json::from_str(&back[0]).unwrap();
    assert_eq!(decoded, value);
}

#[tokio::test]
async fn out_of_range_reads_are_empty() {
    let (_, store) = rolling();
    assert!(store.range_query(0, -1).await.unwrap().is_empty());
    store.append("only").await.unwrap();
    assert!(store.range_query(5, 10).await.unwrap().is_empty());
    assert!(store.range_query(1, 0).await.unwrap().is_empty());
    assert_eq!(store.range_query(0, i64::MAX).await.unwrap(), vec!["only"]);
}

#[tokio::test]
async fn concurrent_appends_respect_capacity() {
    let (backend, store) = rolling();
    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..40 {
                store.append(&format!("{worker}-{i}")).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }
    assert_eq!(backend.len().await, store.capacity());
}

#[tokio::test]
async fn unreachable_backend_reports_errors() {
    let store = RollingStore::new(Arc::new(UnreachableStore));
    assert!(store.append("x").await.is_err());
    assert!(matches!(
        store.range_query(0, -1).await,
        Err(StoreError::Unavailable(_))
    ));
}
