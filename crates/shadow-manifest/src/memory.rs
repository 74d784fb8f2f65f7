//! In-memory reference store
//!
//! DashMap-backed implementation of the store contract with broadcast
//! watch fan-out and a monotonic resourceVersion counter. Backs the adapter
//! tests and local development; production deployments point the adapter at
//! a real store client instead.

use crate::record::ManifestRecord;
use crate::store::{
    ManifestCache, ManifestList, ManifestQuery, ManifestStore, StoreError, StoreEvent, StoreResult,
};
use chrono::Utc;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

const EVENT_FANOUT_CAPACITY: usize = 256;

/// Shared in-memory manifest store
pub struct MemoryManifestStore {
    records: DashMap<String, ManifestRecord>,
    resource_version: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
    watch_buffer: usize,
}

impl MemoryManifestStore {
    /// Empty store with the default watch buffer
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_FANOUT_CAPACITY);
        Self {
            records: DashMap::new(),
            resource_version: AtomicU64::new(0),
            events,
            watch_buffer: 100,
        }
    }

    fn next_resource_version(&self) -> String {
        (self.resource_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn current_resource_version(&self) -> String {
        self.resource_version.load(Ordering::SeqCst).to_string()
    }

    fn publish(&self, event: StoreEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

impl Default for MemoryManifestStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ManifestStore for MemoryManifestStore {
    async fn create(&self, mut record: ManifestRecord) -> StoreResult<ManifestRecord> {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(record.key.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists(record.key)),
            Entry::Vacant(slot) => {
                record.uid = Uuid::new_v4().to_string();
                record.resource_version = self.next_resource_version();
                record.generation = 1;
                record.creation_timestamp = Some(Utc::now());
                slot.insert(record.clone());
                self.publish(StoreEvent::Added(record.clone()));
                Ok(record)
            }
        }
    }

    async fn get(&self, key: &str, _resource_version: &str) -> StoreResult<ManifestRecord> {
        self.records
            .get(key)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn update(&self, record: ManifestRecord) -> StoreResult<ManifestRecord> {
        let mut current = self
            .records
            .get_mut(&record.key)
            .ok_or_else(|| StoreError::NotFound(record.key.clone()))?;

        if !record.resource_version.is_empty()
            && record.resource_version != current.resource_version
        {
            return Err(StoreError::Conflict(record.key));
        }

        if record.payload != current.payload {
            current.generation += 1;
        }
        current.labels = record.labels;
        current.payload = record.payload;
        current.finalizers = record.finalizers;
        current.resource_version = self.next_resource_version();

        let updated = current.clone();
        drop(current);
        self.publish(StoreEvent::Modified(updated.clone()));
        Ok(updated)
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        match self.records.remove(key) {
            Some((_, record)) => {
                self.publish(StoreEvent::Deleted(record));
                Ok(())
            }
            None => Err(StoreError::NotFound(key.to_string())),
        }
    }

    async fn list(&self, query: ManifestQuery) -> StoreResult<ManifestList> {
        let mut items: Vec<ManifestRecord> = self
            .records
            .iter()
            .filter(|entry| query.selector.matches(&entry.labels))
            .map(|entry| entry.clone())
            .collect();
        items.sort_by(|a, b| a.key.cmp(&b.key));

        Ok(ManifestList {
            items,
            resource_version: self.current_resource_version(),
            continue_token: String::new(),
        })
    }

    async fn watch(&self, query: ManifestQuery) -> StoreResult<mpsc::Receiver<StoreEvent>> {
        let mut upstream = self.events.subscribe();
        let (tx, rx) = mpsc::channel(self.watch_buffer);
        let selector = query.selector;

        tokio::spawn(async move {
            loop {
                let event = match upstream.recv().await {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "memory store watcher lagged, ending stream");
                        let status = serde_json::json!({
                            "kind": "Status",
                            "status": "Failure",
                            "reason": "Expired",
                            "message": format!("watch lagged behind by {} events", missed),
                        });
                        let _ = tx.send(StoreEvent::Error(status)).await;
                        return;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                };

                let matches = match &event {
                    StoreEvent::Added(r) | StoreEvent::Modified(r) | StoreEvent::Deleted(r) => {
                        selector.matches(&r.labels)
                    }
                    StoreEvent::Bookmark(_) | StoreEvent::Error(_) => true,
                };
                if matches && tx.send(event).await.is_err() {
                    // watcher gone
                    return;
                }
            }
        });

        Ok(rx)
    }
}

impl ManifestCache for MemoryManifestStore {
    fn get(&self, key: &str) -> StoreResult<ManifestRecord> {
        self.records
            .get(key)
            .map(|r| r.clone())
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_common::{Requirement, Selector};
    use std::collections::BTreeMap;

    fn record(key: &str, kind: &str) -> ManifestRecord {
        let mut labels = BTreeMap::new();
        labels.insert("openshadow.io/config.kind".to_string(), kind.to_string());
        ManifestRecord::new(key, labels, br#"{"kind":"X"}"#.to_vec())
    }

    #[tokio::test]
    async fn create_assigns_bookkeeping_and_rejects_duplicates() {
        let store = MemoryManifestStore::new();
        let created = store.create(record("foos.abcd.ns1.a", "Foo")).await.unwrap();
        assert!(!created.uid.is_empty());
        assert_eq!(created.resource_version, "1");
        assert_eq!(created.generation, 1);
        assert!(created.creation_timestamp.is_some());

        let err = store.create(record("foos.abcd.ns1.a", "Foo")).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn update_enforces_optimistic_concurrency() {
        let store = MemoryManifestStore::new();
        let created = store.create(record("foos.abcd.ns1.a", "Foo")).await.unwrap();

        let mut stale = created.clone();
        stale.resource_version = "0".to_string();
        let err = store.update(stale).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let mut fresh = created.clone();
        fresh.payload = br#"{"kind":"X","spec":1}"#.to_vec();
        let updated = store.update(fresh).await.unwrap();
        assert_eq!(updated.generation, 2);
        assert_ne!(updated.resource_version, created.resource_version);
        assert_eq!(updated.uid, created.uid);
    }

    #[tokio::test]
    async fn list_filters_by_selector() {
        let store = MemoryManifestStore::new();
        store.create(record("foos.abcd.ns1.a", "Foo")).await.unwrap();
        store.create(record("bars.abcd.ns1.b", "Bar")).await.unwrap();

        let query = ManifestQuery {
            selector: Selector::everything()
                .add(Requirement::equals("openshadow.io/config.kind", "Foo")),
            ..ManifestQuery::default()
        };
        let list = store.list(query).await.unwrap();
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].key, "foos.abcd.ns1.a");
        assert!(!list.resource_version.is_empty());
    }

    #[tokio::test]
    async fn watch_sees_matching_events_only() {
        let store = MemoryManifestStore::new();
        let query = ManifestQuery {
            selector: Selector::everything()
                .add(Requirement::equals("openshadow.io/config.kind", "Foo")),
            ..ManifestQuery::default()
        };
        let mut rx = store.watch(query).await.unwrap();

        store.create(record("bars.abcd.ns1.b", "Bar")).await.unwrap();
        store.create(record("foos.abcd.ns1.a", "Foo")).await.unwrap();
        store.delete("foos.abcd.ns1.a").await.unwrap();

        match rx.recv().await.unwrap() {
            StoreEvent::Added(r) => assert_eq!(r.key, "foos.abcd.ns1.a"),
            other => panic!("unexpected event: {other:?}"),
        }
        match rx.recv().await.unwrap() {
            StoreEvent::Deleted(r) => assert_eq!(r.key, "foos.abcd.ns1.a"),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
