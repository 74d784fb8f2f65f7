//! Store client traits
//!
//! The contract the storage adapter consumes. Implementations must be safe
//! for concurrent use; every retry decision belongs to the caller or the
//! client, never to this layer.

use crate::record::ManifestRecord;
use serde::{Deserialize, Serialize};
use shadow_common::Selector;
use thiserror::Error;
use tokio::sync::mpsc;

/// Physical store failure, before re-scoping to a virtual resource
#[derive(Error, Debug)]
pub enum StoreError {
    /// No record under the key
    #[error("manifest not found: {0}")]
    NotFound(String),

    /// Create collided with an existing record
    #[error("manifest already exists: {0}")]
    AlreadyExists(String),

    /// Stale resourceVersion on update
    #[error("manifest conflict: {0}")]
    Conflict(String),

    /// Store unreachable or request aborted
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Anything else
    #[error("store internal error: {0}")]
    Internal(String),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Query against the shared store; always selector-driven since all virtual
/// collections share one physical location
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestQuery {
    /// Compound label predicate; field selectors are never forwarded
    pub selector: Selector,
    /// Snapshot version, passed through
    #[serde(default)]
    pub resource_version: String,
    /// Version match semantics, passed through
    pub resource_version_match: Option<String>,
    /// Page size, passed through
    pub limit: Option<i64>,
    /// Pagination token, passed through
    #[serde(default)]
    pub continue_token: String,
    /// Server-side timeout, passed through
    pub timeout_seconds: Option<u32>,
    /// Whether the watcher accepts bookmarks
    #[serde(default)]
    pub allow_watch_bookmarks: bool,
}

/// One page of records
#[derive(Debug, Clone, Default)]
pub struct ManifestList {
    /// Matching records
    pub items: Vec<ManifestRecord>,
    /// Snapshot version of this page
    pub resource_version: String,
    /// Token for the next page, empty when exhausted
    pub continue_token: String,
}

/// Change event from the physical watch stream
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// Record created
    Added(ManifestRecord),
    /// Record updated
    Modified(ManifestRecord),
    /// Record removed
    Deleted(ManifestRecord),
    /// Progress marker, carries the record-shaped bookmark
    Bookmark(ManifestRecord),
    /// Error marker, carries a status document
    Error(serde_json::Value),
}

/// Client for the shared manifest store
#[async_trait::async_trait]
pub trait ManifestStore: Send + Sync {
    /// Persist a new record; the store assigns uid, resourceVersion and
    /// creation timestamp
    async fn create(&self, record: ManifestRecord) -> StoreResult<ManifestRecord>;

    /// Consistent read by key; `resource_version` passes through when set
    async fn get(&self, key: &str, resource_version: &str) -> StoreResult<ManifestRecord>;

    /// Optimistic-concurrency-checked update
    async fn update(&self, record: ManifestRecord) -> StoreResult<ManifestRecord>;

    /// Delete by key
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Selector-filtered list
    async fn list(&self, query: ManifestQuery) -> StoreResult<ManifestList>;

    /// Selector-filtered watch; the stream ends when the store closes it or
    /// the receiver is dropped
    async fn watch(&self, query: ManifestQuery) -> StoreResult<mpsc::Receiver<StoreEvent>>;
}

/// Read-through cache over the store (informer-style lister). May lag the
/// store; used only when the caller did not pin a resourceVersion.
pub trait ManifestCache: Send + Sync {
    /// Cached read by key
    fn get(&self, key: &str) -> StoreResult<ManifestRecord>;
}
