//! Watch relay
//!
//! Wraps the physical change-event stream and lazily transforms events:
//! record events are unwrapped into caller objects, status/error markers
//! pass through unchanged. The relay runs until the upstream closes or the
//! consumer goes away. The downstream buffer is bounded; a consumer that
//! stays full gets its stream terminated instead of blocking the upstream.

use crate::codec;
use shadow_common::Unstructured;
use shadow_manifest::{ManifestRecord, StoreEvent};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Default downstream buffer size
pub const DEFAULT_WATCH_BUFFER: usize = 100;

/// Event emitted to a watcher of a virtual resource
#[derive(Debug, Clone)]
pub enum WatchEvent {
    /// Object created
    Added(Unstructured),
    /// Object updated
    Modified(Unstructured),
    /// Object removed
    Deleted(Unstructured),
    /// Progress marker
    Bookmark(Unstructured),
    /// Error marker carrying a status document
    Error(serde_json::Value),
}

/// Relays a store event stream to a watcher
pub struct WatchRelay;

impl WatchRelay {
    /// Spawn the relay task for `upstream`, returning the watcher's stream
    pub fn spawn(mut upstream: mpsc::Receiver<StoreEvent>, buffer: usize) -> mpsc::Receiver<WatchEvent> {
        let (tx, rx) = mpsc::channel(buffer.max(1));

        tokio::spawn(async move {
            while let Some(event) = upstream.recv().await {
                let out = match event {
                    StoreEvent::Added(record) => transform(record, WatchEvent::Added),
                    StoreEvent::Modified(record) => transform(record, WatchEvent::Modified),
                    StoreEvent::Deleted(record) => transform(record, WatchEvent::Deleted),
                    StoreEvent::Bookmark(record) => transform(record, WatchEvent::Bookmark),
                    StoreEvent::Error(status) => WatchEvent::Error(status),
                };

                match tx.try_send(out) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!("watch consumer fell behind, terminating relay");
                        return;
                    }
                    Err(TrySendError::Closed(_)) => return,
                }
            }
            tracing::debug!("upstream watch closed, relay done");
        });

        rx
    }
}

fn transform(record: ManifestRecord, wrap: fn(Unstructured) -> WatchEvent) -> WatchEvent {
    match codec::unwrap(&record) {
        Ok(object) => wrap(object),
        Err(err) => {
            // never forward the raw record: that would leak the physical kind
            tracing::error!(key = %record.key, %err, "failed to transform manifest event");
            WatchEvent::Error(err.to_status())
        }
    }
}
