//! Manifest Store Contract
//!
//! The physical layer of the shadow storage stack: the generic wrapper
//! record every virtual object is persisted as, the client traits the
//! storage adapter consumes, and an in-memory reference store.

#![warn(missing_docs)]

pub mod memory;
pub mod record;
pub mod store;

pub use memory::MemoryManifestStore;
pub use record::ManifestRecord;
pub use store::{
    ManifestCache, ManifestList, ManifestQuery, ManifestStore, StoreError, StoreEvent, StoreResult,
};
