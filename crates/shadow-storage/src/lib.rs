//! Storage Virtualization Adapter
//!
//! Exposes many tenant-scoped virtual resource kinds through one uniform
//! CRUD/List/Watch surface while persisting every object as a generic
//! manifest record in one shared reserved location.
//!
//! Request flow:
//!
//! ```text
//! request -> identity (tenant resolution)
//!         -> query/key derivation
//!         -> manifest store client
//!         -> codec (wrap/unwrap)
//!         -> response / watch relay
//! ```

#![warn(missing_docs)]

pub mod codec;
pub mod dryrun;
pub mod identity;
pub mod key;
pub mod query;
pub mod relay;
pub mod rest;

pub use dryrun::{DryRunClient, HttpDryRunClient};
pub use identity::{RequestContext, TenantContext};
pub use relay::{WatchEvent, WatchRelay};
pub use rest::{RestConfig, ShadowRest, Table, TableColumn, TableRow};
