//! Call options for the virtual resource surface
//!
//! Plain serde structs; everything defaults to "unset" and passes through to
//! the physical store untouched. The adapter adds no timeout logic of its
//! own.

use crate::selector::{FieldSelector, Selector};
use serde::{Deserialize, Serialize};

/// Options for Get/List/Watch/DeleteCollection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListOptions {
    /// Caller label selector, applied verbatim
    pub label_selector: Option<Selector>,
    /// Caller field selector; only `metadata.name` is recognized
    pub field_selector: Option<FieldSelector>,
    /// Empty means "serve from cache / latest"
    #[serde(default)]
    pub resource_version: String,
    /// Resource version match semantics, passed through
    pub resource_version_match: Option<String>,
    /// Server-side timeout, passed through
    pub timeout_seconds: Option<u32>,
    /// Page size, passed through
    pub limit: Option<i64>,
    /// Pagination token, passed through
    #[serde(default)]
    pub continue_token: String,
    /// Whether the caller wants bookmark events
    #[serde(default)]
    pub allow_watch_bookmarks: bool,
    /// Set on watch requests
    #[serde(default)]
    pub watch: bool,
}

/// Options for Create
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Field manager name, passed through to the dry-run endpoint
    pub field_manager: Option<String>,
}

/// Options for Update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOptions {
    /// Field manager name, passed through
    pub field_manager: Option<String>,
}

/// Options for Delete; copied per item during bulk delete so graceful
/// deletion state never leaks between items
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteOptions {
    /// Grace period override
    pub grace_period_seconds: Option<i64>,
    /// Dependent-deletion policy, passed through
    pub propagation_policy: Option<String>,
}
