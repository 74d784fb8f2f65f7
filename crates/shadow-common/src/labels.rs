//! Well-known label keys and system constants
//!
//! Every manifest record carries the source-identity labels below so that
//! List/Watch can filter one shared store down to a single virtual
//! collection.

/// Marks who created an object
pub const OBJECT_CREATED_BY_LABEL: &str = "openshadow.io/created-by";

/// Group of the virtual kind the payload belongs to
pub const CONFIG_GROUP_LABEL: &str = "openshadow.io/config.group";
/// Version of the virtual kind the payload belongs to
pub const CONFIG_VERSION_LABEL: &str = "openshadow.io/config.version";
/// Kind name of the payload
pub const CONFIG_KIND_LABEL: &str = "openshadow.io/config.kind";
/// Object name of the payload
pub const CONFIG_NAME_LABEL: &str = "openshadow.io/config.name";
/// Object namespace of the payload (empty for cluster scope)
pub const CONFIG_NAMESPACE_LABEL: &str = "openshadow.io/config.namespace";
/// Tenant the payload belongs to
pub const CLUSTER_ID_LABEL: &str = "openshadow.io/cluster-id";

/// Label value stamped by [`OBJECT_CREATED_BY_LABEL`]
pub const APP_NAME: &str = "openshadow";

/// Namespace where system components (and tenant service accounts) live
pub const SYSTEM_NAMESPACE: &str = "shadow-system";

/// Reserved namespace where every manifest record is stored
pub const RESERVED_NAMESPACE: &str = "shadow-reserved";

/// API category shared by all shadow resources
pub const CATEGORY: &str = "openshadow";

/// Finalizer owned by the platform
pub const APP_FINALIZER: &str = "openshadow.io/finalizer";
