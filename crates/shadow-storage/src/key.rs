//! Composite physical keys
//!
//! Every manifest record is named `<plural>.<tenant>.<namespace>.<name>`
//! (the namespace segment is omitted for cluster-scoped kinds). Plural,
//! tenant and namespace tokens are `[a-z0-9-]` words without dots, so a
//! left-anchored split into the fixed fields plus a free-form name remainder
//! is unambiguous even though names may contain dots. Never split on every
//! dot.

/// Decoded key fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyParts {
    /// Plural resource name
    pub resource: String,
    /// Tenant (cluster) id
    pub tenant: String,
    /// Namespace; `None` for cluster-scoped kinds
    pub namespace: Option<String>,
    /// Object name, may contain dots
    pub name: String,
}

/// Build the physical key for an object
pub fn manifest_key(resource: &str, tenant: &str, namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) => format!("{resource}.{tenant}.{ns}.{name}"),
        None => format!("{resource}.{tenant}.{name}"),
    }
}

/// Split a key back into its fields. The caller must know whether the kind
/// is namespaced since the name remainder is free-form.
pub fn split_manifest_key(key: &str, namespaced: bool) -> Option<KeyParts> {
    let fixed_fields = if namespaced { 3 } else { 2 };
    let mut parts = key.splitn(fixed_fields + 1, '.');

    let resource = parts.next()?.to_string();
    let tenant = parts.next()?.to_string();
    let namespace = if namespaced {
        Some(parts.next()?.to_string())
    } else {
        None
    };
    let name = parts.next()?.to_string();

    if resource.is_empty() || tenant.is_empty() || name.is_empty() {
        return None;
    }
    Some(KeyParts {
        resource,
        tenant,
        namespace,
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_key_round_trip() {
        let key = manifest_key("foos", "abcd", Some("kube-system"), "abc.def-bar");
        assert_eq!(key, "foos.abcd.kube-system.abc.def-bar");

        let parts = split_manifest_key(&key, true).expect("splits");
        assert_eq!(parts.resource, "foos");
        assert_eq!(parts.tenant, "abcd");
        assert_eq!(parts.namespace.as_deref(), Some("kube-system"));
        assert_eq!(parts.name, "abc.def-bar");
    }

    #[test]
    fn cluster_scoped_key_round_trip() {
        let key = manifest_key("bars", "abcd", None, "abc.def-bar");
        assert_eq!(key, "bars.abcd.abc.def-bar");

        let parts = split_manifest_key(&key, false).expect("splits");
        assert_eq!(parts.resource, "bars");
        assert_eq!(parts.tenant, "abcd");
        assert_eq!(parts.namespace, None);
        assert_eq!(parts.name, "abc.def-bar");
    }

    #[test]
    fn plain_names_split_too() {
        let parts = split_manifest_key("foos.abcd.kube-system.abc", true).expect("splits");
        assert_eq!(parts.name, "abc");
    }

    #[test]
    fn truncated_keys_do_not_split() {
        assert!(split_manifest_key("foos.abcd", true).is_none());
        assert!(split_manifest_key("foos.abcd.ns1", true).is_none());
        assert!(split_manifest_key("bars.abcd", false).is_none());
    }
}
