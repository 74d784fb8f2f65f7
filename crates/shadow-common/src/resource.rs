//! Virtual resource descriptors
//!
//! One descriptor per resource kind multiplexed onto the shared manifest
//! store. Descriptors are built once at installation time and passed into
//! the storage adapter as immutable values.

use crate::labels::CATEGORY;
use serde::{Deserialize, Serialize};

/// Describes one virtual resource kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// API group; empty for the core group
    pub group: String,
    /// API version, e.g. `v1alpha1`
    pub version: String,
    /// Kind, e.g. `Foo`
    pub kind: String,
    /// Plural resource name, e.g. `foos`; may carry a `/subresource` suffix
    pub plural: String,
    /// Suggested short names
    pub short_names: Vec<String>,
    /// Whether objects of this kind live in a namespace
    pub namespaced: bool,
}

impl ResourceDescriptor {
    /// New namespaced descriptor
    pub fn namespaced(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            short_names: Vec::new(),
            namespaced: true,
        }
    }

    /// New cluster-scoped descriptor
    pub fn cluster_scoped(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        Self {
            namespaced: false,
            ..Self::namespaced(group, version, kind, plural)
        }
    }

    /// `group/version`, or bare `version` for the core group
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Kind of the synthesized list wrapper. Sub-resources keep the bare
    /// kind since they never list.
    pub fn list_kind(&self) -> String {
        if self.plural.contains('/') {
            self.kind.clone()
        } else {
            format!("{}List", self.kind)
        }
    }

    /// Plural name with any sub-resource suffix stripped
    pub fn base_resource(&self) -> &str {
        match self.plural.split_once('/') {
            Some((base, _)) => base,
            None => &self.plural,
        }
    }

    /// Sub-resource suffix, if any (`foos/status` -> `status`)
    pub fn subresource(&self) -> Option<&str> {
        self.plural.split_once('/').map(|(_, sub)| sub)
    }

    /// Discovery categories; every shadow resource is grouped under the
    /// shared category so `get <category>` enumerates them all
    pub fn categories(&self) -> Vec<String> {
        vec![CATEGORY.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_version_core_group() {
        let d = ResourceDescriptor::cluster_scoped("", "v1", "Namespace", "namespaces");
        assert_eq!(d.api_version(), "v1");
        assert_eq!(d.list_kind(), "NamespaceList");
    }

    #[test]
    fn every_kind_shares_the_category() {
        let d = ResourceDescriptor::namespaced("apps.example.com", "v1", "Foo", "foos");
        assert_eq!(d.categories(), vec![CATEGORY.to_string()]);
    }

    #[test]
    fn subresource_split() {
        let d = ResourceDescriptor::namespaced("apps.example.com", "v1", "Foo", "foos/status");
        assert_eq!(d.base_resource(), "foos");
        assert_eq!(d.subresource(), Some("status"));
        assert_eq!(d.list_kind(), "Foo");

        let plain = ResourceDescriptor::namespaced("apps.example.com", "v1", "Foo", "foos");
        assert_eq!(plain.base_resource(), "foos");
        assert_eq!(plain.subresource(), None);
    }
}
