//! Schema-less object model
//!
//! Stored payloads are opaque JSON documents. `Unstructured` keeps the raw
//! document and projects typed views only at the points that need them
//! (identity fields, record bookkeeping) instead of deserializing into a
//! domain type hierarchy.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One schema-less API object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unstructured(pub Value);

impl Unstructured {
    /// Empty object
    pub fn new() -> Self {
        Unstructured(Value::Object(Map::new()))
    }

    /// Build from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes).map(Unstructured)
    }

    /// Serialize back to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }

    fn get_nested(&self, path: &[&str]) -> Option<&Value> {
        let mut cur = &self.0;
        for seg in path {
            cur = cur.as_object()?.get(*seg)?;
        }
        Some(cur)
    }

    /// Walk down `path`, replacing every missing or non-object node with an
    /// empty object, and return the node at the end of the path.
    fn ensure_nested(&mut self, path: &[&str]) -> &mut Value {
        let mut cur = &mut self.0;
        for seg in path {
            if !cur.is_object() {
                *cur = Value::Object(Map::new());
            }
            cur = match cur {
                Value::Object(map) => map
                    .entry(seg.to_string())
                    .or_insert_with(|| Value::Object(Map::new())),
                other => other,
            };
        }
        if !cur.is_object() {
            *cur = Value::Object(Map::new());
        }
        cur
    }

    fn set_nested(&mut self, path: &[&str], key: &str, value: Value) {
        if let Value::Object(map) = self.ensure_nested(path) {
            map.insert(key.to_string(), value);
        }
    }

    /// Remove a nested field if present; missing intermediate maps are a
    /// no-op
    pub fn remove_nested(&mut self, path: &[&str]) {
        let (parents, leaf) = match path.split_last() {
            Some((leaf, parents)) => (parents, leaf),
            None => return,
        };
        let mut cur = match self.0.as_object_mut() {
            Some(map) => map,
            None => return,
        };
        for seg in parents {
            cur = match cur.get_mut(*seg).and_then(Value::as_object_mut) {
                Some(map) => map,
                None => return,
            };
        }
        cur.remove(*leaf);
    }

    fn string_at(&self, path: &[&str]) -> String {
        self.get_nested(path)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// `apiVersion`
    pub fn api_version(&self) -> String {
        self.string_at(&["apiVersion"])
    }

    /// Set `apiVersion`
    pub fn set_api_version(&mut self, api_version: &str) {
        self.set_nested(&[], "apiVersion", Value::String(api_version.to_string()));
    }

    /// `kind`
    pub fn kind(&self) -> String {
        self.string_at(&["kind"])
    }

    /// Set `kind`
    pub fn set_kind(&mut self, kind: &str) {
        self.set_nested(&[], "kind", Value::String(kind.to_string()));
    }

    /// `metadata.name`
    pub fn name(&self) -> String {
        self.string_at(&["metadata", "name"])
    }

    /// Set `metadata.name`
    pub fn set_name(&mut self, name: &str) {
        self.set_nested(&["metadata"], "name", Value::String(name.to_string()));
    }

    /// `metadata.namespace`
    pub fn namespace(&self) -> String {
        self.string_at(&["metadata", "namespace"])
    }

    /// Set `metadata.namespace`
    pub fn set_namespace(&mut self, namespace: &str) {
        self.set_nested(&["metadata"], "namespace", Value::String(namespace.to_string()));
    }

    /// `metadata.labels` as an owned map
    pub fn labels(&self) -> BTreeMap<String, String> {
        self.get_nested(&["metadata", "labels"])
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Replace `metadata.labels`
    pub fn set_labels(&mut self, labels: &BTreeMap<String, String>) {
        let map: Map<String, Value> = labels
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        self.set_nested(&["metadata"], "labels", Value::Object(map));
    }

    /// Set one label, creating the label map if needed
    pub fn set_label(&mut self, key: &str, value: &str) {
        self.set_nested(
            &["metadata", "labels"],
            key,
            Value::String(value.to_string()),
        );
    }

    /// `metadata.annotations` as an owned map
    pub fn annotations(&self) -> BTreeMap<String, String> {
        self.get_nested(&["metadata", "annotations"])
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `metadata.generation`
    pub fn generation(&self) -> i64 {
        self.get_nested(&["metadata", "generation"])
            .and_then(Value::as_i64)
            .unwrap_or_default()
    }

    /// Set `metadata.generation`
    pub fn set_generation(&mut self, generation: i64) {
        self.set_nested(&["metadata"], "generation", Value::Number(generation.into()));
    }

    /// `metadata.resourceVersion`
    pub fn resource_version(&self) -> String {
        self.string_at(&["metadata", "resourceVersion"])
    }

    /// Set `metadata.resourceVersion`
    pub fn set_resource_version(&mut self, rv: &str) {
        self.set_nested(&["metadata"], "resourceVersion", Value::String(rv.to_string()));
    }

    /// `metadata.uid`
    pub fn uid(&self) -> String {
        self.string_at(&["metadata", "uid"])
    }

    /// Set `metadata.uid`
    pub fn set_uid(&mut self, uid: &str) {
        self.set_nested(&["metadata"], "uid", Value::String(uid.to_string()));
    }

    /// Set `metadata.creationTimestamp` (RFC 3339, seconds precision)
    pub fn set_creation_timestamp(&mut self, ts: DateTime<Utc>) {
        self.set_nested(
            &["metadata"],
            "creationTimestamp",
            Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }

    /// Set `metadata.deletionTimestamp`
    pub fn set_deletion_timestamp(&mut self, ts: DateTime<Utc>) {
        self.set_nested(
            &["metadata"],
            "deletionTimestamp",
            Value::String(ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
    }

    /// Set `metadata.deletionGracePeriodSeconds`
    pub fn set_deletion_grace_period_seconds(&mut self, seconds: i64) {
        self.set_nested(
            &["metadata"],
            "deletionGracePeriodSeconds",
            Value::Number(seconds.into()),
        );
    }

    /// Set `metadata.finalizers`
    pub fn set_finalizers(&mut self, finalizers: &[String]) {
        let list: Vec<Value> = finalizers.iter().map(|f| Value::String(f.clone())).collect();
        self.set_nested(&["metadata"], "finalizers", Value::Array(list));
    }
}

impl Default for Unstructured {
    fn default() -> Self {
        Self::new()
    }
}

/// List wrapper synthesized by the List operation with the virtual
/// resource's identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnstructuredList {
    /// apiVersion of the virtual kind
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// `<Kind>List`
    pub kind: String,
    /// Snapshot metadata, passed through from the physical store
    pub metadata: ListMeta,
    /// Unwrapped objects
    pub items: Vec<Unstructured>,
}

/// List-level bookkeeping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListMeta {
    /// Physical snapshot version, passed through unmodified
    #[serde(rename = "resourceVersion", skip_serializing_if = "String::is_empty", default)]
    pub resource_version: String,
    /// Pagination token, passed through unmodified
    #[serde(rename = "continue", skip_serializing_if = "String::is_empty", default)]
    pub continue_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn projections_read_and_write() {
        let mut obj = Unstructured(json!({
            "apiVersion": "apps.example.com/v1",
            "kind": "Foo",
            "metadata": {"name": "a", "namespace": "ns1", "labels": {"x": "y"}},
            "spec": {"replicas": 3},
        }));

        assert_eq!(obj.name(), "a");
        assert_eq!(obj.namespace(), "ns1");
        assert_eq!(obj.labels().get("x").map(String::as_str), Some("y"));

        obj.set_label("created", "here");
        obj.set_generation(7);
        obj.set_resource_version("42");
        assert_eq!(obj.generation(), 7);
        assert_eq!(obj.resource_version(), "42");
        // business fields untouched
        assert_eq!(obj.0["spec"]["replicas"], 3);
    }

    #[test]
    fn remove_nested_tolerates_missing_paths() {
        let mut obj = Unstructured(json!({"metadata": {"name": "a"}}));
        obj.remove_nested(&["metadata", "managedFields"]);
        obj.remove_nested(&["status", "conditions"]);
        assert_eq!(obj.name(), "a");
    }

    #[test]
    fn set_label_on_object_without_labels() {
        let mut obj = Unstructured(json!({"metadata": {"name": "a"}}));
        obj.set_label("k", "v");
        assert_eq!(obj.labels().get("k").map(String::as_str), Some("v"));
    }

    #[test]
    fn writes_replace_non_object_intermediates() {
        // a scalar where a map is expected gets replaced, not panicked on
        let mut obj = Unstructured(json!({"metadata": "not-a-map"}));
        obj.set_name("a");
        assert_eq!(obj.name(), "a");

        let mut scalar = Unstructured(Value::String("oops".to_string()));
        scalar.set_label("k", "v");
        assert_eq!(scalar.labels().get("k").map(String::as_str), Some("v"));
    }
}
