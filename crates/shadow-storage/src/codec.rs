//! Manifest codec
//!
//! Wraps caller objects into manifest records and back. The record is
//! authoritative for generation, timestamps, resourceVersion, uid and
//! finalizers; those fields are overlaid onto the payload on every read and
//! stripped from the payload before every persist.

use crate::key;
use shadow_common::labels::{
    APP_NAME, CLUSTER_ID_LABEL, CONFIG_GROUP_LABEL, CONFIG_KIND_LABEL, CONFIG_NAMESPACE_LABEL,
    CONFIG_NAME_LABEL, CONFIG_VERSION_LABEL, OBJECT_CREATED_BY_LABEL,
};
use shadow_common::{ApiError, ApiResult, ResourceDescriptor, Unstructured};
use shadow_manifest::ManifestRecord;
use std::collections::BTreeMap;

/// The synthetic scale view; its kind label is never rewritten since the
/// record keeps describing the template object underneath.
const SCALE_KIND: &str = "Scale";

/// Stamp the source-identity labels for an object onto a label set.
pub fn stamp_identity_labels(
    labels: &mut BTreeMap<String, String>,
    descriptor: &ResourceDescriptor,
    tenant: &str,
    object: &Unstructured,
) {
    labels.insert(CONFIG_GROUP_LABEL.to_string(), descriptor.group.clone());
    labels.insert(CONFIG_VERSION_LABEL.to_string(), descriptor.version.clone());
    if descriptor.kind != SCALE_KIND {
        labels.insert(CONFIG_KIND_LABEL.to_string(), descriptor.kind.clone());
    }
    labels.insert(CONFIG_NAME_LABEL.to_string(), object.name());
    labels.insert(CONFIG_NAMESPACE_LABEL.to_string(), object.namespace());
    labels.insert(CLUSTER_ID_LABEL.to_string(), tenant.to_string());
    labels.insert(OBJECT_CREATED_BY_LABEL.to_string(), APP_NAME.to_string());
}

/// Wrap an object into a fresh record under its deterministic key.
///
/// The payload's own labels are carried onto the record (useful for caller
/// label selectors) before the identity labels are stamped on top.
pub fn wrap(
    descriptor: &ResourceDescriptor,
    tenant: &str,
    object: &Unstructured,
) -> ApiResult<ManifestRecord> {
    let namespace = object.namespace();
    let key = key::manifest_key(
        descriptor.base_resource(),
        tenant,
        descriptor.namespaced.then_some(namespace.as_str()),
        &object.name(),
    );

    let mut labels = object.labels();
    stamp_identity_labels(&mut labels, descriptor, tenant, object);

    let payload = object
        .to_bytes()
        .map_err(|e| ApiError::Internal(format!("failed to marshal object: {e}")))?;
    Ok(ManifestRecord::new(key, labels, payload))
}

/// Unwrap a record back into the caller's object, overlaying the
/// record-level bookkeeping. Annotations pass through unchanged.
///
/// A payload that no longer parses is server-side corruption, never a
/// client error.
pub fn unwrap(record: &ManifestRecord) -> ApiResult<Unstructured> {
    let mut object = Unstructured::from_slice(&record.payload)
        .map_err(|e| ApiError::Internal(format!("corrupted manifest payload: {e}")))?;

    object.set_generation(record.generation);
    if let Some(ts) = record.creation_timestamp {
        object.set_creation_timestamp(ts);
    }
    object.set_resource_version(&record.resource_version);
    object.set_uid(&record.uid);
    if let Some(seconds) = record.deletion_grace_period_seconds {
        object.set_deletion_grace_period_seconds(seconds);
    }
    if let Some(ts) = record.deletion_timestamp {
        object.set_deletion_timestamp(ts);
    }
    if !record.finalizers.is_empty() {
        object.set_finalizers(&record.finalizers);
    }
    Ok(object)
}

/// Strip the record-authoritative fields from a payload before persisting.
/// `metadata.uid` stays: patch paths use it for identity checks.
pub fn trim(object: &mut Unstructured) {
    object.remove_nested(&["metadata", "creationTimestamp"]);
    object.remove_nested(&["metadata", "managedFields"]);
    object.remove_nested(&["metadata", "resourceVersion"]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shadow_common::labels::APP_FINALIZER;

    fn foo_descriptor() -> ResourceDescriptor {
        ResourceDescriptor::namespaced("apps.example.com", "v1alpha1", "Foo", "foos")
    }

    #[test]
    fn wrap_derives_key_and_labels() {
        let descriptor = foo_descriptor();
        let object = Unstructured(json!({
            "apiVersion": "apps.example.com/v1alpha1",
            "kind": "Foo",
            "metadata": {"name": "boo", "namespace": "ns1", "labels": {"team": "core"}},
            "spec": {"size": 1},
        }));

        let record = wrap(&descriptor, "abcd", &object).expect("wraps");
        assert_eq!(record.key, "foos.abcd.ns1.boo");
        assert_eq!(record.labels.get("team").map(String::as_str), Some("core"));
        assert_eq!(
            record.labels.get(CONFIG_KIND_LABEL).map(String::as_str),
            Some("Foo")
        );
        assert_eq!(
            record.labels.get(CONFIG_NAMESPACE_LABEL).map(String::as_str),
            Some("ns1")
        );
        assert_eq!(
            record.labels.get(CLUSTER_ID_LABEL).map(String::as_str),
            Some("abcd")
        );
        assert_eq!(
            record.labels.get(OBJECT_CREATED_BY_LABEL).map(String::as_str),
            Some(APP_NAME)
        );
    }

    #[test]
    fn unwrap_wrap_preserves_business_fields() {
        let descriptor = foo_descriptor();
        let object = Unstructured(json!({
            "apiVersion": "apps.example.com/v1alpha1",
            "kind": "Foo",
            "metadata": {"name": "boo", "namespace": "ns1"},
            "spec": {"size": 3, "flavor": "large"},
            "status": {"ready": true},
        }));

        let mut record = wrap(&descriptor, "abcd", &object).expect("wraps");
        record.generation = 4;
        record.resource_version = "99".to_string();
        record.uid = "u-42".to_string();
        record.finalizers = vec![APP_FINALIZER.to_string()];

        let unwrapped = unwrap(&record).expect("unwraps");
        assert_eq!(unwrapped.0["spec"], object.0["spec"]);
        assert_eq!(unwrapped.0["status"], object.0["status"]);
        assert_eq!(unwrapped.generation(), 4);
        assert_eq!(unwrapped.resource_version(), "99");
        assert_eq!(unwrapped.uid(), "u-42");
        assert_eq!(unwrapped.0["metadata"]["finalizers"][0], APP_FINALIZER);
    }

    #[test]
    fn unwrap_overrides_payload_bookkeeping() {
        // payload describing a namespace object with its own uid; the
        // record-level values must win and managedFields must not appear
        let payload = json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {
                "labels": {
                    "key": "valxyz",
                    "kubernetes.io/metadata.name": "abc"
                },
                "name": "abc",
                "uid": "01b17d4e-18cf-441d-8ee6-1c484b4afbe2"
            },
            "spec": {"finalizers": ["kubernetes"]},
            "status": {"phase": "Active"}
        });
        let mut labels = BTreeMap::new();
        labels.insert(CONFIG_GROUP_LABEL.to_string(), "foo".to_string());
        labels.insert(CONFIG_VERSION_LABEL.to_string(), "v1alpha1".to_string());
        labels.insert(CONFIG_KIND_LABEL.to_string(), "Bar".to_string());
        labels.insert(CONFIG_NAME_LABEL.to_string(), "boo".to_string());
        labels.insert(CONFIG_NAMESPACE_LABEL.to_string(), "ns1".to_string());
        let record = ManifestRecord {
            key: "bars.abcd.ns1.boo".to_string(),
            labels,
            payload: serde_json::to_vec(&payload).expect("payload"),
            generation: 6,
            resource_version: "1860247".to_string(),
            uid: "13ff776c-1e91-4a84-b77d-6c35f3a52fed".to_string(),
            ..ManifestRecord::default()
        };

        let got = unwrap(&record).expect("unwraps");
        let want = json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": {
                "generation": 6,
                "labels": {
                    "key": "valxyz",
                    "kubernetes.io/metadata.name": "abc"
                },
                "name": "abc",
                "resourceVersion": "1860247",
                "uid": "13ff776c-1e91-4a84-b77d-6c35f3a52fed"
            },
            "spec": {"finalizers": ["kubernetes"]},
            "status": {"phase": "Active"}
        });
        assert_eq!(got.0, want);
    }

    #[test]
    fn corrupted_payload_is_internal() {
        let record = ManifestRecord {
            key: "foos.abcd.ns1.a".to_string(),
            payload: b"not json at all".to_vec(),
            ..ManifestRecord::default()
        };
        assert!(matches!(unwrap(&record).unwrap_err(), ApiError::Internal(_)));
    }

    #[test]
    fn trim_strips_record_authoritative_fields_only() {
        let mut object = Unstructured(json!({
            "metadata": {
                "name": "a",
                "uid": "keep-me",
                "creationTimestamp": "2024-01-01T00:00:00Z",
                "resourceVersion": "12",
                "managedFields": [{"manager": "kubectl"}]
            },
            "spec": {"size": 1}
        }));
        trim(&mut object);
        assert_eq!(object.uid(), "keep-me");
        assert_eq!(object.0["spec"]["size"], 1);
        let metadata = object.0["metadata"].as_object().expect("metadata");
        assert!(!metadata.contains_key("creationTimestamp"));
        assert!(!metadata.contains_key("resourceVersion"));
        assert!(!metadata.contains_key("managedFields"));
    }

    #[test]
    fn scale_kind_label_is_not_rewritten() {
        let descriptor =
            ResourceDescriptor::namespaced("apps.example.com", "v1", "Scale", "foos/scale");
        let object = Unstructured(json!({
            "metadata": {"name": "boo", "namespace": "ns1"},
        }));
        let mut labels = BTreeMap::new();
        labels.insert(CONFIG_KIND_LABEL.to_string(), "Foo".to_string());
        stamp_identity_labels(&mut labels, &descriptor, "abcd", &object);
        assert_eq!(labels.get(CONFIG_KIND_LABEL).map(String::as_str), Some("Foo"));
    }
}
