//! Manifest records
//!
//! One record wraps one caller object as opaque payload bytes plus the
//! identity label set. The record key uniquely encodes
//! (resource, tenant, namespace, name); the label set must always agree
//! with the identity fields embedded in the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Generic wrapper record persisted in the shared reserved location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    /// Composite physical key, `<plural>.<tenant>[.<namespace>].<name>`
    pub key: String,
    /// Identity label set plus any labels carried over from the payload
    pub labels: BTreeMap<String, String>,
    /// Caller object as opaque JSON bytes
    #[serde(with = "serde_bytes_as_json")]
    pub payload: Vec<u8>,
    /// Record generation, bumped by the store on spec changes
    pub generation: i64,
    /// Store-assigned optimistic concurrency token
    pub resource_version: String,
    /// Store-assigned unique id
    pub uid: String,
    /// When the record was created
    pub creation_timestamp: Option<DateTime<Utc>>,
    /// Set once deletion has been requested
    pub deletion_timestamp: Option<DateTime<Utc>>,
    /// Grace period for the pending deletion
    pub deletion_grace_period_seconds: Option<i64>,
    /// Finalizers still blocking removal
    pub finalizers: Vec<String>,
}

impl ManifestRecord {
    /// New record holding the given payload under the given key
    pub fn new(key: impl Into<String>, labels: BTreeMap<String, String>, payload: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            labels,
            payload,
            ..Self::default()
        }
    }
}

// Payloads are JSON documents; keep them readable when a record itself is
// serialized instead of base64ing the bytes.
mod serde_bytes_as_json {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(payload: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        if payload.is_empty() {
            return serde_json::Value::Null.serialize(serializer);
        }
        let value: serde_json::Value =
            serde_json::from_slice(payload).map_err(serde::ser::Error::custom)?;
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        serde_json::to_vec(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips_through_json() {
        let mut labels = BTreeMap::new();
        labels.insert("openshadow.io/config.kind".to_string(), "Foo".to_string());
        let record = ManifestRecord {
            key: "foos.abcd.ns1.a".to_string(),
            labels,
            payload: br#"{"kind":"Foo","metadata":{"name":"a"}}"#.to_vec(),
            generation: 2,
            resource_version: "17".to_string(),
            uid: "u-1".to_string(),
            ..ManifestRecord::default()
        };

        let encoded = serde_json::to_string(&record).expect("encode");
        let decoded: ManifestRecord = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(decoded.key, record.key);
        assert_eq!(decoded.generation, 2);
        let payload: serde_json::Value = serde_json::from_slice(&decoded.payload).expect("payload");
        assert_eq!(payload["kind"], "Foo");
    }
}
