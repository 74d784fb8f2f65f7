//! Error types for OpenShadow
//!
//! The status vocabulary surfaced to callers of the virtual resource
//! surface. Errors are always scoped to the virtual resource identity;
//! nothing here ever names the physical manifest kind.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level failure inside an [`ApiError::Invalid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCause {
    /// Path of the offending field, e.g. `metadata.namespace`
    pub field: String,
    /// Human-readable description of the failure
    pub message: String,
}

/// Status error surfaced by the shadow storage layer
#[derive(Error, Debug)]
pub enum ApiError {
    /// No caller identity on the request
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Identity malformed or namespace not authorized
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Object absent, scoped to the virtual resource
    #[error("{group_resource} \"{name}\" not found")]
    NotFound {
        /// `<resource>.<group>` of the virtual kind
        group_resource: String,
        /// Object name as the caller knows it
        name: String,
    },

    /// Create collision, scoped to the virtual resource
    #[error("{group_resource} \"{name}\" already exists")]
    AlreadyExists {
        /// `<resource>.<group>` of the virtual kind
        group_resource: String,
        /// Object name as the caller knows it
        name: String,
    },

    /// Optimistic-concurrency failure on update
    #[error("operation cannot be fulfilled on {group_resource} \"{name}\": the object has been modified")]
    Conflict {
        /// `<resource>.<group>` of the virtual kind
        group_resource: String,
        /// Object name as the caller knows it
        name: String,
    },

    /// Object failed validation
    #[error("{kind} \"{name}\" is invalid")]
    Invalid {
        /// Kind of the rejected object
        kind: String,
        /// Name of the rejected object
        name: String,
        /// Field-level failures
        causes: Vec<StatusCause>,
    },

    /// Verb not applicable to this resource
    #[error("method not supported on {group_resource}: {message}")]
    MethodNotSupported {
        /// `<resource>.<group>` of the virtual kind
        group_resource: String,
        /// Why the verb is rejected
        message: String,
    },

    /// Request malformed before it reached storage
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Server-side failure: corrupted payload, unsupported selector key,
    /// marshal failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// NotFound scoped to a virtual resource
    pub fn not_found(group: &str, resource: &str, name: &str) -> Self {
        ApiError::NotFound {
            group_resource: group_resource(group, resource),
            name: name.to_string(),
        }
    }

    /// AlreadyExists scoped to a virtual resource
    pub fn already_exists(group: &str, resource: &str, name: &str) -> Self {
        ApiError::AlreadyExists {
            group_resource: group_resource(group, resource),
            name: name.to_string(),
        }
    }

    /// Conflict scoped to a virtual resource
    pub fn conflict(group: &str, resource: &str, name: &str) -> Self {
        ApiError::Conflict {
            group_resource: group_resource(group, resource),
            name: name.to_string(),
        }
    }

    /// Invalid with a single cause
    pub fn invalid(kind: &str, name: &str, field: &str, message: impl Into<String>) -> Self {
        ApiError::Invalid {
            kind: kind.to_string(),
            name: name.to_string(),
            causes: vec![StatusCause {
                field: field.to_string(),
                message: message.into(),
            }],
        }
    }

    /// MethodNotSupported scoped to a virtual resource
    pub fn method_not_supported(group: &str, resource: &str, message: impl Into<String>) -> Self {
        ApiError::MethodNotSupported {
            group_resource: group_resource(group, resource),
            message: message.into(),
        }
    }

    /// HTTP status code for this error
    pub fn code(&self) -> u16 {
        match self {
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::AlreadyExists { .. } => 409,
            ApiError::Conflict { .. } => 409,
            ApiError::Invalid { .. } => 422,
            ApiError::MethodNotSupported { .. } => 405,
            ApiError::BadRequest(_) => 400,
            ApiError::Internal(_) => 500,
        }
    }

    /// Machine-readable reason string
    pub fn reason(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound { .. } => "NotFound",
            ApiError::AlreadyExists { .. } => "AlreadyExists",
            ApiError::Conflict { .. } => "Conflict",
            ApiError::Invalid { .. } => "Invalid",
            ApiError::MethodNotSupported { .. } => "MethodNotAllowed",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::Internal(_) => "InternalError",
        }
    }

    /// Render the platform status document, used by watch error events
    pub fn to_status(&self) -> serde_json::Value {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "Status",
            "status": "Failure",
            "code": self.code(),
            "reason": self.reason(),
            "message": self.to_string(),
        })
    }

    /// True for 404s, used by bulk delete to swallow races
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

fn group_resource(group: &str, resource: &str) -> String {
    if group.is_empty() {
        resource.to_string()
    } else {
        format!("{}.{}", resource, group)
    }
}

/// Result type for the shadow storage surface
pub type ApiResult<T> = Result<T, ApiError>;
