//! Tenant identity resolution
//!
//! Callers are pre-authenticated service accounts provisioned per tenant.
//! The username encodes the tenant's cluster id and its single authorized
//! namespace:
//!
//! `system:serviceaccount:shadow-system:biz-<random>-<cluster-id>-<random>-<namespace>`
//!
//! Both `<random>` tokens are the same fixed-length string, so the token
//! (with its joining hyphen) acts as a delimiter: its literal value is fixed
//! from the first occurrence right after the prefix and its last occurrence
//! bounds the cluster id. Cluster ids may themselves contain hyphens; the
//! namespace may not contain the delimiter again.

use shadow_common::{ApiError, ApiResult};

/// Service-account prefix shared by every tenant identity
pub const USERNAME_PREFIX: &str = "system:serviceaccount:shadow-system:biz-";

/// Length of the random token in provisioned usernames
pub const RANDOM_TOKEN_LENGTH: usize = 5;

/// Delimiter is the random token plus the joining hyphen
const DELIMITER_LENGTH: usize = RANDOM_TOKEN_LENGTH + 1;

/// Per-request caller information handed in by the host platform
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Authenticated username; `None` when the request carried no identity
    pub user: Option<String>,
    /// Target namespace of the request, if any
    pub namespace: Option<String>,
}

impl RequestContext {
    /// Context for the given user and namespace
    pub fn new(user: &str, namespace: &str) -> Self {
        Self {
            user: Some(user.to_string()),
            namespace: Some(namespace.to_string()),
        }
    }

    /// Target namespace, empty string when unset
    pub fn namespace_value(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}

/// Resolved tenant identity, immutable for the request's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    /// Tenant (calling cluster) id
    pub cluster_id: String,
    /// The one namespace this tenant may operate in
    pub authorized_namespace: String,
}

/// Extract (cluster id, authorized namespace) from a username, or `None`
/// when the identity is not a tenant service account or is ambiguous.
pub fn parse_identity(username: &str) -> Option<(String, String)> {
    let rest = username.strip_prefix(USERNAME_PREFIX)?;
    let delimiter = rest.get(..DELIMITER_LENGTH)?;

    let last = rest.rfind(delimiter)?;
    // delimiter found only once: no way to tell cluster id from namespace
    if last == 0 {
        return None;
    }
    // the hyphen joining cluster id and the second token must exist
    if last <= DELIMITER_LENGTH {
        return None;
    }

    let cluster_id = rest.get(DELIMITER_LENGTH..last - 1)?;
    let namespace = rest.get(last + DELIMITER_LENGTH..)?;
    Some((cluster_id.to_string(), namespace.to_string()))
}

/// Resolve the caller's tenant and verify the request targets the
/// authorized namespace.
///
/// Missing identity is Unauthorized; a malformed identity or a namespace
/// mismatch is Forbidden. Tenancy is derived from the identity alone, never
/// from the request body.
pub fn resolve_tenant(ctx: &RequestContext) -> ApiResult<TenantContext> {
    let username = ctx
        .user
        .as_deref()
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("no user info provided".to_string()))?;

    let (cluster_id, authorized_namespace) = parse_identity(username)
        .ok_or_else(|| ApiError::Forbidden("invalid shadow identity format".to_string()))?;

    let actual = ctx.namespace_value();
    if actual.is_empty() || actual != authorized_namespace {
        return Err(ApiError::Forbidden(format!(
            "can not operate resource in '{}'. allowed namespace: '{}'",
            actual, authorized_namespace
        )));
    }

    Ok(TenantContext {
        cluster_id,
        authorized_namespace,
    })
}
