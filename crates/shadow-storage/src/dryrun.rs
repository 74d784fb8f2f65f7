//! Dry-run create client
//!
//! Before anything is persisted, Create runs the object through a real
//! resource handler with `dryRun=All`, addressed by the resource's own
//! group/version/plural. That lets the handler default and validate the
//! object without writing it; the possibly-mutated result is what gets
//! wrapped and stored.

use shadow_common::{ApiError, ApiResult, CreateOptions, ResourceDescriptor, Unstructured};

/// Path prefix for the core group
const CORE_GROUP_PREFIX: &str = "api";
/// Path prefix for named groups
const NAMED_GROUP_PREFIX: &str = "apis";

/// Validate-and-default pass against an external endpoint
#[async_trait::async_trait]
pub trait DryRunClient: Send + Sync {
    /// Dry-run create `object`; returns the defaulted object on success
    async fn create(
        &self,
        descriptor: &ResourceDescriptor,
        namespace: Option<&str>,
        object: &Unstructured,
        options: &CreateOptions,
    ) -> ApiResult<Unstructured>;
}

/// HTTP implementation talking to the validating endpoint
pub struct HttpDryRunClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpDryRunClient {
    /// Client for the endpoint at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// `<prefix>/<group>/<version>[/namespaces/<ns>]/<plural>`
    fn url_for(&self, descriptor: &ResourceDescriptor, namespace: Option<&str>) -> String {
        let mut url = if descriptor.group.is_empty() {
            format!("{}/{}/{}", self.base_url, CORE_GROUP_PREFIX, descriptor.version)
        } else {
            format!(
                "{}/{}/{}/{}",
                self.base_url, NAMED_GROUP_PREFIX, descriptor.group, descriptor.version
            )
        };
        if let Some(ns) = namespace {
            url.push_str("/namespaces/");
            url.push_str(ns);
        }
        url.push('/');
        url.push_str(descriptor.base_resource());
        url
    }
}

#[async_trait::async_trait]
impl DryRunClient for HttpDryRunClient {
    async fn create(
        &self,
        descriptor: &ResourceDescriptor,
        namespace: Option<&str>,
        object: &Unstructured,
        options: &CreateOptions,
    ) -> ApiResult<Unstructured> {
        let url = self.url_for(descriptor, namespace);
        tracing::debug!(%url, kind = %descriptor.kind, "dry-run create");

        let mut query: Vec<(&str, String)> = vec![("dryRun", "All".to_string())];
        if let Some(manager) = &options.field_manager {
            query.push(("fieldManager", manager.clone()));
        }

        let response = self
            .client
            .post(&url)
            .query(&query)
            .json(&object.0)
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("dry-run request failed: {e}")))?;

        let status = response.status();
        if status.is_success() {
            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| ApiError::Internal(format!("dry-run response unreadable: {e}")))?;
            return Ok(Unstructured(body));
        }

        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        tracing::debug!(code = status.as_u16(), "dry-run rejected object");
        Err(map_rejection(
            status.as_u16(),
            &message,
            descriptor,
            &object.name(),
        ))
    }
}

/// Map a rejection from the validating endpoint onto the status vocabulary,
/// scoped to the virtual resource.
fn map_rejection(code: u16, message: &str, descriptor: &ResourceDescriptor, name: &str) -> ApiError {
    match code {
        400 => ApiError::BadRequest(message.to_string()),
        403 => ApiError::Forbidden(message.to_string()),
        404 => ApiError::not_found(&descriptor.group, descriptor.base_resource(), name),
        409 => ApiError::already_exists(&descriptor.group, descriptor.base_resource(), name),
        422 => ApiError::invalid(&descriptor.kind, name, "", message),
        _ => ApiError::Internal(format!("dry-run create failed with {code}: {message}")),
    }
}
