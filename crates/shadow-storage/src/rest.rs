//! Per-resource storage adapter
//!
//! Implements the full operation contract for one virtual resource kind:
//! Create (dry-run first), Get, Update, Delete, DeleteCollection, List,
//! Watch and table conversion. One adapter instance serves one descriptor;
//! every request runs independently, atomicity comes from the store's
//! per-key linearizable writes with optimistic concurrency.

use crate::codec;
use crate::dryrun::DryRunClient;
use crate::identity::{resolve_tenant, RequestContext, TenantContext};
use crate::key;
use crate::query;
use crate::relay::{WatchEvent, WatchRelay, DEFAULT_WATCH_BUFFER};
use serde::{Deserialize, Serialize};
use shadow_common::labels::{APP_NAME, OBJECT_CREATED_BY_LABEL, RESERVED_NAMESPACE};
use shadow_common::unstructured::ListMeta;
use shadow_common::validation::validate_namespace_name;
use shadow_common::{
    ApiError, ApiResult, CreateOptions, DeleteOptions, ListOptions, ResourceDescriptor,
    Unstructured, UnstructuredList, UpdateOptions,
};
use shadow_manifest::{ManifestCache, ManifestQuery, ManifestStore, StoreError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Default number of workers for a single DeleteCollection call
pub const DEFAULT_DELETE_COLLECTION_WORKERS: usize = 2;

/// The kind whose objects are namespaces themselves; they dry-run at root
/// scope and are never re-homed
const NAMESPACE_KIND: &str = "Namespace";

/// Adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    /// Reserved namespace used as the dry-run target for namespaced objects
    pub reserved_namespace: String,
    /// Maximum workers per DeleteCollection call; deletes for the items in
    /// a collection are issued in parallel
    pub delete_collection_workers: usize,
    /// Downstream buffer size for watch streams
    pub watch_buffer: usize,
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            reserved_namespace: RESERVED_NAMESPACE.to_string(),
            delete_collection_workers: DEFAULT_DELETE_COLLECTION_WORKERS,
            watch_buffer: DEFAULT_WATCH_BUFFER,
        }
    }
}

/// Storage adapter for one virtual resource kind
#[derive(Clone)]
pub struct ShadowRest {
    descriptor: ResourceDescriptor,
    store: Arc<dyn ManifestStore>,
    cache: Arc<dyn ManifestCache>,
    dry_run: Arc<dyn DryRunClient>,
    config: RestConfig,
}

impl ShadowRest {
    /// Adapter for `descriptor` against the given collaborators
    pub fn new(
        descriptor: ResourceDescriptor,
        store: Arc<dyn ManifestStore>,
        cache: Arc<dyn ManifestCache>,
        dry_run: Arc<dyn DryRunClient>,
        config: RestConfig,
    ) -> Self {
        Self {
            descriptor,
            store,
            cache,
            dry_run,
            config,
        }
    }

    /// The descriptor this adapter serves
    pub fn descriptor(&self) -> &ResourceDescriptor {
        &self.descriptor
    }

    /// Namespace clause for query translation: the request namespace for
    /// namespaced kinds, empty for cluster scope to match the empty label
    /// stamped on cluster-scoped records
    fn query_namespace<'a>(&self, ctx: &'a RequestContext) -> &'a str {
        if self.descriptor.namespaced {
            ctx.namespace_value()
        } else {
            ""
        }
    }

    fn record_key(&self, tenant: &TenantContext, namespace: &str, name: &str) -> String {
        key::manifest_key(
            self.descriptor.base_resource(),
            &tenant.cluster_id,
            self.descriptor.namespaced.then_some(namespace),
            name,
        )
    }

    /// Re-scope a store error to the virtual resource; the physical backing
    /// identity must never leak to callers.
    fn rescope(&self, err: StoreError, name: &str) -> ApiError {
        let group = &self.descriptor.group;
        let resource = self.descriptor.base_resource();
        match err {
            StoreError::NotFound(_) => ApiError::not_found(group, resource, name),
            StoreError::AlreadyExists(_) => ApiError::already_exists(group, resource, name),
            StoreError::Conflict(_) => ApiError::conflict(group, resource, name),
            StoreError::Unavailable(msg) | StoreError::Internal(msg) => ApiError::Internal(msg),
        }
    }

    /// Map a failed store query to a client error. The store's own message
    /// names physical keys, so it goes to the log only; the caller sees a
    /// message scoped to the virtual resource.
    fn query_failed(&self, err: StoreError) -> ApiError {
        tracing::error!(resource = %self.descriptor.plural, %err, "store query failed");
        ApiError::Internal(format!("failed to query {}", self.descriptor.base_resource()))
    }

    /// Retrieve one object. An empty `resource_version` is served from the
    /// read-through cache (which may lag); anything else goes to the store.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        name: &str,
        resource_version: &str,
    ) -> ApiResult<Unstructured> {
        let tenant = resolve_tenant(ctx)?;
        let key = self.record_key(&tenant, ctx.namespace_value(), name);

        let record = if resource_version.is_empty() {
            self.cache.get(&key)
        } else {
            self.store.get(&key, resource_version).await
        }
        .map_err(|e| self.rescope(e, name))?;

        codec::unwrap(&record)
    }

    /// Insert a new object under its deterministic key.
    ///
    /// The object is first dry-run created against the external validating
    /// endpoint so a real handler can default and validate it without
    /// persisting; only the (possibly mutated) result is wrapped and stored.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        object: Unstructured,
        options: &CreateOptions,
    ) -> ApiResult<Unstructured> {
        let tenant = resolve_tenant(ctx)?;
        let actual = self.dry_run_create(ctx, object, options).await?;

        let record = codec::wrap(&self.descriptor, &tenant.cluster_id, &actual)?;
        let created = self
            .store
            .create(record)
            .await
            .map_err(|e| self.rescope(e, &actual.name()))?;
        codec::unwrap(&created)
    }

    async fn dry_run_create(
        &self,
        ctx: &RequestContext,
        mut object: Unstructured,
        options: &CreateOptions,
    ) -> ApiResult<Unstructured> {
        let target_namespace = ctx.namespace_value().to_string();
        let is_namespace_kind = self.descriptor.kind == NAMESPACE_KIND;

        if self.descriptor.namespaced || is_namespace_kind {
            let errs = validate_namespace_name(&target_namespace);
            if !errs.is_empty() {
                let field = if is_namespace_kind {
                    "metadata.name"
                } else {
                    "metadata.namespace"
                };
                return Err(ApiError::invalid(
                    &self.descriptor.kind,
                    &object.name(),
                    field,
                    errs.join(","),
                ));
            }
        }

        object.set_label(OBJECT_CREATED_BY_LABEL, APP_NAME);

        // namespaced objects dry-run inside the reserved namespace so the
        // handler never fails on a namespace the host does not know about;
        // namespace objects themselves dry-run at root scope
        let dry_run_namespace = if !is_namespace_kind && self.descriptor.namespaced {
            object.set_namespace(&self.config.reserved_namespace);
            Some(self.config.reserved_namespace.as_str())
        } else {
            None
        };

        let mut result = self
            .dry_run
            .create(&self.descriptor, dry_run_namespace, &object, options)
            .await?;

        if !is_namespace_kind && self.descriptor.namespaced {
            // set the original namespace back
            result.set_namespace(&target_namespace);
        }
        codec::trim(&mut result);
        Ok(result)
    }

    /// Apply a caller-supplied transform to the current object and persist
    /// the result with optimistic concurrency.
    ///
    /// The returned bool is always false: shadow objects are manifest
    /// templates, there is no create-on-update fallback, and sub-resource
    /// updates are rejected outright.
    pub async fn update<F>(
        &self,
        ctx: &RequestContext,
        name: &str,
        transform: F,
        _options: &UpdateOptions,
    ) -> ApiResult<(Unstructured, bool)>
    where
        F: FnOnce(Unstructured) -> ApiResult<Unstructured>,
    {
        if let Some(subresource) = self.descriptor.subresource() {
            return Err(ApiError::method_not_supported(
                &self.descriptor.group,
                self.descriptor.base_resource(),
                format!(
                    "{} are considered as manifests, which make no sense to update manifests' {}",
                    self.descriptor.base_resource(),
                    subresource
                ),
            ));
        }

        let tenant = resolve_tenant(ctx)?;
        let key = self.record_key(&tenant, ctx.namespace_value(), name);
        let record = self.cache.get(&key).map_err(|e| self.rescope(e, name))?;

        let current = codec::unwrap(&record)?;
        let mut result = transform(current)?;
        codec::trim(&mut result);

        // in case labels got changed
        let mut updated = record;
        for (k, v) in result.labels() {
            updated.labels.insert(k, v);
        }
        codec::stamp_identity_labels(
            &mut updated.labels,
            &self.descriptor,
            &tenant.cluster_id,
            &result,
        );
        updated.payload = result
            .to_bytes()
            .map_err(|e| ApiError::Internal(format!("failed to marshal object: {e}")))?;

        let saved = self
            .store
            .update(updated)
            .await
            .map_err(|e| self.rescope(e, name))?;
        Ok((codec::unwrap(&saved)?, false))
    }

    /// Remove one object by key.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        name: &str,
        _options: &DeleteOptions,
    ) -> ApiResult<()> {
        let tenant = resolve_tenant(ctx)?;
        let key = self.record_key(&tenant, ctx.namespace_value(), name);
        self.store
            .delete(&key)
            .await
            .map_err(|e| self.rescope(e, name))
    }

    /// Remove every object matched by `list_options`.
    ///
    /// Not atomic: deletes are issued in parallel by a bounded worker pool
    /// and a failure can leave the collection partially deleted. NotFound on
    /// individual items is swallowed; the first other error stops new work
    /// from being scheduled and is surfaced once dispatched work drains.
    /// On success the pre-deletion snapshot is returned, which may be stale
    /// against concurrent writers.
    pub async fn delete_collection(
        &self,
        ctx: &RequestContext,
        options: &DeleteOptions,
        list_options: &ListOptions,
    ) -> ApiResult<UnstructuredList> {
        let snapshot = self.list(ctx, list_options).await?;
        if snapshot.items.is_empty() {
            return Ok(snapshot);
        }

        let names: Arc<Vec<String>> =
            Arc::new(snapshot.items.iter().map(Unstructured::name).collect());
        let workers = self
            .config
            .delete_collection_workers
            .min(names.len())
            .max(1);

        let (index_tx, index_rx) = mpsc::channel::<usize>(2 * workers);
        let index_rx = Arc::new(Mutex::new(index_rx));
        let (error_tx, mut error_rx) = mpsc::channel::<ApiError>(workers + 1);
        let stop = Arc::new(AtomicBool::new(false));

        let distributor = {
            let stop = stop.clone();
            let total = names.len();
            tokio::spawn(async move {
                for index in 0..total {
                    if stop.load(Ordering::SeqCst) {
                        break;
                    }
                    // all workers gone means nobody will consume this index
                    if index_tx.send(index).await.is_err() {
                        break;
                    }
                }
            })
        };

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let adapter = self.clone();
            let ctx = ctx.clone();
            let names = names.clone();
            let index_rx = index_rx.clone();
            let error_tx = error_tx.clone();
            let stop = stop.clone();
            let options = options.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    let index = { index_rx.lock().await.recv().await };
                    let Some(index) = index else { return };

                    // per-item copy: graceful deletion may mutate options
                    let item_options = options.clone();
                    match adapter.delete(&ctx, &names[index], &item_options).await {
                        Ok(()) => {}
                        Err(err) if err.is_not_found() => {}
                        Err(err) => {
                            tracing::warn!(
                                name = %names[index],
                                %err,
                                "delete during DeleteCollection failed"
                            );
                            stop.store(true, Ordering::SeqCst);
                            let _ = error_tx.try_send(err);
                            return;
                        }
                    }
                }
            }));
        }
        drop(error_tx);
        // workers hold the only receiver handles now; once they exit the
        // distributor's send fails instead of blocking on a full queue
        drop(index_rx);

        // drain dispatched work, then report the first failure if any
        for handle in handles {
            let _ = handle.await;
        }
        let _ = distributor.await;

        match error_rx.try_recv() {
            Ok(err) => Err(err),
            Err(_) => Ok(snapshot),
        }
    }

    /// List objects matching the caller's options, synthesized under the
    /// virtual resource's identity. resourceVersion and continue pass
    /// through from the physical snapshot unmodified.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        options: &ListOptions,
    ) -> ApiResult<UnstructuredList> {
        let tenant = resolve_tenant(ctx)?;
        let selector =
            query::translate(&self.descriptor, &tenant, self.query_namespace(ctx), options)?;

        let page = self
            .store
            .list(self.manifest_query(selector, options))
            .await
            .map_err(|e| self.query_failed(e))?;

        let mut items = Vec::with_capacity(page.items.len());
        for record in &page.items {
            items.push(codec::unwrap(record)?);
        }

        Ok(UnstructuredList {
            api_version: self.descriptor.api_version(),
            kind: self.descriptor.list_kind(),
            metadata: ListMeta {
                resource_version: page.resource_version,
                continue_token: page.continue_token,
            },
            items,
        })
    }

    /// Open a watch matching the caller's options and relay it.
    pub async fn watch(
        &self,
        ctx: &RequestContext,
        options: &ListOptions,
    ) -> ApiResult<mpsc::Receiver<WatchEvent>> {
        let tenant = resolve_tenant(ctx)?;
        let selector =
            query::translate(&self.descriptor, &tenant, self.query_namespace(ctx), options)?;

        let upstream = self
            .store
            .watch(self.manifest_query(selector, options))
            .await
            .map_err(|e| self.query_failed(e))?;
        Ok(WatchRelay::spawn(upstream, self.config.watch_buffer))
    }

    fn manifest_query(&self, selector: shadow_common::Selector, options: &ListOptions) -> ManifestQuery {
        ManifestQuery {
            selector,
            resource_version: options.resource_version.clone(),
            resource_version_match: options.resource_version_match.clone(),
            limit: options.limit,
            continue_token: options.continue_token.clone(),
            timeout_seconds: options.timeout_seconds,
            allow_watch_bookmarks: options.allow_watch_bookmarks,
        }
    }

    /// Default two-column table rendering of a list
    pub fn convert_to_table(&self, list: &UnstructuredList) -> Table {
        let rows = list
            .items
            .iter()
            .map(|object| TableRow {
                cells: vec![
                    serde_json::Value::String(object.name()),
                    object.0["metadata"]["creationTimestamp"].clone(),
                ],
                object: object.clone(),
            })
            .collect();

        Table {
            column_definitions: vec![
                TableColumn {
                    name: "Name".to_string(),
                    kind: "string".to_string(),
                    format: "name".to_string(),
                    description: "Name of the resource".to_string(),
                },
                TableColumn {
                    name: "Created At".to_string(),
                    kind: "date".to_string(),
                    format: String::new(),
                    description: "Creation timestamp".to_string(),
                },
            ],
            rows,
        }
    }
}

/// Tabular rendering of a list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    /// Column headers
    #[serde(rename = "columnDefinitions")]
    pub column_definitions: Vec<TableColumn>,
    /// One row per object
    pub rows: Vec<TableRow>,
}

/// One table column header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Header text
    pub name: String,
    /// Cell value type
    #[serde(rename = "type")]
    pub kind: String,
    /// Display hint
    pub format: String,
    /// Header tooltip
    pub description: String,
}

/// One table row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableRow {
    /// Cell values, one per column
    pub cells: Vec<serde_json::Value>,
    /// The full object backing this row
    pub object: Unstructured,
}
