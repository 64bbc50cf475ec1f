//! Manifest reconciliation
//!
//! Applies or deletes every object of a manifest, in document order, through the
//! current client handle. The first failing document stops the batch; documents
//! handled before it stay applied (or deleted).

use crate::config::{ApplyStrategy, EngineConfig};
use crate::error::EngineError;
use crate::filter::ResourceFilter;
use crate::lifecycle::{ClientManager, HandleFactory};
use crate::manifest::split_documents;
use crate::namespace::{resolve_namespace, Intent, Placement};
use crate::object::{decode_named_object, GenericResourceObject};
use crate::poll::poll_until;
use cluster_client::{ClusterClientTrait, ResourceTarget};
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Outcome of a successful batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Objects written or deleted (a delete of a missing object counts)
    pub processed: usize,
    /// Cluster-scoped objects left alone by a namespaced delete
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Apply(ApplyStrategy),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SingleWrite {
    Create,
    Update,
}

/// Reconciliation engine
pub struct Reconciler<F: HandleFactory> {
    clients: Arc<ClientManager<F>>,
    config: EngineConfig,
}

impl<F: HandleFactory> std::fmt::Debug for Reconciler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<F: HandleFactory> Reconciler<F> {
    pub fn new(clients: Arc<ClientManager<F>>, config: EngineConfig) -> Self {
        Self { clients, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clients(&self) -> &Arc<ClientManager<F>> {
        &self.clients
    }

    /// Apply every object in `manifest` with the configured strategy
    pub async fn apply_all(&self, manifest: &str, namespace: Option<&str>) -> Result<BatchReport, EngineError> {
        self.run_batch(manifest, namespace, Mutation::Apply(self.config.apply_strategy), None)
            .await
    }

    /// Apply the objects `filter` selects from `manifest`.
    ///
    /// The filter sees every decoded object before anything is written; if it
    /// rejects the batch, nothing is written.
    pub async fn apply_selective(
        &self,
        manifest: &str,
        namespace: Option<&str>,
        filter: &dyn ResourceFilter,
    ) -> Result<BatchReport, EngineError> {
        self.run_batch(manifest, namespace, Mutation::Apply(self.config.apply_strategy), Some(filter))
            .await
    }

    /// Apply with an explicit strategy instead of the configured one
    pub async fn apply_with_strategy(
        &self,
        manifest: &str,
        namespace: Option<&str>,
        strategy: ApplyStrategy,
        filter: Option<&dyn ResourceFilter>,
    ) -> Result<BatchReport, EngineError> {
        self.run_batch(manifest, namespace, Mutation::Apply(strategy), filter)
            .await
    }

    /// Delete every object in `manifest`.
    ///
    /// Objects that are already gone count as deleted. With a namespace given,
    /// cluster-scoped objects are skipped.
    pub async fn delete_all(&self, manifest: &str, namespace: Option<&str>) -> Result<BatchReport, EngineError> {
        self.run_batch(manifest, namespace, Mutation::Delete, None).await
    }

    /// Create one decoded object; fails if it already exists.
    ///
    /// The object may leave `metadata.name` empty and set `generateName`.
    pub async fn create_one(
        &self,
        object: &GenericResourceObject,
        namespace: Option<&str>,
    ) -> Result<GenericResourceObject, EngineError> {
        self.with_stale_kind_retry(move || self.write_one(object, namespace, SingleWrite::Create))
            .await
    }

    /// Replace one decoded object; the object's resourceVersion, when set, must
    /// match the live one
    pub async fn update_one(
        &self,
        object: &GenericResourceObject,
        namespace: Option<&str>,
    ) -> Result<GenericResourceObject, EngineError> {
        self.with_stale_kind_retry(move || self.write_one(object, namespace, SingleWrite::Update))
            .await
    }

    /// Rebuild the client handle from scratch
    pub async fn reinit(&self) -> Result<(), EngineError> {
        self.clients.reinit().await.map(|_| ())
    }

    /// List objects of one kind.
    ///
    /// `namespace` is ignored for cluster-scoped kinds; for namespaced kinds no
    /// namespace means all namespaces.
    pub async fn list_objects(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<GenericResourceObject>, EngineError> {
        self.with_stale_kind_retry(move || self.list_once(gvk, namespace, label_selector))
            .await
    }

    /// Poll [`Self::list_objects`] until it returns something or `timeout` passes
    pub async fn wait_for_objects(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        label_selector: Option<&str>,
        timeout: Duration,
    ) -> Result<Vec<GenericResourceObject>, EngineError> {
        let waiting_for = match namespace {
            Some(ns) => format!("{} in namespace {}", gvk.kind, ns),
            None => gvk.kind.clone(),
        };
        poll_until(timeout, self.config.poll_interval, waiting_for, move || async move {
            let objects = self.list_objects(gvk, namespace, label_selector).await?;
            Ok((!objects.is_empty()).then_some(objects))
        })
        .await
    }

    async fn run_batch(
        &self,
        manifest: &str,
        namespace: Option<&str>,
        mutation: Mutation,
        filter: Option<&dyn ResourceFilter>,
    ) -> Result<BatchReport, EngineError> {
        let candidates = split_documents(manifest)?
            .iter()
            .map(decode_named_object)
            .collect::<Result<Vec<_>, _>>()?;
        let candidates = match filter {
            Some(filter) => filter.select(candidates)?,
            None => candidates,
        };
        let intent = match mutation {
            Mutation::Apply(_) => Intent::Apply,
            Mutation::Delete => Intent::Delete,
        };

        let handle = self.clients.acquire().await?;
        let mut report = BatchReport::default();
        for object in &candidates {
            let mapping = handle.resolve(&object.gvk())?;
            let placement = resolve_namespace(mapping.scope, object, namespace, intent)?;
            if placement == Placement::Skip {
                debug!(kind = %object.kind, name = object.name(), "Skipping cluster-scoped object");
                report.skipped += 1;
                continue;
            }
            let target = ResourceTarget::new(mapping, placement.namespace().map(str::to_string));
            match mutation {
                Mutation::Apply(strategy) => {
                    self.write(handle.client(), &target, object, strategy).await?;
                }
                Mutation::Delete => delete(handle.client(), &target, object).await?,
            }
            report.processed += 1;
        }
        Ok(report)
    }

    async fn write(
        &self,
        client: &F::Handle,
        target: &ResourceTarget,
        object: &GenericResourceObject,
        strategy: ApplyStrategy,
    ) -> Result<DynamicObject, EngineError> {
        debug!(
            kind = %object.kind,
            name = object.name(),
            namespace = ?target.namespace,
            ?strategy,
            "Writing object"
        );
        let mut desired = object.to_dynamic(target.namespace.as_deref());
        let field_manager = self.config.field_manager.as_str();
        let written = match strategy {
            ApplyStrategy::ServerSide => {
                client
                    .apply(target, &desired, field_manager, self.config.force_conflicts)
                    .await?
            }
            ApplyStrategy::CreateOrUpdate => match client.get(target, object.name()).await {
                Ok(current) => {
                    desired.metadata.resource_version = current.metadata.resource_version;
                    client.update(target, &desired, field_manager).await?
                }
                Err(err) if err.is_not_found() => client.create(target, &desired, field_manager).await?,
                Err(err) => return Err(err.into()),
            },
        };
        Ok(written)
    }

    async fn write_one(
        &self,
        object: &GenericResourceObject,
        namespace: Option<&str>,
        op: SingleWrite,
    ) -> Result<GenericResourceObject, EngineError> {
        let handle = self.clients.acquire().await?;
        let gvk = object.gvk();
        let mapping = handle.resolve(&gvk)?;
        let placement = resolve_namespace(mapping.scope, object, namespace, Intent::Apply)?;
        let target = ResourceTarget::new(mapping, placement.namespace().map(str::to_string));
        let desired = object.to_dynamic(target.namespace.as_deref());
        let field_manager = self.config.field_manager.as_str();

        debug!(kind = %object.kind, name = object.name(), namespace = ?target.namespace, ?op, "Writing single object");
        let written = match op {
            SingleWrite::Create => handle.create(&target, &desired, field_manager).await?,
            SingleWrite::Update => handle.update(&target, &desired, field_manager).await?,
        };
        Ok(GenericResourceObject::from_dynamic(written, &gvk))
    }

    async fn list_once(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        label_selector: Option<&str>,
    ) -> Result<Vec<GenericResourceObject>, EngineError> {
        let handle = self.clients.acquire().await?;
        let mapping = handle.resolve(gvk)?;
        let namespace = namespace
            .filter(|ns| !ns.is_empty() && mapping.is_namespaced())
            .map(str::to_string);
        let items = handle
            .list(&ResourceTarget::new(mapping, namespace), label_selector)
            .await?;
        Ok(items
            .into_iter()
            .map(|item| GenericResourceObject::from_dynamic(item, gvk))
            .collect())
    }

    /// Run `attempt`; if it fails because its kind is unknown to the current
    /// discovery snapshot and the stale-kind policy allows it, rebuild the handle
    /// and run it once more. The second outcome is final.
    ///
    /// Each attempt takes and releases its own read guard, so no guard is held
    /// while rebuilding.
    async fn with_stale_kind_retry<T, A, Fut>(&self, attempt: A) -> Result<T, EngineError>
    where
        A: Fn() -> Fut,
        Fut: Future<Output = Result<T, EngineError>>,
    {
        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        let Some((group, kind)) = err
            .unknown_type()
            .map(|(group, kind)| (group.to_string(), kind.to_string()))
        else {
            return Err(err);
        };
        if !self.config.stale_kinds.should_reinit(&group, &kind) {
            return Err(err);
        }
        debug!(group = %group, kind = %kind, "Kind unknown to current client, rebuilding and retrying once");
        self.clients.reinit().await?;
        attempt().await
    }
}

async fn delete<C: ClusterClientTrait + ?Sized>(
    client: &C,
    target: &ResourceTarget,
    object: &GenericResourceObject,
) -> Result<(), EngineError> {
    debug!(kind = %object.kind, name = object.name(), namespace = ?target.namespace, "Deleting object");
    match client.delete(target, object.name()).await {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => {
            debug!(kind = %object.kind, name = object.name(), "Already deleted");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
