//! Main controller implementation.
//!
//! This module contains the `Controller` struct that renders the configured
//! manifest bundle and hands it to the manifest engine.

use crate::config::{ControllerConfig, ManifestAction};
use crate::error::ControllerError;
use crate::template;
use cluster_client::gvk_from_api_version;
use manifest_engine::{BatchReport, ClientManager, HandleFactory, KubeHandleFactory, Reconciler};
use std::sync::Arc;
use tracing::info;

/// One-shot controller for a manifest bundle.
pub struct Controller<F: HandleFactory> {
    reconciler: Reconciler<F>,
    config: ControllerConfig,
}

impl Controller<KubeHandleFactory> {
    /// Connects to the cluster and publishes the first client handle.
    pub async fn connect(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Manifest Controller");

        let kube_config: kube::Config = cluster_client::load_config(config.kubeconfig.as_deref()).await?;
        info!("Connecting to {}", kube_config.cluster_url);
        let clients = ClientManager::connect(KubeHandleFactory::new(kube_config)).await?;
        let reconciler = Reconciler::new(Arc::new(clients), config.engine.clone());

        Ok(Self::with_reconciler(reconciler, config))
    }
}

impl<F: HandleFactory> Controller<F> {
    pub fn with_reconciler(reconciler: Reconciler<F>, config: ControllerConfig) -> Self {
        Self { reconciler, config }
    }

    /// Reads the manifest from disk and reconciles it.
    pub async fn run(&self) -> Result<BatchReport, ControllerError> {
        let path = &self.config.manifest_path;
        let manifest = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ControllerError::Io {
                path: path.clone(),
                source,
            })?;
        info!("Loaded manifest from {}", path.display());
        self.reconcile(&manifest).await
    }

    /// Renders `manifest`, applies or deletes it, then waits for workloads if
    /// configured.
    pub async fn reconcile(&self, manifest: &str) -> Result<BatchReport, ControllerError> {
        let rendered = template::render(manifest, &self.config.vars);
        let namespace = self.config.namespace.as_deref();

        let report = match self.config.action {
            ManifestAction::Apply => self.reconciler.apply_all(&rendered, namespace).await?,
            ManifestAction::Delete => self.reconciler.delete_all(&rendered, namespace).await?,
        };
        info!(
            "{:?} finished: {} objects processed, {} skipped",
            self.config.action, report.processed, report.skipped
        );

        if let (ManifestAction::Apply, Some(wait)) = (self.config.action, &self.config.wait) {
            info!("Waiting up to {:?} for deployments matching {}", wait.timeout, wait.label_selector);
            let deployments = self
                .reconciler
                .wait_for_objects(
                    &gvk_from_api_version("apps/v1", "Deployment"),
                    namespace,
                    Some(&wait.label_selector),
                    wait.timeout,
                )
                .await?;
            for deployment in &deployments {
                info!("Deployment {} is present", deployment.name());
            }
        }

        Ok(report)
    }
}
