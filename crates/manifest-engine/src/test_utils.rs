//! Test utilities for unit testing the reconciler
//!
//! This module provides fixture manifests and helpers for wiring a reconciler to
//! an in-memory cluster.

#[cfg(test)]
use crate::config::EngineConfig;
#[cfg(test)]
use crate::lifecycle::ClientManager;
#[cfg(test)]
use crate::reconciler::Reconciler;
#[cfg(test)]
use cluster_client::{
    gvk_from_api_version, ClusterClientTrait, MockClusterClient, MockOperation, ResourceScope,
    ResourceTarget, ResourceTypeMapping,
};
#[cfg(test)]
use std::sync::Arc;

/// A Namespace followed by a Deployment living in it
#[cfg(test)]
pub const NAMESPACE_AND_DEPLOYMENT: &str = r"
apiVersion: v1
kind: Namespace
metadata:
  name: demo
---
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  namespace: demo
  labels:
    app: web
spec:
  replicas: 2
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      containers:
      - name: web
        image: nginx:1.27
";

/// A single ClickHouseInstallation without a namespace
#[cfg(test)]
pub const CLICKHOUSE_INSTALLATION: &str = r"
apiVersion: clickhouse.altinity.com/v1
kind: ClickHouseInstallation
metadata:
  name: demo
spec:
  configuration:
    clusters:
    - name: cluster1
";

/// Type mapping for the ClickHouseInstallation CRD
#[cfg(test)]
pub fn clickhouse_installation_type() -> ResourceTypeMapping {
    ResourceTypeMapping::new(
        gvk_from_api_version("clickhouse.altinity.com/v1", "ClickHouseInstallation"),
        "clickhouseinstallations",
        ResourceScope::Namespaced,
    )
}

/// Connect a reconciler to `cluster`; the manager publishes generation 1
#[cfg(test)]
pub async fn create_test_reconciler(
    cluster: &MockClusterClient,
    config: EngineConfig,
) -> Reconciler<MockClusterClient> {
    let clients = ClientManager::connect(cluster.clone())
        .await
        .expect("mock cluster connects");
    Reconciler::new(Arc::new(clients), config)
}

/// Target for `kind` in `namespace` (cluster-scoped when `None`), resolved
/// against the discovery snapshot of `cluster`
#[cfg(test)]
pub fn target(
    cluster: &MockClusterClient,
    api_version: &str,
    kind: &str,
    namespace: Option<&str>,
) -> ResourceTarget {
    let mapping = cluster
        .resolve(&gvk_from_api_version(api_version, kind))
        .expect("kind is registered");
    ResourceTarget::new(mapping, namespace.map(str::to_string))
}

/// Operations recorded against `cluster`, in order, with connects left out
#[cfg(test)]
pub fn recorded_operations(cluster: &MockClusterClient) -> Vec<(MockOperation, String)> {
    cluster
        .calls()
        .into_iter()
        .filter(|call| call.operation != MockOperation::Connect)
        .map(|call| (call.operation, call.name.unwrap_or_default()))
        .collect()
}
