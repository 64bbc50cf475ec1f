//! Kubernetes cluster client
//!
//! Implements `ClusterClientTrait` on top of kube-rs. One `KubeClusterClient` is the
//! aggregate the engine treats as a single client handle: the connection config,
//! the `kube::Client` (typed and dynamic access share it) and a type-mapping cache
//! built from one discovery pass.

use crate::error::ClusterError;
use crate::models::{ResourceTarget, ResourceTypeMapping};
use crate::cluster_trait::ClusterClientTrait;
use kube::api::{Api, DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::GroupVersionKind;
use kube::{Client, Config, Discovery};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Default connection timeout for the API server
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Default read timeout for API calls
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Load connection settings.
///
/// With an explicit kubeconfig path that file is used. Otherwise the
/// configuration is inferred: in-cluster service account first, then the
/// user's default kubeconfig.
pub async fn load_config(kubeconfig: Option<&Path>) -> Result<Config, ClusterError> {
    let mut config = match kubeconfig {
        Some(path) => {
            debug!("Loading kubeconfig from {}", path.display());
            let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                ClusterError::Config(format!("failed to read kubeconfig {}: {}", path.display(), e))
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|e| ClusterError::Config(format!("failed to load kubeconfig: {}", e)))?
        }
        None => Config::infer()
            .await
            .map_err(|e| ClusterError::Config(format!("failed to infer config: {}", e)))?,
    };
    config.connect_timeout = Some(DEFAULT_CONNECT_TIMEOUT);
    config.read_timeout = Some(DEFAULT_READ_TIMEOUT);
    Ok(config)
}

/// Cached discovery snapshot: GVK -> plural name and scope.
///
/// Built once per client handle. It goes stale when new types are installed
/// after the snapshot was taken; rebuilding the handle is the only refresh.
#[derive(Debug, Clone, Default)]
pub struct TypeMappingCache {
    mappings: HashMap<GroupVersionKind, ResourceTypeMapping>,
}

impl TypeMappingCache {
    /// Run discovery against the cluster and index every served version
    pub async fn discover(client: &Client) -> Result<Self, ClusterError> {
        let discovery = Discovery::new(client.clone())
            .run()
            .await
            .map_err(ClusterError::from_kube)?;
        Ok(Self::from_discovery(&discovery))
    }

    fn from_discovery(discovery: &Discovery) -> Self {
        let mut mappings = HashMap::new();
        for group in discovery.groups() {
            // All versions, not just the preferred one, so manifests pinned to an
            // older served version still resolve.
            for version in group.versions() {
                for (ar, caps) in group.versioned_resources(version) {
                    let mapping = ResourceTypeMapping::from_discovered(&ar, &caps);
                    mappings.insert(mapping.gvk.clone(), mapping);
                }
            }
        }
        Self { mappings }
    }

    /// Build a cache from known mappings
    pub fn from_mappings(mappings: impl IntoIterator<Item = ResourceTypeMapping>) -> Self {
        Self {
            mappings: mappings
                .into_iter()
                .map(|m| (m.gvk.clone(), m))
                .collect(),
        }
    }

    pub fn lookup(&self, gvk: &GroupVersionKind) -> Result<ResourceTypeMapping, ClusterError> {
        self.mappings
            .get(gvk)
            .cloned()
            .ok_or_else(|| ClusterError::NoKindMatch {
                group: gvk.group.clone(),
                version: gvk.version.clone(),
                kind: gvk.kind.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Cluster client handle backed by kube-rs
pub struct KubeClusterClient {
    config: Config,
    client: Client,
    types: TypeMappingCache,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient")
            .field("cluster_url", &self.config.cluster_url)
            .field("known_types", &self.types.len())
            .finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    /// Build a complete handle: API client plus a fresh discovery snapshot.
    ///
    /// # Arguments
    /// * `config` - Connection settings (see [`load_config`])
    pub async fn connect(config: Config) -> Result<Self, ClusterError> {
        let client = Client::try_from(config.clone()).map_err(ClusterError::from_kube)?;
        let types = TypeMappingCache::discover(&client).await?;
        info!(
            "Connected to {} ({} resource types discovered)",
            config.cluster_url,
            types.len()
        );
        Ok(Self {
            config,
            client,
            types,
        })
    }

    /// Connection settings this handle was built from
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Underlying client for typed API access
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn types(&self) -> &TypeMappingCache {
        &self.types
    }

    fn dynamic_api(&self, target: &ResourceTarget) -> Api<DynamicObject> {
        let ar = target.mapping.api_resource();
        match &target.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &ar),
            None => Api::all_with(self.client.clone(), &ar),
        }
    }
}

fn object_name(object: &DynamicObject) -> Result<&str, ClusterError> {
    object
        .metadata
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ClusterError::InvalidObject("metadata.name is required".to_string()))
}

/// Name used to describe a create: the name, else the `generateName` prefix
fn create_name(object: &DynamicObject) -> Result<&str, ClusterError> {
    object_name(object).or_else(|err| {
        object
            .metadata
            .generate_name
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
            .ok_or(err)
    })
}

fn post_params(field_manager: &str) -> PostParams {
    PostParams {
        field_manager: Some(field_manager.to_string()),
        ..Default::default()
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    fn resolve(&self, gvk: &GroupVersionKind) -> Result<ResourceTypeMapping, ClusterError> {
        self.types.lookup(gvk)
    }

    async fn get(&self, target: &ResourceTarget, name: &str) -> Result<DynamicObject, ClusterError> {
        debug!("Fetching {}", target.describe(name));
        self.dynamic_api(target)
            .get(name)
            .await
            .map_err(ClusterError::from_kube)
    }

    async fn list(&self, target: &ResourceTarget, label_selector: Option<&str>) -> Result<Vec<DynamicObject>, ClusterError> {
        let mut params = ListParams::default();
        if let Some(selector) = label_selector {
            params = params.labels(selector);
        }
        let list = self
            .dynamic_api(target)
            .list(&params)
            .await
            .map_err(ClusterError::from_kube)?;
        Ok(list.items)
    }

    async fn create(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str) -> Result<DynamicObject, ClusterError> {
        debug!("Creating {}", target.describe(create_name(object)?));
        self.dynamic_api(target)
            .create(&post_params(field_manager), object)
            .await
            .map_err(ClusterError::from_kube)
    }

    async fn update(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str) -> Result<DynamicObject, ClusterError> {
        let name = object_name(object)?;
        debug!("Replacing {}", target.describe(name));
        self.dynamic_api(target)
            .replace(name, &post_params(field_manager), object)
            .await
            .map_err(ClusterError::from_kube)
    }

    async fn apply(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str, force: bool) -> Result<DynamicObject, ClusterError> {
        let name = object_name(object)?;
        debug!("Server-side applying {}", target.describe(name));
        let mut params = PatchParams::apply(field_manager);
        if force {
            params = params.force();
        }
        self.dynamic_api(target)
            .patch(name, &params, &Patch::Apply(object))
            .await
            .map_err(ClusterError::from_kube)
    }

    async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError> {
        debug!("Deleting {}", target.describe(name));
        self.dynamic_api(target)
            .delete(name, &DeleteParams::default())
            .await
            .map_err(ClusterError::from_kube)?;
        Ok(())
    }
}
