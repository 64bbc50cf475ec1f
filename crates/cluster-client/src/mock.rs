//! Mock cluster client for unit testing
//!
//! `MockCluster` plays the API server: it owns the installed resource types and the
//! stored objects. `MockClusterClient` is one connected handle with its own discovery
//! snapshot taken at connect time, so a type installed after connecting stays unknown
//! to that handle until a new one is built with [`MockClusterClient::try_reconnect`].
//!
//! Server-side apply tracks the last configuration each field manager applied.
//! Reapplying without a field that the same manager set before removes it; fields
//! set by other writers are left alone. Ownership is tracked per manager, not per
//! field, and list fields are replaced wholesale.

use crate::error::ClusterError;
use crate::models::{gvk_from_api_version, ResourceScope, ResourceTarget, ResourceTypeMapping};
use crate::cluster_trait::ClusterClientTrait;
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Operations the mock records and can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Connect,
    Get,
    List,
    Create,
    Update,
    Apply,
    Delete,
}

impl MockOperation {
    /// Whether the operation changes cluster state
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Apply | Self::Delete)
    }
}

/// Failure to inject for the next call of an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    NotFound,
    Conflict,
    AlreadyExists,
    /// Kind unknown to the handle, as if the snapshot were stale
    NoKindMatch,
    /// Any other server-side error
    Server(String),
}

impl MockFailure {
    fn into_error(self, target: Option<&ResourceTarget>, name: &str) -> ClusterError {
        let what = match target {
            Some(t) => t.describe(name),
            None => name.to_string(),
        };
        match self {
            Self::NotFound => ClusterError::NotFound(what),
            Self::Conflict => ClusterError::Conflict(what),
            Self::AlreadyExists => ClusterError::AlreadyExists(what),
            Self::NoKindMatch => {
                let gvk = target
                    .map(|t| t.mapping.gvk.clone())
                    .unwrap_or_else(|| GroupVersionKind::gvk("", "v1", "Unknown"));
                ClusterError::NoKindMatch {
                    group: gvk.group,
                    version: gvk.version,
                    kind: gvk.kind,
                }
            }
            Self::Server(message) => ClusterError::Kube(kube::Error::Api(kube::core::ErrorResponse {
                status: "Failure".to_string(),
                message,
                reason: "InternalError".to_string(),
                code: 500,
            })),
        }
    }
}

/// A recorded call against the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub operation: MockOperation,
    pub kind: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct ObjectKey {
    group: String,
    plural: String,
    namespace: Option<String>,
    name: String,
}

impl ObjectKey {
    fn new(target: &ResourceTarget, name: &str) -> Self {
        Self {
            group: target.mapping.gvk.group.clone(),
            plural: target.mapping.plural.clone(),
            namespace: target.namespace.clone(),
            name: name.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct StoredObject {
    object: DynamicObject,
    /// Last writer
    field_manager: String,
    /// Last applied configuration per field manager, as [`applied_fields`]
    applied: HashMap<String, Value>,
}

impl StoredObject {
    fn written(object: DynamicObject, field_manager: &str) -> Self {
        Self {
            object,
            field_manager: field_manager.to_string(),
            applied: HashMap::new(),
        }
    }
}

/// In-memory API server shared by every handle built from it
#[derive(Debug, Default)]
pub struct MockCluster {
    types: Mutex<HashMap<GroupVersionKind, ResourceTypeMapping>>,
    objects: Mutex<BTreeMap<ObjectKey, StoredObject>>,
    calls: Mutex<Vec<MockCall>>,
    failures: Mutex<HashMap<MockOperation, MockFailure>>,
    connect_delay: Mutex<Option<Duration>>,
    connections: Mutex<u64>,
    next_version: Mutex<u64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockCluster {
    fn next_resource_version(&self) -> String {
        let mut version = lock(&self.next_version);
        *version += 1;
        version.to_string()
    }

    fn record(&self, operation: MockOperation, target: Option<&ResourceTarget>, name: Option<&str>) {
        lock(&self.calls).push(MockCall {
            operation,
            kind: target.map(|t| t.mapping.gvk.kind.clone()).unwrap_or_default(),
            namespace: target.and_then(|t| t.namespace.clone()),
            name: name.map(str::to_string),
        });
    }

    fn take_failure(&self, operation: MockOperation) -> Option<MockFailure> {
        lock(&self.failures).remove(&operation)
    }

    /// Record the call, then fail it if a failure was injected or the type is not
    /// served by the cluster.
    fn begin(&self, operation: MockOperation, target: &ResourceTarget, name: Option<&str>) -> Result<(), ClusterError> {
        self.record(operation, Some(target), name);
        if let Some(failure) = self.take_failure(operation) {
            return Err(failure.into_error(Some(target), name.unwrap_or_default()));
        }
        if !lock(&self.types).contains_key(&target.mapping.gvk) {
            return Err(ClusterError::NotFound(format!(
                "the server could not find the requested resource ({})",
                target.mapping.plural
            )));
        }
        Ok(())
    }
}

/// Mock ClusterClient for testing
///
/// Cloning shares both the cluster and the discovery snapshot.
#[derive(Clone, Debug)]
pub struct MockClusterClient {
    cluster: Arc<MockCluster>,
    snapshot: Arc<HashMap<GroupVersionKind, ResourceTypeMapping>>,
}

impl Default for MockClusterClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClusterClient {
    /// Create a mock cluster with no resource types installed
    pub fn new() -> Self {
        Self::with_types(Vec::new())
    }

    /// Create a mock cluster serving `types`; the returned handle already knows them
    pub fn with_types(types: impl IntoIterator<Item = ResourceTypeMapping>) -> Self {
        let cluster = Arc::new(MockCluster::default());
        for mapping in types {
            lock(&cluster.types).insert(mapping.gvk.clone(), mapping);
        }
        let snapshot = Arc::new(lock(&cluster.types).clone());
        Self { cluster, snapshot }
    }

    /// Create a mock cluster serving [`builtin_types`]
    pub fn with_builtin_types() -> Self {
        Self::with_types(builtin_types())
    }

    /// Install a type on the cluster (e.g. a CRD registered after connecting).
    ///
    /// Existing handles do not see it until they are rebuilt.
    pub fn install_type(&self, mapping: ResourceTypeMapping) {
        lock(&self.cluster.types).insert(mapping.gvk.clone(), mapping);
    }

    /// Build a new handle against the same cluster with a fresh snapshot
    pub async fn try_reconnect(&self) -> Result<Self, ClusterError> {
        let delay = *lock(&self.cluster.connect_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.cluster.record(MockOperation::Connect, None, None);
        if let Some(failure) = self.cluster.take_failure(MockOperation::Connect) {
            return Err(failure.into_error(None, "connect"));
        }
        *lock(&self.cluster.connections) += 1;
        Ok(Self {
            cluster: Arc::clone(&self.cluster),
            snapshot: Arc::new(lock(&self.cluster.types).clone()),
        })
    }

    /// Number of handles built with [`Self::try_reconnect`]
    pub fn connection_count(&self) -> u64 {
        *lock(&self.cluster.connections)
    }

    /// Make every subsequent connect wait before completing
    pub fn set_connect_delay(&self, delay: Duration) {
        *lock(&self.cluster.connect_delay) = Some(delay);
    }

    /// Fail the next call of `operation` with `failure`
    pub fn fail_next(&self, operation: MockOperation, failure: MockFailure) {
        lock(&self.cluster.failures).insert(operation, failure);
    }

    /// Whether this handle's snapshot knows `gvk`
    pub fn knows(&self, gvk: &GroupVersionKind) -> bool {
        self.snapshot.contains_key(gvk)
    }

    /// Store an object directly (for test setup); not recorded as a call
    pub fn insert_object(&self, target: &ResourceTarget, mut object: DynamicObject) {
        let name = object.metadata.name.clone().unwrap_or_default();
        object.metadata.namespace = target.namespace.clone();
        object.metadata.resource_version = Some(self.cluster.next_resource_version());
        lock(&self.cluster.objects).insert(
            ObjectKey::new(target, &name),
            StoredObject::written(object, "test-setup"),
        );
    }

    /// Look up a stored object without recording a call
    pub fn stored_object(&self, target: &ResourceTarget, name: &str) -> Option<DynamicObject> {
        lock(&self.cluster.objects)
            .get(&ObjectKey::new(target, name))
            .map(|stored| stored.object.clone())
    }

    /// Number of stored objects across all types
    pub fn object_count(&self) -> usize {
        lock(&self.cluster.objects).len()
    }

    /// Every call made against the cluster so far
    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.cluster.calls).clone()
    }

    pub fn mutating_call_count(&self) -> usize {
        lock(&self.cluster.calls)
            .iter()
            .filter(|call| call.operation.is_mutating())
            .count()
    }

    pub fn clear_calls(&self) {
        lock(&self.cluster.calls).clear();
    }

    fn stamp(&self, target: &ResourceTarget, object: &DynamicObject) -> DynamicObject {
        let mut stored = object.clone();
        stored.metadata.namespace = target.namespace.clone();
        stored.metadata.resource_version = Some(self.cluster.next_resource_version());
        stored.metadata.managed_fields = None;
        stored
    }
}

/// Common built-in types: Namespace, ConfigMap, Secret, Service, ServiceAccount,
/// Deployment, ClusterRole and CustomResourceDefinition
pub fn builtin_types() -> Vec<ResourceTypeMapping> {
    [
        ("v1", "Namespace", "namespaces", ResourceScope::Cluster),
        ("v1", "ConfigMap", "configmaps", ResourceScope::Namespaced),
        ("v1", "Secret", "secrets", ResourceScope::Namespaced),
        ("v1", "Service", "services", ResourceScope::Namespaced),
        ("v1", "ServiceAccount", "serviceaccounts", ResourceScope::Namespaced),
        ("apps/v1", "Deployment", "deployments", ResourceScope::Namespaced),
        ("rbac.authorization.k8s.io/v1", "ClusterRole", "clusterroles", ResourceScope::Cluster),
        (
            "apiextensions.k8s.io/v1",
            "CustomResourceDefinition",
            "customresourcedefinitions",
            ResourceScope::Cluster,
        ),
    ]
    .into_iter()
    .map(|(api_version, kind, plural, scope)| {
        ResourceTypeMapping::new(gvk_from_api_version(api_version, kind), plural, scope)
    })
    .collect()
}

/// Deep-merge `patch` into `base`: objects merge key by key, anything else replaces
fn merge_json(base: &mut Value, patch: &Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                merge_json(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, patch) => *base = patch.clone(),
    }
}

/// Remove from `live` the fields `previous` set that `desired` no longer sets
fn prune_json(live: &mut Value, previous: &Value, desired: &Value) {
    let (Value::Object(live), Value::Object(previous)) = (live, previous) else {
        return;
    };
    for (key, before) in previous {
        match desired.get(key) {
            None => {
                live.remove(key);
            }
            Some(now) => {
                if let Some(child) = live.get_mut(key) {
                    prune_json(child, before, now);
                }
            }
        }
    }
}

/// The parts of an object server-side apply merges: payload, labels, annotations
fn applied_fields(object: &DynamicObject) -> Value {
    let mut fields = serde_json::Map::new();
    fields.insert("data".to_string(), object.data.clone());
    if let Some(labels) = &object.metadata.labels {
        fields.insert("labels".to_string(), string_map_to_json(labels));
    }
    if let Some(annotations) = &object.metadata.annotations {
        fields.insert("annotations".to_string(), string_map_to_json(annotations));
    }
    Value::Object(fields)
}

fn set_applied_fields(object: &mut DynamicObject, fields: Value) {
    let Value::Object(mut fields) = fields else {
        return;
    };
    object.data = fields.remove("data").unwrap_or(Value::Null);
    object.metadata.labels = fields.remove("labels").map(|v| json_to_string_map(&v));
    object.metadata.annotations = fields.remove("annotations").map(|v| json_to_string_map(&v));
}

fn string_map_to_json(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

fn json_to_string_map(value: &Value) -> BTreeMap<String, String> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Equality-based selector: `k=v`, `k==v`, `k!=v` and bare `k`, comma separated
fn matches_selector(labels: Option<&BTreeMap<String, String>>, selector: &str) -> bool {
    let empty = BTreeMap::new();
    let labels = labels.unwrap_or(&empty);
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if let Some((key, value)) = term.split_once("!=") {
                labels.get(key.trim()).map(String::as_str) != Some(value.trim())
            } else if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
                labels.get(key.trim()).map(String::as_str) == Some(value.trim())
            } else {
                labels.contains_key(term)
            }
        })
}

fn required_name(object: &DynamicObject) -> Result<String, ClusterError> {
    object
        .metadata
        .name
        .clone()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ClusterError::InvalidObject("metadata.name is required".to_string()))
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    fn resolve(&self, gvk: &GroupVersionKind) -> Result<ResourceTypeMapping, ClusterError> {
        self.snapshot
            .get(gvk)
            .cloned()
            .ok_or_else(|| ClusterError::NoKindMatch {
                group: gvk.group.clone(),
                version: gvk.version.clone(),
                kind: gvk.kind.clone(),
            })
    }

    async fn get(&self, target: &ResourceTarget, name: &str) -> Result<DynamicObject, ClusterError> {
        self.cluster.begin(MockOperation::Get, target, Some(name))?;
        lock(&self.cluster.objects)
            .get(&ObjectKey::new(target, name))
            .map(|stored| stored.object.clone())
            .ok_or_else(|| ClusterError::NotFound(target.describe(name)))
    }

    async fn list(&self, target: &ResourceTarget, label_selector: Option<&str>) -> Result<Vec<DynamicObject>, ClusterError> {
        self.cluster.begin(MockOperation::List, target, None)?;
        let objects = lock(&self.cluster.objects);
        Ok(objects
            .iter()
            .filter(|(key, _)| {
                key.group == target.mapping.gvk.group
                    && key.plural == target.mapping.plural
                    && (target.namespace.is_none() || key.namespace == target.namespace)
            })
            .map(|(_, stored)| &stored.object)
            .filter(|object| {
                label_selector
                    .map(|selector| matches_selector(object.metadata.labels.as_ref(), selector))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str) -> Result<DynamicObject, ClusterError> {
        let mut object = object.clone();
        let name = match required_name(&object) {
            Ok(name) => name,
            Err(err) => {
                let prefix = object
                    .metadata
                    .generate_name
                    .clone()
                    .filter(|prefix| !prefix.is_empty())
                    .ok_or(err)?;
                let name = format!("{prefix}{}", self.cluster.next_resource_version());
                object.metadata.name = Some(name.clone());
                name
            }
        };
        self.cluster.begin(MockOperation::Create, target, Some(&name))?;
        let key = ObjectKey::new(target, &name);
        let mut objects = lock(&self.cluster.objects);
        if objects.contains_key(&key) {
            return Err(ClusterError::AlreadyExists(target.describe(&name)));
        }
        let stored = self.stamp(target, &object);
        objects.insert(key, StoredObject::written(stored.clone(), field_manager));
        Ok(stored)
    }

    async fn update(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str) -> Result<DynamicObject, ClusterError> {
        let name = required_name(object)?;
        self.cluster.begin(MockOperation::Update, target, Some(&name))?;
        let key = ObjectKey::new(target, &name);
        let mut objects = lock(&self.cluster.objects);
        let current = objects
            .get(&key)
            .ok_or_else(|| ClusterError::NotFound(target.describe(&name)))?;
        if let Some(expected) = &object.metadata.resource_version {
            if current.object.metadata.resource_version.as_ref() != Some(expected) {
                return Err(ClusterError::Conflict(format!(
                    "{}: the object has been modified",
                    target.describe(&name)
                )));
            }
        }
        let stored = self.stamp(target, object);
        let applied = current.applied.clone();
        objects.insert(
            key,
            StoredObject {
                object: stored.clone(),
                field_manager: field_manager.to_string(),
                applied,
            },
        );
        Ok(stored)
    }

    async fn apply(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str, force: bool) -> Result<DynamicObject, ClusterError> {
        let name = required_name(object)?;
        self.cluster.begin(MockOperation::Apply, target, Some(&name))?;
        let key = ObjectKey::new(target, &name);
        let desired = applied_fields(object);
        let mut objects = lock(&self.cluster.objects);
        let Some(current) = objects.get(&key).cloned() else {
            let stored = self.stamp(target, object);
            let mut created = StoredObject::written(stored.clone(), field_manager);
            created.applied.insert(field_manager.to_string(), desired);
            objects.insert(key, created);
            return Ok(stored);
        };

        let live = applied_fields(&current.object);
        let mut merged = live.clone();
        merge_json(&mut merged, &desired);
        if let Some(previous) = current.applied.get(field_manager) {
            prune_json(&mut merged, previous, &desired);
        }
        if merged == live {
            return Ok(current.object);
        }
        if !force && current.field_manager != field_manager {
            return Err(ClusterError::Conflict(format!(
                "{}: fields owned by {}",
                target.describe(&name),
                current.field_manager
            )));
        }
        let mut written = current.object.clone();
        set_applied_fields(&mut written, merged);
        written.metadata.resource_version = Some(self.cluster.next_resource_version());
        let mut applied = current.applied;
        applied.insert(field_manager.to_string(), desired);
        objects.insert(
            key,
            StoredObject {
                object: written.clone(),
                field_manager: field_manager.to_string(),
                applied,
            },
        );
        Ok(written)
    }

    async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError> {
        self.cluster.begin(MockOperation::Delete, target, Some(name))?;
        lock(&self.cluster.objects)
            .remove(&ObjectKey::new(target, name))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound(target.describe(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ObjectMeta;
    use serde_json::json;

    fn configmaps(client: &MockClusterClient, ns: &str) -> ResourceTarget {
        let mapping = client
            .resolve(&gvk_from_api_version("v1", "ConfigMap"))
            .unwrap();
        ResourceTarget::namespaced(mapping, ns)
    }

    fn configmap(name: &str, data: Value) -> DynamicObject {
        DynamicObject {
            types: None,
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            data,
        }
    }

    #[tokio::test]
    async fn test_apply_unchanged_keeps_resource_version() {
        let client = MockClusterClient::with_builtin_types();
        let target = configmaps(&client, "demo");
        let object = configmap("settings", json!({"data": {"a": "1"}}));

        let first = client.apply(&target, &object, "tests", true).await.unwrap();
        let second = client.apply(&target, &object, "tests", true).await.unwrap();

        assert_eq!(
            first.metadata.resource_version,
            second.metadata.resource_version
        );
    }

    #[tokio::test]
    async fn test_apply_conflicts_with_other_manager_unless_forced() {
        let client = MockClusterClient::with_builtin_types();
        let target = configmaps(&client, "demo");
        client
            .apply(&target, &configmap("settings", json!({"data": {"a": "1"}})), "first", true)
            .await
            .unwrap();

        let changed = configmap("settings", json!({"data": {"a": "2"}}));
        let err = client.apply(&target, &changed, "second", false).await.unwrap_err();
        assert!(err.is_conflict());

        client.apply(&target, &changed, "second", true).await.unwrap();
        let stored = client.stored_object(&target, "settings").unwrap();
        assert_eq!(stored.data["data"]["a"], "2");
    }

    #[tokio::test]
    async fn test_reapply_prunes_fields_dropped_by_same_manager() {
        let client = MockClusterClient::with_builtin_types();
        let target = configmaps(&client, "demo");
        let mut first = configmap("settings", json!({"data": {"a": "1", "b": "2"}}));
        first.metadata.labels = Some(BTreeMap::from([("tier".to_string(), "web".to_string())]));
        client.apply(&target, &first, "tests", true).await.unwrap();
        client
            .apply(&target, &configmap("settings", json!({"data": {"c": "3"}})), "other", true)
            .await
            .unwrap();

        let reduced = configmap("settings", json!({"data": {"a": "1"}}));
        client.apply(&target, &reduced, "tests", true).await.unwrap();

        let stored = client.stored_object(&target, "settings").unwrap();
        assert_eq!(stored.data["data"], json!({"a": "1", "c": "3"}));
        assert_eq!(stored.metadata.labels, None);
    }

    #[tokio::test]
    async fn test_create_with_generate_name() {
        let client = MockClusterClient::with_builtin_types();
        let target = configmaps(&client, "demo");
        let mut object = configmap("", json!({}));
        object.metadata.name = None;
        object.metadata.generate_name = Some("settings-".to_string());

        let created = client.create(&target, &object, "tests").await.unwrap();

        let name = created.metadata.name.unwrap();
        assert!(name.starts_with("settings-") && name.len() > "settings-".len());
        assert!(client.stored_object(&target, &name).is_some());
    }

    #[tokio::test]
    async fn test_update_with_stale_version_conflicts() {
        let client = MockClusterClient::with_builtin_types();
        let target = configmaps(&client, "demo");
        let created = client
            .create(&target, &configmap("settings", json!({})), "tests")
            .await
            .unwrap();
        client.update(&target, &created, "tests").await.unwrap();

        let err = client.update(&target, &created, "tests").await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_snapshot_is_fixed_until_reconnect() {
        let client = MockClusterClient::with_builtin_types();
        let gvk = gvk_from_api_version("example.com/v1", "Widget");
        client.install_type(ResourceTypeMapping::new(
            gvk.clone(),
            "widgets",
            ResourceScope::Namespaced,
        ));

        assert!(matches!(
            client.resolve(&gvk),
            Err(ClusterError::NoKindMatch { .. })
        ));
        let fresh = client.try_reconnect().await.unwrap();
        assert!(fresh.resolve(&gvk).is_ok());
        assert_eq!(client.connection_count(), 1);
    }

    #[tokio::test]
    async fn test_injected_connect_failure_is_one_shot() {
        let client = MockClusterClient::with_builtin_types();
        client.fail_next(MockOperation::Connect, MockFailure::Server("unreachable".to_string()));

        assert!(client.try_reconnect().await.is_err());
        assert!(client.try_reconnect().await.is_ok());
    }

    #[tokio::test]
    async fn test_list_filters_by_namespace_and_labels() {
        let client = MockClusterClient::with_builtin_types();
        let mut labelled = configmap("labelled", json!({}));
        labelled.metadata.labels = Some(BTreeMap::from([("app".to_string(), "web".to_string())]));
        client.insert_object(&configmaps(&client, "a"), labelled);
        client.insert_object(&configmaps(&client, "a"), configmap("plain", json!({})));
        client.insert_object(&configmaps(&client, "b"), configmap("other", json!({})));

        let in_a = client.list(&configmaps(&client, "a"), None).await.unwrap();
        assert_eq!(in_a.len(), 2);

        let web = client
            .list(&configmaps(&client, "a"), Some("app=web"))
            .await
            .unwrap();
        assert_eq!(web.len(), 1);
        assert_eq!(web[0].metadata.name.as_deref(), Some("labelled"));
    }

    #[test]
    fn test_selector_terms() {
        let labels = BTreeMap::from([("app".to_string(), "web".to_string())]);
        assert!(matches_selector(Some(&labels), "app==web"));
        assert!(matches_selector(Some(&labels), "app"));
        assert!(matches_selector(Some(&labels), "tier!=db"));
        assert!(!matches_selector(Some(&labels), "app=db"));
        assert!(!matches_selector(None, "app"));
    }
}
