//! ClusterClient trait for mocking
//!
//! This trait abstracts the cluster-facing handle so the manifest engine can run
//! against the real API server or an in-memory mock.

use crate::error::ClusterError;
use crate::models::{ResourceTarget, ResourceTypeMapping};
use kube::api::DynamicObject;
use kube::core::GroupVersionKind;

/// Trait for schema-agnostic cluster operations
///
/// Every kind is addressed through a `ResourceTypeMapping` produced by `resolve`,
/// so no resource kind is hardcoded behind this trait.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Look up a kind in the cached discovery snapshot.
    ///
    /// Returns `ClusterError::NoKindMatch` when the snapshot does not know the kind.
    fn resolve(&self, gvk: &GroupVersionKind) -> Result<ResourceTypeMapping, ClusterError>;

    async fn get(&self, target: &ResourceTarget, name: &str) -> Result<DynamicObject, ClusterError>;
    async fn list(&self, target: &ResourceTarget, label_selector: Option<&str>) -> Result<Vec<DynamicObject>, ClusterError>;
    async fn create(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str) -> Result<DynamicObject, ClusterError>;
    async fn update(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str) -> Result<DynamicObject, ClusterError>;

    /// Server-side apply of `object` as a declarative partial state
    async fn apply(&self, target: &ResourceTarget, object: &DynamicObject, field_manager: &str, force: bool) -> Result<DynamicObject, ClusterError>;

    async fn delete(&self, target: &ResourceTarget, name: &str) -> Result<(), ClusterError>;
}
