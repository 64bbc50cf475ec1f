//! Resource type models
//!
//! Type coordinates used to address arbitrary kinds through the dynamic API.

use kube::core::GroupVersionKind;
use kube::discovery::{ApiCapabilities, ApiResource, Scope};
use serde::{Deserialize, Serialize};

/// Whether a kind lives inside a namespace or cluster-wide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceScope {
    Cluster,
    Namespaced,
}

impl From<&Scope> for ResourceScope {
    fn from(scope: &Scope) -> Self {
        match scope {
            Scope::Cluster => Self::Cluster,
            Scope::Namespaced => Self::Namespaced,
        }
    }
}

/// Mapping of a (group, version, kind) to its plural resource name and scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeMapping {
    pub gvk: GroupVersionKind,
    /// Plural resource name used in API paths (e.g., "deployments")
    pub plural: String,
    pub scope: ResourceScope,
}

impl ResourceTypeMapping {
    pub fn new(gvk: GroupVersionKind, plural: impl Into<String>, scope: ResourceScope) -> Self {
        Self {
            gvk,
            plural: plural.into(),
            scope,
        }
    }

    /// Build from a discovered resource and its capabilities
    pub fn from_discovered(ar: &ApiResource, caps: &ApiCapabilities) -> Self {
        Self {
            gvk: GroupVersionKind::gvk(&ar.group, &ar.version, &ar.kind),
            plural: ar.plural.clone(),
            scope: ResourceScope::from(&caps.scope),
        }
    }

    /// The `ApiResource` needed to build an `Api<DynamicObject>`
    pub fn api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.gvk.group.clone(),
            version: self.gvk.version.clone(),
            api_version: self.gvk.api_version(),
            kind: self.gvk.kind.clone(),
            plural: self.plural.clone(),
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.scope == ResourceScope::Namespaced
    }
}

/// A resolved type plus the namespace a call should be issued against.
///
/// `namespace` is `None` for cluster-scoped kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTarget {
    pub mapping: ResourceTypeMapping,
    pub namespace: Option<String>,
}

impl ResourceTarget {
    pub fn new(mapping: ResourceTypeMapping, namespace: Option<String>) -> Self {
        Self { mapping, namespace }
    }

    /// Target a cluster-scoped kind (or every namespace, when listing)
    pub fn cluster(mapping: ResourceTypeMapping) -> Self {
        Self {
            mapping,
            namespace: None,
        }
    }

    pub fn namespaced(mapping: ResourceTypeMapping, namespace: impl Into<String>) -> Self {
        Self {
            mapping,
            namespace: Some(namespace.into()),
        }
    }

    /// Human readable path used in error messages, e.g. `apps/v1 deployments in ns`
    pub fn describe(&self, name: &str) -> String {
        match &self.namespace {
            Some(ns) => format!(
                "{} {}/{} in namespace {}",
                self.mapping.gvk.api_version(),
                self.mapping.plural,
                name,
                ns
            ),
            None => format!(
                "{} {}/{}",
                self.mapping.gvk.api_version(),
                self.mapping.plural,
                name
            ),
        }
    }
}

/// Split an apiVersion string into (group, version).
///
/// Core-group versions such as `v1` have an empty group.
pub fn split_api_version(api_version: &str) -> (&str, &str) {
    match api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", api_version),
    }
}

/// Build a `GroupVersionKind` from an apiVersion string and kind
pub fn gvk_from_api_version(api_version: &str, kind: &str) -> GroupVersionKind {
    let (group, version) = split_api_version(api_version);
    GroupVersionKind::gvk(group, version, kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_api_version_core_group() {
        assert_eq!(split_api_version("v1"), ("", "v1"));
    }

    #[test]
    fn test_split_api_version_named_group() {
        assert_eq!(split_api_version("apps/v1"), ("apps", "v1"));
    }

    #[test]
    fn test_api_resource_uses_discovered_plural() {
        let mapping = ResourceTypeMapping::new(
            gvk_from_api_version("clickhouse.altinity.com/v1", "ClickHouseInstallation"),
            "clickhouseinstallations",
            ResourceScope::Namespaced,
        );
        let ar = mapping.api_resource();
        assert_eq!(ar.api_version, "clickhouse.altinity.com/v1");
        assert_eq!(ar.group, "clickhouse.altinity.com");
        assert_eq!(ar.plural, "clickhouseinstallations");
        assert!(mapping.is_namespaced());
    }

    #[test]
    fn test_describe_target() {
        let mapping = ResourceTypeMapping::new(
            gvk_from_api_version("v1", "Namespace"),
            "namespaces",
            ResourceScope::Cluster,
        );
        assert_eq!(ResourceTarget::cluster(mapping).describe("demo"), "v1 namespaces/demo");
    }
}
