//! Namespace resolution
//!
//! Decides which namespace a call for an object is issued against, from the
//! object's own namespace and the namespace requested by the caller.

use crate::error::EngineError;
use crate::object::GenericResourceObject;
use cluster_client::ResourceScope;

/// What the caller is about to do with the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Apply,
    Delete,
}

/// Where the call for an object goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Cluster-scoped kind, no namespace
    Cluster,
    Namespaced(String),
    /// Leave the object alone
    Skip,
}

impl Placement {
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Self::Namespaced(ns) => Some(ns),
            Self::Cluster | Self::Skip => None,
        }
    }
}

/// Resolve the namespace for `object`.
///
/// Cluster-scoped kinds ignore the requested namespace when applying, and are
/// skipped when deleting with a requested namespace so that a namespaced delete
/// never removes cluster-wide objects.
///
/// Namespaced kinds:
///
/// | object | requested | result              |
/// |--------|-----------|---------------------|
/// | -      | -         | `NamespaceRequired` |
/// | -      | C         | C                   |
/// | O      | -         | O                   |
/// | O      | C, C != O | `NamespaceConflict` |
/// | O      | O         | O                   |
///
/// An empty requested namespace counts as absent.
pub fn resolve_namespace(
    scope: ResourceScope,
    object: &GenericResourceObject,
    requested: Option<&str>,
    intent: Intent,
) -> Result<Placement, EngineError> {
    let requested = requested.filter(|ns| !ns.is_empty());

    if scope == ResourceScope::Cluster {
        return Ok(match (intent, requested) {
            (Intent::Delete, Some(_)) => Placement::Skip,
            _ => Placement::Cluster,
        });
    }

    match (object.namespace(), requested) {
        (None, None) => Err(EngineError::NamespaceRequired {
            kind: object.kind.clone(),
            name: object.name().to_string(),
        }),
        (None, Some(requested)) => Ok(Placement::Namespaced(requested.to_string())),
        (Some(own), None) => Ok(Placement::Namespaced(own.to_string())),
        (Some(own), Some(requested)) if own != requested => Err(EngineError::NamespaceConflict {
            object: object.describe(),
            object_namespace: own.to_string(),
            requested: requested.to_string(),
        }),
        (Some(own), Some(_)) => Ok(Placement::Namespaced(own.to_string())),
    }
}
