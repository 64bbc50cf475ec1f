//! Manifest engine errors

use cluster_client::ClusterError;
use thiserror::Error;

/// Errors returned by the manifest engine
///
/// Cluster failures are wrapped without modification; use the helper predicates
/// to classify them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document stream is malformed
    #[error("Manifest parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A document is not a valid resource object
    #[error("Invalid document {index}: {reason}")]
    Decode {
        /// Position of the document in the manifest, starting at 0
        index: usize,
        reason: String,
    },

    /// A namespaced object has no namespace and none was supplied
    #[error("{kind} {name} is namespaced but no namespace was given")]
    NamespaceRequired { kind: String, name: String },

    /// The object's namespace differs from the requested one
    #[error("{object} is in namespace {object_namespace}, but namespace {requested} was requested")]
    NamespaceConflict {
        object: String,
        object_namespace: String,
        requested: String,
    },

    /// A resource filter refused the candidate set
    #[error("Filter rejected manifest: {0}")]
    FilterRejected(String),

    /// A bounded wait reached its deadline
    #[error("Timed out after {elapsed:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: String,
        elapsed: std::time::Duration,
    },

    /// No client handle has been published yet
    #[error("Cluster client is not initialized")]
    Uninitialized,

    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl EngineError {
    /// Whether this wraps a kind unknown to the current discovery snapshot
    pub fn no_kind_match(&self) -> Option<&str> {
        match self {
            Self::Cluster(ClusterError::NoKindMatch { kind, .. }) => Some(kind),
            _ => None,
        }
    }

    /// Group and kind of a type unknown to the current discovery snapshot
    pub fn unknown_type(&self) -> Option<(&str, &str)> {
        match self {
            Self::Cluster(ClusterError::NoKindMatch { group, kind, .. }) => Some((group, kind)),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Cluster(err) if err.is_conflict())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Cluster(err) if err.is_not_found())
    }
}
