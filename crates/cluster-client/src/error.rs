//! Cluster client errors

use thiserror::Error;

/// Errors that can occur when talking to the cluster API
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Any other Kubernetes client or API error, passed through unmodified
    #[error("Kubernetes error: {0}")]
    Kube(#[source] kube::Error),

    /// The kind is unknown to the current discovery snapshot
    #[error("no resource type registered for {kind} in {}", api_version(.group, .version))]
    NoKindMatch {
        /// API group ("" for the core group)
        group: String,
        /// API version
        version: String,
        /// Resource kind
        kind: String,
    },

    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Stale resourceVersion or conflicting field ownership (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Create of an object that already exists (HTTP 409, reason AlreadyExists)
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Kubeconfig could not be loaded or inferred
    #[error("Invalid client configuration: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Object is missing a field the API call needs (name, apiVersion)
    #[error("Invalid object: {0}")]
    InvalidObject(String),
}

impl ClusterError {
    /// Classify a raw `kube::Error`, lifting 404/409 responses into dedicated variants.
    pub fn from_kube(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(resp) if resp.code == 404 => Self::NotFound(resp.message),
            kube::Error::Api(resp) if resp.code == 409 && resp.reason == "AlreadyExists" => {
                Self::AlreadyExists(resp.message)
            }
            kube::Error::Api(resp) if resp.code == 409 => Self::Conflict(resp.message),
            other => Self::Kube(other),
        }
    }

    /// Whether this error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error is an optimistic-concurrency or ownership conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

fn api_version(group: &str, version: &str) -> String {
    if group.is_empty() {
        version.to_string()
    } else {
        format!("{group}/{version}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::ErrorResponse;

    fn api_error(code: u16, reason: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: format!("{reason} happened"),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_not_found_is_lifted() {
        let err = ClusterError::from_kube(api_error(404, "NotFound"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_already_exists_is_not_a_conflict() {
        let err = ClusterError::from_kube(api_error(409, "AlreadyExists"));
        assert!(matches!(err, ClusterError::AlreadyExists(_)));
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_stale_version_is_a_conflict() {
        let err = ClusterError::from_kube(api_error(409, "Conflict"));
        assert!(err.is_conflict());
    }

    #[test]
    fn test_other_api_errors_pass_through() {
        let err = ClusterError::from_kube(api_error(422, "Invalid"));
        assert!(matches!(err, ClusterError::Kube(kube::Error::Api(ref resp)) if resp.code == 422));
    }

    #[test]
    fn test_no_kind_match_message_for_core_group() {
        let err = ClusterError::NoKindMatch {
            group: String::new(),
            version: "v1".to_string(),
            kind: "Widget".to_string(),
        };
        assert_eq!(err.to_string(), "no resource type registered for Widget in v1");
    }
}
