//! Controller-specific error types.
//!
//! This module defines error types specific to the Manifest Controller
//! that are not covered by the engine and client errors.

use cluster_client::ClusterError;
use manifest_engine::EngineError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in the Manifest Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Manifest engine error
    #[error("Manifest engine error: {0}")]
    Engine(#[from] EngineError),

    /// Cluster connection error
    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Manifest file could not be read
    #[error("Failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
