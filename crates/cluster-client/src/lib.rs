//! Dynamic Kubernetes cluster client
//!
//! A schema-agnostic client for applying arbitrary manifests. Kinds are resolved
//! through a discovery snapshot taken when the client connects, so CRDs and
//! built-in types are handled the same way.
//!
//! # Example
//!
//! ```no_run
//! use cluster_client::{load_config, gvk_from_api_version, ClusterClientTrait, KubeClusterClient, ResourceTarget};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config(None).await?;
//! let client = KubeClusterClient::connect(config).await?;
//!
//! // Resolve a kind against the discovery snapshot
//! let mapping = client.resolve(&gvk_from_api_version("apps/v1", "Deployment"))?;
//!
//! // List deployments in a namespace
//! let deployments = client
//!     .list(&ResourceTarget::namespaced(mapping, "default"), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Discovery snapshot**: GVK to plural/scope mapping, cached per client
//! - **Dynamic CRUD**: get, list, create, replace and delete on any served kind
//! - **Server-side apply**: field-managed apply with optional conflict forcing
//! - **Mocking**: `MockClusterClient` behind the `test-util` feature

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod cluster_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{load_config, KubeClusterClient, TypeMappingCache};
pub use error::ClusterError;
pub use models::*;
pub use cluster_trait::ClusterClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{builtin_types, MockCall, MockClusterClient, MockFailure, MockOperation};
