//! Manifest reconciliation engine
//!
//! Applies and deletes multi-document manifests against a cluster without
//! hardcoding any resource kind. Kinds are resolved through the discovery
//! snapshot of a shared, swappable client handle.
//!
//! # Example
//!
//! ```no_run
//! use manifest_engine::{ClientManager, EngineConfig, KubeHandleFactory, Reconciler};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = cluster_client::load_config(None).await?;
//! let clients = ClientManager::connect(KubeHandleFactory::new(config)).await?;
//! let reconciler = Reconciler::new(Arc::new(clients), EngineConfig::default());
//!
//! let manifest = std::fs::read_to_string("bundle.yaml")?;
//! let report = reconciler.apply_all(&manifest, Some("default")).await?;
//! println!("applied {} objects", report.processed);
//! # Ok(())
//! # }
//! ```
//!
//! # Guarantees
//!
//! - Documents are processed in order and the first failure stops a batch
//! - Earlier documents of a failed batch are not rolled back
//! - Server-side apply of an unchanged object leaves cluster state unchanged
//! - Deleting an object that is already gone succeeds

pub mod config;
pub mod error;
pub mod filter;
pub mod lifecycle;
pub mod manifest;
pub mod namespace;
pub mod object;
pub mod poll;
pub mod reconciler;
#[cfg(test)]
mod test_utils;

pub use config::{ApplyStrategy, EngineConfig, StaleKindPolicy, DEFAULT_FIELD_MANAGER};
pub use error::EngineError;
pub use filter::{ExactlyOneOfKind, KindFilter, ResourceFilter};
pub use lifecycle::{ClientHandle, ClientManager, HandleFactory, HandleGuard, KubeHandleFactory, LifecycleState};
pub use manifest::{join_documents, split_documents, ManifestDocument};
pub use namespace::{resolve_namespace, Intent, Placement};
pub use object::{decode_named_object, decode_object, GenericResourceObject};
pub use poll::{poll_until, POLL_INTERVAL};
pub use reconciler::{BatchReport, Reconciler};
