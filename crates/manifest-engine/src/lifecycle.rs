//! Client lifecycle management
//!
//! One client handle is shared by every caller. It is published behind a
//! reader/writer lock and replaced wholesale by [`ClientManager::reinit`], never
//! mutated in place.
//!
//! Callers hold a read guard for the duration of a cluster call. `reinit` takes
//! the write lock, so it waits for in-flight readers and holds back new ones
//! until the new handle is published. A task must drop its read guard before
//! calling `reinit`, or it deadlocks against itself.

use crate::error::EngineError;
use cluster_client::{ClusterClientTrait, ClusterError, KubeClusterClient};
use std::ops::Deref;
use tokio::sync::{RwLock, RwLockReadGuard};
use tracing::info;

/// Builds complete client handles
#[async_trait::async_trait]
pub trait HandleFactory: Send + Sync {
    type Handle: ClusterClientTrait + 'static;

    /// Build a new handle from scratch, including a fresh discovery snapshot
    async fn build(&self) -> Result<Self::Handle, ClusterError>;
}

/// Builds [`KubeClusterClient`] handles from fixed connection settings
#[derive(Clone)]
pub struct KubeHandleFactory {
    config: kube::Config,
}

impl std::fmt::Debug for KubeHandleFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeHandleFactory")
            .field("cluster_url", &self.config.cluster_url)
            .finish_non_exhaustive()
    }
}

impl KubeHandleFactory {
    pub fn new(config: kube::Config) -> Self {
        Self { config }
    }
}

#[async_trait::async_trait]
impl HandleFactory for KubeHandleFactory {
    type Handle = KubeClusterClient;

    async fn build(&self) -> Result<Self::Handle, ClusterError> {
        KubeClusterClient::connect(self.config.clone()).await
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait::async_trait]
impl HandleFactory for cluster_client::MockClusterClient {
    type Handle = cluster_client::MockClusterClient;

    async fn build(&self) -> Result<Self::Handle, ClusterError> {
        self.try_reconnect().await
    }
}

/// A published client handle
#[derive(Debug)]
pub struct ClientHandle<H> {
    client: H,
    generation: u64,
}

impl<H> ClientHandle<H> {
    pub fn client(&self) -> &H {
        &self.client
    }

    /// 1 for the first published handle, incremented by every successful rebuild
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<H> Deref for ClientHandle<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.client
    }
}

/// Shared read access to the current handle
pub type HandleGuard<'a, H> = RwLockReadGuard<'a, ClientHandle<H>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Ready { generation: u64 },
}

/// Owns the process-wide client handle
pub struct ClientManager<F: HandleFactory> {
    factory: F,
    current: RwLock<Option<ClientHandle<F::Handle>>>,
}

impl<F: HandleFactory> std::fmt::Debug for ClientManager<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientManager").finish_non_exhaustive()
    }
}

impl<F: HandleFactory> ClientManager<F> {
    /// Create an uninitialized manager; [`Self::acquire`] fails until the first
    /// successful [`Self::reinit`]
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            current: RwLock::new(None),
        }
    }

    /// Create a manager and publish its first handle
    pub async fn connect(factory: F) -> Result<Self, EngineError> {
        let manager = Self::new(factory);
        manager.reinit().await?;
        Ok(manager)
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Take shared access to the current handle
    pub async fn acquire(&self) -> Result<HandleGuard<'_, F::Handle>, EngineError> {
        RwLockReadGuard::try_map(self.current.read().await, Option::as_ref)
            .map_err(|_| EngineError::Uninitialized)
    }

    /// Rebuild the handle from scratch and publish it.
    ///
    /// Holds the write lock for the whole rebuild. On failure the previous
    /// handle, if any, stays published. Returns the new generation.
    pub async fn reinit(&self) -> Result<u64, EngineError> {
        let mut current = self.current.write().await;
        let client = self.factory.build().await?;
        let generation = current.as_ref().map_or(1, |handle| handle.generation + 1);
        *current = Some(ClientHandle { client, generation });
        info!("Published cluster client handle (generation {})", generation);
        Ok(generation)
    }

    pub async fn state(&self) -> LifecycleState {
        match self.current.read().await.as_ref() {
            Some(handle) => LifecycleState::Ready {
                generation: handle.generation,
            },
            None => LifecycleState::Uninitialized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cluster_client::{builtin_types, MockClusterClient, MockFailure, MockOperation};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Barrier;

    #[tokio::test]
    async fn test_acquire_before_first_build_fails() {
        let manager = ClientManager::new(MockClusterClient::with_builtin_types());
        assert!(matches!(manager.acquire().await, Err(EngineError::Uninitialized)));
        assert_eq!(manager.state().await, LifecycleState::Uninitialized);
    }

    #[tokio::test]
    async fn test_connect_publishes_first_generation() {
        let manager = ClientManager::connect(MockClusterClient::with_builtin_types())
            .await
            .unwrap();
        assert_eq!(manager.acquire().await.unwrap().generation(), 1);
        assert_eq!(manager.state().await, LifecycleState::Ready { generation: 1 });
    }

    #[tokio::test]
    async fn test_failed_rebuild_keeps_previous_handle() {
        let cluster = MockClusterClient::with_builtin_types();
        let manager = ClientManager::connect(cluster.clone()).await.unwrap();

        cluster.fail_next(MockOperation::Connect, MockFailure::Server("unreachable".to_string()));
        assert!(manager.reinit().await.is_err());
        assert_eq!(manager.acquire().await.unwrap().generation(), 1);

        assert_eq!(manager.reinit().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reinit_waits_for_readers_and_publishes_atomically() {
        const READERS: usize = 4;
        let cluster = MockClusterClient::with_types(builtin_types());
        let manager = Arc::new(ClientManager::connect(cluster.clone()).await.unwrap());
        cluster.set_connect_delay(Duration::from_millis(50));

        // Every reader holds its guard until released through the barrier.
        let held = Arc::new(Barrier::new(READERS + 1));
        let release = Arc::new(Barrier::new(READERS + 1));
        let mut readers = Vec::new();
        for _ in 0..READERS {
            let manager = Arc::clone(&manager);
            let held = Arc::clone(&held);
            let release = Arc::clone(&release);
            readers.push(tokio::spawn(async move {
                let guard = manager.acquire().await.unwrap();
                held.wait().await;
                release.wait().await;
                guard.generation()
            }));
        }
        held.wait().await;

        let rebuild = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.reinit().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!rebuild.is_finished(), "rebuild must wait for active readers");

        release.wait().await;
        for reader in readers {
            assert_eq!(reader.await.unwrap(), 1);
        }
        assert_eq!(rebuild.await.unwrap().unwrap(), 2);

        // Readers arriving after the rebuild only ever see the new handle
        assert_eq!(manager.acquire().await.unwrap().generation(), 2);
        assert_eq!(cluster.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_readers_queued_behind_rebuild_see_new_handle() {
        let cluster = MockClusterClient::with_builtin_types();
        let manager = Arc::new(ClientManager::connect(cluster.clone()).await.unwrap());
        cluster.set_connect_delay(Duration::from_millis(100));

        let rebuild = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.reinit().await })
        };
        // Let the rebuild take the write lock before the reader arrives
        tokio::time::sleep(Duration::from_millis(20)).await;

        let generation = manager.acquire().await.unwrap().generation();
        assert_eq!(generation, 2);
        rebuild.await.unwrap().unwrap();
    }
}
