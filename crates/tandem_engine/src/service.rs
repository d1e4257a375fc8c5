//! The operator-facing service facade.
//!
//! `SyncService` owns the pair registry, the host handle, and the health
//! monitor; everything the host platform or an operator can do to the
//! engine goes through here.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::health::HealthMonitor;
use crate::host::HostPlatform;
use crate::pair::{self, PairCommand, PairStatus};
use crate::registry::{PairHandle, PairOverview, PairRegistry};
use std::sync::Arc;
use tandem_model::{EntityRef, PairConfig, PairId, Side};
use tracing::{info, warn};

/// The bidirectional sync service.
///
/// # Example
///
/// ```rust,ignore
/// use tandem_engine::{EngineConfig, SyncService};
///
/// let service = SyncService::new(host, EngineConfig::default());
/// let id = service.add_pair(entity_a, entity_b)?;
/// service.manual_sync(&id, Side::A).await?;
/// ```
pub struct SyncService {
    host: Arc<dyn HostPlatform>,
    config: EngineConfig,
    registry: Arc<PairRegistry>,
    health: Option<HealthMonitor>,
}

impl SyncService {
    /// Creates a service and starts its health monitor.
    pub fn new(host: Arc<dyn HostPlatform>, config: EngineConfig) -> Self {
        let registry = Arc::new(PairRegistry::new());
        let health = HealthMonitor::start(Arc::clone(&registry), config.health_interval);
        Self {
            host,
            config,
            registry,
            health: Some(health),
        }
    }

    /// Configures a new enabled pair for two entities.
    ///
    /// The sync mode is derived from the two domains. Entities missing on
    /// the host are not an error: the pair starts pending and the health
    /// monitor activates it once both resolve.
    pub fn add_pair(&self, entity_a: EntityRef, entity_b: EntityRef) -> EngineResult<PairId> {
        if entity_a == entity_b {
            return Err(EngineError::IdenticalEntities { entity: entity_a });
        }
        let config = PairConfig::new(entity_a, entity_b);
        let id = config.id.clone();
        self.register(config)?;
        info!(%id, "pair added");
        Ok(id)
    }

    /// Registers a pair from an existing definition, honoring its
    /// `enabled` flag.
    pub fn register(&self, config: PairConfig) -> EngineResult<()> {
        let (commands, status, task) =
            pair::spawn(config.clone(), self.config.clone(), Arc::clone(&self.host));
        let handle = PairHandle {
            config,
            commands,
            status,
            task,
        };
        // On a duplicate the fresh task dies with its dropped handle: the
        // command channel closes and the run loop exits.
        self.registry.insert(handle)
    }

    /// Removes a pair, detaching its listeners and cancelling its timers.
    pub fn remove_pair(&self, id: &PairId) -> EngineResult<()> {
        let handle = self.registry.remove(id)?;
        let _ = handle.commands.try_send(PairCommand::Shutdown);
        info!(%id, "pair removed");
        Ok(())
    }

    /// Sets a pair's enabled flag.
    ///
    /// Disabling lets any in-flight propagation finish, then detaches
    /// listeners and cancels timers until re-enabled.
    pub async fn set_enabled(&self, id: &PairId, enabled: bool) -> EngineResult<()> {
        self.registry.set_enabled(id, enabled)?;
        self.send(id, PairCommand::SetEnabled(enabled)).await
    }

    /// Flips a pair's enabled flag, returning the new value.
    pub async fn toggle(&self, id: &PairId) -> EngineResult<bool> {
        let enabled = !self.registry.is_enabled(id)?;
        self.set_enabled(id, enabled).await?;
        Ok(enabled)
    }

    /// Forces one propagation pass from the given side, regardless of
    /// cooldown state.
    pub async fn manual_sync(&self, id: &PairId, from: Side) -> EngineResult<()> {
        self.send(id, PairCommand::ManualSync(from)).await
    }

    /// Lists all pairs with their current status.
    pub fn list(&self) -> Vec<PairOverview> {
        self.registry.list()
    }

    /// Returns one pair's status snapshot.
    pub fn status(&self, id: &PairId) -> EngineResult<PairStatus> {
        self.registry.status(id)
    }

    /// Rebuilds the registry from a fresh configuration.
    ///
    /// All existing pair tasks are torn down (listeners detached, timers
    /// cancelled) and every supplied definition is registered anew, without
    /// a process restart. Duplicate definitions are skipped with a warning
    /// rather than aborting the reload halfway.
    pub async fn reload(&self, configs: Vec<PairConfig>) -> EngineResult<()> {
        let count = configs.len();
        self.teardown_pairs().await;
        for config in configs {
            let id = config.id.clone();
            if let Err(err) = self.register(config) {
                warn!(%id, %err, "skipping pair during reload");
            }
        }
        info!(pairs = count, "registry reloaded");
        Ok(())
    }

    /// Stops the health monitor and tears down every pair.
    pub async fn shutdown(mut self) {
        if let Some(health) = self.health.take() {
            health.stop();
        }
        self.teardown_pairs().await;
        info!("sync service stopped");
    }

    async fn teardown_pairs(&self) {
        for handle in self.registry.drain() {
            let _ = handle.commands.try_send(PairCommand::Shutdown);
            drop(handle.commands);
            // In-flight host writes are not retracted; the task finishes
            // its current event and exits.
            let _ = handle.task.await;
        }
    }

    async fn send(&self, id: &PairId, command: PairCommand) -> EngineResult<()> {
        let sender = self.registry.commands(id)?;
        sender
            .send(command)
            .await
            .map_err(|_| EngineError::PairStopped { id: id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, HostResult};
    use async_trait::async_trait;
    use tandem_model::{AttributeUpdate, Domain, EntityState, StateChange};
    use tokio::sync::mpsc;

    /// A host with no entities at all; enough for registry-level tests.
    struct EmptyHost;

    #[async_trait]
    impl HostPlatform for EmptyHost {
        async fn lookup(&self, entity: &EntityRef) -> HostResult<EntityState> {
            Err(HostError::NotFound(entity.clone()))
        }

        fn subscribe(&self, _entity: &EntityRef) -> mpsc::Receiver<StateChange> {
            mpsc::channel(1).1
        }

        async fn write(&self, entity: &EntityRef, _update: AttributeUpdate) -> HostResult<()> {
            Err(HostError::NotFound(entity.clone()))
        }
    }

    fn service() -> SyncService {
        SyncService::new(Arc::new(EmptyHost), EngineConfig::default())
    }

    #[tokio::test]
    async fn identical_entities_rejected() {
        let service = service();
        let entity = EntityRef::new(Domain::Light, "hall");
        let err = service.add_pair(entity.clone(), entity).unwrap_err();
        assert!(matches!(err, EngineError::IdenticalEntities { .. }));
        assert!(service.list().is_empty());
    }

    #[tokio::test]
    async fn duplicate_pair_rejected() {
        let service = service();
        let a = EntityRef::new(Domain::Light, "hall");
        let b = EntityRef::new(Domain::Switch, "hall");

        service.add_pair(a.clone(), b.clone()).unwrap();
        let err = service.add_pair(b, a).unwrap_err();
        assert!(matches!(err, EngineError::DuplicatePair { .. }));
        assert_eq!(service.list().len(), 1);
    }

    #[tokio::test]
    async fn operations_on_unknown_pair_fail() {
        let service = service();
        let id = PairId::for_entities(
            &EntityRef::new(Domain::Light, "x"),
            &EntityRef::new(Domain::Light, "y"),
        );
        assert!(matches!(
            service.status(&id),
            Err(EngineError::PairNotFound { .. })
        ));
        assert!(matches!(
            service.manual_sync(&id, Side::A).await,
            Err(EngineError::PairNotFound { .. })
        ));
        assert!(matches!(
            service.remove_pair(&id),
            Err(EngineError::PairNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn remove_then_shutdown() {
        let service = service();
        let a = EntityRef::new(Domain::Light, "one");
        let b = EntityRef::new(Domain::Light, "two");
        let id = service.add_pair(a, b).unwrap();

        service.remove_pair(&id).unwrap();
        assert!(service.list().is_empty());
        service.shutdown().await;
    }
}
