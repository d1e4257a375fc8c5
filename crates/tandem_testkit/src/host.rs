//! In-memory simulated host platform.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tandem_engine::{HostError, HostPlatform, HostResult};
use tandem_model::{AttributeSet, AttributeUpdate, EntityRef, EntityState, StateChange};
use tokio::sync::mpsc;

/// Buffer size of handed-out notification channels.
const SUBSCRIPTION_BUFFER: usize = 64;

/// An in-memory host platform for tests.
///
/// Entities are plain attribute snapshots. Writes are logged, applied, and
/// confirmed with a notification to subscribers, exactly like a real host
/// echoing a committed state transition back to its listeners. Failure
/// injection covers the host error taxonomy: missing entities, offline
/// entities, and rejected writes.
///
/// The host is cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct SimulatedHost {
    inner: Arc<HostInner>,
}

#[derive(Default)]
struct HostInner {
    entities: RwLock<HashMap<EntityRef, AttributeSet>>,
    offline: RwLock<HashSet<EntityRef>>,
    rejecting: RwLock<HashSet<EntityRef>>,
    subscribers: RwLock<HashMap<EntityRef, Vec<mpsc::Sender<StateChange>>>>,
    writes: RwLock<Vec<(EntityRef, AttributeUpdate)>>,
}

impl SimulatedHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity with an initial snapshot.
    ///
    /// No notification is emitted; registration is not a state change.
    pub fn add_entity(&self, entity: EntityRef, attributes: AttributeSet) {
        self.inner.entities.write().insert(entity, attributes);
    }

    /// Deregisters an entity and closes its notification streams.
    pub fn remove_entity(&self, entity: &EntityRef) {
        self.inner.entities.write().remove(entity);
        self.inner.subscribers.write().remove(entity);
    }

    /// Applies a state change as a human or device would, notifying
    /// subscribers.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not registered; tests should set up their
    /// entities first.
    pub fn set_state(&self, entity: &EntityRef, attributes: AttributeSet) {
        {
            let mut entities = self.inner.entities.write();
            let slot = entities
                .get_mut(entity)
                .unwrap_or_else(|| panic!("set_state on unregistered entity {entity}"));
            *slot = attributes.clone();
        }
        let change = if self.inner.offline.read().contains(entity) {
            StateChange::unavailable(entity.clone(), attributes)
        } else {
            StateChange::new(entity.clone(), attributes)
        };
        self.notify(change);
    }

    /// Marks an entity offline or back online, notifying subscribers of
    /// the availability transition.
    pub fn set_offline(&self, entity: &EntityRef, offline: bool) {
        if offline {
            self.inner.offline.write().insert(entity.clone());
        } else {
            self.inner.offline.write().remove(entity);
        }
        let attributes = self
            .inner
            .entities
            .read()
            .get(entity)
            .cloned()
            .unwrap_or_default();
        let change = if offline {
            StateChange::unavailable(entity.clone(), attributes)
        } else {
            StateChange::new(entity.clone(), attributes)
        };
        self.notify(change);
    }

    /// Makes the host reject writes to an entity as invalid.
    pub fn reject_writes(&self, entity: &EntityRef, reject: bool) {
        if reject {
            self.inner.rejecting.write().insert(entity.clone());
        } else {
            self.inner.rejecting.write().remove(entity);
        }
    }

    /// Returns an entity's current snapshot.
    pub fn attributes(&self, entity: &EntityRef) -> Option<AttributeSet> {
        self.inner.entities.read().get(entity).cloned()
    }

    /// Returns every write issued so far, in order.
    pub fn writes(&self) -> Vec<(EntityRef, AttributeUpdate)> {
        self.inner.writes.read().clone()
    }

    /// Returns the writes issued to one entity, in order.
    pub fn writes_to(&self, entity: &EntityRef) -> Vec<AttributeUpdate> {
        self.inner
            .writes
            .read()
            .iter()
            .filter(|(target, _)| target == entity)
            .map(|(_, update)| update.clone())
            .collect()
    }

    /// Returns the total number of writes issued.
    pub fn write_count(&self) -> usize {
        self.inner.writes.read().len()
    }

    /// Forgets the write log.
    pub fn clear_writes(&self) {
        self.inner.writes.write().clear();
    }

    /// Delivers a notification to the entity's subscribers, dropping
    /// disconnected ones.
    fn notify(&self, change: StateChange) {
        let mut subscribers = self.inner.subscribers.write();
        if let Some(senders) = subscribers.get_mut(&change.entity) {
            senders.retain(|sender| sender.try_send(change.clone()).is_ok());
        }
    }
}

#[async_trait]
impl HostPlatform for SimulatedHost {
    async fn lookup(&self, entity: &EntityRef) -> HostResult<EntityState> {
        let attributes = self
            .inner
            .entities
            .read()
            .get(entity)
            .cloned()
            .ok_or_else(|| HostError::NotFound(entity.clone()))?;
        if self.inner.offline.read().contains(entity) {
            Ok(EntityState::unavailable(attributes))
        } else {
            Ok(EntityState::new(attributes))
        }
    }

    fn subscribe(&self, entity: &EntityRef) -> mpsc::Receiver<StateChange> {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        self.inner
            .subscribers
            .write()
            .entry(entity.clone())
            .or_default()
            .push(tx);
        rx
    }

    async fn write(&self, entity: &EntityRef, update: AttributeUpdate) -> HostResult<()> {
        if self.inner.rejecting.read().contains(entity) {
            return Err(HostError::InvalidUpdate {
                entity: entity.clone(),
                reason: "rejected by test configuration".into(),
            });
        }
        if self.inner.offline.read().contains(entity) {
            return Err(HostError::Unavailable(entity.clone()));
        }

        let attributes = {
            let mut entities = self.inner.entities.write();
            match entities.get_mut(entity) {
                Some(slot) => {
                    update.apply_to(slot);
                    slot.clone()
                }
                None => return Err(HostError::NotFound(entity.clone())),
            }
        };

        self.inner
            .writes
            .write()
            .push((entity.clone(), update.clone()));

        // Confirmation notification, as the host echoes committed writes.
        self.notify(StateChange::new(entity.clone(), attributes));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[tokio::test]
    async fn lookup_and_write() {
        let host = SimulatedHost::new();
        let lamp = fixtures::light("desk");
        host.add_entity(lamp.clone(), fixtures::light_off());

        let state = host.lookup(&lamp).await.unwrap();
        assert!(state.available);
        assert_eq!(state.attributes.power(), Some(false));

        let update = AttributeUpdate {
            power: Some(true),
            level: Some(100),
            ..Default::default()
        };
        host.write(&lamp, update).await.unwrap();

        assert_eq!(host.write_count(), 1);
        assert_eq!(host.attributes(&lamp).unwrap().level(), Some(100));
    }

    #[tokio::test]
    async fn write_confirmations_reach_subscribers() {
        let host = SimulatedHost::new();
        let lamp = fixtures::light("desk");
        host.add_entity(lamp.clone(), fixtures::light_off());

        let mut stream = host.subscribe(&lamp);
        host.write(&lamp, AttributeUpdate::power_only(true))
            .await
            .unwrap();

        let change = stream.recv().await.unwrap();
        assert_eq!(change.entity, lamp);
        assert_eq!(change.attributes.power(), Some(true));
        assert!(change.available);
    }

    #[tokio::test]
    async fn offline_entities_fail_writes() {
        let host = SimulatedHost::new();
        let lamp = fixtures::light("desk");
        host.add_entity(lamp.clone(), fixtures::light_off());
        host.set_offline(&lamp, true);

        let err = host
            .write(&lamp, AttributeUpdate::power_only(true))
            .await
            .unwrap_err();
        assert_eq!(err, HostError::Unavailable(lamp.clone()));

        let state = host.lookup(&lamp).await.unwrap();
        assert!(!state.available);
    }

    #[tokio::test]
    async fn missing_entities_are_not_found() {
        let host = SimulatedHost::new();
        let ghost = fixtures::light("ghost");

        assert_eq!(
            host.lookup(&ghost).await.unwrap_err(),
            HostError::NotFound(ghost.clone())
        );
        assert_eq!(
            host.write(&ghost, AttributeUpdate::power_only(true))
                .await
                .unwrap_err(),
            HostError::NotFound(ghost)
        );
    }

    #[tokio::test]
    async fn rejected_writes_do_not_land() {
        let host = SimulatedHost::new();
        let lamp = fixtures::light("desk");
        host.add_entity(lamp.clone(), fixtures::light_off());
        host.reject_writes(&lamp, true);

        let err = host
            .write(&lamp, AttributeUpdate::power_only(true))
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::InvalidUpdate { .. }));
        assert_eq!(host.write_count(), 0);
        assert_eq!(host.attributes(&lamp).unwrap().power(), Some(false));
    }

    #[tokio::test]
    async fn removing_entity_closes_streams() {
        let host = SimulatedHost::new();
        let lamp = fixtures::light("desk");
        host.add_entity(lamp.clone(), fixtures::light_off());

        let mut stream = host.subscribe(&lamp);
        host.remove_entity(&lamp);

        assert!(stream.recv().await.is_none());
    }
}
