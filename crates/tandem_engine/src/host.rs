//! Host platform boundary.
//!
//! The host platform owns the entity registry, the state store, and event
//! delivery. The engine only consumes this trait; `tandem_testkit`
//! provides an in-memory implementation for tests.

use async_trait::async_trait;
use tandem_model::{AttributeUpdate, EntityRef, EntityState, StateChange};
use thiserror::Error;
use tokio::sync::mpsc;

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Errors reported by the host platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The entity is not in the host registry.
    #[error("entity not found: {0}")]
    NotFound(EntityRef),

    /// The entity exists but is currently offline.
    #[error("entity unavailable: {0}")]
    Unavailable(EntityRef),

    /// The host refused the attribute combination.
    #[error("invalid update for {entity}: {reason}")]
    InvalidUpdate {
        /// The write target.
        entity: EntityRef,
        /// The host's reason.
        reason: String,
    },

    /// The caller may not write to this entity.
    #[error("permission denied writing to {0}")]
    PermissionDenied(EntityRef),
}

impl HostError {
    /// Returns true if the condition is expected to clear on its own.
    pub fn is_transient(&self) -> bool {
        matches!(self, HostError::Unavailable(_) | HostError::NotFound(_))
    }
}

/// The host platform as seen by the engine.
///
/// All three operations mirror what the host exposes to integrations:
/// entity lookup, change subscription, and attribute writes. Handling a
/// notification must never block the host's event delivery, which is why
/// `subscribe` hands out a buffered channel the host pushes into.
#[async_trait]
pub trait HostPlatform: Send + Sync {
    /// Looks up an entity's current state.
    async fn lookup(&self, entity: &EntityRef) -> HostResult<EntityState>;

    /// Subscribes to state-change notifications for an entity.
    ///
    /// The returned receiver yields every committed state transition,
    /// including confirmations of this engine's own writes. Dropping the
    /// receiver detaches the listener.
    fn subscribe(&self, entity: &EntityRef) -> mpsc::Receiver<StateChange>;

    /// Issues a partial attribute write to an entity.
    async fn write(&self, entity: &EntityRef, update: AttributeUpdate) -> HostResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_model::Domain;

    #[test]
    fn transient_host_errors() {
        let entity = EntityRef::new(Domain::Fan, "attic");
        assert!(HostError::Unavailable(entity.clone()).is_transient());
        assert!(HostError::NotFound(entity.clone()).is_transient());
        assert!(!HostError::PermissionDenied(entity.clone()).is_transient());
        assert!(!HostError::InvalidUpdate {
            entity,
            reason: "two color descriptors".into()
        }
        .is_transient());
    }
}
