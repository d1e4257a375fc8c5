//! Error types for the sync engine.

use crate::host::HostError;
use tandem_model::{EntityRef, PairId};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the sync engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configured entity reference cannot be found on the host.
    ///
    /// Recovered by the health monitor's retry loop; surfaced only as a
    /// degraded pair status, never as an operator-facing failure.
    #[error("entity cannot be resolved: {entity}")]
    Resolution {
        /// The unresolved entity.
        entity: EntityRef,
    },

    /// The host refused a write (invalid attribute combination).
    ///
    /// Not retried automatically: retrying an invalid payload is futile.
    #[error("write to {entity} rejected: {reason}")]
    WriteRejected {
        /// The write target.
        entity: EntityRef,
        /// The host's reason.
        reason: String,
    },

    /// The target entity is temporarily offline.
    ///
    /// The propagation attempt is dropped; the next genuine change or the
    /// health monitor covers recovery.
    #[error("entity temporarily unavailable: {entity}")]
    TransientUnavailable {
        /// The offline entity.
        entity: EntityRef,
    },

    /// A pair already exists for the same unordered entity set.
    #[error("pair already registered: {id}")]
    DuplicatePair {
        /// The conflicting pair id.
        id: PairId,
    },

    /// A pair must reference two distinct entities.
    #[error("a pair requires two distinct entities, got {entity} twice")]
    IdenticalEntities {
        /// The repeated entity.
        entity: EntityRef,
    },

    /// No pair with the given id is registered.
    #[error("pair not found: {id}")]
    PairNotFound {
        /// The unknown pair id.
        id: PairId,
    },

    /// The pair's task is gone (already shut down).
    #[error("pair task is no longer running: {id}")]
    PairStopped {
        /// The stopped pair id.
        id: PairId,
    },
}

impl EngineError {
    /// Returns true if the condition is expected to clear on its own.
    ///
    /// Transient errors never surface to operators; the pair degrades and
    /// the health monitor recovers it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Resolution { .. } | EngineError::TransientUnavailable { .. }
        )
    }
}

impl From<HostError> for EngineError {
    /// Classifies a host failure into the engine taxonomy.
    fn from(err: HostError) -> Self {
        match err {
            HostError::NotFound(entity) => EngineError::Resolution { entity },
            HostError::Unavailable(entity) => EngineError::TransientUnavailable { entity },
            HostError::InvalidUpdate { entity, reason } => {
                EngineError::WriteRejected { entity, reason }
            }
            HostError::PermissionDenied(entity) => EngineError::WriteRejected {
                entity,
                reason: "permission denied".into(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_model::Domain;

    fn entity() -> EntityRef {
        EntityRef::new(Domain::Light, "hall")
    }

    #[test]
    fn transient_classification() {
        assert!(EngineError::Resolution { entity: entity() }.is_transient());
        assert!(EngineError::TransientUnavailable { entity: entity() }.is_transient());
        assert!(!EngineError::WriteRejected {
            entity: entity(),
            reason: "conflicting color descriptors".into()
        }
        .is_transient());
        assert!(!EngineError::DuplicatePair {
            id: PairId::for_entities(&entity(), &EntityRef::new(Domain::Switch, "hall")),
        }
        .is_transient());
    }

    #[test]
    fn host_errors_classify_into_the_taxonomy() {
        assert!(matches!(
            EngineError::from(HostError::NotFound(entity())),
            EngineError::Resolution { .. }
        ));
        assert!(matches!(
            EngineError::from(HostError::Unavailable(entity())),
            EngineError::TransientUnavailable { .. }
        ));
        assert!(matches!(
            EngineError::from(HostError::PermissionDenied(entity())),
            EngineError::WriteRejected { .. }
        ));
        assert!(matches!(
            EngineError::from(HostError::InvalidUpdate {
                entity: entity(),
                reason: "two color descriptors".into()
            }),
            EngineError::WriteRejected { .. }
        ));
    }

    #[test]
    fn error_display() {
        let err = EngineError::Resolution { entity: entity() };
        assert_eq!(err.to_string(), "entity cannot be resolved: light.hall");
    }
}
