//! State-change notifications delivered by the host platform.

use crate::attribute::AttributeSet;
use crate::entity::EntityRef;
use std::time::Instant;

/// A single state-change notification for a watched entity.
///
/// Notifications are emitted by the host after a state transition commits,
/// whether the transition came from a human, a device, or one of our own
/// writes (the confirmation echo).
#[derive(Debug, Clone)]
pub struct StateChange {
    /// The entity that changed.
    pub entity: EntityRef,
    /// The entity's new attribute snapshot.
    pub attributes: AttributeSet,
    /// Whether the entity is reachable after the change.
    pub available: bool,
    /// When the host emitted the notification.
    pub at: Instant,
}

impl StateChange {
    /// Creates a notification for an available entity, stamped now.
    pub fn new(entity: EntityRef, attributes: AttributeSet) -> Self {
        Self {
            entity,
            attributes,
            available: true,
            at: Instant::now(),
        }
    }

    /// Creates a notification marking the entity unavailable.
    ///
    /// The snapshot carries the last attributes the host saw.
    pub fn unavailable(entity: EntityRef, attributes: AttributeSet) -> Self {
        Self {
            entity,
            attributes,
            available: false,
            at: Instant::now(),
        }
    }
}
