//! Pair identity and configuration.

use crate::domain::Domain;
use crate::entity::EntityRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One side of a synchronization pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The first entity.
    A,
    /// The second entity.
    B,
}

impl Side {
    /// Returns the other side.
    pub fn opposite(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
        }
    }
}

/// How much of the attribute surface a pair synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// All domain-relevant attributes (same-domain pairs).
    Full,
    /// Coarse on/off state only (dissimilar but compatible domains).
    Basic,
}

impl SyncMode {
    /// Derives the mode for a pair of domains.
    ///
    /// Equal domains synchronize fully; anything else falls back to the
    /// lower-capability on/off mirror. The mode is fixed at pair creation.
    pub fn derive(a: Domain, b: Domain) -> SyncMode {
        if a == b {
            SyncMode::Full
        } else {
            SyncMode::Basic
        }
    }
}

/// Unique identifier of a synchronization pair.
///
/// Derived from the two entity references, order-independently: the same
/// two entities always produce the same id no matter which was named first.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(String);

impl PairId {
    /// Derives the id for an unordered pair of entity references.
    pub fn for_entities(a: &EntityRef, b: &EntityRef) -> Self {
        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{first}<->{second}"))
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PairId({})", self.0)
    }
}

/// The persisted definition of a synchronization pair.
///
/// The host platform owns configuration storage; this type only fixes the
/// shape of what gets stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairConfig {
    /// Unique pair id.
    pub id: PairId,
    /// First entity.
    pub entity_a: EntityRef,
    /// Second entity.
    pub entity_b: EntityRef,
    /// Whether the pair propagates changes. Disabled pairs stay registered.
    pub enabled: bool,
    /// Attribute surface, derived once at creation.
    pub sync_mode: SyncMode,
}

impl PairConfig {
    /// Creates an enabled pair definition for two entities.
    pub fn new(entity_a: EntityRef, entity_b: EntityRef) -> Self {
        Self {
            id: PairId::for_entities(&entity_a, &entity_b),
            sync_mode: SyncMode::derive(entity_a.domain(), entity_b.domain()),
            entity_a,
            entity_b,
            enabled: true,
        }
    }

    /// Returns the entity on the given side.
    pub fn entity(&self, side: Side) -> &EntityRef {
        match side {
            Side::A => &self.entity_a,
            Side::B => &self.entity_b,
        }
    }

    /// Returns the side a changed entity belongs to, if it is part of
    /// this pair.
    pub fn side_of(&self, entity: &EntityRef) -> Option<Side> {
        if entity == &self.entity_a {
            Some(Side::A)
        } else if entity == &self.entity_b {
            Some(Side::B)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light(id: &str) -> EntityRef {
        EntityRef::new(Domain::Light, id)
    }

    fn switch(id: &str) -> EntityRef {
        EntityRef::new(Domain::Switch, id)
    }

    #[test]
    fn pair_id_is_order_independent() {
        let a = light("desk");
        let b = switch("desk");
        assert_eq!(PairId::for_entities(&a, &b), PairId::for_entities(&b, &a));
    }

    #[test]
    fn pair_ids_differ_per_pair() {
        let a = light("desk");
        assert_ne!(
            PairId::for_entities(&a, &switch("desk")),
            PairId::for_entities(&a, &switch("shelf"))
        );
    }

    #[test]
    fn sync_mode_derivation() {
        assert_eq!(
            SyncMode::derive(Domain::Light, Domain::Light),
            SyncMode::Full
        );
        assert_eq!(
            SyncMode::derive(Domain::Switch, Domain::Light),
            SyncMode::Basic
        );
    }

    #[test]
    fn side_lookup() {
        let config = PairConfig::new(light("one"), light("two"));
        assert_eq!(config.side_of(&light("one")), Some(Side::A));
        assert_eq!(config.side_of(&light("two")), Some(Side::B));
        assert_eq!(config.side_of(&light("three")), None);
        assert_eq!(config.entity(Side::B), &light("two"));
    }

    #[test]
    fn config_serde_round_trip() {
        let config = PairConfig::new(light("hall"), switch("hall"));
        let json = serde_json::to_string(&config).unwrap();
        let back: PairConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert_eq!(back.sync_mode, SyncMode::Basic);
    }
}
