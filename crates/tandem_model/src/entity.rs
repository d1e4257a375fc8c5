//! Entity references and host-side entity state.

use crate::attribute::AttributeSet;
use crate::domain::Domain;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors from parsing an entity reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseEntityRefError {
    /// The reference is not of the form `domain.object_id`.
    #[error("entity reference must be of the form domain.object_id: {0:?}")]
    MissingSeparator(String),

    /// The domain part is not a known domain.
    #[error("unknown domain: {0:?}")]
    UnknownDomain(String),

    /// The object id part is empty.
    #[error("entity reference has an empty object id")]
    EmptyObjectId,
}

/// An opaque reference to a host-managed entity.
///
/// References carry a domain tag plus a host-scoped object id and render
/// as `domain.object_id` (e.g. `light.kitchen`), the form the host platform
/// uses in its own registry and configuration storage.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityRef {
    domain: Domain,
    object_id: String,
}

impl EntityRef {
    /// Creates an entity reference from a domain and object id.
    pub fn new(domain: Domain, object_id: impl Into<String>) -> Self {
        Self {
            domain,
            object_id: object_id.into(),
        }
    }

    /// Returns the domain tag.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Returns the host-scoped object id.
    pub fn object_id(&self) -> &str {
        &self.object_id
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.domain, self.object_id)
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({self})")
    }
}

impl FromStr for EntityRef {
    type Err = ParseEntityRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, object_id) = s
            .split_once('.')
            .ok_or_else(|| ParseEntityRefError::MissingSeparator(s.to_string()))?;
        if object_id.is_empty() {
            return Err(ParseEntityRefError::EmptyObjectId);
        }
        Ok(Self {
            domain: domain.parse()?,
            object_id: object_id.to_string(),
        })
    }
}

impl TryFrom<String> for EntityRef {
    type Error = ParseEntityRefError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EntityRef> for String {
    fn from(entity: EntityRef) -> Self {
        entity.to_string()
    }
}

/// A point-in-time view of a host entity, as returned by lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    /// Current attribute snapshot.
    pub attributes: AttributeSet,
    /// Whether the entity is currently reachable.
    ///
    /// An entity that exists in the host registry may still be offline;
    /// lookups succeed for it but writes will not land.
    pub available: bool,
}

impl EntityState {
    /// Creates an available entity state.
    pub fn new(attributes: AttributeSet) -> Self {
        Self {
            attributes,
            available: true,
        }
    }

    /// Creates an unavailable entity state.
    pub fn unavailable(attributes: AttributeSet) -> Self {
        Self {
            attributes,
            available: false,
        }
    }
}
