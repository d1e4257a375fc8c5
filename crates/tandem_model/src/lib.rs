//! # Tandem Model
//!
//! Data model for Tandem bidirectional entity synchronization.
//!
//! This crate provides:
//! - `EntityRef` references to host-managed entities
//! - The tagged attribute model (`AttributeValue`, `AttributeSet`)
//! - `AttributeUpdate` partial writes with a single color slot
//! - `StateChange` notifications from the host platform
//! - Pair identity and configuration (`PairId`, `PairConfig`, `SyncMode`)
//!
//! This is a pure types crate with no I/O operations. Attribute access is
//! fully typed: every attribute is one variant of a closed sum type, so
//! rules like "never send two color descriptors in one write" hold by
//! construction instead of by convention.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod attribute;
mod change;
mod domain;
mod entity;
mod pair;
mod update;

pub use attribute::{AttributeKind, AttributeSet, AttributeValue, ColorCommand};
pub use change::StateChange;
pub use domain::Domain;
pub use entity::{EntityRef, EntityState, ParseEntityRefError};
pub use pair::{PairConfig, PairId, Side, SyncMode};
pub use update::AttributeUpdate;
