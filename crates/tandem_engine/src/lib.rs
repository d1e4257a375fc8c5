//! # Tandem Engine
//!
//! Bidirectional sync engine for paired smart-home entities.
//!
//! This crate provides:
//! - Per-pair coordinator state machine (idle → propagating → cooldown)
//! - Echo guard (self-caused change recognition, value-based)
//! - Cooldown gate (burst collapsing with discrete-control bypass)
//! - Pure attribute mapper with color-descriptor exclusivity
//! - Pair registry and periodic health monitor
//! - `SyncService` operator facade (manual sync, toggle, reload)
//!
//! ## Architecture
//!
//! Each configured pair runs as its own task that consumes a serialized
//! stream of commands, host notifications, and timer expirations. Pairs are
//! independent: nothing a pair does blocks another pair or the host's event
//! delivery.
//!
//! ## Key invariants
//!
//! - A write we issued never propagates back as a reverse write (echoes are
//!   recognized by value, not just by time)
//! - At most one propagation is in flight per pair
//! - Deferred changes are coalesced, never dropped
//! - Transient host failures degrade a pair silently; the health monitor
//!   recovers it without operator involvement

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cooldown;
mod echo;
mod error;
mod health;
mod host;
mod mapper;
mod pair;
mod registry;
mod service;

pub use config::EngineConfig;
pub use cooldown::{Admission, CooldownGate};
pub use echo::{EchoGuard, EchoVerdict};
pub use error::{EngineError, EngineResult};
pub use host::{HostError, HostPlatform, HostResult};
pub use mapper::map_attributes;
pub use pair::{PairHealth, PairState, PairStats, PairStatus};
pub use registry::{PairOverview, PairRegistry};
pub use service::SyncService;
