//! # Tandem Testkit
//!
//! Test utilities for Tandem.
//!
//! This crate provides:
//! - [`SimulatedHost`], an in-memory host platform with write logging and
//!   failure injection
//! - Entity fixtures and snapshot builders
//! - Tracing initialization for tests
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tandem_testkit::{fixtures, SimulatedHost};
//!
//! let host = SimulatedHost::new();
//! host.add_entity(fixtures::light("desk"), fixtures::light_on(128));
//! host.set_state(&fixtures::light("desk"), fixtures::light_on(255));
//! assert_eq!(host.write_count(), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
mod host;

pub use host::SimulatedHost;
