//! The pair registry.
//!
//! Holds the set of configured pairs and their runtime handles. This map
//! is the only structure shared across pair tasks; the lock is taken for
//! structural changes and status reads only, never across a propagation.

use crate::error::{EngineError, EngineResult};
use crate::pair::{PairCommand, PairStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tandem_model::{PairConfig, PairId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Runtime handle to one pair task.
pub(crate) struct PairHandle {
    /// The pair's definition.
    pub(crate) config: PairConfig,
    /// Command channel into the pair task.
    pub(crate) commands: mpsc::Sender<PairCommand>,
    /// Status snapshot the task keeps current.
    pub(crate) status: Arc<RwLock<PairStatus>>,
    /// The task itself, awaited on shutdown.
    pub(crate) task: JoinHandle<()>,
}

/// A pair's definition plus its current runtime status.
#[derive(Debug, Clone)]
pub struct PairOverview {
    /// The pair's definition.
    pub config: PairConfig,
    /// Status snapshot at the time of listing.
    pub status: PairStatus,
}

/// The set of registered pairs.
#[derive(Default)]
pub struct PairRegistry {
    pairs: RwLock<HashMap<PairId, PairHandle>>,
}

impl PairRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pair handle.
    ///
    /// Rejects a second pair for the same unordered entity set: the id is
    /// order-independent, so `(a, b)` and `(b, a)` collide here.
    pub(crate) fn insert(&self, handle: PairHandle) -> EngineResult<()> {
        let mut pairs = self.pairs.write();
        let id = handle.config.id.clone();
        if pairs.contains_key(&id) {
            return Err(EngineError::DuplicatePair { id });
        }
        pairs.insert(id, handle);
        Ok(())
    }

    /// Removes a pair, returning its handle for teardown.
    pub(crate) fn remove(&self, id: &PairId) -> EngineResult<PairHandle> {
        self.pairs
            .write()
            .remove(id)
            .ok_or_else(|| EngineError::PairNotFound { id: id.clone() })
    }

    /// Removes and returns every handle; used by reload and shutdown.
    pub(crate) fn drain(&self) -> Vec<PairHandle> {
        self.pairs.write().drain().map(|(_, handle)| handle).collect()
    }

    /// Returns the command sender of a pair.
    pub(crate) fn commands(&self, id: &PairId) -> EngineResult<mpsc::Sender<PairCommand>> {
        self.pairs
            .read()
            .get(id)
            .map(|handle| handle.commands.clone())
            .ok_or_else(|| EngineError::PairNotFound { id: id.clone() })
    }

    /// Returns the command senders of all pairs.
    pub(crate) fn all_commands(&self) -> Vec<mpsc::Sender<PairCommand>> {
        self.pairs
            .read()
            .values()
            .map(|handle| handle.commands.clone())
            .collect()
    }

    /// Flips a pair's configured `enabled` flag, returning the new value.
    pub(crate) fn set_enabled(&self, id: &PairId, enabled: bool) -> EngineResult<()> {
        let mut pairs = self.pairs.write();
        let handle = pairs
            .get_mut(id)
            .ok_or_else(|| EngineError::PairNotFound { id: id.clone() })?;
        handle.config.enabled = enabled;
        Ok(())
    }

    /// Returns the configured `enabled` flag of a pair.
    pub(crate) fn is_enabled(&self, id: &PairId) -> EngineResult<bool> {
        self.pairs
            .read()
            .get(id)
            .map(|handle| handle.config.enabled)
            .ok_or_else(|| EngineError::PairNotFound { id: id.clone() })
    }

    /// Lists every pair with its current status.
    pub fn list(&self) -> Vec<PairOverview> {
        let pairs = self.pairs.read();
        let mut overviews: Vec<PairOverview> = pairs
            .values()
            .map(|handle| PairOverview {
                config: handle.config.clone(),
                status: handle.status.read().clone(),
            })
            .collect();
        overviews.sort_by(|x, y| x.config.id.cmp(&y.config.id));
        overviews
    }

    /// Returns the status snapshot of one pair.
    pub fn status(&self, id: &PairId) -> EngineResult<PairStatus> {
        self.pairs
            .read()
            .get(id)
            .map(|handle| handle.status.read().clone())
            .ok_or_else(|| EngineError::PairNotFound { id: id.clone() })
    }

    /// Returns the number of registered pairs.
    pub fn len(&self) -> usize {
        self.pairs.read().len()
    }

    /// Returns true if no pairs are registered.
    pub fn is_empty(&self) -> bool {
        self.pairs.read().is_empty()
    }
}
