//! Echo recognition for self-caused change notifications.
//!
//! Every write the coordinator issues comes back as a change notification
//! for the written entity. Re-propagating that confirmation would ping-pong
//! state between the two sides forever. The guard records what each write
//! is expected to look like and classifies later notifications by value:
//! a matching notification is an echo, a differing one is a genuine change
//! even if it arrives inside the recognition window.

use std::time::{Duration, Instant};
use tandem_model::{AttributeSet, AttributeUpdate, Side};

/// Classification of an incoming change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoVerdict {
    /// The notification is the expected result of our own write.
    Echo,
    /// The notification is an independent change and must propagate.
    Genuine,
}

/// The recorded expectation for one in-flight write.
#[derive(Debug, Clone)]
struct Expectation {
    /// The side the write was issued to.
    target: Side,
    /// What the write is expected to leave on the target.
    update: AttributeUpdate,
    /// When the write was issued.
    issued_at: Instant,
}

/// Recognizes confirmations of the engine's own writes.
#[derive(Debug)]
pub struct EchoGuard {
    window: Duration,
    expectation: Option<Expectation>,
}

impl EchoGuard {
    /// Creates a guard with the given recognition window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            expectation: None,
        }
    }

    /// Records the expectation for a write about to be issued to `target`.
    ///
    /// At most one write is in flight per pair, so a new expectation
    /// replaces any stale one.
    pub fn record(&mut self, target: Side, update: AttributeUpdate) {
        self.expectation = Some(Expectation {
            target,
            update,
            issued_at: Instant::now(),
        });
    }

    /// Forgets the current expectation.
    ///
    /// Called when a write fails: no confirmation is coming.
    pub fn clear(&mut self) {
        self.expectation = None;
    }

    /// Returns true if an expectation is currently recorded.
    pub fn is_armed(&self) -> bool {
        self.expectation.is_some()
    }

    /// Classifies a change notification observed on `side`.
    ///
    /// An echo consumes the expectation. A notification on the expected
    /// side that does not match the written values also consumes it (the
    /// write landed and was immediately overridden); a notification on the
    /// other side leaves the expectation armed.
    pub fn classify(&mut self, side: Side, observed: &AttributeSet) -> EchoVerdict {
        let Some(expectation) = self.expectation.take() else {
            return EchoVerdict::Genuine;
        };

        if expectation.issued_at.elapsed() > self.window {
            return EchoVerdict::Genuine;
        }

        if expectation.target != side {
            // A change on the other side leaves the expectation armed.
            self.expectation = Some(expectation);
            return EchoVerdict::Genuine;
        }

        if expectation.update.consistent_with(observed) {
            EchoVerdict::Echo
        } else {
            EchoVerdict::Genuine
        }
    }
}
