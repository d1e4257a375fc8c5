//! Cooldown gating between propagated writes.
//!
//! A dimmer being dragged emits a burst of change notifications; writing
//! each one through would hammer the target and feel glitchy. The gate
//! opens a window after each propagated write; changes inside the window
//! defer (the coordinator retains the latest snapshot) and a single write
//! fires at expiry. Plain switches bypass the gate: an on/off flip has no
//! settling process, and delaying it is perceptible as lag.

use std::time::Duration;
use tokio::time::Instant;

/// Outcome of asking the gate whether a propagation may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// No window is open; propagate immediately.
    PropagateNow,
    /// A window is open; defer until the deadline.
    Defer {
        /// When the open window ends.
        until: Instant,
    },
}

/// Per-pair cooldown gate.
#[derive(Debug)]
pub struct CooldownGate {
    interval: Duration,
    until: Option<Instant>,
}

impl CooldownGate {
    /// Creates a gate with the given window length.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            until: None,
        }
    }

    /// Asks whether a propagation may fire now.
    ///
    /// `discrete_source` marks changes from instantaneous controls, which
    /// are always admitted and never open or consult a window.
    pub fn admit(&mut self, discrete_source: bool) -> Admission {
        if discrete_source {
            return Admission::PropagateNow;
        }
        match self.until {
            Some(until) if until > Instant::now() => Admission::Defer { until },
            _ => {
                self.until = None;
                Admission::PropagateNow
            }
        }
    }

    /// Opens a new window, called after a propagated write fires.
    pub fn open(&mut self) {
        self.until = Some(Instant::now() + self.interval);
    }

    /// Returns the open window's deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.until
    }

    /// Closes the window without waiting it out.
    ///
    /// Called on pair disable and teardown so no timer outlives the pair.
    pub fn cancel(&mut self) {
        self.until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn admits_when_idle() {
        let mut gate = CooldownGate::new(Duration::from_millis(100));
        assert_eq!(gate.admit(false), Admission::PropagateNow);
        assert!(gate.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn defers_inside_window() {
        let mut gate = CooldownGate::new(Duration::from_millis(100));
        gate.open();

        match gate.admit(false) {
            Admission::Defer { until } => {
                assert_eq!(until, gate.deadline().unwrap());
            }
            Admission::PropagateNow => panic!("window should be open"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn admits_after_expiry() {
        let mut gate = CooldownGate::new(Duration::from_millis(100));
        gate.open();

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(gate.admit(false), Admission::PropagateNow);
        assert!(gate.deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn discrete_sources_bypass() {
        let mut gate = CooldownGate::new(Duration::from_millis(100));
        gate.open();

        assert_eq!(gate.admit(true), Admission::PropagateNow);
        // The window stays open for non-discrete sources.
        assert!(matches!(gate.admit(false), Admission::Defer { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_closes_window() {
        let mut gate = CooldownGate::new(Duration::from_millis(100));
        gate.open();
        gate.cancel();
        assert_eq!(gate.admit(false), Admission::PropagateNow);
    }
}
