//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration shared by all pairs of a service.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Minimum spacing between propagated writes for a pair.
    ///
    /// Bursts of changes inside this window are collapsed into a single
    /// propagation carrying the latest snapshot. Discrete controls
    /// (plain switches) bypass it.
    pub cooldown: Duration,
    /// How long a just-issued write's confirmation is recognized as an echo.
    ///
    /// Bounded by the cooldown interval; a confirmation arriving later than
    /// this is treated as a genuine change.
    pub echo_window: Duration,
    /// Interval of the periodic health check over all pairs.
    pub health_interval: Duration,
    /// Buffer size of per-pair command and notification channels.
    pub channel_capacity: usize,
}

impl EngineConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self {
            cooldown: Duration::from_millis(100),
            echo_window: Duration::from_millis(100),
            health_interval: Duration::from_secs(60),
            channel_capacity: 32,
        }
    }

    /// Sets the cooldown interval.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Sets the echo recognition window.
    pub fn with_echo_window(mut self, window: Duration) -> Self {
        self.echo_window = window;
        self
    }

    /// Sets the health check interval.
    pub fn with_health_interval(mut self, interval: Duration) -> Self {
        self.health_interval = interval;
        self
    }

    /// Sets the channel capacity.
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = EngineConfig::new()
            .with_cooldown(Duration::from_millis(250))
            .with_echo_window(Duration::from_millis(200))
            .with_health_interval(Duration::from_secs(30))
            .with_channel_capacity(8);

        assert_eq!(config.cooldown, Duration::from_millis(250));
        assert_eq!(config.echo_window, Duration::from_millis(200));
        assert_eq!(config.health_interval, Duration::from_secs(30));
        assert_eq!(config.channel_capacity, 8);
    }

    #[test]
    fn defaults_are_sane() {
        let config = EngineConfig::default();
        // The echo window must not outlast the cooldown, or a deferred
        // propagation could race its own confirmation.
        assert!(config.echo_window <= config.cooldown);
    }
}
