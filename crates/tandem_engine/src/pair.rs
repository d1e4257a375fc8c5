//! Per-pair sync coordinator.
//!
//! Each configured pair runs as one task owning the full runtime state:
//! subscriptions, last-known snapshots, the echo guard, the cooldown gate,
//! and the state machine. Everything that happens to a pair (host
//! notifications, operator commands, cooldown expiry, health checks) is
//! serialized through this task, so the state machine never sees two
//! events at once and at most one write is in flight per pair.

use crate::config::EngineConfig;
use crate::cooldown::{Admission, CooldownGate};
use crate::echo::{EchoGuard, EchoVerdict};
use crate::error::EngineError;
use crate::host::{HostError, HostPlatform};
use crate::mapper::map_attributes;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use std::time::Instant as StdInstant;
use tandem_model::{AttributeSet, PairConfig, Side, StateChange};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn, Instrument};

/// Commands delivered to a pair task.
#[derive(Debug)]
pub(crate) enum PairCommand {
    /// Force one propagation pass from the given side, ignoring cooldown.
    ManualSync(Side),
    /// Enable or disable propagation.
    SetEnabled(bool),
    /// Periodic health probe from the monitor.
    HealthCheck,
    /// Stop the pair task.
    Shutdown,
}

/// Coordinator state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairState {
    /// Waiting for a genuine change.
    Idle,
    /// A write is in flight in the given direction (value is the source side).
    Propagating(Side),
    /// The post-propagation window is open; changes defer and coalesce.
    Cooldown,
}

/// Pair availability as tracked by activation and the health monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairHealth {
    /// Entities were unresolved at registration; activation pending.
    Pending,
    /// Both entities resolved and available; listeners attached.
    Active,
    /// A previously reachable entity is missing or offline; propagation
    /// suspended while recovery is polled.
    Degraded,
    /// The pair is administratively disabled.
    Disabled,
}

/// Counters for one pair's synchronization activity.
#[derive(Debug, Clone, Default)]
pub struct PairStats {
    /// Writes successfully issued to the host.
    pub propagations: u64,
    /// Writes the host refused or could not deliver.
    pub failed_propagations: u64,
    /// Self-caused confirmations recognized and consumed.
    pub echoes_suppressed: u64,
    /// Changes deferred into an open cooldown window.
    pub changes_coalesced: u64,
    /// Propagations skipped because the target already matched.
    pub noops_skipped: u64,
    /// When the last successful propagation happened.
    pub last_propagation: Option<StdInstant>,
    /// The most recent non-transient failure, for diagnosis.
    pub last_error: Option<String>,
}

/// A point-in-time view of a pair's runtime state.
#[derive(Debug, Clone)]
pub struct PairStatus {
    /// Availability of the pair.
    pub health: PairHealth,
    /// Current state machine state.
    pub state: PairState,
    /// Which side caused the most recent propagated write, while the
    /// cooldown window lasts.
    pub last_origin: Option<Side>,
    /// Activity counters.
    pub stats: PairStats,
}

/// Per-side storage; sides are a closed two-element space.
#[derive(Debug, Default)]
struct SideMap<T> {
    a: T,
    b: T,
}

impl<T> SideMap<T> {
    fn get(&self, side: Side) -> &T {
        match side {
            Side::A => &self.a,
            Side::B => &self.b,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }
}

/// What woke the pair task up.
enum Wake {
    Command(PairCommand),
    CommandsClosed,
    Change(Side, Option<StateChange>),
    CooldownExpired,
}

/// Spawns a pair task and returns its command sender, shared status, and
/// join handle.
pub(crate) fn spawn(
    config: PairConfig,
    engine: EngineConfig,
    host: Arc<dyn HostPlatform>,
) -> (
    mpsc::Sender<PairCommand>,
    Arc<RwLock<PairStatus>>,
    JoinHandle<()>,
) {
    let (commands_tx, commands_rx) = mpsc::channel(engine.channel_capacity);
    let enabled = config.enabled;
    let shared = Arc::new(RwLock::new(PairStatus {
        health: if enabled {
            PairHealth::Pending
        } else {
            PairHealth::Disabled
        },
        state: PairState::Idle,
        last_origin: None,
        stats: PairStats::default(),
    }));

    let span = tracing::info_span!("pair", id = %config.id);
    let runtime = PairRuntime {
        echo: EchoGuard::new(engine.echo_window),
        gate: CooldownGate::new(engine.cooldown),
        config,
        engine,
        host,
        commands: commands_rx,
        shared: Arc::clone(&shared),
        subscriptions: SideMap::default(),
        last_known: SideMap::default(),
        pending: None,
        state: PairState::Idle,
        health: if enabled {
            PairHealth::Pending
        } else {
            PairHealth::Disabled
        },
        last_origin: None,
        enabled,
        stats: PairStats::default(),
    };
    let task = tokio::spawn(runtime.run().instrument(span));

    (commands_tx, shared, task)
}

struct PairRuntime {
    config: PairConfig,
    engine: EngineConfig,
    host: Arc<dyn HostPlatform>,
    commands: mpsc::Receiver<PairCommand>,
    shared: Arc<RwLock<PairStatus>>,
    subscriptions: SideMap<Option<mpsc::Receiver<StateChange>>>,
    /// Last attribute snapshot seen per side; no-op and echo detection.
    last_known: SideMap<Option<AttributeSet>>,
    /// The latest snapshot observed during an open cooldown window. A
    /// single slot: whichever side changed most recently supersedes
    /// anything older, from either side.
    pending: Option<(Side, AttributeSet)>,
    echo: EchoGuard,
    gate: CooldownGate,
    state: PairState,
    health: PairHealth,
    last_origin: Option<(Side, StdInstant)>,
    enabled: bool,
    stats: PairStats,
}

impl PairRuntime {
    async fn run(mut self) {
        if self.enabled {
            self.try_activate().await;
        }
        self.publish();

        loop {
            match self.next_wake().await {
                Wake::CommandsClosed | Wake::Command(PairCommand::Shutdown) => break,
                Wake::Command(command) => self.handle_command(command).await,
                Wake::Change(side, Some(change)) => self.handle_change(side, change).await,
                Wake::Change(side, None) => self.subscription_lost(side),
                Wake::CooldownExpired => self.handle_cooldown_expired().await,
            }
            self.expire_origin();
            self.publish();
        }

        debug!("pair task stopped");
    }

    /// Waits for the next command, notification, or timer expiry.
    ///
    /// Commands win ties so operator actions are never starved by a chatty
    /// entity; per-channel arrival order is preserved either way.
    async fn next_wake(&mut self) -> Wake {
        let deadline = self.gate.deadline();
        let commands = &mut self.commands;
        let sub_a = &mut self.subscriptions.a;
        let sub_b = &mut self.subscriptions.b;

        tokio::select! {
            biased;
            command = commands.recv() => match command {
                Some(command) => Wake::Command(command),
                None => Wake::CommandsClosed,
            },
            change = recv_subscribed(sub_a) => Wake::Change(Side::A, change),
            change = recv_subscribed(sub_b) => Wake::Change(Side::B, change),
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(far_future)), if deadline.is_some() => {
                Wake::CooldownExpired
            }
        }
    }

    async fn handle_command(&mut self, command: PairCommand) {
        match command {
            PairCommand::ManualSync(side) => self.manual_sync(side).await,
            PairCommand::SetEnabled(enabled) => self.set_enabled(enabled).await,
            PairCommand::HealthCheck => self.health_check().await,
            // Handled by the run loop before dispatch.
            PairCommand::Shutdown => {}
        }
    }

    async fn handle_change(&mut self, side: Side, change: StateChange) {
        if !self.enabled {
            return;
        }

        if !change.available {
            // The last-known snapshot stays frozen at its pre-outage value:
            // it is the baseline the recovery reconciliation diffs against.
            debug!(entity = %change.entity, "entity went unavailable, suspending propagation");
            self.health = PairHealth::Degraded;
            return;
        }

        // A live notification from a degraded pair is the earliest possible
        // recovery signal; re-activation also reconciles outage divergence.
        if self.health == PairHealth::Degraded {
            debug!(%side, "notification received while degraded, attempting recovery");
            self.try_activate().await;
            if self.health != PairHealth::Active {
                // Still down. The change is dropped, not queued: recovery
                // re-reads both sides, so nothing is lost.
                return;
            }
        }

        // Attribute-identical restates carry no information; dropping them
        // before echo classification keeps a pending expectation armed.
        if self.last_known.get(side).as_ref() == Some(&change.attributes) {
            return;
        }

        if self.echo.classify(side, &change.attributes) == EchoVerdict::Echo {
            self.stats.echoes_suppressed += 1;
            *self.last_known.get_mut(side) = Some(change.attributes);
            // The write round-tripped; the loop is closed.
            self.last_origin = None;
            debug!(%side, "suppressed echo of own write");
            return;
        }

        *self.last_known.get_mut(side) = Some(change.attributes.clone());

        let discrete = self.config.entity(side).domain().is_discrete();
        match self.gate.admit(discrete) {
            Admission::PropagateNow => self.propagate(side, change.attributes).await,
            Admission::Defer { until } => {
                self.stats.changes_coalesced += 1;
                self.pending = Some((side, change.attributes));
                debug!(%side, deadline = ?until, "change deferred into open cooldown window");
            }
        }
    }

    /// Maps and writes one snapshot toward the other side.
    async fn propagate(&mut self, source: Side, snapshot: AttributeSet) {
        let target = source.opposite();
        let target_ref = self.config.entity(target).clone();

        if target_ref.domain().is_read_only() {
            return;
        }

        let update = map_attributes(
            &snapshot,
            self.config.entity(source).domain(),
            target_ref.domain(),
            self.config.sync_mode,
        );
        if update.is_empty() {
            return;
        }

        if let Some(known) = self.last_known.get(target) {
            if update.is_noop_for(known) {
                self.stats.noops_skipped += 1;
                debug!(%source, "target already matches, skipping write");
                return;
            }
        }

        self.state = PairState::Propagating(source);
        self.publish();
        self.echo.record(target, update.clone());

        let discrete = self.config.entity(source).domain().is_discrete();
        match self.host.write(&target_ref, update.clone()).await {
            Ok(()) => {
                self.stats.propagations += 1;
                self.stats.last_propagation = Some(StdInstant::now());
                self.last_origin = Some((source, StdInstant::now()));
                debug!(%source, target = %target_ref, "propagated update");
                if !discrete {
                    self.gate.open();
                }
                // A discrete bypass may fire inside a window opened by the
                // other side; the window keeps running either way.
                self.state = if self.gate.deadline().is_some() {
                    PairState::Cooldown
                } else {
                    PairState::Idle
                };
            }
            Err(HostError::Unavailable(entity)) => {
                // Dropped, not queued: the next genuine change or the
                // health monitor covers recovery.
                self.echo.clear();
                self.stats.failed_propagations += 1;
                self.state = PairState::Idle;
                self.health = PairHealth::Degraded;
                debug!(%entity, "target unavailable, dropping propagation");
            }
            Err(HostError::NotFound(entity)) => {
                self.echo.clear();
                self.stats.failed_propagations += 1;
                self.state = PairState::Idle;
                self.health = PairHealth::Degraded;
                warn!(%entity, "target disappeared, degrading pair");
            }
            Err(err) => {
                // Invalid payload or permissions: retrying the same update
                // is futile, so log it for diagnosis and move on.
                let err = EngineError::from(err);
                self.echo.clear();
                self.stats.failed_propagations += 1;
                self.stats.last_error = Some(err.to_string());
                self.state = PairState::Idle;
                warn!(%err, ?update, "host rejected write");
            }
        }
    }

    async fn handle_cooldown_expired(&mut self) {
        self.gate.cancel();
        self.state = PairState::Idle;
        self.last_origin = None;

        // The latest deferred snapshot fires now; propagate() re-checks
        // whether it still differs from the target.
        if let Some((side, snapshot)) = self.pending.take() {
            self.propagate(side, snapshot).await;
        }
    }

    /// Operator-forced pass: looks up both sides and propagates from the
    /// requested one, bypassing the cooldown gate. Works even while the
    /// pair is disabled.
    async fn manual_sync(&mut self, side: Side) {
        let source_ref = self.config.entity(side).clone();
        let source = match self.host.lookup(&source_ref).await {
            Ok(state) if state.available => state,
            Ok(_) => {
                warn!(entity = %source_ref, "manual sync skipped, source unavailable");
                return;
            }
            Err(err) => {
                warn!(entity = %source_ref, %err, "manual sync could not resolve source");
                return;
            }
        };

        // Refresh the target snapshot so the forced pass diffs against
        // reality, not against the last event this task happened to see.
        let target = side.opposite();
        if let Ok(state) = self.host.lookup(self.config.entity(target)).await {
            *self.last_known.get_mut(target) = Some(state.attributes);
        }

        info!(%side, "manual sync requested");
        self.pending = None;
        *self.last_known.get_mut(side) = Some(source.attributes.clone());
        self.gate.cancel();
        self.state = PairState::Idle;
        self.propagate(side, source.attributes).await;
    }

    async fn set_enabled(&mut self, enabled: bool) {
        if enabled == self.enabled {
            return;
        }
        self.enabled = enabled;
        if enabled {
            info!("pair enabled");
            self.health = PairHealth::Pending;
            self.try_activate().await;
        } else {
            info!("pair disabled");
            self.detach();
        }
    }

    async fn health_check(&mut self) {
        if !self.enabled {
            return;
        }
        match self.health {
            PairHealth::Active => self.verify_entities().await,
            PairHealth::Pending | PairHealth::Degraded => self.try_activate().await,
            PairHealth::Disabled => {}
        }
    }

    /// Confirms a nominally active pair is still backed by live entities.
    async fn verify_entities(&mut self) {
        for side in [Side::A, Side::B] {
            let entity = self.config.entity(side).clone();
            match self.host.lookup(&entity).await {
                Ok(state) if state.available => {}
                Ok(_) => {
                    debug!(%entity, "entity offline, degrading pair");
                    self.health = PairHealth::Degraded;
                }
                Err(_) => {
                    warn!(%entity, "entity missing, degrading pair");
                    // The stream for a deregistered entity is dead weight;
                    // activation will resubscribe on recovery.
                    *self.subscriptions.get_mut(side) = None;
                    self.health = PairHealth::Degraded;
                }
            }
        }
    }

    /// Resolves both entities and attaches listeners.
    ///
    /// Called at startup, on enable, and from the health monitor's retry
    /// loop. A pair that was synchronized before (has last-known state)
    /// additionally reconciles divergence accumulated during the outage.
    async fn try_activate(&mut self) {
        let was_synced = self.last_known.a.is_some() || self.last_known.b.is_some();

        let state_a = match self.host.lookup(&self.config.entity_a).await {
            Ok(state) => state,
            Err(err) => {
                self.activation_failed(err, was_synced);
                return;
            }
        };
        let state_b = match self.host.lookup(&self.config.entity_b).await {
            Ok(state) => state,
            Err(err) => {
                self.activation_failed(err, was_synced);
                return;
            }
        };

        if !state_a.available || !state_b.available {
            debug!("entities resolved but not all available, staying degraded");
            self.ensure_subscribed();
            self.health = PairHealth::Degraded;
            return;
        }

        self.ensure_subscribed();
        // Anything deferred before the outage is stale against the fresh
        // lookups.
        self.pending = None;

        if was_synced {
            let a_diverged = self
                .last_known
                .a
                .as_ref()
                .is_some_and(|known| known != &state_a.attributes);
            let b_diverged = self
                .last_known
                .b
                .as_ref()
                .is_some_and(|known| known != &state_b.attributes);

            self.last_known.a = Some(state_a.attributes.clone());
            self.last_known.b = Some(state_b.attributes.clone());
            self.health = PairHealth::Active;

            match (a_diverged, b_diverged) {
                (true, false) => {
                    info!("reconciling post-outage divergence from side A");
                    self.propagate(Side::A, state_a.attributes).await;
                }
                (false, true) => {
                    info!("reconciling post-outage divergence from side B");
                    self.propagate(Side::B, state_b.attributes).await;
                }
                (true, true) => {
                    // No policy can know which side the user meant; wait
                    // for the next genuine change instead of guessing.
                    warn!("both sides changed during outage, leaving divergence unresolved");
                }
                (false, false) => {}
            }
        } else {
            self.last_known.a = Some(state_a.attributes);
            self.last_known.b = Some(state_b.attributes);
            self.health = PairHealth::Active;
            info!("pair activated");
        }
    }

    fn activation_failed(&mut self, err: HostError, was_synced: bool) {
        self.health = if was_synced {
            PairHealth::Degraded
        } else {
            PairHealth::Pending
        };
        let err = EngineError::from(err);
        debug!(%err, "activation attempt failed, will retry on next health tick");
    }

    fn ensure_subscribed(&mut self) {
        if self.subscriptions.a.is_none() {
            self.subscriptions.a = Some(self.host.subscribe(&self.config.entity_a));
        }
        if self.subscriptions.b.is_none() {
            self.subscriptions.b = Some(self.host.subscribe(&self.config.entity_b));
        }
    }

    fn subscription_lost(&mut self, side: Side) {
        warn!(entity = %self.config.entity(side), "host closed the notification stream");
        *self.subscriptions.get_mut(side) = None;
        if self.health == PairHealth::Active {
            self.health = PairHealth::Degraded;
        }
    }

    /// Detaches listeners and cancels timers; the disabled pair keeps its
    /// last-known state for reconciliation on re-enable.
    fn detach(&mut self) {
        self.subscriptions.a = None;
        self.subscriptions.b = None;
        self.gate.cancel();
        self.pending = None;
        self.echo.clear();
        self.state = PairState::Idle;
        self.last_origin = None;
        self.health = PairHealth::Disabled;
    }

    /// An origin older than the cooldown window no longer explains any
    /// incoming event; it must not linger.
    fn expire_origin(&mut self) {
        if let Some((_, at)) = self.last_origin {
            if at.elapsed() > self.engine.cooldown {
                self.last_origin = None;
            }
        }
    }

    fn publish(&self) {
        let mut shared = self.shared.write();
        shared.health = self.health;
        shared.state = self.state;
        shared.last_origin = self.last_origin.map(|(side, _)| side);
        shared.stats = self.stats.clone();
    }
}

async fn recv_subscribed(
    subscription: &mut Option<mpsc::Receiver<StateChange>>,
) -> Option<StateChange> {
    match subscription {
        Some(receiver) => receiver.recv().await,
        // An unsubscribed side never wakes its select arm.
        None => std::future::pending().await,
    }
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(60 * 60 * 24 * 365)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_map_indexing() {
        let mut map = SideMap { a: 1, b: 2 };
        assert_eq!(*map.get(Side::A), 1);
        assert_eq!(*map.get(Side::B), 2);
        *map.get_mut(Side::B) = 5;
        assert_eq!(*map.get(Side::B), 5);
    }

    #[test]
    fn fresh_stats_are_zeroed() {
        let stats = PairStats::default();
        assert_eq!(stats.propagations, 0);
        assert_eq!(stats.echoes_suppressed, 0);
        assert!(stats.last_propagation.is_none());
    }
}
