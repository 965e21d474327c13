//! Shared dashboard state and its change events.
//!
//! [`DashboardState`] holds the latest snapshots and the connection health.
//! Every mutation publishes a [`DashboardEvent`] on a broadcast channel; the
//! UI subscribes and re-renders from a cloned [`StateView`].

use std::time::Instant;

use tokio::sync::broadcast;

use super::health::ConnectionHealth;
use super::snapshot::{AnalyticsSnapshot, HealthReport, StatsSnapshot};
use crate::notify::Severity;

/// Capacity of the event channel. Slow subscribers see `Lagged` and resync.
const EVENT_CAPACITY: usize = 64;

/// A polled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Stats,
    Analytics,
    Health,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Stats, Resource::Analytics, Resource::Health];

    pub fn label(&self) -> &'static str {
        match self {
            Resource::Stats => "stats",
            Resource::Analytics => "analytics",
            Resource::Health => "health",
        }
    }
}

/// A user-facing notification raised by the data layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

/// Events published on every state change.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// A new stats snapshot is available.
    StatsUpdated,
    /// A new analytics snapshot is available.
    AnalyticsUpdated,
    /// Connection health moved between states.
    HealthChanged {
        from: ConnectionHealth,
        to: ConnectionHealth,
    },
    /// A poll for the resource went in flight.
    PollStarted(Resource),
    /// A poll for the resource completed, successfully or not.
    PollFinished(Resource),
    /// A notification for the toast queue.
    Notice(Notice),
}

/// Read-only copy of the state handed to the UI.
#[derive(Debug, Clone)]
pub struct StateView {
    pub stats: Option<StatsSnapshot>,
    pub analytics: Option<AnalyticsSnapshot>,
    pub health_report: Option<HealthReport>,
    pub health: ConnectionHealth,
    pub last_updated: Option<Instant>,
    pub last_error: Option<String>,
}

/// Latest snapshots, connection health and the event channel.
#[derive(Debug)]
pub struct DashboardState {
    stats: Option<StatsSnapshot>,
    analytics: Option<AnalyticsSnapshot>,
    health_report: Option<HealthReport>,
    health: ConnectionHealth,
    last_updated: Option<Instant>,
    last_error: Option<String>,
    events: broadcast::Sender<DashboardEvent>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            stats: None,
            analytics: None,
            health_report: None,
            health: ConnectionHealth::Connecting,
            last_updated: None,
            last_error: None,
            events,
        }
    }

    /// Subscribe to state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn stats(&self) -> Option<&StatsSnapshot> {
        self.stats.as_ref()
    }

    pub fn analytics(&self) -> Option<&AnalyticsSnapshot> {
        self.analytics.as_ref()
    }

    pub fn health(&self) -> ConnectionHealth {
        self.health
    }

    pub fn last_updated(&self) -> Option<Instant> {
        self.last_updated
    }

    pub fn view(&self) -> StateView {
        StateView {
            stats: self.stats.clone(),
            analytics: self.analytics.clone(),
            health_report: self.health_report.clone(),
            health: self.health,
            last_updated: self.last_updated,
            last_error: self.last_error.clone(),
        }
    }

    pub fn set_stats(&mut self, stats: StatsSnapshot, now: Instant) {
        self.stats = Some(stats);
        self.last_updated = Some(now);
        self.last_error = None;
        self.emit(DashboardEvent::StatsUpdated);
    }

    pub fn set_analytics(&mut self, analytics: AnalyticsSnapshot, now: Instant) {
        self.analytics = Some(analytics);
        self.last_updated = Some(now);
        self.last_error = None;
        self.emit(DashboardEvent::AnalyticsUpdated);
    }

    pub fn set_health_report(&mut self, report: HealthReport) {
        self.last_error = report.error.clone();
        self.health_report = Some(report);
    }

    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Move to `next`, publishing a change event. Returns the previous state
    /// if it changed.
    pub fn set_health(&mut self, next: ConnectionHealth) -> Option<ConnectionHealth> {
        let from = self.health;
        if from == next {
            return None;
        }
        self.health = next;
        self.emit(DashboardEvent::HealthChanged { from, to: next });
        Some(from)
    }

    pub fn notify(&self, severity: Severity, message: impl Into<String>) {
        self.emit(DashboardEvent::Notice(Notice {
            message: message.into(),
            severity,
        }));
    }

    pub fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine; events are only for observers.
        let _ = self.events.send(event);
    }
}
