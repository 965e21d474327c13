//! Background polling and connection health.
//!
//! [`DataManager`] owns the [`ApiClient`] and the shared [`DashboardState`].
//! Each resource is polled on its own interval; a poll that is still in
//! flight when the next one is requested is skipped rather than queued.
//!
//! ```text
//! interval tick / manual refresh
//!        │
//!        ▼
//! PollGuard::try_acquire ──busy──▶ PollOutcome::Skipped
//!        │
//!        ▼
//! ApiClient::fetch_* ──Ok──▶ DashboardState::set_* ──▶ next_health(Reachable)
//!        │
//!        └──Err──▶ RetryCounter::increment ──▶ next_health(Failed)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::api::{ApiClient, ApiError};
use crate::data::health::{next_health, ConnectionHealth, PollSignal, DEFAULT_MAX_RETRIES};
use crate::data::state::{DashboardEvent, DashboardState, Resource, StateView};
use crate::notify::Severity;

/// Polling intervals and the failure threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    pub stats_interval: Duration,
    pub analytics_interval: Duration,
    pub health_interval: Duration,
    pub max_retries: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            stats_interval: Duration::from_secs(15),
            analytics_interval: Duration::from_secs(30),
            health_interval: Duration::from_secs(60),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Stats => self.stats_interval,
            Resource::Analytics => self.analytics_interval,
            Resource::Health => self.health_interval,
        }
    }
}

/// Result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Updated,
    /// A poll for the same resource was already in flight.
    Skipped,
    Failed(ApiError),
}

impl PollOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, PollOutcome::Updated)
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            PollOutcome::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Outcome of a full refresh.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshReport {
    pub stats: PollOutcome,
    pub analytics: PollOutcome,
    pub health: PollOutcome,
}

impl RefreshReport {
    fn outcomes(&self) -> [(Resource, &PollOutcome); 3] {
        [
            (Resource::Stats, &self.stats),
            (Resource::Analytics, &self.analytics),
            (Resource::Health, &self.health),
        ]
    }

    pub fn failures(&self) -> Vec<(Resource, &ApiError)> {
        self.outcomes()
            .into_iter()
            .filter_map(|(resource, outcome)| outcome.error().map(|err| (resource, err)))
            .collect()
    }

    pub fn all_skipped(&self) -> bool {
        self.outcomes()
            .iter()
            .all(|(_, outcome)| **outcome == PollOutcome::Skipped)
    }

    pub fn is_success(&self) -> bool {
        self.outcomes()
            .iter()
            .all(|(_, outcome)| outcome.error().is_none())
    }
}

/// In-flight flag for one resource.
#[derive(Debug, Default)]
struct PollGuard {
    busy: AtomicBool,
}

/// Clears the flag when the poll finishes or is cancelled.
struct PollToken<'a> {
    busy: &'a AtomicBool,
}

impl PollGuard {
    fn try_acquire(&self) -> Option<PollToken<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PollToken { busy: &self.busy })
    }

    fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for PollToken<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Polls the bot API and maintains [`DashboardState`].
#[derive(Debug)]
pub struct DataManager {
    client: ApiClient,
    state: Arc<Mutex<DashboardState>>,
    config: PollingConfig,
    stats_guard: PollGuard,
    analytics_guard: PollGuard,
    health_guard: PollGuard,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl DataManager {
    pub fn new(client: ApiClient, config: PollingConfig) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(DashboardState::new())),
            config,
            stats_guard: PollGuard::default(),
            analytics_guard: PollGuard::default(),
            health_guard: PollGuard::default(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    pub fn state(&self) -> Arc<Mutex<DashboardState>> {
        Arc::clone(&self.state)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.state.lock().subscribe()
    }

    pub fn view(&self) -> StateView {
        self.state.lock().view()
    }

    pub fn health(&self) -> ConnectionHealth {
        self.state.lock().health()
    }

    /// Whether a poll for `resource` is in flight.
    pub fn is_polling(&self, resource: Resource) -> bool {
        self.guard(resource).is_busy()
    }

    pub async fn update_stats(&self) -> PollOutcome {
        self.poll(Resource::Stats).await
    }

    pub async fn update_analytics(&self) -> PollOutcome {
        self.poll(Resource::Analytics).await
    }

    pub async fn check_health(&self) -> PollOutcome {
        self.poll(Resource::Health).await
    }

    /// Poll every resource concurrently.
    pub async fn update_all(&self) -> RefreshReport {
        let (stats, analytics, health) = tokio::join!(
            self.update_stats(),
            self.update_analytics(),
            self.check_health()
        );
        RefreshReport {
            stats,
            analytics,
            health,
        }
    }

    fn guard(&self, resource: Resource) -> &PollGuard {
        match resource {
            Resource::Stats => &self.stats_guard,
            Resource::Analytics => &self.analytics_guard,
            Resource::Health => &self.health_guard,
        }
    }

    /// Poll one resource unless a poll for it is already in flight.
    pub async fn poll(&self, resource: Resource) -> PollOutcome {
        let Some(_token) = self.guard(resource).try_acquire() else {
            tracing::debug!(resource = resource.label(), "poll already in flight, skipping");
            return PollOutcome::Skipped;
        };

        self.state.lock().emit(DashboardEvent::PollStarted(resource));
        let outcome = match self.fetch(resource).await {
            Ok(signal) => {
                tracing::debug!(resource = resource.label(), "poll succeeded");
                self.record_success(signal);
                PollOutcome::Updated
            }
            Err(err) => {
                self.record_failure(resource, &err);
                PollOutcome::Failed(err)
            }
        };
        self.state.lock().emit(DashboardEvent::PollFinished(resource));
        outcome
    }

    async fn fetch(&self, resource: Resource) -> Result<PollSignal, ApiError> {
        match resource {
            Resource::Stats => {
                let previous = self.state.lock().stats().cloned();
                let stats = self.client.fetch_stats(previous.as_ref()).await?;
                self.state.lock().set_stats(stats, Instant::now());
                Ok(PollSignal::Reachable)
            }
            Resource::Analytics => {
                let previous = self.state.lock().analytics().cloned();
                let analytics = self.client.fetch_analytics(previous.as_ref()).await?;
                self.state.lock().set_analytics(analytics, Instant::now());
                Ok(PollSignal::Reachable)
            }
            Resource::Health => {
                let report = self.client.check_health().await?;
                let signal = if report.is_healthy() {
                    PollSignal::Healthy
                } else {
                    PollSignal::Degraded
                };
                self.state.lock().set_health_report(report);
                Ok(signal)
            }
        }
    }

    fn record_success(&self, signal: PollSignal) {
        let failures = self.client.retries().get();
        let mut state = self.state.lock();
        let next = next_health(state.health(), failures, self.config.max_retries, signal);
        let Some(from) = state.set_health(next) else {
            return;
        };

        tracing::info!(%from, to = %next, "connection health changed");
        if from == ConnectionHealth::Unhealthy {
            state.notify(Severity::Success, "Connection to the bot API restored");
        }
        if next == ConnectionHealth::Degraded {
            let detail = state
                .view()
                .last_error
                .unwrap_or_else(|| "no details".to_string());
            state.notify(
                Severity::Warning,
                format!("Bot reports degraded health: {}", detail),
            );
        }
    }

    fn record_failure(&self, resource: Resource, err: &ApiError) {
        let failures = self.client.retries().increment();
        tracing::warn!(
            resource = resource.label(),
            kind = err.kind(),
            error = %err,
            failures,
            "poll failed"
        );

        let mut state = self.state.lock();
        state.record_error(format!("{} update failed: {}", resource.label(), err));
        let next = next_health(
            state.health(),
            failures,
            self.config.max_retries,
            PollSignal::Failed,
        );
        if let Some(from) = state.set_health(next) {
            tracing::error!(%from, to = %next, failures, "connection health changed");
            state.notify(
                Severity::Error,
                format!(
                    "Lost connection to the bot API after {} failed requests: {}",
                    failures, err
                ),
            );
        }
    }

    /// Start one polling task per resource. The first poll runs immediately.
    /// Calling this while polling is running does nothing.
    pub fn start(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() {
            return;
        }

        for resource in Resource::ALL {
            let manager = Arc::clone(self);
            let period = self.config.interval(resource);
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    manager.poll(resource).await;
                }
            }));
        }
        tracing::info!(api = self.client.describe(), "polling started");
    }

    /// Cancel the polling tasks. In-flight polls are dropped.
    pub fn stop(&self) {
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        if tasks.is_empty() {
            return;
        }
        for task in tasks {
            task.abort();
        }
        tracing::info!("polling stopped");
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.lock().is_empty()
    }

    /// Pause polling while the dashboard is not visible; resume when it is.
    pub fn set_visible(self: &Arc<Self>, visible: bool) {
        if visible {
            self.start();
        } else {
            self.stop();
        }
    }

    /// Stop polling for good and mark the connection as disconnected.
    pub fn shutdown(&self) {
        self.stop();
        self.state.lock().set_health(ConnectionHealth::Disconnected);
    }
}
