//! Application state and navigation logic.
//!
//! [`App`] is the UI side of the dashboard. It never waits on the network:
//! state changes arrive as [`DashboardEvent`]s and user actions run as tasks
//! on the runtime whose results come back as [`ActionOutcome`]s. Both
//! channels are drained once per frame by [`App::process_events`].

use std::collections::HashSet;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tokio::sync::mpsc;

use crate::api::{ApiError, SettingsMap};
use crate::data::{ChartData, DashboardEvent, GuildSummary, Resource, StateView};
use crate::manager::{DataManager, RefreshReport};
use crate::notify::{Severity, ToastQueue};
use crate::toggle::{
    toggle_value, PendingChange, RequestIds, Resolution, SettingScope, SettingsPanel,
};
use crate::ui::Theme;

/// How long a status bar message stays up.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Stat cards, resource gauges and the latency chart.
    Overview,
    /// Command usage and activity.
    Analytics,
    /// Guild list and per-guild settings.
    Guilds,
    /// Bot-wide settings.
    Settings,
}

impl View {
    pub const ALL: [View; 4] = [View::Overview, View::Analytics, View::Guilds, View::Settings];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Overview => View::Analytics,
            View::Analytics => View::Guilds,
            View::Guilds => View::Settings,
            View::Settings => View::Overview,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Overview => View::Settings,
            View::Analytics => View::Overview,
            View::Guilds => View::Analytics,
            View::Settings => View::Guilds,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Overview => "Overview",
            View::Analytics => "Analytics",
            View::Guilds => "Guilds",
            View::Settings => "Settings",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            View::Overview => 0,
            View::Analytics => 1,
            View::Guilds => 2,
            View::Settings => 3,
        }
    }
}

/// Which pane of the Guilds view has the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuildFocus {
    List,
    Settings,
}

/// Result of a user action, sent back from its task.
#[derive(Debug)]
pub enum ActionOutcome {
    Refresh(RefreshReport),
    Toggle {
        scope: SettingScope,
        request_id: u64,
        result: Result<(), ApiError>,
    },
    GuildsLoaded(Result<Vec<GuildSummary>, ApiError>),
    SettingsLoaded(Result<SettingsMap, ApiError>),
    GuildSettingsLoaded {
        guild_id: String,
        result: Result<SettingsMap, ApiError>,
    },
    GuildReset {
        guild_id: String,
        result: Result<(), ApiError>,
    },
    BotReloaded(Result<(), ApiError>),
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    manager: Arc<DataManager>,
    runtime: Handle,
    events: broadcast::Receiver<DashboardEvent>,
    actions_tx: mpsc::UnboundedSender<ActionOutcome>,
    actions_rx: mpsc::UnboundedReceiver<ActionOutcome>,

    /// Latest copy of the dashboard state.
    pub data: StateView,
    pub charts: ChartData,
    pub toasts: ToastQueue,
    /// Resources with a poll in flight.
    pub polling: HashSet<Resource>,
    pub is_refreshing: bool,
    pub focused: bool,

    pub settings: SettingsPanel,
    pub settings_loaded: bool,
    pub guilds: Vec<GuildSummary>,
    pub guilds_loaded: bool,
    pub selected_guild: usize,
    pub guild_settings: Option<SettingsPanel>,
    pub guild_focus: GuildFocus,
    /// Shared by every settings panel so reopened panels never reuse an id.
    request_ids: RequestIds,

    pub theme: Theme,
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        manager: Arc<DataManager>,
        runtime: Handle,
        theme: Theme,
        toast_duration: Duration,
        now: Instant,
    ) -> Self {
        let events = manager.subscribe();
        let data = manager.view();
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let request_ids = RequestIds::default();

        Self {
            running: true,
            current_view: View::Overview,
            show_help: false,
            manager,
            runtime,
            events,
            actions_tx,
            actions_rx,
            data,
            charts: ChartData::new(now),
            toasts: ToastQueue::new(toast_duration),
            polling: HashSet::new(),
            is_refreshing: false,
            focused: true,
            settings: SettingsPanel::global_defaults().with_request_ids(request_ids.clone()),
            settings_loaded: false,
            guilds: Vec::new(),
            guilds_loaded: false,
            selected_guild: 0,
            guild_settings: None,
            guild_focus: GuildFocus::List,
            request_ids,
            theme,
            status_message: None,
        }
    }

    /// Description of the API target.
    pub fn target(&self) -> &str {
        self.manager.client().describe()
    }

    pub fn set_status_message(&mut self, message: impl Into<String>, now: Instant) {
        self.status_message = Some((message.into(), now));
    }

    /// The current status message if it hasn't expired.
    pub fn get_status_message(&self, now: Instant) -> Option<&str> {
        match &self.status_message {
            Some((msg, at)) if now.saturating_duration_since(*at) < STATUS_MESSAGE_TTL => {
                Some(msg)
            }
            _ => None,
        }
    }

    /// Drain state events and action results, then advance toast timers.
    pub fn process_events(&mut self, now: Instant) {
        loop {
            match self.events.try_recv() {
                Ok(event) => self.apply_event(event, now),
                Err(TryRecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "UI fell behind the event stream, resyncing");
                    self.resync();
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        while let Ok(outcome) = self.actions_rx.try_recv() {
            self.apply_outcome(outcome, now);
        }

        self.toasts.tick(now);
    }

    fn resync(&mut self) {
        self.data = self.manager.view();
        if let Some(ref analytics) = self.data.analytics {
            self.charts.record_analytics(analytics);
        }
    }

    fn apply_event(&mut self, event: DashboardEvent, now: Instant) {
        match event {
            DashboardEvent::StatsUpdated => {
                self.data = self.manager.view();
                if let Some(ref stats) = self.data.stats {
                    self.charts.record_stats(stats, now);
                }
            }
            DashboardEvent::AnalyticsUpdated => {
                self.data = self.manager.view();
                if let Some(ref analytics) = self.data.analytics {
                    self.charts.record_analytics(analytics);
                }
            }
            DashboardEvent::HealthChanged { .. } => {
                self.data = self.manager.view();
            }
            DashboardEvent::PollStarted(resource) => {
                self.polling.insert(resource);
            }
            DashboardEvent::PollFinished(resource) => {
                self.polling.remove(&resource);
                self.data = self.manager.view();
            }
            DashboardEvent::Notice(notice) => {
                self.toasts.push(notice.severity, notice.message, now);
            }
        }
    }

    fn apply_outcome(&mut self, outcome: ActionOutcome, now: Instant) {
        match outcome {
            ActionOutcome::Refresh(report) => {
                self.is_refreshing = false;
                if report.all_skipped() {
                    self.toasts.push(Severity::Info, "Update already in progress", now);
                } else if let Some((resource, err)) = report.failures().first() {
                    self.toasts.push(
                        Severity::Error,
                        format!("Refresh failed ({}): {}", resource.label(), err),
                        now,
                    );
                } else {
                    self.toasts.push(Severity::Success, "Dashboard refreshed", now);
                }
            }
            ActionOutcome::Toggle {
                scope,
                request_id,
                result,
            } => self.resolve_toggle(scope, request_id, result, now),
            ActionOutcome::GuildsLoaded(Ok(guilds)) => {
                self.guilds = guilds;
                self.guilds_loaded = true;
                self.selected_guild = self.selected_guild.min(self.guilds.len().saturating_sub(1));
            }
            ActionOutcome::GuildsLoaded(Err(err)) => {
                self.toasts
                    .push(Severity::Error, format!("Failed to load guilds: {}", err), now);
            }
            ActionOutcome::SettingsLoaded(Ok(settings)) => {
                self.settings.apply_remote(&settings);
                self.settings_loaded = true;
            }
            ActionOutcome::SettingsLoaded(Err(err)) => {
                self.toasts
                    .push(Severity::Error, format!("Failed to load settings: {}", err), now);
            }
            ActionOutcome::GuildSettingsLoaded { guild_id, result } => match result {
                Ok(settings) => {
                    let scope = SettingScope::Guild(guild_id);
                    match self.guild_settings.as_mut() {
                        Some(panel) if panel.scope == scope => panel.apply_remote(&settings),
                        _ => {
                            let panel = SettingsPanel::from_settings(scope, &settings)
                                .with_request_ids(self.request_ids.clone());
                            self.guild_settings = Some(panel);
                        }
                    }
                    self.guild_focus = GuildFocus::Settings;
                }
                Err(err) => {
                    self.toasts.push(
                        Severity::Error,
                        format!("Failed to load guild settings: {}", err),
                        now,
                    );
                }
            },
            ActionOutcome::GuildReset { guild_id, result } => match result {
                Ok(()) => {
                    let name = self.guild_name(&guild_id);
                    self.toasts.push(
                        Severity::Success,
                        format!("Settings for {} reset to defaults", name),
                        now,
                    );
                    let open = self
                        .guild_settings
                        .as_ref()
                        .is_some_and(|p| p.scope == SettingScope::Guild(guild_id.clone()));
                    if open {
                        self.load_guild_settings(guild_id);
                    }
                }
                Err(err) => {
                    self.toasts.push(
                        Severity::Error,
                        format!("Failed to reset guild settings: {}", err),
                        now,
                    );
                }
            },
            ActionOutcome::BotReloaded(Ok(())) => {
                self.toasts.push(Severity::Success, "Bot reloaded", now);
            }
            ActionOutcome::BotReloaded(Err(err)) => {
                self.toasts
                    .push(Severity::Error, format!("Failed to reload bot: {}", err), now);
            }
        }
    }

    fn resolve_toggle(
        &mut self,
        scope: SettingScope,
        request_id: u64,
        result: Result<(), ApiError>,
        now: Instant,
    ) {
        let panel = match scope {
            SettingScope::Global => Some(&mut self.settings),
            SettingScope::Guild(_) => self.guild_settings.as_mut().filter(|p| p.scope == scope),
        };
        let Some(panel) = panel else {
            tracing::debug!(request_id, "toggle result for a closed panel");
            return;
        };

        let resolution = panel.resolve(request_id, &result);
        let label = |key: &str| {
            panel
                .get(key)
                .map(|t| t.label.clone())
                .unwrap_or_else(|| key.to_string())
        };
        match resolution {
            Resolution::Confirmed { key, value } => {
                let state = if value { "enabled" } else { "disabled" };
                let message = format!("{} {}", label(&key), state);
                self.toasts.push(Severity::Success, message, now);
            }
            Resolution::Reverted { key, .. } => {
                let reason = result.err().map(|e| e.to_string()).unwrap_or_default();
                tracing::warn!(setting = %key, %reason, "setting update failed, reverted");
                let message = format!("Failed to update {}: {}", label(&key), reason);
                self.toasts.push(Severity::Error, message, now);
            }
            Resolution::Stale => {}
        }
    }

    fn guild_name(&self, guild_id: &str) -> String {
        self.guilds
            .iter()
            .find(|g| g.id == guild_id)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| guild_id.to_string())
    }

    fn spawn_action<F>(&self, action: F)
    where
        F: Future<Output = ActionOutcome> + Send + 'static,
    {
        let tx = self.actions_tx.clone();
        self.runtime.spawn(async move {
            // The app may have quit; nothing to report to.
            let _ = tx.send(action.await);
        });
    }

    /// Refresh everything now. Returns false if a manual refresh is running.
    pub fn refresh(&mut self, now: Instant) -> bool {
        if self.is_refreshing {
            self.set_status_message("Refresh already in progress", now);
            return false;
        }
        self.is_refreshing = true;

        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move { ActionOutcome::Refresh(manager.update_all().await) });

        match self.current_view {
            View::Guilds => self.load_guilds(),
            View::Settings => self.load_settings(),
            _ => {}
        }
        true
    }

    pub fn load_guilds(&self) {
        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move {
            ActionOutcome::GuildsLoaded(manager.client().fetch_guilds().await)
        });
    }

    pub fn load_settings(&self) {
        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move {
            ActionOutcome::SettingsLoaded(manager.client().fetch_settings().await)
        });
    }

    fn load_guild_settings(&self, guild_id: String) {
        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move {
            let result = manager.client().fetch_guild_settings(&guild_id).await;
            ActionOutcome::GuildSettingsLoaded { guild_id, result }
        });
    }

    pub fn selected_guild(&self) -> Option<&GuildSummary> {
        self.guilds.get(self.selected_guild)
    }

    /// Load the selected guild's settings into the side panel.
    pub fn open_selected_guild(&mut self) {
        if let Some(id) = self.selected_guild().map(|g| g.id.clone()) {
            self.load_guild_settings(id);
        }
    }

    /// Reset the selected guild's settings to the bot defaults.
    pub fn reset_selected_guild(&mut self, now: Instant) {
        let Some(guild_id) = self.selected_guild().map(|g| g.id.clone()) else {
            self.set_status_message("No guild selected", now);
            return;
        };
        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move {
            let result = manager.client().reset_guild_defaults(&guild_id).await;
            ActionOutcome::GuildReset { guild_id, result }
        });
    }

    pub fn reload_bot(&mut self, now: Instant) {
        self.set_status_message("Reloading bot...", now);
        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move {
            ActionOutcome::BotReloaded(manager.client().reload_bot().await)
        });
    }

    /// The settings panel that has the keyboard, if any.
    pub fn active_panel(&mut self) -> Option<&mut SettingsPanel> {
        match (self.current_view, self.guild_focus) {
            (View::Settings, _) => Some(&mut self.settings),
            (View::Guilds, GuildFocus::Settings) => self.guild_settings.as_mut(),
            _ => None,
        }
    }

    /// Flip the selected toggle and send the change.
    pub fn toggle_selected(&mut self) {
        let Some(change) = self.active_panel().and_then(SettingsPanel::toggle_selected) else {
            return;
        };
        self.send_change(change);
    }

    fn send_change(&self, change: PendingChange) {
        let manager = Arc::clone(&self.manager);
        self.spawn_action(async move {
            let value = toggle_value(change.value);
            let result = match change.scope {
                SettingScope::Global => manager.client().update_setting(&change.key, value).await,
                SettingScope::Guild(ref id) => {
                    manager
                        .client()
                        .update_guild_setting(id, &change.key, value)
                        .await
                }
            };
            ActionOutcome::Toggle {
                scope: change.scope,
                request_id: change.request_id,
                result,
            }
        });
    }

    /// Terminal focus changes stand in for page visibility.
    pub fn set_focus(&mut self, focused: bool, now: Instant) {
        if self.focused == focused {
            return;
        }
        self.focused = focused;
        {
            let _guard = self.runtime.enter();
            self.manager.set_visible(focused);
        }
        if focused {
            self.set_status_message("Polling resumed", now);
        }
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a view, loading its data the first time it is shown.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        match view {
            View::Guilds if !self.guilds_loaded => self.load_guilds(),
            View::Settings if !self.settings_loaded => self.load_settings(),
            _ => {}
        }
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        match (self.current_view, self.guild_focus) {
            (View::Guilds, GuildFocus::List) => {
                let max = self.guilds.len().saturating_sub(1);
                self.selected_guild = (self.selected_guild + 1).min(max);
            }
            _ => {
                if let Some(panel) = self.active_panel() {
                    panel.select_next();
                }
            }
        }
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        match (self.current_view, self.guild_focus) {
            (View::Guilds, GuildFocus::List) => {
                self.selected_guild = self.selected_guild.saturating_sub(1);
            }
            _ => {
                if let Some(panel) = self.active_panel() {
                    panel.select_prev();
                }
            }
        }
    }

    /// Enter: open a guild from the list, or flip a toggle.
    pub fn activate(&mut self) {
        match (self.current_view, self.guild_focus) {
            (View::Guilds, GuildFocus::List) => self.open_selected_guild(),
            (View::Guilds, GuildFocus::Settings) | (View::Settings, _) => self.toggle_selected(),
            _ => {}
        }
    }

    /// Navigate back: close help, then leave the guild settings pane.
    pub fn go_back(&mut self) {
        if self.show_help {
            self.show_help = false;
        } else if self.current_view == View::Guilds && self.guild_focus == GuildFocus::Settings {
            self.guild_focus = GuildFocus::List;
        }
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn dismiss_toast(&mut self, now: Instant) {
        self.toasts.dismiss_latest(now);
    }

    pub fn dismiss_all_toasts(&mut self, now: Instant) {
        self.toasts.dismiss_all(now);
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Stop polling; called once the UI loop has ended.
    pub fn shutdown(&self) {
        self.manager.shutdown();
    }

    /// Export the current state to a JSON file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        export_view(&self.data, path)
    }
}

/// Build the JSON report for a state view.
pub fn export_report(view: &StateView) -> serde_json::Value {
    json!({
        "health": view.health,
        "last_error": view.last_error,
        "stats": view.stats,
        "analytics": view.analytics,
        "health_report": view.health_report,
    })
}

/// Write the JSON report for a state view to `path`.
pub fn export_view(view: &StateView, path: &Path) -> Result<()> {
    if view.stats.is_none() && view.analytics.is_none() && view.health_report.is_none() {
        anyhow::bail!("No data to export");
    }

    let json = serde_json::to_string_pretty(&export_report(view))?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};
    use crate::api::{ApiClient, DEFAULT_TIMEOUT};
    use crate::data::{ConnectionHealth, RetryCounter};
    use crate::manager::PollingConfig;
    use crate::notify::DEFAULT_TOAST_DURATION;

    fn app_with(transport: &Arc<ScriptedTransport>) -> App {
        let client = ApiClient::new(transport.clone(), DEFAULT_TIMEOUT, RetryCounter::new());
        let manager = Arc::new(DataManager::new(client, PollingConfig::default()));
        App::new(
            manager,
            Handle::current(),
            Theme::dark(),
            DEFAULT_TOAST_DURATION,
            Instant::now(),
        )
    }

    /// Let spawned actions finish, then drain them.
    async fn settle(app: &mut App) {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        app.process_events(Instant::now());
    }

    #[tokio::test]
    async fn test_stats_event_updates_view_and_chart() {
        let transport = ScriptedTransport::new();
        transport.push(
            "/api/stats",
            Reply::ok(json!({"guilds": 12, "users": 3400, "bot_status": "online", "latency": 45})),
        );
        let mut app = app_with(&transport);

        app.manager.update_stats().await;
        app.process_events(Instant::now());

        let stats = app.data.stats.as_ref().unwrap();
        assert_eq!(stats.guilds, 12);
        assert_eq!(app.data.health, ConnectionHealth::Healthy);
        assert_eq!(app.charts.latency.len(), 1);
        assert!(app.polling.is_empty());
    }

    #[tokio::test]
    async fn test_failed_toggle_reverts_with_error_toast() {
        let transport = ScriptedTransport::new();
        transport.push("/api/settings", Reply::status(500, json!({"error": "db down"})));
        let mut app = app_with(&transport);
        app.current_view = View::Settings;
        app.settings.selected = 4;

        app.toggle_selected();
        assert!(app.settings.get("maintenance_mode").unwrap().value);

        settle(&mut app).await;

        assert!(!app.settings.get("maintenance_mode").unwrap().value);
        assert!(!app.settings.get("maintenance_mode").unwrap().is_pending());
        let toast = app.toasts.iter().last().unwrap();
        assert_eq!(toast.severity, Severity::Error);
        assert!(toast.message.contains("Maintenance Mode"));
        // Action failures do not count against connection health.
        assert_eq!(app.data.health, ConnectionHealth::Connecting);
        assert_eq!(transport.count("/api/settings"), 1);
    }

    #[tokio::test]
    async fn test_successful_toggle_confirms() {
        let transport = ScriptedTransport::new();
        transport.push("/api/settings", Reply::ok(json!({"success": true})));
        let mut app = app_with(&transport);
        app.current_view = View::Settings;
        app.settings.selected = 3;

        app.toggle_selected();
        settle(&mut app).await;

        assert!(app.settings.get("auto_backup").unwrap().value);
        let toast = app.toasts.iter().last().unwrap();
        assert_eq!(toast.severity, Severity::Success);
        assert_eq!(toast.message, "Auto Backup enabled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_is_not_reentrant() {
        let transport = ScriptedTransport::new();
        transport.always(
            "/api/stats",
            Reply::delayed(Duration::from_secs(1), Reply::ok(json!({"guilds": 1}))),
        );
        transport.always("/api/analytics", Reply::ok(json!({})));
        transport.always("/api/bot/health", Reply::ok(json!({"status": "healthy"})));
        let mut app = app_with(&transport);
        let now = Instant::now();

        assert!(app.refresh(now));
        assert!(!app.refresh(now));
        assert_eq!(app.get_status_message(now), Some("Refresh already in progress"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        app.process_events(Instant::now());

        assert!(!app.is_refreshing);
        assert_eq!(transport.count("/api/stats"), 1);
        assert_eq!(app.toasts.iter().last().unwrap().message, "Dashboard refreshed");
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_background_poll_is_skipped() {
        let transport = ScriptedTransport::new();
        transport.push(
            "/api/stats",
            Reply::delayed(Duration::from_secs(1), Reply::ok(json!({"guilds": 1}))),
        );
        transport.push(
            "/api/analytics",
            Reply::delayed(Duration::from_secs(1), Reply::ok(json!({}))),
        );
        transport.push(
            "/api/bot/health",
            Reply::delayed(Duration::from_secs(1), Reply::ok(json!({"status": "healthy"}))),
        );
        let mut app = app_with(&transport);

        let manager = Arc::clone(&app.manager);
        let background = tokio::spawn(async move { manager.update_all().await });
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }

        app.refresh(Instant::now());
        tokio::time::sleep(Duration::from_secs(2)).await;
        background.await.unwrap();
        app.process_events(Instant::now());

        assert_eq!(transport.count("/api/stats"), 1);
        assert_eq!(transport.count("/api/analytics"), 1);
        assert_eq!(
            app.toasts.iter().last().unwrap().message,
            "Update already in progress"
        );
    }

    #[tokio::test]
    async fn test_guild_flow() {
        let transport = ScriptedTransport::new();
        transport.push(
            "/api/guilds",
            Reply::ok(json!({"guilds": [
                {"id": "42", "name": "Lads", "member_count": 120, "owner": true},
                {"id": 7, "name": "Other", "member_count": 3}
            ]})),
        );
        transport.push(
            "/api/guild/42/settings",
            Reply::ok(json!({"prefix": "l.", "spam_protection": true, "nsfw_filter": false})),
        );
        transport.push("/api/guild/42/reset-defaults", Reply::ok(json!({"success": true})));
        transport.push(
            "/api/guild/42/settings",
            Reply::ok(json!({"spam_protection": false, "nsfw_filter": false})),
        );
        let mut app = app_with(&transport);

        app.set_view(View::Guilds);
        settle(&mut app).await;
        assert_eq!(app.guilds.len(), 2);
        assert_eq!(app.guilds[1].id, "7");

        app.activate();
        settle(&mut app).await;
        assert_eq!(app.guild_focus, GuildFocus::Settings);
        let panel = app.guild_settings.as_ref().unwrap();
        assert_eq!(panel.scope, SettingScope::Guild("42".to_string()));
        assert!(panel.get("spam_protection").unwrap().value);

        app.reset_selected_guild(Instant::now());
        settle(&mut app).await;
        settle(&mut app).await;
        assert!(app
            .toasts
            .iter()
            .any(|t| t.message == "Settings for Lads reset to defaults"));
        let panel = app.guild_settings.as_ref().unwrap();
        assert!(!panel.get("spam_protection").unwrap().value);

        app.go_back();
        assert_eq!(app.guild_focus, GuildFocus::List);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopened_guild_ignores_result_of_earlier_toggle() {
        let transport = ScriptedTransport::new();
        transport.push(
            "/api/guilds",
            Reply::ok(json!({"guilds": [
                {"id": "1", "name": "Alpha", "member_count": 10},
                {"id": "2", "name": "Beta", "member_count": 20}
            ]})),
        );
        let alpha = "/api/guild/1/settings";
        transport.push(alpha, Reply::ok(json!({"spam_protection": false})));
        transport.push(
            alpha,
            Reply::delayed(
                Duration::from_secs(1),
                Reply::status(500, json!({"error": "db down"})),
            ),
        );
        transport.push(alpha, Reply::ok(json!({"spam_protection": false})));
        transport.push(
            alpha,
            Reply::delayed(Duration::from_secs(5), Reply::ok(json!({"success": true}))),
        );
        transport.push("/api/guild/2/settings", Reply::ok(json!({"spam_protection": true})));
        let mut app = app_with(&transport);

        app.set_view(View::Guilds);
        settle(&mut app).await;

        // Open Alpha and flip; the request is slow to fail.
        app.activate();
        settle(&mut app).await;
        app.toggle_selected();

        // Switch to Beta, then back to Alpha and flip again.
        app.go_back();
        app.select_next();
        app.activate();
        settle(&mut app).await;
        app.go_back();
        app.select_prev();
        app.activate();
        settle(&mut app).await;
        assert_eq!(
            app.guild_settings.as_ref().unwrap().scope,
            SettingScope::Guild("1".to_string())
        );
        app.toggle_selected();

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle(&mut app).await;
        let toggle = app.guild_settings.as_ref().unwrap().get("spam_protection").unwrap();
        assert!(toggle.value);
        assert!(toggle.is_pending());
        assert!(app.toasts.iter().all(|t| t.severity != Severity::Error));

        tokio::time::sleep(Duration::from_secs(5)).await;
        settle(&mut app).await;
        let toggle = app.guild_settings.as_ref().unwrap().get("spam_protection").unwrap();
        assert!(toggle.value);
        assert!(!toggle.is_pending());
        assert_eq!(
            app.toasts.iter().last().unwrap().message,
            "Spam Protection enabled"
        );
    }

    #[tokio::test]
    async fn test_notices_become_toasts() {
        let transport = ScriptedTransport::new();
        transport.always(
            "/api/analytics",
            Reply::Error(ApiError::Transport("refused".to_string())),
        );
        let mut app = app_with(&transport);

        for _ in 0..3 {
            app.manager.update_analytics().await;
        }
        app.process_events(Instant::now());

        assert_eq!(app.data.health, ConnectionHealth::Unhealthy);
        assert_eq!(app.toasts.len(), 1);
        assert_eq!(app.toasts.iter().next().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_view_cycle() {
        let mut view = View::Overview;
        for _ in 0..View::ALL.len() {
            view = view.next();
        }
        assert_eq!(view, View::Overview);
        assert_eq!(View::Overview.prev(), View::Settings);
        assert_eq!(View::Guilds.index(), 2);
    }

    #[test]
    fn test_export_requires_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let empty = crate::data::DashboardState::new().view();
        assert!(export_view(&empty, &path).is_err());

        let mut state = crate::data::DashboardState::new();
        state.set_stats(
            crate::data::StatsSnapshot {
                guilds: 5,
                ..Default::default()
            },
            Instant::now(),
        );
        export_view(&state.view(), &path).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["stats"]["guilds"], json!(5));
        assert_eq!(written["health"], json!("connecting"));
    }
}
