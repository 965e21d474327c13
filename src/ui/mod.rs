//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//! Renderers only read [`App`](crate::app::App) state; they never fetch.
//!
//! ## Submodules
//!
//! - [`overview`]: Stat cards, bot status badge, resource gauges and latency chart
//! - [`analytics`]: Period counts, command usage table and chart, hourly activity
//! - [`guilds`]: Guild list with a per-guild settings pane
//! - [`settings`]: Bot-wide setting toggles
//! - [`common`]: Shared components (header, tabs, status bar, help, toasts)
//! - [`format`]: Number formatting and badge/progress mappings
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (overview/analytics/guilds/settings) │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - common::render_toasts
//!    - common::render_help
//! ```

pub mod analytics;
pub mod common;
pub mod format;
pub mod guilds;
pub mod overview;
pub mod settings;
pub mod theme;

pub use theme::{Theme, Tone};

use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

use crate::app::{App, View};

/// Draw one full frame.
pub fn draw(frame: &mut Frame, app: &App, now: std::time::Instant) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Overview => overview::render(frame, app, chunks[2]),
        View::Analytics => analytics::render(frame, app, chunks[2]),
        View::Guilds => guilds::render(frame, app, chunks[2]),
        View::Settings => settings::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3], now);
    common::render_toasts(frame, app, chunks[2]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use serde_json::json;
    use tokio::runtime::Handle;

    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};
    use crate::api::{ApiClient, DEFAULT_TIMEOUT};
    use crate::data::RetryCounter;
    use crate::manager::{DataManager, PollingConfig};
    use crate::notify::DEFAULT_TOAST_DURATION;

    fn screen(app: &App, now: Instant) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app, now)).unwrap();
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer[(x, y)].symbol());
            }
            text.push('\n');
        }
        text
    }

    #[tokio::test]
    async fn test_overview_shows_formatted_stats() {
        let transport = ScriptedTransport::new();
        transport.push(
            "/api/stats",
            Reply::ok(json!({"guilds": 12, "users": 3400, "bot_status": "online", "latency": 45})),
        );
        let client = ApiClient::new(transport.clone(), DEFAULT_TIMEOUT, RetryCounter::new());
        let manager = Arc::new(DataManager::new(client, PollingConfig::default()));
        let now = Instant::now();
        let mut app = App::new(
            manager.clone(),
            Handle::current(),
            Theme::dark(),
            DEFAULT_TOAST_DURATION,
            now,
        );

        let before = screen(&app, now);
        assert!(before.contains("Loading stats..."));

        manager.update_stats().await;
        app.process_events(now);

        let after = screen(&app, now);
        assert!(after.contains("3.4K"));
        assert!(after.contains("45ms"));
        assert!(after.contains("HEALTHY"));
        assert!(after.contains("ONLINE"));
    }

    #[tokio::test]
    async fn test_every_view_renders_without_data() {
        let transport = ScriptedTransport::new();
        let client = ApiClient::new(transport.clone(), DEFAULT_TIMEOUT, RetryCounter::new());
        let manager = Arc::new(DataManager::new(client, PollingConfig::default()));
        let now = Instant::now();
        let mut app = App::new(manager, Handle::current(), Theme::light(), DEFAULT_TOAST_DURATION, now);

        for view in View::ALL {
            app.current_view = view;
            let text = screen(&app, now);
            assert!(text.contains(view.label()));
        }
        app.current_view = View::Settings;
        assert!(screen(&app, now).contains("Maintenance"));
    }
}
