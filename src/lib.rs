//! # ladbot-dashboard
//!
//! A terminal admin dashboard and library for monitoring a Ladbot Discord bot
//! through its web API.
//!
//! The dashboard polls the bot's stats, analytics and health endpoints on
//! independent timers, tracks connection health across consecutive failures,
//! and renders the results in an interactive terminal UI. Bot-wide and
//! per-guild settings can be toggled from the UI with optimistic updates.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐  events   ┌──────────┐  draw   ┌──────────────┐ │
//! │  │ manager │──────────▶│   app    │────────▶│      ui      │ │
//! │  │(polling)│           │ (state)  │         │ (rendering)  │ │
//! │  └────┬────┘           └────┬─────┘         └──────────────┘ │
//! │       │                     │ toggles, resets                │
//! │       ▼                     ▼                                │
//! │  ┌──────────────────────────────┐                            │
//! │  │  api (ApiClient + Transport) │◀── HttpTransport (reqwest) │
//! │  └──────────────────────────────┘                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`api`]**: Typed access to the bot's endpoints with timeouts and error
//!   classification, behind a [`Transport`] trait
//! - **[`data`]**: Snapshots, the shared [`DashboardState`], connection health
//!   transitions and chart history
//! - **[`manager`]**: [`DataManager`] runs the polling loops and refreshes
//! - **[`app`]**: UI-side state, navigation and user actions
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`toggle`]**, **[`notify`]**: Settings toggles and toast notifications
//!
//! ## Usage
//!
//! ```bash
//! # Watch a bot running locally
//! ladbot-dashboard --url http://127.0.0.1:8080
//!
//! # Fetch everything once and write a JSON report
//! ladbot-dashboard --url https://bot.example.com --export report.json
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use ladbot_dashboard::{ApiClient, DataManager, HttpTransport, PollingConfig, RetryCounter};
//! use ladbot_dashboard::api::DEFAULT_TIMEOUT;
//!
//! # tokio_test::block_on(async {
//! let transport = Arc::new(HttpTransport::new("http://127.0.0.1:8080", None).unwrap());
//! let client = ApiClient::new(transport, DEFAULT_TIMEOUT, RetryCounter::new());
//! let manager = DataManager::new(client, PollingConfig::default());
//!
//! let report = manager.update_all().await;
//! println!("health: {:?}, ok: {}", manager.health(), report.is_success());
//! # });
//! ```

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod manager;
pub mod notify;
pub mod toggle;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiClient, ApiError, HttpTransport, Transport};
pub use app::App;
pub use config::{DashboardConfig, ThemeChoice};
pub use data::{
    AnalyticsSnapshot, ConnectionHealth, DashboardEvent, DashboardState, HealthReport,
    RetryCounter, StatsSnapshot,
};
pub use manager::{DataManager, PollingConfig, RefreshReport};
