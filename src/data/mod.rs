//! Data models and processing for bot API snapshots.
//!
//! ## Submodules
//!
//! - [`snapshot`]: Wire types ([`StatsSnapshot`], [`AnalyticsSnapshot`], [`HealthReport`])
//!   and the shallow merge used for partial responses
//! - [`health`]: [`ConnectionHealth`] classification and the shared [`RetryCounter`]
//! - [`state`]: [`DashboardState`] and the [`DashboardEvent`] bus
//! - [`history`]: Chart datasets with rolling time series
//!
//! ## Data Flow
//!
//! ```text
//! JSON body (ApiClient)
//!        │
//!        ▼
//! merge_snapshot(previous, body)
//!        │
//!        ├──▶ DashboardState::set_stats / set_analytics ──▶ DashboardEvent
//!        │
//!        └──▶ ChartData::record_* (in the UI, on the event)
//! ```

pub mod health;
pub mod history;
pub mod snapshot;
pub mod state;

pub use health::{ConnectionHealth, PollSignal, RetryCounter, DEFAULT_MAX_RETRIES};
pub use history::{ChartData, RollingBuffer, TIME_SERIES_CAPACITY};
pub use snapshot::{
    AnalyticsSnapshot, CommandUsageEntry, GrowthPoint, GuildSummary, HealthReport, StatsSnapshot,
};
pub use state::{DashboardEvent, DashboardState, Notice, Resource, StateView};
