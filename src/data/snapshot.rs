//! Wire types for the bot API responses.
//!
//! These types match the JSON produced by the bot's web process. Every field
//! is optional on the wire and falls back to its zero value, so a dashboard
//! talking to an older or partially-ready bot still renders.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::ApiError;

/// Live bot statistics from `GET /api/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSnapshot {
    pub guilds: u64,
    pub users: u64,
    /// Number of registered commands.
    pub commands: u64,
    /// Preformatted uptime, e.g. "3h 12m 5s".
    pub uptime: String,
    /// Gateway latency in milliseconds.
    pub latency: f64,
    /// Host memory usage in percent.
    pub memory_usage: f64,
    /// Host CPU usage in percent.
    pub cpu_usage: f64,
    pub bot_status: String,
    pub loaded_cogs: u64,
    pub commands_today: u64,
    pub session_commands: u64,
    pub total_commands: u64,
    pub error_count: u64,
    pub last_updated: Option<String>,
    pub version: Option<String>,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            guilds: 0,
            users: 0,
            commands: 0,
            uptime: String::new(),
            latency: 0.0,
            memory_usage: 0.0,
            cpu_usage: 0.0,
            bot_status: "unknown".to_string(),
            loaded_cogs: 0,
            commands_today: 0,
            session_commands: 0,
            total_commands: 0,
            error_count: 0,
            last_updated: None,
            version: None,
        }
    }
}

/// A single row of command usage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandUsageEntry {
    pub name: String,
    pub count: u64,
    pub category: String,
    pub last_used: Option<String>,
}

/// A guild the bot is a member of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildSummary {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    pub name: String,
    pub member_count: u64,
    pub icon: Option<String>,
    /// Whether the logged-in dashboard user owns this guild.
    #[serde(deserialize_with = "lenient_flag")]
    pub owner: bool,
}

/// One point of the guild growth series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthPoint {
    pub date: String,
    pub count: u64,
}

/// Aggregated usage analytics from `GET /api/analytics`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSnapshot {
    pub total_guilds: u64,
    pub total_users: u64,
    pub total_commands: u64,
    pub daily_commands: u64,
    pub weekly_commands: u64,
    pub monthly_commands: u64,
    /// Share of failed commands, in percent.
    pub error_rate: f64,
    pub uptime_percentage: f64,
    pub average_response_time: f64,
    /// Ranked command usage. Older bots send this as `top_commands`.
    pub command_stats: Vec<CommandUsageEntry>,
    pub guilds: Vec<GuildSummary>,
    #[serde(deserialize_with = "activity_counts")]
    pub hourly_activity: Vec<u64>,
    pub guild_growth: Vec<GrowthPoint>,
}

impl AnalyticsSnapshot {
    /// Change in guild count across the growth series (last minus first).
    pub fn guild_growth_delta(&self) -> i64 {
        match (self.guild_growth.first(), self.guild_growth.last()) {
            (Some(first), Some(last)) => last.count as i64 - first.count as i64,
            _ => 0,
        }
    }
}

/// Response of the health endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    pub status: String,
    pub error: Option<String>,
    pub bot_status: Option<String>,
    pub uptime: Option<String>,
    pub version: Option<String>,
    pub timestamp: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Response of `GET /api/guilds`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GuildList {
    pub guilds: Vec<GuildSummary>,
}

/// A snapshot type that is merged field by field across polls.
pub trait Snapshot: Serialize + DeserializeOwned {
    /// Wire keys older bots use, paired with the current key.
    const LEGACY_KEYS: &'static [(&'static str, &'static str)] = &[];
}

impl Snapshot for StatsSnapshot {}

impl Snapshot for AnalyticsSnapshot {
    const LEGACY_KEYS: &'static [(&'static str, &'static str)] =
        &[("top_commands", "command_stats")];
}

/// Current key for a wire key.
fn canonical_key<T: Snapshot>(key: String) -> String {
    T::LEGACY_KEYS
        .iter()
        .find(|(legacy, _)| *legacy == key)
        .map(|(_, current)| current.to_string())
        .unwrap_or(key)
}

/// Merge a JSON object over the previous value of a snapshot.
///
/// Keys present in `body` replace the previous value; missing or `null` keys
/// keep it. Without a previous value, missing keys take their defaults.
/// Legacy keys are renamed before merging.
pub fn merge_snapshot<T: Snapshot>(previous: Option<&T>, body: Value) -> Result<T, ApiError> {
    let Value::Object(incoming) = body else {
        return Err(ApiError::Malformed("expected a JSON object".to_string()));
    };

    let mut merged = match previous {
        Some(prev) => match serde_json::to_value(prev)? {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        None => Map::new(),
    };

    for (key, value) in incoming {
        if !value.is_null() {
            merged.insert(canonical_key::<T>(key), value);
        }
    }

    Ok(serde_json::from_value(Value::Object(merged))?)
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(matches!(value, Value::Bool(true)))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

/// Hourly activity arrives either as plain counts or as `{hour, count}` objects.
fn activity_counts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u64>, D::Error> {
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .iter()
        .map(|v| {
            let count = match v {
                Value::Object(obj) => obj.get("count").unwrap_or(&Value::Null),
                other => other,
            };
            count
                .as_u64()
                .or_else(|| count.as_f64().map(|f| f.max(0.0).round() as u64))
                .unwrap_or(0)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stats_missing_fields_default() {
        let stats: StatsSnapshot =
            merge_snapshot(None, json!({"guilds": 12, "users": 3400})).unwrap();
        assert_eq!(stats.guilds, 12);
        assert_eq!(stats.users, 3400);
        assert_eq!(stats.bot_status, "unknown");
        assert_eq!(stats.latency, 0.0);
        assert!(stats.uptime.is_empty());
    }

    #[test]
    fn test_stats_partial_response_merges() {
        let first: StatsSnapshot = merge_snapshot(
            None,
            json!({"guilds": 12, "users": 3400, "bot_status": "online", "latency": 45}),
        )
        .unwrap();

        let second: StatsSnapshot =
            merge_snapshot(Some(&first), json!({"latency": 60, "uptime": null})).unwrap();
        assert_eq!(second.latency, 60.0);
        assert_eq!(second.guilds, 12);
        assert_eq!(second.bot_status, "online");
    }

    #[test]
    fn test_non_object_body_is_malformed() {
        let result: Result<StatsSnapshot, _> = merge_snapshot(None, json!([1, 2, 3]));
        assert!(matches!(result, Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let result: Result<StatsSnapshot, _> = merge_snapshot(None, json!({"guilds": "many"}));
        assert!(matches!(result, Err(ApiError::Malformed(_))));
    }

    #[test]
    fn test_analytics_accepts_legacy_shapes() {
        let analytics: AnalyticsSnapshot = merge_snapshot(
            None,
            json!({
                "total_guilds": 3,
                "top_commands": [{"name": "help", "count": 30}],
                "guilds": [{"id": 42, "name": "Lounge", "member_count": 10, "owner": "someone#1"}],
                "hourly_activity": [1, {"hour": 1, "count": 4}, 2.6],
                "guild_growth": [{"date": "2024-12-01", "count": 2}, {"date": "2024-12-30", "count": 7}]
            }),
        )
        .unwrap();

        assert_eq!(analytics.command_stats.len(), 1);
        assert_eq!(analytics.command_stats[0].name, "help");
        assert_eq!(analytics.guilds[0].id, "42");
        assert!(!analytics.guilds[0].owner);
        assert_eq!(analytics.hourly_activity, vec![1, 4, 3]);
        assert_eq!(analytics.guild_growth_delta(), 5);
    }

    #[test]
    fn test_legacy_key_merges_over_previous_snapshot() {
        let body = json!({"total_guilds": 3, "top_commands": [{"name": "help", "count": 30}]});
        let first: AnalyticsSnapshot = merge_snapshot(None, body.clone()).unwrap();

        let body2 = json!({"top_commands": [{"name": "ping", "count": 8}]});
        let second: AnalyticsSnapshot = merge_snapshot(Some(&first), body2).unwrap();
        assert_eq!(second.total_guilds, 3);
        assert_eq!(second.command_stats.len(), 1);
        assert_eq!(second.command_stats[0].name, "ping");

        let third: AnalyticsSnapshot = merge_snapshot(Some(&second), body).unwrap();
        assert_eq!(third.command_stats[0].name, "help");
    }

    #[test]
    fn test_health_report_status() {
        let report: HealthReport =
            serde_json::from_value(json!({"status": "healthy", "platform": "railway"})).unwrap();
        assert!(report.is_healthy());

        let report: HealthReport =
            serde_json::from_value(json!({"status": "starting", "error": "gateway"})).unwrap();
        assert!(!report.is_healthy());
        assert_eq!(report.error.as_deref(), Some("gateway"));
    }
}
