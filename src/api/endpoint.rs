//! The fixed set of bot API endpoints the dashboard talks to.

/// A bot API endpoint.
///
/// Each endpoint has one canonical path. Some have deprecated aliases that
/// older bot versions still serve; the client falls back to them on a 404.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Stats,
    Analytics,
    Health,
    Guilds,
    Settings,
    GuildSettings(String),
    GuildResetDefaults(String),
    BotReload,
}

impl Endpoint {
    /// Canonical path of this endpoint.
    pub fn path(&self) -> String {
        match self {
            Endpoint::Stats => "/api/stats".to_string(),
            Endpoint::Analytics => "/api/analytics".to_string(),
            Endpoint::Health => "/api/bot/health".to_string(),
            Endpoint::Guilds => "/api/guilds".to_string(),
            Endpoint::Settings => "/api/settings".to_string(),
            Endpoint::GuildSettings(id) => format!("/api/guild/{}/settings", id),
            Endpoint::GuildResetDefaults(id) => format!("/api/guild/{}/reset-defaults", id),
            Endpoint::BotReload => "/api/bot/reload".to_string(),
        }
    }

    /// Deprecated paths tried in order when the canonical path answers 404.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Endpoint::Analytics => &["/api/analytics/refresh"],
            Endpoint::Health => &["/api/system/status", "/api/health", "/health"],
            _ => &[],
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Stats => "stats",
            Endpoint::Analytics => "analytics",
            Endpoint::Health => "health",
            Endpoint::Guilds => "guilds",
            Endpoint::Settings => "settings",
            Endpoint::GuildSettings(_) => "guild-settings",
            Endpoint::GuildResetDefaults(_) => "guild-reset-defaults",
            Endpoint::BotReload => "bot-reload",
        }
    }
}
