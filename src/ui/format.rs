//! Value formatting and badge mappings shared by the views.

use std::time::Duration;

use super::theme::Tone;
use crate::data::ConnectionHealth;

/// Format a count for display (e.g., 1500 -> "1.5K", 2000000 -> "2.0M").
pub fn format_number(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Latency in whole milliseconds, e.g. "45ms".
pub fn format_latency(millis: f64) -> String {
    format!("{}ms", millis.max(0.0).round() as u64)
}

pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// "3s ago", "2m ago", "1h ago".
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s ago", secs)
    } else if secs < 3600 {
        format!("{}m ago", secs / 60)
    } else {
        format!("{}h ago", secs / 3600)
    }
}

/// A progress bar's fill and color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Fill percentage, clamped to 0..=100.
    pub percent: f64,
    pub tone: Tone,
}

pub fn progress(value: f64) -> Progress {
    let percent = if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    };
    Progress {
        percent,
        tone: progress_tone(value),
    }
}

/// Upper boundaries are inclusive: 50 is already a warning, 80 is danger.
pub fn progress_tone(value: f64) -> Tone {
    if value < 50.0 {
        Tone::Success
    } else if value < 80.0 {
        Tone::Warning
    } else {
        Tone::Danger
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBadge {
    pub text: &'static str,
    pub text_tone: Tone,
    pub badge_tone: Tone,
}

/// Map the bot's presence to a badge. Anything unrecognized is `unknown`.
pub fn status_badge(status: &str) -> StatusBadge {
    let (text, text_tone, badge_tone) = match status.trim().to_ascii_lowercase().as_str() {
        "online" => ("online", Tone::Success, Tone::Success),
        "idle" => ("idle", Tone::Warning, Tone::Warning),
        "dnd" => ("do not disturb", Tone::Danger, Tone::Danger),
        "offline" => ("offline", Tone::Secondary, Tone::Danger),
        _ => ("unknown", Tone::Secondary, Tone::Secondary),
    };
    StatusBadge {
        text,
        text_tone,
        badge_tone,
    }
}

pub fn health_tone(health: ConnectionHealth) -> Tone {
    match health {
        ConnectionHealth::Connecting => Tone::Info,
        ConnectionHealth::Healthy => Tone::Success,
        ConnectionHealth::Degraded => Tone::Warning,
        ConnectionHealth::Unhealthy => Tone::Danger,
        ConnectionHealth::Disconnected => Tone::Secondary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(12), "12");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1500), "1.5K");
        assert_eq!(format_number(3400), "3.4K");
        assert_eq!(format_number(2_000_000), "2.0M");
    }

    #[test]
    fn test_progress_boundaries() {
        assert_eq!(progress(49.0).tone, Tone::Success);
        assert_eq!(progress(50.0).tone, Tone::Warning);
        assert_eq!(progress(79.0).tone, Tone::Warning);
        assert_eq!(progress(80.0).tone, Tone::Danger);
    }

    #[test]
    fn test_progress_clamps_width() {
        assert_eq!(progress(-5.0).percent, 0.0);
        assert_eq!(progress(140.0).percent, 100.0);
        assert_eq!(progress(140.0).tone, Tone::Danger);
        assert_eq!(progress(f64::NAN).percent, 0.0);
    }

    #[test]
    fn test_status_badges() {
        let online = status_badge("online");
        assert_eq!(online.text, "online");
        assert_eq!(online.badge_tone, Tone::Success);
        assert_eq!(status_badge("dnd").badge_tone, Tone::Danger);
        assert_eq!(status_badge("Idle").text, "idle");
        assert_eq!(status_badge("streaming"), status_badge("unknown"));
        assert_eq!(status_badge(""), status_badge("unknown"));
    }

    #[test]
    fn test_health_tones() {
        assert_eq!(health_tone(ConnectionHealth::Healthy), Tone::Success);
        assert_eq!(health_tone(ConnectionHealth::Unhealthy), Tone::Danger);
        assert_eq!(health_tone(ConnectionHealth::Degraded).label(), "warning");
    }

    #[test]
    fn test_latency_and_age() {
        assert_eq!(format_latency(45.0), "45ms");
        assert_eq!(format_latency(44.6), "45ms");
        assert_eq!(format_age(Duration::from_secs(3)), "3s ago");
        assert_eq!(format_age(Duration::from_secs(125)), "2m ago");
    }
}
