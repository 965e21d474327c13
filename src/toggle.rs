//! Boolean setting toggles with optimistic update and rollback.
//!
//! Flipping a toggle changes its value immediately and issues exactly one
//! update request. If the request fails, the toggle is restored to its
//! previous value once; a toggle with a request in flight ignores further
//! flips until the request resolves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::api::{ApiError, SettingsMap};

/// Where a setting lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingScope {
    /// Bot-wide settings (`/api/settings`).
    Global,
    /// Per-guild settings (`/api/guild/{id}/settings`).
    Guild(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingToggle {
    pub key: String,
    pub label: String,
    pub value: bool,
    pending: Option<u64>,
}

impl SettingToggle {
    pub fn new(key: &str, value: bool) -> Self {
        Self {
            key: key.to_string(),
            label: label_for(key),
            value,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// A change to send to the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    pub request_id: u64,
    pub scope: SettingScope,
    pub key: String,
    pub value: bool,
}

/// Result of resolving a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Confirmed { key: String, value: bool },
    Reverted { key: String, restored: bool },
    /// The request is unknown or already resolved; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    index: usize,
    previous: bool,
}

/// Source of change request ids.
///
/// Clones share one sequence, so panels built from the same source never
/// reuse an id even when a scope is closed and reopened.
#[derive(Debug, Clone)]
pub struct RequestIds(Arc<AtomicU64>);

impl Default for RequestIds {
    fn default() -> Self {
        Self(Arc::new(AtomicU64::new(1)))
    }
}

impl RequestIds {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// A list of toggles for one scope.
#[derive(Debug, Clone)]
pub struct SettingsPanel {
    pub scope: SettingScope,
    pub toggles: Vec<SettingToggle>,
    pub selected: usize,
    in_flight: HashMap<u64, InFlight>,
    request_ids: RequestIds,
}

/// Bot-wide boolean settings and their defaults.
const GLOBAL_DEFAULTS: [(&str, bool); 5] = [
    ("error_logging", true),
    ("analytics_enabled", true),
    ("welcome_message_enabled", true),
    ("auto_backup", false),
    ("maintenance_mode", false),
];

impl SettingsPanel {
    pub fn new(scope: SettingScope, toggles: Vec<SettingToggle>) -> Self {
        Self {
            scope,
            toggles,
            selected: 0,
            in_flight: HashMap::new(),
            request_ids: RequestIds::default(),
        }
    }

    /// Draw request ids from a shared source.
    pub fn with_request_ids(mut self, ids: RequestIds) -> Self {
        self.request_ids = ids;
        self
    }

    /// Global panel populated with the bot's default values.
    pub fn global_defaults() -> Self {
        let toggles = GLOBAL_DEFAULTS
            .iter()
            .map(|(key, value)| SettingToggle::new(key, *value))
            .collect();
        Self::new(SettingScope::Global, toggles)
    }

    /// Build a panel from a settings object, keeping only boolean entries.
    pub fn from_settings(scope: SettingScope, settings: &SettingsMap) -> Self {
        let toggles = settings
            .iter()
            .filter_map(|(key, value)| value.as_bool().map(|v| SettingToggle::new(key, v)))
            .collect();
        Self::new(scope, toggles)
    }

    /// Overlay values fetched from the API. Toggles with a request in flight
    /// keep their optimistic value; unknown boolean keys are appended.
    pub fn apply_remote(&mut self, settings: &SettingsMap) {
        for (key, value) in settings {
            let Some(value) = value.as_bool() else {
                continue;
            };
            match self.toggles.iter_mut().find(|t| &t.key == key) {
                Some(toggle) if !toggle.is_pending() => toggle.value = value,
                Some(_) => {}
                None => self.toggles.push(SettingToggle::new(key, value)),
            }
        }
    }

    pub fn select_next(&mut self) {
        let max = self.toggles.len().saturating_sub(1);
        self.selected = (self.selected + 1).min(max);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Flip the selected toggle.
    pub fn toggle_selected(&mut self) -> Option<PendingChange> {
        self.begin_toggle(self.selected)
    }

    /// Flip the toggle at `index` and return the change to send, or `None` if
    /// the index is out of range or a request is already in flight.
    pub fn begin_toggle(&mut self, index: usize) -> Option<PendingChange> {
        let toggle = self.toggles.get_mut(index)?;
        if toggle.is_pending() {
            return None;
        }

        let request_id = self.request_ids.next();
        let previous = toggle.value;
        toggle.value = !previous;
        toggle.pending = Some(request_id);
        self.in_flight.insert(request_id, InFlight { index, previous });

        Some(PendingChange {
            request_id,
            scope: self.scope.clone(),
            key: toggle.key.clone(),
            value: toggle.value,
        })
    }

    /// Apply the outcome of a change request.
    pub fn resolve(&mut self, request_id: u64, result: &Result<(), ApiError>) -> Resolution {
        let Some(flight) = self.in_flight.remove(&request_id) else {
            return Resolution::Stale;
        };
        let Some(toggle) = self.toggles.get_mut(flight.index) else {
            return Resolution::Stale;
        };
        toggle.pending = None;

        match result {
            Ok(()) => Resolution::Confirmed {
                key: toggle.key.clone(),
                value: toggle.value,
            },
            Err(_) => {
                toggle.value = flight.previous;
                Resolution::Reverted {
                    key: toggle.key.clone(),
                    restored: flight.previous,
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&SettingToggle> {
        self.toggles.iter().find(|t| t.key == key)
    }
}

/// JSON value sent for a toggle.
pub fn toggle_value(value: bool) -> Value {
    Value::Bool(value)
}

/// "spam_protection" -> "Spam Protection"
fn label_for(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn failure() -> Result<(), ApiError> {
        Err(ApiError::Http { status: 500 })
    }

    #[test]
    fn test_labels() {
        assert_eq!(label_for("spam_protection"), "Spam Protection");
        assert_eq!(label_for("nsfw_filter"), "Nsfw Filter");
        assert_eq!(label_for("ping"), "Ping");
    }

    #[test]
    fn test_toggle_is_optimistic() {
        let mut panel = SettingsPanel::global_defaults();
        let change = panel.begin_toggle(3).unwrap();
        assert_eq!(change.key, "auto_backup");
        assert!(change.value);
        assert!(panel.get("auto_backup").unwrap().value);
        assert!(panel.get("auto_backup").unwrap().is_pending());
    }

    #[test]
    fn test_failed_toggle_reverts_exactly_once() {
        let mut panel = SettingsPanel::global_defaults();
        let change = panel.begin_toggle(0).unwrap();
        assert!(!panel.get("error_logging").unwrap().value);

        assert_eq!(
            panel.resolve(change.request_id, &failure()),
            Resolution::Reverted {
                key: "error_logging".to_string(),
                restored: true,
            }
        );
        assert!(panel.get("error_logging").unwrap().value);

        // The same failure delivered again must not flip the value back.
        assert_eq!(panel.resolve(change.request_id, &failure()), Resolution::Stale);
        assert!(panel.get("error_logging").unwrap().value);
    }

    #[test]
    fn test_pending_toggle_ignores_flips() {
        let mut panel = SettingsPanel::global_defaults();
        let change = panel.begin_toggle(1).unwrap();
        assert!(panel.begin_toggle(1).is_none());

        assert_eq!(
            panel.resolve(change.request_id, &Ok(())),
            Resolution::Confirmed {
                key: "analytics_enabled".to_string(),
                value: false,
            }
        );
        assert!(panel.begin_toggle(1).is_some());
    }

    #[test]
    fn test_out_of_range_index() {
        let mut panel = SettingsPanel::global_defaults();
        assert!(panel.begin_toggle(99).is_none());
    }

    #[test]
    fn test_from_settings_keeps_booleans() {
        let settings: SettingsMap = serde_json::from_value(json!({
            "prefix": "l.",
            "command_cooldown": 3,
            "spam_protection": true,
            "nsfw_filter": false
        }))
        .unwrap();
        let panel = SettingsPanel::from_settings(SettingScope::Guild("7".to_string()), &settings);
        let keys: Vec<&str> = panel.toggles.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["nsfw_filter", "spam_protection"]);
    }

    #[test]
    fn test_apply_remote_respects_pending() {
        let mut panel = SettingsPanel::global_defaults();
        let _change = panel.begin_toggle(4).unwrap();

        let remote: SettingsMap = serde_json::from_value(json!({
            "maintenance_mode": false,
            "auto_backup": true,
            "debug_mode": true
        }))
        .unwrap();
        panel.apply_remote(&remote);

        assert!(panel.get("maintenance_mode").unwrap().value);
        assert!(panel.get("auto_backup").unwrap().value);
        assert!(panel.get("debug_mode").is_some());
    }

    #[test]
    fn test_shared_ids_survive_reopening_a_scope() {
        let ids = RequestIds::default();
        let settings: SettingsMap = serde_json::from_value(json!({"spam_protection": true})).unwrap();
        let scope = SettingScope::Guild("7".to_string());

        let mut first = SettingsPanel::from_settings(scope.clone(), &settings)
            .with_request_ids(ids.clone());
        let old = first.begin_toggle(0).unwrap();

        let mut reopened =
            SettingsPanel::from_settings(scope, &settings).with_request_ids(ids.clone());
        let new = reopened.begin_toggle(0).unwrap();
        assert_ne!(old.request_id, new.request_id);

        // The closed panel's result does not touch the new change.
        assert_eq!(reopened.resolve(old.request_id, &failure()), Resolution::Stale);
        assert!(!reopened.get("spam_protection").unwrap().value);
        assert!(reopened.get("spam_protection").unwrap().is_pending());

        assert_eq!(
            reopened.resolve(new.request_id, &failure()),
            Resolution::Reverted {
                key: "spam_protection".to_string(),
                restored: true,
            }
        );
    }
}
