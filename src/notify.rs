//! Toast notifications.
//!
//! Toasts are independent: each has its own timer and leaves the queue once
//! the timer and the dismissal animation have both elapsed, or shortly after
//! the user dismisses it.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default time a toast stays visible.
pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// How long a dismissed toast stays on screen (rendered dimmed).
pub const DISMISS_ANIMATION: Duration = Duration::from_millis(300);

/// Toasts beyond this count push out the oldest.
const MAX_TOASTS: usize = 8;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "✔",
            Severity::Error => "✖",
            Severity::Warning => "▲",
            Severity::Info => "●",
        }
    }
}

/// Lifecycle of a toast on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    /// Dismissed at the given instant; removed once the animation completes.
    Dismissing(Instant),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created: Instant,
    pub duration: Duration,
    pub phase: ToastPhase,
}

impl Toast {
    pub fn is_dismissing(&self) -> bool {
        matches!(self.phase, ToastPhase::Dismissing(_))
    }
}

/// Ordered queue of toasts, oldest first.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    toasts: VecDeque<Toast>,
    next_id: u64,
    default_duration: Duration,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_DURATION)
    }
}

impl ToastQueue {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            next_id: 1,
            default_duration,
        }
    }

    /// Show a toast with the default duration. Returns its id.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>, now: Instant) -> u64 {
        self.push_with_duration(severity, message, self.default_duration, now)
    }

    pub fn push_with_duration(
        &mut self,
        severity: Severity,
        message: impl Into<String>,
        duration: Duration,
        now: Instant,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        self.toasts.push_back(Toast {
            id,
            message: message.into(),
            severity,
            created: now,
            duration,
            phase: ToastPhase::Visible,
        });
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
        id
    }

    /// Start dismissing the toast with `id`. Returns false if it is unknown or
    /// already dismissing.
    pub fn dismiss(&mut self, id: u64, now: Instant) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) if !toast.is_dismissing() => {
                toast.phase = ToastPhase::Dismissing(now);
                true
            }
            _ => false,
        }
    }

    /// Dismiss the most recent visible toast.
    pub fn dismiss_latest(&mut self, now: Instant) -> bool {
        let latest = self.toasts.iter().rev().find(|t| !t.is_dismissing()).map(|t| t.id);
        latest.is_some_and(|id| self.dismiss(id, now))
    }

    pub fn dismiss_all(&mut self, now: Instant) {
        for toast in self.toasts.iter_mut().filter(|t| !t.is_dismissing()) {
            toast.phase = ToastPhase::Dismissing(now);
        }
    }

    /// Advance timers: expire visible toasts and drop finished animations.
    pub fn tick(&mut self, now: Instant) {
        for toast in self.toasts.iter_mut() {
            if toast.phase == ToastPhase::Visible
                && now.saturating_duration_since(toast.created) >= toast.duration
            {
                toast.phase = ToastPhase::Dismissing(now);
            }
        }
        self.toasts.retain(|t| match t.phase {
            ToastPhase::Visible => true,
            ToastPhase::Dismissing(since) => {
                now.saturating_duration_since(since) < DISMISS_ANIMATION
            }
        });
    }

    /// Toasts oldest first; reverse for newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }
}
