//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, help overlay
//! and the toast stack.

use std::time::Instant;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

use super::format::{format_age, health_tone};
use super::theme::Tone;
use crate::app::{App, GuildFocus, View};
use crate::notify::Severity;

/// Render the header bar with the connection health badge.
///
/// Displays: health badge, bot name and version, API target, polls in flight.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let health = app.data.health;
    let tone = health_tone(health);

    let version = app
        .data
        .stats
        .as_ref()
        .and_then(|s| s.version.clone())
        .or_else(|| app.data.health_report.as_ref().and_then(|h| h.version.clone()));

    let mut spans = vec![
        Span::styled(format!(" {} ", health.label().to_uppercase()), app.theme.badge_style(tone)),
        Span::styled(" LADBOT ", Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(version) = version {
        spans.push(Span::styled(
            format!("v{} ", version),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    spans.push(Span::raw("│ "));
    spans.push(Span::raw(app.target().to_string()));

    if !app.polling.is_empty() || app.is_refreshing {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("updating…", app.theme.tone_style(Tone::Info)));
    }
    if !app.focused {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("paused", app.theme.tone_style(Tone::Secondary)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!("{}:{}", i + 1, view.label())))
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: time since last update, the last error, available controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect, now: Instant) {
    if let Some(msg) = app.get_status_message(now) {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match (app.current_view, app.guild_focus) {
        (View::Guilds, GuildFocus::List) => "↑↓:select Enter:settings R:reset r:refresh ?:help q:quit",
        (View::Guilds, GuildFocus::Settings) => "↑↓:select Space:toggle Esc:back r:refresh q:quit",
        (View::Settings, _) => "↑↓:select Space:toggle B:reload bot r:refresh ?:help q:quit",
        _ => "Tab:switch r:refresh x:dismiss ?:help q:quit",
    };

    let updated = match app.data.last_updated {
        Some(at) => format!("Updated {}", format_age(now.saturating_duration_since(at))),
        None => "Waiting for data".to_string(),
    };

    let mut spans = vec![Span::styled(
        format!(" {} │ {}", updated, controls),
        Style::default().add_modifier(Modifier::DIM),
    )];
    if let Some(ref err) = app.data.last_error {
        spans.push(Span::styled(
            format!(" │ {}", err),
            app.theme.tone_style(Tone::Danger),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn severity_tone(severity: Severity) -> Tone {
    match severity {
        Severity::Success => Tone::Success,
        Severity::Error => Tone::Danger,
        Severity::Warning => Tone::Warning,
        Severity::Info => Tone::Info,
    }
}

/// Render the toast stack in the top-right corner of `area`, newest on top.
pub fn render_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let width = 44u16.min(area.width.saturating_sub(2));
    if width < 10 {
        return;
    }
    let x = area.x + area.width.saturating_sub(width + 1);
    let mut y = area.y;

    for toast in app.toasts.iter().rev() {
        let height = 3u16;
        if y + height > area.y + area.height {
            break;
        }
        let tone = severity_tone(toast.severity);
        let mut style = app.theme.tone_style(tone);
        let mut border = Style::default().fg(app.theme.color(tone));
        if toast.is_dismissing() {
            style = style.add_modifier(Modifier::DIM);
            border = border.add_modifier(Modifier::DIM);
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(border);
        let text = Line::from(vec![
            Span::styled(format!("{} ", toast.severity.icon()), style),
            Span::raw(toast.message.clone()),
        ]);
        let toast_area = Rect::new(x, y, width, height);
        frame.render_widget(Clear, toast_area);
        frame.render_widget(
            Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
            toast_area,
        );
        y += height;
    }
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l 1-4   Switch views"),
        Line::from("  ↑/↓ j/k       Navigate list"),
        Line::from("  Enter         Open guild / toggle"),
        Line::from("  Esc           Back to guild list"),
        Line::from(""),
        section(" Settings"),
        Line::from("  Space         Toggle setting"),
        Line::from("  R             Reset guild to defaults"),
        Line::from("  B             Reload bot"),
        Line::from(""),
        section(" General"),
        Line::from("  r             Refresh now"),
        Line::from("  x / X         Dismiss toast / all"),
        Line::from("  e             Export to JSON"),
        Line::from("  q             Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
