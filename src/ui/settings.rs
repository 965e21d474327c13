//! Settings view rendering.
//!
//! Bot-wide toggles. [`render_panel`] is shared with the guild settings pane.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::theme::Tone;
use crate::app::App;
use crate::toggle::{SettingToggle, SettingsPanel};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::vertical([Constraint::Min(5), Constraint::Length(3)]).split(area);

    let title = if app.settings_loaded {
        " Bot settings ".to_string()
    } else {
        " Bot settings (defaults, loading...) ".to_string()
    };
    render_panel(frame, app, &app.settings, chunks[0], &title, true);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled(" B ", app.theme.badge_style(Tone::Warning)),
        Span::raw(" reload all cogs on the bot"),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(hint, chunks[1]);
}

/// On/off text and tone for a toggle. Pending toggles show their optimistic value.
pub fn toggle_cell(toggle: &SettingToggle) -> (&'static str, Tone) {
    match (toggle.value, toggle.is_pending()) {
        (_, true) => ("saving…", Tone::Info),
        (true, false) => ("● on", Tone::Success),
        (false, false) => ("○ off", Tone::Secondary),
    }
}

/// Render a toggle list with the selection highlighted when `focused`.
pub fn render_panel(
    frame: &mut Frame,
    app: &App,
    panel: &SettingsPanel,
    area: Rect,
    title: &str,
    focused: bool,
) {
    let header = Row::new(vec![Cell::from("Setting"), Cell::from("State")]).style(app.theme.header);

    let rows: Vec<Row> = panel
        .toggles
        .iter()
        .map(|toggle| {
            let (text, tone) = toggle_cell(toggle);
            let mut style = app.theme.tone_style(tone);
            if toggle.is_pending() {
                style = style.add_modifier(Modifier::ITALIC);
            }
            Row::new(vec![
                Cell::from(toggle.label.clone()),
                Cell::from(Span::styled(text, style)),
            ])
        })
        .collect();

    let border = if focused {
        app.theme.highlight
    } else {
        app.theme.border
    };
    let table = Table::new(rows, [Constraint::Min(20), Constraint::Length(10)])
        .header(header)
        .block(
            Block::default()
                .title(title.to_string())
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if focused && !panel.toggles.is_empty() {
        state.select(Some(panel.selected));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_cells() {
        let mut panel = SettingsPanel::global_defaults();
        assert_eq!(toggle_cell(&panel.toggles[0]).0, "● on");
        assert_eq!(toggle_cell(&panel.toggles[3]).1, Tone::Secondary);

        panel.begin_toggle(3);
        assert_eq!(toggle_cell(&panel.toggles[3]), ("saving…", Tone::Info));
    }
}
