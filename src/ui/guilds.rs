//! Guilds view rendering.
//!
//! Guild list on the left; the selected guild's settings on the right once
//! loaded with Enter.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::format::format_number;
use super::settings::render_panel;
use crate::app::{App, GuildFocus};
use crate::toggle::SettingScope;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).split(area);

    render_list(frame, app, columns[0]);
    render_settings(frame, app, columns[1]);
}

fn render_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.guild_focus == GuildFocus::List;
    let border = if focused {
        app.theme.highlight
    } else {
        app.theme.border
    };
    let block = Block::default()
        .title(format!(" Guilds ({}) ", app.guilds.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(border));

    if app.guilds.is_empty() {
        let text = if app.guilds_loaded {
            "No guilds"
        } else {
            "Loading guilds..."
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Members"),
        Cell::from("ID"),
    ])
    .style(app.theme.header);

    let rows: Vec<Row> = app
        .guilds
        .iter()
        .map(|guild| {
            let name = if guild.owner {
                format!("{} ★", guild.name)
            } else {
                guild.name.clone()
            };
            Row::new(vec![
                Cell::from(name),
                Cell::from(format_number(guild.member_count)),
                Cell::from(guild.id.clone()).style(Style::default().add_modifier(Modifier::DIM)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(20),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_guild));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_settings(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.guild_focus == GuildFocus::Settings;
    match app.guild_settings {
        Some(ref panel) => {
            let name = match panel.scope {
                SettingScope::Guild(ref id) => app
                    .guilds
                    .iter()
                    .find(|g| &g.id == id)
                    .map(|g| g.name.clone())
                    .unwrap_or_else(|| id.clone()),
                SettingScope::Global => "bot".to_string(),
            };
            render_panel(frame, app, panel, area, &format!(" {} ", name), focused);
        }
        None => {
            let block = Block::default()
                .title(" Settings ")
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border));
            frame.render_widget(
                Paragraph::new("Press Enter to load the selected guild's settings").block(block),
                area,
            );
        }
    }
}
