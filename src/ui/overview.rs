//! Overview rendering.
//!
//! Stat cards across the top, the bot status and resource gauges in the
//! middle, and the rolling latency chart filling the rest.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph},
    Frame,
};

use super::format::{format_latency, format_number, progress, status_badge};
use crate::app::App;
use crate::data::StatsSnapshot;

/// A labelled value in the card row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

/// Values shown in the card row, in display order.
pub fn stat_cards(stats: &StatsSnapshot) -> Vec<StatCard> {
    let card = |label, value| StatCard { label, value };
    vec![
        card("Guilds", format_number(stats.guilds)),
        card("Users", format_number(stats.users)),
        card("Commands", format_number(stats.commands)),
        card("Latency", format_latency(stats.latency)),
        card("Uptime", stats.uptime.clone()),
        card("Errors", format_number(stats.error_count)),
    ]
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref stats) = app.data.stats else {
        let message = match app.data.last_error {
            Some(ref err) => format!("No stats yet: {}", err),
            None => "Loading stats...".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        frame.render_widget(Paragraph::new(message).block(block), area);
        return;
    };

    let rows = Layout::vertical([
        Constraint::Length(3), // Cards
        Constraint::Length(3), // Status + gauges
        Constraint::Min(5),    // Latency chart
    ])
    .split(area);

    render_cards(frame, app, stats, rows[0]);
    render_resources(frame, app, stats, rows[1]);
    render_latency_chart(frame, app, rows[2]);
}

fn render_cards(frame: &mut Frame, app: &App, stats: &StatsSnapshot, area: Rect) {
    let cards = stat_cards(stats);
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let cells = Layout::horizontal(constraints).split(area);

    for (card, cell) in cards.iter().zip(cells.iter()) {
        let block = Block::default()
            .title(format!(" {} ", card.label))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let value = Paragraph::new(Line::from(Span::styled(
            card.value.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(block);
        frame.render_widget(value, *cell);
    }
}

fn render_resources(frame: &mut Frame, app: &App, stats: &StatsSnapshot, area: Rect) {
    let cells = Layout::horizontal([
        Constraint::Length(24),
        Constraint::Percentage(50),
        Constraint::Percentage(50),
    ])
    .split(area);

    let badge = status_badge(&stats.bot_status);
    let status = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", badge.text.to_uppercase()),
            app.theme.badge_style(badge.badge_tone),
        ),
        Span::raw(" "),
        Span::styled(
            format!("{} cogs", stats.loaded_cogs),
            app.theme.tone_style(badge.text_tone),
        ),
    ]))
    .block(
        Block::default()
            .title(" Bot ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(status, cells[0]);

    for (title, value, cell) in [
        (" Memory ", stats.memory_usage, cells[1]),
        (" CPU ", stats.cpu_usage, cells[2]),
    ] {
        let level = progress(value);
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_type(app.theme.border_type)
                    .border_style(Style::default().fg(app.theme.border)),
            )
            .gauge_style(Style::default().fg(app.theme.color(level.tone)))
            .ratio(level.percent / 100.0)
            .label(format!("{:.1}%", value));
        frame.render_widget(gauge, cell);
    }
}

fn render_latency_chart(frame: &mut Frame, app: &App, area: Rect) {
    let points = app.charts.latency_points();
    let (min_y, max_y) = app.charts.latency_bounds();
    let (min_x, max_x) = match (points.first(), points.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        (Some(first), _) => (first.0, first.0 + 1.0),
        _ => (0.0, 1.0),
    };

    let dataset = Dataset::default()
        .name("latency")
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(app.theme.highlight))
        .data(&points);

    let title = match app.charts.latency.latest() {
        Some(latest) => format!(" Latency ({}) ", format_latency(latest.millis)),
        None => " Latency ".to_string(),
    };

    let chart = Chart::new(vec![dataset])
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .x_axis(Axis::default().bounds([min_x, max_x]))
        .y_axis(
            Axis::default()
                .bounds([min_y, max_y])
                .labels(vec![
                    Line::from(format!("{:.0}", min_y)),
                    Line::from(format!("{:.0}ms", max_y)),
                ])
                .style(Style::default().add_modifier(Modifier::DIM)),
        );
    frame.render_widget(chart, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_cards_for_scenario() {
        let stats = StatsSnapshot {
            guilds: 12,
            users: 3400,
            bot_status: "online".to_string(),
            latency: 45.0,
            ..Default::default()
        };
        let cards = stat_cards(&stats);
        let value = |label: &str| {
            cards
                .iter()
                .find(|c| c.label == label)
                .map(|c| c.value.clone())
                .unwrap()
        };
        assert_eq!(value("Guilds"), "12");
        assert_eq!(value("Users"), "3.4K");
        assert_eq!(value("Latency"), "45ms");
    }
}
