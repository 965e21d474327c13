//! Analytics view rendering.
//!
//! Displays period command counts, the most used commands as a table and a
//! bar chart, and hourly activity as a sparkline.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::format::{format_number, format_percent, progress_tone};
use super::theme::Tone;
use crate::app::App;
use crate::data::AnalyticsSnapshot;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(ref analytics) = app.data.analytics else {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        frame.render_widget(Paragraph::new("Loading analytics...").block(block), area);
        return;
    };

    let rows = Layout::vertical([
        Constraint::Length(4), // Totals
        Constraint::Min(6),    // Commands
        Constraint::Length(3), // Activity
    ])
    .split(area);

    render_totals(frame, app, analytics, rows[0]);

    let columns =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).split(rows[1]);
    render_command_table(frame, app, analytics, columns[0]);
    render_command_chart(frame, app, columns[1]);

    render_activity(frame, app, rows[2]);
}

fn render_totals(frame: &mut Frame, app: &App, analytics: &AnalyticsSnapshot, area: Rect) {
    let label = |text: &'static str| Span::styled(text, Style::default().add_modifier(Modifier::DIM));
    let value = |text: String| Span::styled(text, Style::default().add_modifier(Modifier::BOLD));

    let delta = analytics.guild_growth_delta();
    let delta_style = if delta < 0 {
        app.theme.tone_style(Tone::Danger)
    } else {
        app.theme.tone_style(Tone::Success)
    };

    let lines = vec![
        Line::from(vec![
            label(" Today "),
            value(format_number(analytics.daily_commands)),
            label("  Week "),
            value(format_number(analytics.weekly_commands)),
            label("  Month "),
            value(format_number(analytics.monthly_commands)),
            label("  Total "),
            value(format_number(analytics.total_commands)),
        ]),
        Line::from(vec![
            label(" Error rate "),
            Span::styled(
                format_percent(analytics.error_rate),
                app.theme.tone_style(error_rate_tone(analytics.error_rate)),
            ),
            label("  Uptime "),
            value(format_percent(analytics.uptime_percentage)),
            label("  Avg response "),
            value(format!("{:.0}ms", analytics.average_response_time)),
            label("  Guild growth "),
            Span::styled(format!("{:+}", delta), delta_style),
        ]),
    ];

    let block = Block::default()
        .title(" Totals ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Error rates are small percentages; scale so 5% reads as danger.
fn error_rate_tone(rate: f64) -> Tone {
    progress_tone(rate * 16.0)
}

fn render_command_table(frame: &mut Frame, app: &App, analytics: &AnalyticsSnapshot, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Command"),
        Cell::from("Category"),
        Cell::from("Uses"),
    ])
    .style(app.theme.header);

    let rows: Vec<Row> = analytics
        .command_stats
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(entry.name.clone()),
                Cell::from(entry.category.clone()),
                Cell::from(format_number(entry.count)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(12),
        Constraint::Length(14),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" Commands ({}) ", analytics.command_stats.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, area);
}

fn render_command_chart(frame: &mut Frame, app: &App, area: Rect) {
    let bars: Vec<Bar> = app
        .charts
        .commands
        .iter()
        .map(|(name, count)| {
            Bar::default()
                .label(Line::from(name.clone()))
                .value(*count)
                .text_value(format_number(*count))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Top commands ")
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .direction(ratatui::layout::Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(app.theme.highlight))
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(chart, area);
}

fn render_activity(frame: &mut Frame, app: &App, area: Rect) {
    let levels = app.charts.activity_levels();
    let peak = app.charts.activity.iter().copied().max().unwrap_or(0);
    let line = if levels.is_empty() {
        Line::from(Span::styled(
            " No activity data",
            Style::default().add_modifier(Modifier::DIM),
        ))
    } else {
        Line::from(vec![
            Span::raw(" "),
            Span::styled(render_sparkline(&levels), Style::default().fg(app.theme.highlight)),
            Span::styled(
                format!("  peak {}", format_number(peak)),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ])
    };

    let block = Block::default()
        .title(" Hourly activity ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_sparkline(levels: &[u8]) -> String {
    levels.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparkline_levels() {
        assert_eq!(render_sparkline(&[0, 3, 7, 9]), "▁▄██");
        assert_eq!(render_sparkline(&[]), "");
    }

    #[test]
    fn test_error_rate_tone() {
        assert_eq!(error_rate_tone(0.5), Tone::Success);
        assert_eq!(error_rate_tone(4.0), Tone::Warning);
        assert_eq!(error_rate_tone(5.0), Tone::Danger);
    }
}
