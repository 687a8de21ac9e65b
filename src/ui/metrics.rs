//! Metrics view rendering.
//!
//! Stat blocks on top, one chart per series in the middle, and the
//! response-time distribution at the bottom. When the endpoint answers with
//! an error status, the whole view is replaced by an "unavailable" panel.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, BarChart, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame,
};

use super::{render_placeholder, Theme};
use crate::app::App;
use crate::data::{MetricsOverview, Series, SlidingWindow, StatBlock};
use crate::source::Availability;

const BLOCKS_PER_ROW: usize = 5;

/// Render the Metrics view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let metrics = &app.metrics;

    if let Availability::Unavailable { status } = metrics.availability {
        render_unavailable(frame, &app.theme, status, area);
        return;
    }

    if metrics.families.is_empty() {
        let message = match metrics.last_error {
            Some(ref err) => format!("Unable to read metrics: {}", err),
            None => "Waiting for the first poll...".to_string(),
        };
        let style = Style::default().fg(app.theme.warning);
        render_placeholder(frame, &app.theme, "Metrics", &message, style, area);
        return;
    }

    let overview = app.overview();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(6), Constraint::Length(9)])
        .split(area);

    render_blocks(frame, &app.theme, &overview, layout[0]);
    render_charts(frame, app, layout[1]);
    render_response_times(frame, &app.theme, &overview, layout[2]);
}

/// Panel shown in place of the dashboard while the endpoint is down.
fn render_unavailable(frame: &mut Frame, theme: &Theme, status: u16, area: Rect) {
    let message = format!(
        "Metrics endpoint unavailable (status {}). Retrying every poll.",
        status
    );
    let style = Style::default().fg(theme.critical);
    render_placeholder(frame, theme, "Metrics unavailable", &message, style, area);
}

fn render_blocks(frame: &mut Frame, theme: &Theme, overview: &MetricsOverview, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(area);

    for (row, blocks) in rows.iter().zip(overview.blocks.chunks(BLOCKS_PER_ROW)) {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, BLOCKS_PER_ROW as u32); BLOCKS_PER_ROW])
            .split(*row);

        for (cell, stat) in cells.iter().zip(blocks) {
            frame.render_widget(stat_paragraph(theme, stat), *cell);
        }
    }
}

fn stat_paragraph<'a>(theme: &Theme, stat: &'a StatBlock) -> Paragraph<'a> {
    let value_style = if stat.is_available() {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let mut spans = vec![Span::styled(stat.value.as_str(), value_style)];
    if let Some(units) = stat.units.filter(|_| stat.is_available()) {
        spans.push(Span::raw(format!(" {}", units)));
    }

    let block = Block::default()
        .title(format!(" {} ", stat.title))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    Paragraph::new(Line::from(spans)).block(block)
}

fn render_charts(frame: &mut Frame, app: &App, area: Rect) {
    let history = &app.metrics.history;
    let theme = &app.theme;

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    let requests = history.window(Series::RequestRate);
    let request_points = requests.chart_data();
    let chart = series_chart(
        theme,
        Series::RequestRate.title(),
        vec![dataset(Series::RequestRate.title(), &request_points, theme.series[0])],
        &[requests],
        format_rate,
    );
    frame.render_widget(chart, columns[0]);

    let memory = history.window(Series::ResidentMemory);
    let memory_points = memory.chart_data();
    let chart = series_chart(
        theme,
        Series::ResidentMemory.title(),
        vec![dataset("RSS", &memory_points, theme.series[1])],
        &[memory],
        format_bytes,
    );
    frame.render_widget(chart, columns[1]);

    let fetched = history.window(Series::FetchedRate);
    let served = history.window(Series::ServedRate);
    let fetched_points = fetched.chart_data();
    let served_points = served.chart_data();
    let chart = series_chart(
        theme,
        "Traffic (bytes/s)",
        vec![
            dataset("fetched", &fetched_points, theme.series[2]),
            dataset("served", &served_points, theme.series[0]),
        ],
        &[fetched, served],
        format_bytes,
    );
    frame.render_widget(chart, columns[2]);
}

fn dataset<'a>(name: &'static str, points: &'a [(f64, f64)], color: ratatui::style::Color) -> Dataset<'a> {
    Dataset::default()
        .name(name)
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(points)
}

fn series_chart<'a>(
    theme: &Theme,
    title: &'static str,
    datasets: Vec<Dataset<'a>>,
    windows: &[&SlidingWindow],
    format_label: fn(f64) -> String,
) -> Chart<'a> {
    let x_max = windows.iter().map(|w| w.capacity()).max().unwrap_or(1).saturating_sub(1).max(1);
    let y_max = windows.iter().map(|w| w.bounds().1).fold(0.0_f64, f64::max);
    let y_max = (y_max * 1.15).max(1.0);

    Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ", title))
                .borders(Borders::ALL)
                .border_type(theme.border_type)
                .border_style(Style::default().fg(theme.border)),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max as f64])
                .style(Style::default().fg(theme.border)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec![
                    Line::from("0"),
                    Line::from(format_label(y_max / 2.0)),
                    Line::from(format_label(y_max)),
                ])
                .style(Style::default().fg(theme.border)),
        )
        .legend_position(Some(LegendPosition::TopLeft))
}

fn render_response_times(frame: &mut Frame, theme: &Theme, overview: &MetricsOverview, area: Rect) {
    let block = Block::default()
        .title(" Response Time (ms) ")
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    if overview.response_times.is_empty() {
        let paragraph = Paragraph::new("No response-time histogram reported")
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let data: Vec<(&str, u64)> =
        overview.response_times.iter().map(|bar| (bar.label.as_str(), bar.count)).collect();
    let inner_width = area.width.saturating_sub(2) as usize;
    let bar_width = (inner_width / data.len().max(1)).saturating_sub(1).clamp(3, 9) as u16;

    let chart = BarChart::default()
        .block(block)
        .data(data.as_slice())
        .bar_width(bar_width)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme.highlight))
        .value_style(theme.header);

    frame.render_widget(chart, area);
}

fn format_rate(value: f64) -> String {
    format!("{:.1}", value)
}

/// Format a byte quantity with SI suffixes (e.g., 48234496 -> "48.2M").
fn format_bytes(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.1}G", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}
