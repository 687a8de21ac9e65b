//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{now_ms, App, View};
use crate::data::Series;
use crate::source::Availability;

/// Render the header bar with the endpoint state.
///
/// Displays: availability indicator, source, total requests, request rate.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let metrics = &app.metrics;
    let status_style = app.theme.availability_style(metrics.availability);

    let state = match metrics.availability {
        Availability::Pending => "waiting".to_string(),
        Availability::Available => "up".to_string(),
        Availability::Unavailable { status } => format!("down ({})", status),
    };

    let mut spans = vec![
        Span::styled(" ● ", status_style),
        Span::styled("IMGPROXY DOCTOR ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::raw(app.source_description().to_string()),
        Span::raw(" │ "),
        Span::styled(state, status_style),
    ];

    if metrics.sequence > 0 {
        let rate = metrics
            .history
            .window(Series::RequestRate)
            .latest()
            .filter(|p| !p.is_placeholder())
            .map(|p| format!("{:.1}/s", p.value))
            .unwrap_or_else(|| "-".to_string());

        spans.extend([
            Span::raw(" │ "),
            Span::styled(
                format_count(metrics.total_requests),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(" requests │ "),
            Span::raw(rate),
        ]);
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
fn format_count(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.1}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.1}K", n / 1_000.0)
    } else {
        format!("{:.0}", n)
    }
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .map(|view| Line::from(view.tab_title()))
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
/// Shows: time since last update, active sort, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Metrics | View::Info => "Tab:switch e:export ?:help q:quit",
        View::Reports => "←→:column Enter:sort r:refresh Tab:switch ?:help q:quit",
        View::Moderation => "←→:column Enter:sort Tab:switch ?:help q:quit",
    };

    let sort = match app.current_view {
        View::Reports => Some(app.reports.sort.state()),
        View::Moderation => Some(app.documents.sort.state()),
        _ => None,
    }
    .map(|state| format!("sort {}{} | ", state.field, state.direction.arrow()))
    .unwrap_or_default();

    let status = if let Some(updated) = app.metrics.last_updated_ms {
        let elapsed = now_ms().saturating_sub(updated) as f64 / 1000.0;
        let error = app
            .metrics
            .last_error
            .as_deref()
            .map(|e| format!("Error: {} | ", e))
            .unwrap_or_default();
        format!(" {}Updated {:.1}s ago | {}{}", error, elapsed, sort, controls)
    } else if let Some(ref err) = app.metrics.last_error {
        format!(" Error: {} | {}{}", err, sort, controls)
    } else {
        format!(" Loading... | {}{}", sort, controls)
    };

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  Tab/S-Tab   Switch views"),
        Line::from("  1-4         Jump to view"),
        Line::from("  ↑/↓ j/k     Navigate rows"),
        Line::from("  PgUp/PgDn   Jump 10 rows"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Reports & Moderation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Choose column"),
        Line::from("  Enter/s     Sort by column"),
        Line::from("  r           Refresh reports"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  e           Export to JSON"),
        Line::from("  q/Esc       Quit"),
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

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 22u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
