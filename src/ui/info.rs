//! Info view rendering.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::source::{Availability, Fetched};

/// Render build information and sampler diagnostics.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let label = Style::default().add_modifier(Modifier::BOLD);
    let row = |name: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("  {:<18}", name), label), Span::raw(value)])
    };

    let (package, git) = match &app.info {
        Fetched::Ready(info) => (info.package_version.clone(), info.git_version.clone()),
        Fetched::Pending => ("Loading...".to_string(), "Loading...".to_string()),
        Fetched::Failed(err) => (format!("Unavailable: {}", err), "-".to_string()),
    };

    let availability = match app.metrics.availability {
        Availability::Pending => "waiting for first poll".to_string(),
        Availability::Available => "available".to_string(),
        Availability::Unavailable { status } => format!("unavailable (status {})", status),
    };

    let mut lines = vec![
        Line::from(""),
        row("Package version", package),
        row("Git version", git),
        Line::from(""),
        row("Source", app.source_description().to_string()),
        row("Metrics endpoint", availability),
        row("Polls", app.metrics.sequence.to_string()),
        row("Skipped lines", app.metrics.skipped_lines.to_string()),
        row("Gateway", app.gateway.clone()),
    ];

    if let Some(ref err) = app.metrics.last_error {
        lines.push(Line::from(vec![
            Span::styled(format!("  {:<18}", "Last error"), label),
            Span::styled(err.clone(), Style::default().fg(app.theme.critical)),
        ]));
    }

    let block = Block::default()
        .title(" Info ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}
