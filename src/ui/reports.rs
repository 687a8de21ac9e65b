//! Reports and Moderation view rendering.
//!
//! Both views are sortable tables: the column under the cursor is
//! underlined, and the active sort column carries a direction arrow.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table as TableWidget, TableState},
    Frame,
};

use super::render_placeholder;
use crate::app::{App, Table};
use crate::data::{AggregatedReport, DescribedDocument};
use crate::source::Fetched;

/// Render the Reports view: one row per reported URL.
pub fn render_reports(frame: &mut Frame, app: &App, area: Rect) {
    let Some(reports) = ready_rows(frame, app, &app.reports, "Reports", area) else {
        return;
    };

    let rows: Vec<Row> = reports
        .iter()
        .map(|r| {
            Row::new(vec![
                Cell::from(r.index.to_string()),
                Cell::from(r.gateway_link(&app.gateway)),
                Cell::from(r.categories.join(", ")),
                Cell::from(r.num_reports.to_string()),
                Cell::from(r.updated_at.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(4),
        Constraint::Fill(2),
        Constraint::Length(8),
        Constraint::Fill(1),
    ];

    let total: usize = reports.iter().map(|r| r.num_reports).sum();
    let title = format!(" Reports ({} URLs, {} reports) [r:refresh] ", reports.len(), total);
    render_table(frame, app, &app.reports, title, rows, widths, area);
}

/// Render the Moderation view: one row per described document.
pub fn render_moderation(frame: &mut Frame, app: &App, area: Rect) {
    let Some(documents) = ready_rows(frame, app, &app.documents, "Moderation", area) else {
        return;
    };

    let rows: Vec<Row> = documents
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.index.to_string()),
                Cell::from(d.gateway_link(&app.gateway)),
                Cell::from(d.categories.join(", ")),
                Cell::from(d.status.to_string()).style(app.theme.document_style(d.status)),
                Cell::from(d.provider.clone()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(5),
        Constraint::Fill(4),
        Constraint::Fill(2),
        Constraint::Length(11),
        Constraint::Fill(1),
    ];

    let title = format!(" Moderation ({} documents) ", documents.len());
    render_table(frame, app, &app.documents, title, rows, widths, area);
}

/// Rows of a loaded table, or a placeholder rendered in its place.
fn ready_rows<'a, T>(
    frame: &mut Frame,
    app: &App,
    table: &'a Table<T>,
    title: &str,
    area: Rect,
) -> Option<&'a [T]> {
    match &table.rows {
        Fetched::Ready(rows) if !rows.is_empty() => Some(rows.as_slice()),
        Fetched::Ready(_) => {
            let style = Style::default().add_modifier(Modifier::DIM);
            render_placeholder(frame, &app.theme, title, "Nothing to show", style, area);
            None
        }
        Fetched::Pending => {
            let style = Style::default().fg(app.theme.warning);
            render_placeholder(frame, &app.theme, title, "Loading...", style, area);
            None
        }
        Fetched::Failed(err) => {
            let style = Style::default().fg(app.theme.critical);
            let message = format!("Request failed: {}", err);
            render_placeholder(frame, &app.theme, title, &message, style, area);
            None
        }
    }
}

fn render_table<T>(
    frame: &mut Frame,
    app: &App,
    table: &Table<T>,
    title: String,
    rows: Vec<Row>,
    widths: [Constraint; 5],
    area: Rect,
) {
    let header = Row::new(
        table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, (field, name))| Cell::from(format_header(name, field, i, table)))
            .collect::<Vec<_>>(),
    )
    .height(1)
    .style(app.theme.header);

    let count = rows.len();
    let widget = TableWidget::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(table.selected.min(count.saturating_sub(1))));

    frame.render_stateful_widget(widget, area, &mut state);
}

fn format_header<T>(name: &str, field: &str, column: usize, table: &Table<T>) -> Span<'static> {
    let text = match table.sort.direction_of(field) {
        Some(direction) => format!("{}{}", name, direction.arrow()),
        None => name.to_string(),
    };

    if column == table.column {
        Span::styled(text, Style::default().add_modifier(Modifier::UNDERLINED))
    } else {
        Span::raw(text)
    }
}
