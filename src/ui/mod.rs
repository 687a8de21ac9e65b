//! Terminal UI rendering using ratatui.
//!
//! This module contains all the view-specific rendering logic for the TUI.
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`metrics`]: Stat blocks, time-series charts and the response-time histogram
//! - [`reports`]: Sortable tables of aggregated reports and document descriptions
//! - [`info`]: Build information of the proxy
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! The main loop in `main.rs` calls into these modules based on the current view:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (metrics/reports/info::render)       │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlay rendered on top:
//!    - common::render_help
//! ```

pub mod common;
pub mod info;
pub mod metrics;
pub mod reports;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render a bordered, centered one-line message in place of a view.
pub(crate) fn render_placeholder(
    frame: &mut Frame,
    theme: &Theme,
    title: &str,
    message: &str,
    style: Style,
    area: Rect,
) {
    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_type(theme.border_type)
        .border_style(Style::default().fg(theme.border));

    let paragraph = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(style.add_modifier(Modifier::ITALIC))
        .block(block);

    frame.render_widget(paragraph, area);
}
