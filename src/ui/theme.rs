//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::DocumentStatus;
use crate::source::Availability;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for data that has not arrived yet.
    pub warning: Color,
    /// Color for an unavailable endpoint and blocked documents.
    pub critical: Color,
    /// Color for an answering endpoint and allowed documents.
    pub healthy: Color,
    /// Colors of the charted series, in plotting order.
    pub series: [Color; 3],
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            series: [Color::Cyan, Color::Magenta, Color::Yellow],
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            series: [Color::Blue, Color::Magenta, Color::Red],
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Get style for the endpoint availability
    pub fn availability_style(&self, availability: Availability) -> Style {
        match availability {
            Availability::Available => Style::default().fg(self.healthy),
            Availability::Pending => Style::default().fg(self.warning),
            Availability::Unavailable { .. } => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }

    /// Get style for a moderation status
    pub fn document_style(&self, status: DocumentStatus) -> Style {
        match status {
            DocumentStatus::Blocked => Style::default().fg(self.critical),
            DocumentStatus::Allowed => Style::default().fg(self.healthy),
            DocumentStatus::NeverSeen => Style::default().add_modifier(Modifier::DIM),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_is_bold() {
        let theme = Theme::dark();
        let style = theme.availability_style(Availability::Unavailable { status: 503 });
        assert_eq!(style.fg, Some(theme.critical));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(theme.availability_style(Availability::Available).fg, Some(Color::Green));
    }
}
