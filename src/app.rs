//! Application state and navigation logic.

use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use serde_json::{json, Value};

use crate::data::{AggregatedReport, DescribedDocument, MetricsOverview, SortEngine, Sortable};
use crate::source::{BuildInfo, Fetched, MetricsFeed, MetricsState};
use crate::ui::Theme;

/// Columns of the reports table as `(field, header)`.
pub const REPORT_COLUMNS: &[(&str, &str)] = &[
    ("index", "#"),
    ("url", "URL"),
    ("categories", "Categories"),
    ("num_reports", "Reports"),
    ("updated_at", "Updated"),
];

/// Columns of the moderation table as `(field, header)`.
pub const DOCUMENT_COLUMNS: &[(&str, &str)] = &[
    ("index", "#"),
    ("url", "URL"),
    ("categories", "Categories"),
    ("status", "Status"),
    ("provider", "Provider"),
];

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Stat blocks, time series and the response-time histogram.
    Metrics,
    /// Reports aggregated by URL.
    Reports,
    /// Document descriptions.
    Moderation,
    /// Build information.
    Info,
}

impl View {
    pub const ALL: [View; 4] = [View::Metrics, View::Reports, View::Moderation, View::Info];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Metrics => View::Reports,
            View::Reports => View::Moderation,
            View::Moderation => View::Info,
            View::Info => View::Metrics,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Metrics => View::Info,
            View::Reports => View::Metrics,
            View::Moderation => View::Reports,
            View::Info => View::Moderation,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Metrics => "Metrics",
            View::Reports => "Reports",
            View::Moderation => "Moderation",
            View::Info => "Info",
        }
    }

    /// Title shown in the tab bar, e.g. `" 1:Metrics "`.
    pub fn tab_title(&self) -> String {
        format!(" {}:{} ", self.index() + 1, self.label())
    }

    /// The view whose tab covers `column` in the tab bar.
    ///
    /// Each tab is its title plus one column of padding on either side,
    /// followed by a one-column divider.
    pub fn at_tab_column(column: u16) -> Option<View> {
        let mut start = 0u16;
        for view in View::ALL {
            let end = start + view.tab_title().chars().count() as u16 + 2;
            if column < end {
                return Some(view);
            }
            start = end + 1;
            if column < start {
                return None;
            }
        }
        None
    }

    pub fn index(&self) -> usize {
        match self {
            View::Metrics => 0,
            View::Reports => 1,
            View::Moderation => 2,
            View::Info => 3,
        }
    }
}

/// A sortable table: its rows, sort state, selected column and row.
#[derive(Debug, Clone)]
pub struct Table<T> {
    pub rows: Fetched<Vec<T>>,
    pub sort: SortEngine,
    pub column: usize,
    pub selected: usize,
    columns: &'static [(&'static str, &'static str)],
}

impl<T> Table<T> {
    fn new(columns: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            rows: Fetched::Pending,
            sort: SortEngine::default(),
            column: 0,
            selected: 0,
            columns,
        }
    }

    pub fn columns(&self) -> &'static [(&'static str, &'static str)] {
        self.columns
    }
}

impl<T: Sortable> Table<T> {
    /// Replace the rows, keeping the active sort.
    fn replace(&mut self, mut rows: Fetched<Vec<T>>) {
        if let Some(rows) = rows.ready_mut() {
            self.sort.apply(rows);
        }
        self.rows = rows;
        self.clamp_selection();
    }

    fn len(&self) -> usize {
        self.rows.ready().map_or(0, Vec::len)
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.len().saturating_sub(1));
    }

    fn next_column(&mut self) {
        self.column = (self.column + 1) % self.columns.len();
    }

    fn prev_column(&mut self) {
        self.column = (self.column + self.columns.len() - 1) % self.columns.len();
    }

    /// Activate sorting on the selected column.
    fn activate_sort(&mut self) {
        let (field, _) = self.columns[self.column];
        match self.rows.ready_mut() {
            Some(rows) => self.sort.activate(field, rows),
            None => self.sort.activate::<T>(field, &mut []),
        }
    }

    fn select_next_n(&mut self, n: usize) {
        self.selected = (self.selected + n).min(self.len().saturating_sub(1));
    }

    fn select_prev_n(&mut self, n: usize) {
        self.selected = self.selected.saturating_sub(n);
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    // Data source
    feed: MetricsFeed,
    pub metrics: MetricsState,
    pub reports: Table<AggregatedReport>,
    pub documents: Table<DescribedDocument>,
    pub info: Fetched<BuildInfo>,

    // UI
    pub gateway: String,
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App reading from `feed`.
    pub fn new(feed: MetricsFeed, gateway: impl Into<String>, theme: Theme) -> Self {
        Self {
            running: true,
            current_view: View::Metrics,
            show_help: false,
            feed,
            metrics: MetricsState::default(),
            reports: Table::new(REPORT_COLUMNS),
            documents: Table::new(DOCUMENT_COLUMNS),
            info: Fetched::Pending,
            gateway: gateway.into(),
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> &str {
        self.feed.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Take whatever the sampler published since the last call.
    ///
    /// Returns true if anything changed.
    pub fn reload_data(&mut self) -> bool {
        let mut changed = false;

        if let Some(metrics) = self.feed.poll_metrics() {
            self.metrics = metrics;
            changed = true;
        }
        if let Some(reports) = self.feed.poll_reports() {
            self.reports.replace(reports);
            changed = true;
        }
        if let Some(documents) = self.feed.poll_documents() {
            self.documents.replace(documents);
            changed = true;
        }
        if let Some(info) = self.feed.poll_info() {
            self.info = info;
            changed = true;
        }

        changed
    }

    /// Stat blocks for the latest metrics.
    pub fn overview(&self) -> MetricsOverview {
        self.metrics.overview(now_ms())
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    /// Move the column cursor right in the current table.
    pub fn next_column(&mut self) {
        match self.current_view {
            View::Reports => self.reports.next_column(),
            View::Moderation => self.documents.next_column(),
            _ => {}
        }
    }

    /// Move the column cursor left in the current table.
    pub fn prev_column(&mut self) {
        match self.current_view {
            View::Reports => self.reports.prev_column(),
            View::Moderation => self.documents.prev_column(),
            _ => {}
        }
    }

    /// Sort the current table by the column under the cursor.
    pub fn activate_sort(&mut self) {
        match self.current_view {
            View::Reports => self.reports.activate_sort(),
            View::Moderation => self.documents.activate_sort(),
            _ => {}
        }
    }

    /// Move selection down by n rows.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Reports => self.reports.select_next_n(n),
            View::Moderation => self.documents.select_next_n(n),
            _ => {}
        }
    }

    /// Move selection up by n rows.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Reports => self.reports.select_prev_n(n),
            View::Moderation => self.documents.select_prev_n(n),
            _ => {}
        }
    }

    /// Ask the sampler for a fresh report list.
    pub fn request_reports(&mut self) {
        let message = if self.feed.request_reports() {
            "Refreshing reports..."
        } else {
            "Report refresh already queued"
        };
        self.set_status_message(message.to_string());
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current state to a file.
    pub fn export_state(&self, path: &Path) -> Result<()> {
        if self.metrics.sequence == 0 {
            anyhow::bail!("No data to export");
        }

        let export = export_snapshot(
            self.source_description(),
            &self.metrics,
            &self.reports.rows,
            &self.documents.rows,
            &self.info,
            now_ms(),
        );
        write_export(&export, path)
    }
}

/// Wall-clock time in milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Build the JSON document written by `e` and `--export`.
pub fn export_snapshot(
    source: &str,
    metrics: &MetricsState,
    reports: &Fetched<Vec<AggregatedReport>>,
    documents: &Fetched<Vec<DescribedDocument>>,
    info: &Fetched<BuildInfo>,
    now_ms: u64,
) -> Value {
    let mut export = serde_json::Map::new();

    export.insert("source".to_string(), json!(source));
    export.insert("exported_at_ms".to_string(), json!(now_ms));
    export.insert("availability".to_string(), json!(metrics.availability));
    export.insert("last_updated_ms".to_string(), json!(metrics.last_updated_ms));
    export.insert("last_error".to_string(), json!(metrics.last_error));
    export.insert("skipped_lines".to_string(), json!(metrics.skipped_lines));
    export.insert("overview".to_string(), json!(metrics.overview(now_ms)));
    export.insert("history".to_string(), json!(metrics.history));
    export.insert("reports".to_string(), json!(reports));
    export.insert("documents".to_string(), json!(documents));
    export.insert("info".to_string(), json!(info));

    Value::Object(export)
}

/// Write an export document as pretty JSON.
pub fn write_export(export: &Value, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(export)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{parse, DocumentStatus, History, SortDirection};
    use crate::data::fixtures::PROXY_METRICS;
    use crate::source::{feed_channel, Availability, FeedPublisher};

    fn report(index: usize, url: &str, num_reports: usize) -> AggregatedReport {
        AggregatedReport {
            index,
            id: vec![format!("r{}", index)],
            url: url.to_string(),
            categories: vec!["Violence".to_string()],
            updated_at: "2023-01-01".to_string(),
            num_reports,
        }
    }

    fn app() -> (FeedPublisher, App) {
        let (publisher, feed) = feed_channel("test");
        (publisher, App::new(feed, "https://gw/ipfs/", Theme::dark()))
    }

    fn metrics_state() -> MetricsState {
        let mut state = MetricsState::new(History::default());
        state.sequence = 1;
        state.availability = Availability::Available;
        state.families = parse(PROXY_METRICS).unwrap();
        state.total_requests = 1000.0;
        state
    }

    #[test]
    fn test_view_cycles() {
        let mut view = View::Metrics;
        for expected in [View::Reports, View::Moderation, View::Info, View::Metrics] {
            view = view.next();
            assert_eq!(view, expected);
        }
        assert_eq!(View::Metrics.prev(), View::Info);
        assert_eq!(View::Moderation.index(), 2);
    }

    #[test]
    fn test_reload_takes_published_values() {
        let (publisher, mut app) = app();
        assert!(!app.reload_data());

        publisher.metrics.send_replace(metrics_state());
        publisher.info.send_replace(Fetched::Ready(BuildInfo {
            package_version: "0.3.1".to_string(),
            git_version: "abc".to_string(),
        }));
        assert!(app.reload_data());
        assert_eq!(app.metrics.sequence, 1);
        assert_eq!(app.info.ready().unwrap().package_version, "0.3.1");
        assert!(!app.reload_data());
    }

    #[test]
    fn test_sort_survives_report_refresh() {
        let (publisher, mut app) = app();
        app.set_view(View::Reports);
        app.next_column();
        app.next_column();
        app.next_column();
        assert_eq!(REPORT_COLUMNS[app.reports.column].0, "num_reports");

        publisher
            .reports
            .send_replace(Fetched::Ready(vec![report(0, "A", 2), report(1, "B", 1)]));
        app.reload_data();

        app.activate_sort();
        let order: Vec<usize> = app.reports.rows.ready().unwrap().iter().map(|r| r.num_reports).collect();
        assert_eq!(order, vec![1, 2]);

        app.activate_sort();
        assert_eq!(app.reports.sort.direction_of("num_reports"), Some(SortDirection::Descending));

        publisher.reports.send_replace(Fetched::Ready(vec![
            report(0, "A", 1),
            report(1, "B", 3),
            report(2, "C", 2),
        ]));
        app.reload_data();
        let order: Vec<usize> = app.reports.rows.ready().unwrap().iter().map(|r| r.num_reports).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_column_cursor_wraps() {
        let (_publisher, mut app) = app();
        app.set_view(View::Moderation);
        app.prev_column();
        assert_eq!(DOCUMENT_COLUMNS[app.documents.column].0, "provider");
        app.next_column();
        assert_eq!(app.documents.column, 0);
    }

    #[test]
    fn test_selection_is_clamped() {
        let (publisher, mut app) = app();
        app.set_view(View::Moderation);
        publisher.documents.send_replace(Fetched::Ready(vec![DescribedDocument {
            index: 0,
            url: "ipfs://ipfs/Qm1".to_string(),
            status: DocumentStatus::Blocked,
            categories: Vec::new(),
            provider: "p".to_string(),
        }]));
        app.reload_data();
        app.select_next_n(10);
        assert_eq!(app.documents.selected, 0);
    }

    #[test]
    fn test_request_reports_sets_status() {
        let (_publisher, mut app) = app();
        app.request_reports();
        assert_eq!(app.get_status_message(), Some("Refreshing reports..."));
        app.request_reports();
        assert_eq!(app.get_status_message(), Some("Report refresh already queued"));
    }

    #[test]
    fn test_export_requires_data() {
        let (_publisher, app) = app();
        let dir = tempfile::tempdir().unwrap();
        assert!(app.export_state(&dir.path().join("out.json")).is_err());
    }

    #[test]
    fn test_export_writes_snapshot() {
        let (publisher, mut app) = app();
        publisher.metrics.send_replace(metrics_state());
        publisher.reports.send_replace(Fetched::Ready(vec![report(0, "A", 2)]));
        app.reload_data();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        app.export_state(&path).unwrap();

        let value: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["source"], "test");
        assert_eq!(value["availability"]["state"], "available");
        assert_eq!(value["reports"]["state"], "ready");
        assert_eq!(value["reports"]["value"][0]["num_reports"], 2);
        assert_eq!(value["info"]["state"], "pending");
        assert!(value["overview"]["blocks"].as_array().unwrap().len() >= 10);
    }
}
