//! Stat blocks shown at the top of the metrics view.

use serde::Serialize;

use super::family::MetricFamily;
use super::lookup::{self, names, HistogramBar, MetricView};

/// Shown in place of a value the proxy did not report.
pub const NOT_AVAILABLE: &str = "Not available";

/// One titled value with units and an explanatory hint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatBlock {
    pub title: &'static str,
    pub value: String,
    pub units: Option<&'static str>,
    pub hint: String,
}

impl StatBlock {
    fn new(title: &'static str, value: Option<String>, hint: &str) -> Self {
        Self {
            title,
            value: value.unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            units: None,
            hint: hint.to_string(),
        }
    }

    fn units(mut self, units: &'static str) -> Self {
        self.units = Some(units);
        self
    }

    pub fn is_available(&self) -> bool {
        self.value != NOT_AVAILABLE
    }
}

/// Everything the metrics view shows besides the time series.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MetricsOverview {
    pub blocks: Vec<StatBlock>,
    pub response_times: Vec<HistogramBar>,
}

impl MetricsOverview {
    pub fn from_families(families: &[MetricFamily], now_ms: u64, total_requests: f64) -> Self {
        let start = MetricView::first(families, names::PROCESS_START_TIME);
        let uptime = start.value().map(|s| format!("{:.3}", now_ms as f64 / 1e3 - s));

        let used = lookup::cache_metric(families, "mem_used_bytes").value();
        let total = lookup::cache_metric(families, "mem_total_bytes").value();
        let usage = match (used, total) {
            (Some(used), Some(total)) if total != 0.0 => {
                Some(format!("{:.3}", used / total * 100.0))
            }
            _ => None,
        };
        let cache_mem = total.map(|t| format!("{:.3}", t / 1e6));
        let items = lookup::cache_metric(families, "items").value().map(format_count);

        let fetched = MetricView::nested(families, names::DOCUMENT, "status", "fetched");
        let forced = MetricView::nested(families, names::DOCUMENT, "status", "forced");

        let errors = MetricView::first(families, names::ERRORS);
        let virtual_mem = MetricView::first(families, names::PROCESS_VIRTUAL_MEMORY);
        let cpu = MetricView::first(families, names::PROCESS_CPU_SECONDS);

        let blocks = vec![
            StatBlock::new("Uptime", uptime, start.help_or("Time since the proxy started"))
                .units("Seconds"),
            StatBlock::new("Cache Usage", usage, "Percentage of cache memory used").units("%"),
            StatBlock::new("Cache Mem", cache_mem, "Total cache memory").units("Mb"),
            StatBlock::new("Cached Documents", items, "Number of items in cache"),
            StatBlock::new(
                "Total Requests",
                Some(format_count(total_requests)),
                "Total number of requests made",
            ),
            StatBlock::new(
                "Fetched (Docs)",
                Some(format_count(fetched.value_or(0.0))),
                "Number of unforced fetches",
            ),
            StatBlock::new(
                "Forced (Docs)",
                Some(format_count(forced.value_or(0.0))),
                "Number of forced fetches",
            ),
            StatBlock::new("Errors", errors.value().map(format_count), errors.help_or("Total errors")),
            StatBlock::new(
                "Virtual Memory",
                virtual_mem.value().map(format_count),
                virtual_mem.help_or("Virtual memory size in bytes"),
            )
            .units("Bytes"),
            StatBlock::new(
                "Total CPU Time",
                cpu.value().map(|v| v.to_string()),
                cpu.help_or("Total user and system CPU time"),
            )
            .units("Seconds"),
        ];

        Self {
            blocks,
            response_times: lookup::response_time_histogram(families),
        }
    }

    pub fn block(&self, title: &str) -> Option<&StatBlock> {
        self.blocks.iter().find(|b| b.title == title)
    }
}

/// Whole numbers without a fractional part, anything else as-is.
fn format_count(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::exposition::parse;
    use crate::data::fixtures::PROXY_METRICS;

    #[test]
    fn blocks_from_fixture() {
        let families = parse(PROXY_METRICS).unwrap();
        let overview = MetricsOverview::from_families(&families, 1_700_000_100_000, 1000.0);

        assert_eq!(overview.block("Uptime").unwrap().value, "100.000");
        assert_eq!(overview.block("Cache Usage").unwrap().value, "25.000");
        assert_eq!(overview.block("Cache Mem").unwrap().value, "50.000");
        assert_eq!(overview.block("Cached Documents").unwrap().value, "311");
        assert_eq!(overview.block("Total Requests").unwrap().value, "1000");
        assert_eq!(overview.block("Forced (Docs)").unwrap().value, "12");
        assert_eq!(overview.block("Errors").unwrap().hint, "Total errors");
        assert_eq!(overview.block("Total CPU Time").unwrap().value, "12.5");
        assert_eq!(overview.response_times.len(), 4);
    }

    #[test]
    fn missing_metrics_fall_back() {
        let overview = MetricsOverview::from_families(&[], 1_000, 0.0);
        let uptime = overview.block("Uptime").unwrap();
        assert_eq!(uptime.value, NOT_AVAILABLE);
        assert!(!uptime.is_available());
        assert_eq!(uptime.hint, "Time since the proxy started");
        // Document counts default to zero rather than "not available".
        assert_eq!(overview.block("Fetched (Docs)").unwrap().value, "0");
        assert_eq!(overview.block("Cache Usage").unwrap().value, NOT_AVAILABLE);
        assert!(overview.response_times.is_empty());
    }

    #[test]
    fn format_count_drops_zero_fraction() {
        assert_eq!(format_count(3.0), "3");
        assert_eq!(format_count(2.5), "2.5");
    }
}
