//! Rolling series for the dashboard charts.

use serde::Serialize;

use super::family::MetricFamily;
use super::lookup::{self, find_family, names, MetricView};
use super::rate::{CounterResetPolicy, RateBasis, RateDeriver};
use super::window::{SlidingWindow, TimePoint, DEFAULT_WINDOW_CAPACITY};

/// RPC methods whose request counters make up "total requests".
pub const DEFAULT_API_METHODS: [&str; 4] = [
    "img_proxy_fetch",
    "img_proxy_describe",
    "img_proxy_report",
    "img_proxy_describe_report",
];

/// The charted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
    RequestRate,
    ResidentMemory,
    FetchedRate,
    ServedRate,
}

impl Series {
    pub const ALL: [Series; 4] =
        [Series::RequestRate, Series::ResidentMemory, Series::FetchedRate, Series::ServedRate];

    pub fn title(&self) -> &'static str {
        match self {
            Series::RequestRate => "Requests/s",
            Series::ResidentMemory => "Resident Memory",
            Series::FetchedRate => "Bytes Fetched/s",
            Series::ServedRate => "Bytes Served/s",
        }
    }
}

/// One window per series, plus the rate state of the counter-backed ones.
///
/// Owned by the sampler task; the UI only ever sees clones.
#[derive(Debug, Clone, Serialize)]
pub struct History {
    pub requests: SlidingWindow,
    pub memory: SlidingWindow,
    pub fetched: SlidingWindow,
    pub served: SlidingWindow,
    #[serde(skip)]
    request_rate: RateDeriver,
    #[serde(skip)]
    fetched_rate: RateDeriver,
    #[serde(skip)]
    served_rate: RateDeriver,
    #[serde(skip)]
    api_methods: Vec<String>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_CAPACITY, 5000)
    }
}

impl History {
    /// Create a history with primed windows and empty rate baselines.
    pub fn new(capacity: usize, period_ms: u64) -> Self {
        Self {
            requests: SlidingWindow::new(capacity),
            memory: SlidingWindow::new(capacity),
            fetched: SlidingWindow::new(capacity),
            served: SlidingWindow::new(capacity),
            request_rate: RateDeriver::new(period_ms),
            fetched_rate: RateDeriver::new(period_ms),
            served_rate: RateDeriver::new(period_ms),
            api_methods: DEFAULT_API_METHODS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn with_basis(mut self, basis: RateBasis) -> Self {
        self.request_rate = self.request_rate.with_basis(basis);
        self.fetched_rate = self.fetched_rate.with_basis(basis);
        self.served_rate = self.served_rate.with_basis(basis);
        self
    }

    pub fn with_reset_policy(mut self, policy: CounterResetPolicy) -> Self {
        self.request_rate = self.request_rate.with_reset_policy(policy);
        self.fetched_rate = self.fetched_rate.with_reset_policy(policy);
        self.served_rate = self.served_rate.with_reset_policy(policy);
        self
    }

    pub fn with_api_methods(mut self, methods: Vec<String>) -> Self {
        self.api_methods = methods;
        self
    }

    pub fn api_methods(&self) -> &[String] {
        &self.api_methods
    }

    pub fn window(&self, series: Series) -> &SlidingWindow {
        match series {
            Series::RequestRate => &self.requests,
            Series::ResidentMemory => &self.memory,
            Series::FetchedRate => &self.fetched,
            Series::ServedRate => &self.served,
        }
    }

    /// Sum of the configured request counters, `None` if the family is absent.
    pub fn total_requests(&self, families: &[MetricFamily]) -> Option<f64> {
        find_family(families, names::API_REQUESTS)?;
        Some(self.api_methods.iter().map(|m| lookup::api_requests(families, m)).sum())
    }

    /// Record one poll's snapshot.
    pub fn record(&mut self, families: &[MetricFamily], now_ms: u64) {
        let total = self.total_requests(families);
        if let Some(rate) = self.request_rate.observe(total, now_ms) {
            self.requests.push(TimePoint::new(now_ms, rate));
        }

        let memory = MetricView::first(families, names::PROCESS_RESIDENT_MEMORY).value();
        if let Some(bytes) = memory.filter(|v| *v != 0.0) {
            self.memory.push(TimePoint::new(now_ms, bytes));
        }

        let fetched = MetricView::nested(families, names::TRAFFIC, "metric", "fetched").value();
        if let Some(rate) = self.fetched_rate.observe(fetched, now_ms) {
            self.fetched.push(TimePoint::new(now_ms, rate));
        }

        let served = MetricView::nested(families, names::TRAFFIC, "metric", "served").value();
        if let Some(rate) = self.served_rate.observe(served, now_ms) {
            self.served.push(TimePoint::new(now_ms, rate));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::exposition::parse;
    use crate::data::family::{labels, MetricKind, MetricSample};
    use crate::data::fixtures::PROXY_METRICS;

    fn snapshot(fetch: f64, fetched: f64, served: f64, memory: f64) -> Vec<MetricFamily> {
        vec![
            MetricFamily::new("api_requests")
                .with_kind(MetricKind::Counter)
                .with_sample(MetricSample::single(labels([("rpc_method", "img_proxy_fetch")]), fetch)),
            MetricFamily::new("traffic")
                .with_kind(MetricKind::Counter)
                .with_sample(MetricSample::single(labels([("metric", "fetched")]), fetched))
                .with_sample(MetricSample::single(labels([("metric", "served")]), served)),
            MetricFamily::new("process_resident_memory_bytes")
                .with_kind(MetricKind::Gauge)
                .with_sample(MetricSample::single(labels([]), memory)),
        ]
    }

    #[test]
    fn first_poll_records_memory_but_no_rates() {
        let mut history = History::new(4, 5000);
        history.record(&parse(PROXY_METRICS).unwrap(), 5000);
        assert_eq!(history.requests.recorded().count(), 0);
        assert_eq!(history.fetched.recorded().count(), 0);
        assert_eq!(history.memory.latest(), Some(&TimePoint::new(5000, 48234496.0)));
        assert_eq!(history.memory.len(), 4);
    }

    #[test]
    fn second_poll_derives_rates() {
        let mut history = History::new(4, 5000);
        history.record(&snapshot(100.0, 1000.0, 2000.0, 10.0), 5000);
        history.record(&snapshot(150.0, 6000.0, 2500.0, 12.0), 10000);
        assert_eq!(history.requests.latest().map(|p| p.value), Some(10.0));
        assert_eq!(history.fetched.latest().map(|p| p.value), Some(1000.0));
        assert_eq!(history.served.latest().map(|p| p.value), Some(100.0));
        assert_eq!(history.memory.recorded().count(), 2);
    }

    #[test]
    fn zero_memory_is_not_recorded() {
        let mut history = History::new(4, 5000);
        history.record(&snapshot(1.0, 1.0, 1.0, 0.0), 5000);
        assert_eq!(history.memory.recorded().count(), 0);
    }

    #[test]
    fn total_requests_sums_configured_methods() {
        let families = parse(PROXY_METRICS).unwrap();
        let history = History::default();
        assert_eq!(history.total_requests(&families), Some(1000.0));

        let history = History::default().with_api_methods(vec!["img_proxy_fetch".to_string()]);
        assert_eq!(history.total_requests(&families), Some(900.0));
        assert_eq!(history.total_requests(&[]), None);
    }

    #[test]
    fn window_lookup_by_series() {
        let history = History::new(7, 5000);
        for series in Series::ALL {
            assert_eq!(history.window(series).len(), 7);
        }
    }
}
