//! Scheduled sampling of a [`DataSource`].
//!
//! The [`Sampler`] runs as a set of tokio tasks:
//!
//! - the metrics loop polls the exposition immediately and then every
//!   `poll_interval`. Each fetch is awaited inside the loop, so at most one
//!   is in flight, and ticks missed during a slow fetch are delayed rather
//!   than bursted.
//! - the reports loop fetches the report list once at start and again on
//!   every [`MetricsFeed::request_reports`].
//! - one-shot tasks fetch the document descriptions and build info.
//!
//! Results reach the UI through watch channels (latest value wins), read
//! without blocking by [`MetricsFeed`]. [`SamplerHandle::shutdown`] cancels
//! every task; a fetch in flight at that moment is abandoned and nothing is
//! published afterwards.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{BuildInfo, DataSource};
use crate::data::history::DEFAULT_API_METHODS;
use crate::data::reports::index_documents;
use crate::data::{
    aggregate, AggregatedReport, CounterResetPolicy, DescribedDocument, ExpositionParser,
    History, MetricFamily, MetricsOverview, RateBasis,
};
use crate::error::{Error, Result};

/// Whether the metrics endpoint is currently answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Availability {
    /// No poll has completed yet.
    #[default]
    Pending,
    Available,
    /// The endpoint answered with a non-success status.
    Unavailable { status: u16 },
}

/// Result of a one-off fetch.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Fetched<T> {
    #[default]
    Pending,
    Ready(T),
    Failed(String),
}

impl<T> Fetched<T> {
    pub fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Fetched::Ready(value),
            Err(e) => Fetched::Failed(e.to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Fetched::Pending)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Fetched::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match self {
            Fetched::Ready(value) => Some(value),
            _ => None,
        }
    }
}

/// Everything the metrics view needs from one poll.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsState {
    /// Incremented on every completed poll.
    pub sequence: u64,
    pub availability: Availability,
    /// Families of the last successful poll.
    pub families: Vec<MetricFamily>,
    pub history: History,
    pub total_requests: f64,
    pub last_updated_ms: Option<u64>,
    pub last_error: Option<String>,
    /// Lines skipped by the last successful parse.
    pub skipped_lines: usize,
}

impl Default for MetricsState {
    fn default() -> Self {
        Self::new(History::default())
    }
}

impl MetricsState {
    pub fn new(history: History) -> Self {
        Self {
            sequence: 0,
            availability: Availability::Pending,
            families: Vec::new(),
            history,
            total_requests: 0.0,
            last_updated_ms: None,
            last_error: None,
            skipped_lines: 0,
        }
    }

    pub fn overview(&self, now_ms: u64) -> MetricsOverview {
        MetricsOverview::from_families(&self.families, now_ms, self.total_requests)
    }
}

/// Sampler settings.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub poll_interval: Duration,
    pub window_capacity: usize,
    pub rate_basis: RateBasis,
    pub counter_reset: CounterResetPolicy,
    pub api_methods: Vec<String>,
    /// Documents to describe at start; `"*"` selects all of them.
    pub describe_urls: Vec<String>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
            window_capacity: 60,
            rate_basis: RateBasis::default(),
            counter_reset: CounterResetPolicy::default(),
            api_methods: DEFAULT_API_METHODS.iter().map(|m| m.to_string()).collect(),
            describe_urls: vec!["*".to_string()],
        }
    }
}

impl SamplerConfig {
    fn history(&self) -> History {
        History::new(self.window_capacity, self.poll_interval.as_millis() as u64)
            .with_basis(self.rate_basis)
            .with_reset_policy(self.counter_reset)
            .with_api_methods(self.api_methods.clone())
    }
}

/// Producer half of a feed, used by the sampler tasks.
#[derive(Debug)]
pub struct FeedPublisher {
    pub metrics: watch::Sender<MetricsState>,
    pub reports: watch::Sender<Fetched<Vec<AggregatedReport>>>,
    pub documents: watch::Sender<Fetched<Vec<DescribedDocument>>>,
    pub info: watch::Sender<Fetched<BuildInfo>>,
    pub report_requests: mpsc::Receiver<()>,
}

/// Consumer half of a feed, read by the UI thread.
///
/// Like a channel-backed data source, every `poll_*` method is non-blocking
/// and returns `Some` only when a new value has been published.
#[derive(Debug)]
pub struct MetricsFeed {
    metrics: watch::Receiver<MetricsState>,
    reports: watch::Receiver<Fetched<Vec<AggregatedReport>>>,
    documents: watch::Receiver<Fetched<Vec<DescribedDocument>>>,
    info: watch::Receiver<Fetched<BuildInfo>>,
    report_requests: mpsc::Sender<()>,
    description: String,
}

/// Create a connected publisher/feed pair.
pub fn feed_channel(description: &str) -> (FeedPublisher, MetricsFeed) {
    let (metrics_tx, metrics_rx) = watch::channel(MetricsState::default());
    let (reports_tx, reports_rx) = watch::channel(Fetched::Pending);
    let (documents_tx, documents_rx) = watch::channel(Fetched::Pending);
    let (info_tx, info_rx) = watch::channel(Fetched::Pending);
    // Capacity one: a request made while another is queued is dropped.
    let (request_tx, request_rx) = mpsc::channel(1);

    let publisher = FeedPublisher {
        metrics: metrics_tx,
        reports: reports_tx,
        documents: documents_tx,
        info: info_tx,
        report_requests: request_rx,
    };
    let feed = MetricsFeed {
        metrics: metrics_rx,
        reports: reports_rx,
        documents: documents_rx,
        info: info_rx,
        report_requests: request_tx,
        description: description.to_string(),
    };
    (publisher, feed)
}

impl MetricsFeed {
    pub fn poll_metrics(&mut self) -> Option<MetricsState> {
        poll_watch(&mut self.metrics)
    }

    pub fn poll_reports(&mut self) -> Option<Fetched<Vec<AggregatedReport>>> {
        poll_watch(&mut self.reports)
    }

    pub fn poll_documents(&mut self) -> Option<Fetched<Vec<DescribedDocument>>> {
        poll_watch(&mut self.documents)
    }

    pub fn poll_info(&mut self) -> Option<Fetched<BuildInfo>> {
        poll_watch(&mut self.info)
    }

    /// Wait for the next metrics state. `None` once the sampler has stopped.
    pub async fn next_metrics(&mut self) -> Option<MetricsState> {
        self.metrics.changed().await.ok()?;
        Some(self.metrics.borrow_and_update().clone())
    }

    /// Wait until the report fetch has finished.
    pub async fn settled_reports(&mut self) -> Option<Fetched<Vec<AggregatedReport>>> {
        settled(&mut self.reports).await
    }

    /// Wait until the document descriptions have been fetched.
    pub async fn settled_documents(&mut self) -> Option<Fetched<Vec<DescribedDocument>>> {
        settled(&mut self.documents).await
    }

    /// Wait until the build information has been fetched.
    pub async fn settled_info(&mut self) -> Option<Fetched<BuildInfo>> {
        settled(&mut self.info).await
    }

    /// Ask the sampler to fetch the report list again.
    ///
    /// Returns `false` if a request is already queued or the sampler stopped.
    pub fn request_reports(&self) -> bool {
        self.report_requests.try_send(()).is_ok()
    }

    /// Human-readable description of the sampled source.
    pub fn description(&self) -> &str {
        &self.description
    }
}

async fn settled<T: Clone>(receiver: &mut watch::Receiver<Fetched<T>>) -> Option<Fetched<T>> {
    let value = receiver.wait_for(|v| !v.is_pending()).await.ok()?;
    Some(value.clone())
}

fn poll_watch<T: Clone>(receiver: &mut watch::Receiver<T>) -> Option<T> {
    // One-shot publishers drop their sender after sending, so the value is
    // checked through the borrow rather than `Receiver::has_changed`.
    let value = receiver.borrow_and_update();
    if value.has_changed() {
        Some(value.clone())
    } else {
        None
    }
}

/// Controls a running sampler.
#[derive(Debug)]
pub struct SamplerHandle {
    shutdown: watch::Sender<bool>,
    tasks: Vec<JoinHandle<()>>,
}

impl SamplerHandle {
    /// Stop every sampler task. In-flight fetches are abandoned.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.iter().all(JoinHandle::is_finished)
    }

    /// Wait for every task to exit.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Resolves once shutdown is requested or the handle is dropped.
async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

/// Wall clock in milliseconds that follows tokio's (possibly paused) clock.
#[derive(Debug, Clone, Copy)]
struct Clock {
    epoch_ms: u64,
    started: Instant,
}

impl Clock {
    fn new() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        Self {
            epoch_ms,
            started: Instant::now(),
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch_ms + self.started.elapsed().as_millis() as u64
    }
}

/// The metrics loop and the state it owns.
pub struct Sampler {
    source: Arc<dyn DataSource>,
    config: SamplerConfig,
    parser: ExpositionParser,
    state: MetricsState,
    clock: Clock,
}

impl Sampler {
    /// Spawn the sampler tasks on the current tokio runtime.
    pub fn spawn(source: Arc<dyn DataSource>, config: SamplerConfig) -> (SamplerHandle, MetricsFeed) {
        let (publisher, feed) = feed_channel(source.description());
        let handle = Self::spawn_with(source, config, publisher);
        (handle, feed)
    }

    /// Spawn the sampler tasks publishing into an existing feed.
    pub fn spawn_with(
        source: Arc<dyn DataSource>,
        config: SamplerConfig,
        publisher: FeedPublisher,
    ) -> SamplerHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let FeedPublisher {
            metrics,
            reports,
            documents,
            info,
            report_requests,
        } = publisher;

        info!(
            "Starting sampler for {} every {:?}",
            source.description(),
            config.poll_interval
        );

        let mut tasks = Vec::with_capacity(4);

        tasks.push(tokio::spawn(run_reports(
            source.clone(),
            reports,
            report_requests,
            shutdown_rx.clone(),
        )));

        let describe_urls = config.describe_urls.clone();
        let docs_source = source.clone();
        tasks.push(tokio::spawn(fetch_once(documents, shutdown_rx.clone(), async move {
            docs_source.fetch_documents(&describe_urls).await.map(index_documents)
        })));

        let info_source = source.clone();
        tasks.push(tokio::spawn(fetch_once(info, shutdown_rx.clone(), async move {
            info_source.fetch_info().await
        })));

        let sampler = Sampler {
            state: MetricsState::new(config.history()),
            source,
            config,
            parser: ExpositionParser::new(),
            clock: Clock::new(),
        };
        tasks.push(tokio::spawn(sampler.run(metrics, shutdown_rx)));

        SamplerHandle {
            shutdown: shutdown_tx,
            tasks,
        }
    }

    async fn run(mut self, publisher: watch::Sender<MetricsState>, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => break,
                _ = interval.tick() => {}
            }

            let result = tokio::select! {
                biased;
                _ = cancelled(&mut shutdown) => break,
                result = self.source.fetch_metrics() => result,
            };

            let now_ms = self.clock.now_ms();
            self.apply(result, now_ms);

            if publisher.send(self.state.clone()).is_err() {
                debug!("Metrics feed dropped, stopping sampler");
                break;
            }
        }

        debug!("Sampler stopped after {} polls", self.state.sequence);
    }

    /// Fold one poll result into the state.
    fn apply(&mut self, result: Result<String>, now_ms: u64) {
        self.state.sequence += 1;

        let parsed = result.and_then(|text| self.parser.parse(&text).map_err(Error::from));
        match parsed {
            Ok(families) => {
                self.state.history.record(&families, now_ms);
                self.state.total_requests =
                    self.state.history.total_requests(&families).unwrap_or(0.0);
                self.state.families = families;
                self.state.last_updated_ms = Some(now_ms);
                self.state.last_error = None;
                self.state.skipped_lines = self.parser.skipped().len();
                self.set_availability(Availability::Available);
                debug!(
                    "Poll {}: {} families, {} skipped lines",
                    self.state.sequence,
                    self.state.families.len(),
                    self.state.skipped_lines
                );
            }
            Err(Error::EndpointUnavailable { status }) => {
                self.state.last_error = Some(Error::EndpointUnavailable { status }.to_string());
                self.set_availability(Availability::Unavailable { status });
            }
            Err(e) => {
                warn!("Poll {} failed: {}", self.state.sequence, e);
                self.state.last_error = Some(e.to_string());
            }
        }
    }

    fn set_availability(&mut self, availability: Availability) {
        if self.state.availability != availability {
            match availability {
                Availability::Unavailable { status } => {
                    warn!("Metrics endpoint unavailable (status {})", status)
                }
                _ => info!("Metrics endpoint is now {:?}", availability),
            }
            self.state.availability = availability;
        }
    }
}

async fn run_reports(
    source: Arc<dyn DataSource>,
    publisher: watch::Sender<Fetched<Vec<AggregatedReport>>>,
    mut requests: mpsc::Receiver<()>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        publisher.send_replace(Fetched::Pending);

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut shutdown) => return,
            result = source.fetch_reports() => result,
        };
        if let Err(e) = &result {
            warn!("Report fetch failed: {}", e);
        }
        let fetched = Fetched::from_result(result.map(|raw| aggregate(&raw)));
        if publisher.send(fetched).is_err() {
            return;
        }

        tokio::select! {
            biased;
            _ = cancelled(&mut shutdown) => return,
            request = requests.recv() => {
                if request.is_none() {
                    return;
                }
                debug!("Re-fetching reports");
            }
        }
    }
}

async fn fetch_once<T, F>(
    publisher: watch::Sender<Fetched<T>>,
    mut shutdown: watch::Receiver<bool>,
    fetch: F,
) where
    F: std::future::Future<Output = Result<T>>,
{
    let result = tokio::select! {
        biased;
        _ = cancelled(&mut shutdown) => return,
        result = fetch => result,
    };
    if let Err(e) = &result {
        warn!("Fetch failed: {}", e);
    }
    let _ = publisher.send(Fetched::from_result(result));
}
