//! # imgproxy-doctor
//!
//! A diagnostic TUI and library for watching an image proxy: its metrics
//! exposition, its moderation reports and its document descriptions.
//!
//! The crate polls a running proxy (or reads files saved from one), parses the
//! text exposition into typed metric families, derives per-second rates from
//! the counters, and keeps fixed-depth time series for charting. Reports are
//! aggregated by URL and shown in sortable tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │(parsing) │    │(render) │    │         │ │
//! │  └────▲────┘    └────▲─────┘    └─────────┘    └─────────┘ │
//! │       │ MetricsFeed  │                                      │
//! │  ┌────┴──────────────┴┐                                     │
//! │  │ source::Sampler    │◀── HttpSource | FileSource          │
//! │  │ (tokio tasks)      │                                     │
//! │  └────────────────────┘                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Data source abstraction ([`DataSource`] trait) with HTTP and
//!   file implementations, and the [`Sampler`] that polls a source on a schedule
//! - **[`data`]**: Exposition parsing, metric lookup, rate derivation, sliding
//!   windows, report aggregation and table sorting
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`config`]** and **[`logging`]**: layered settings and tracing setup
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a running proxy
//! imgproxy-doctor --endpoint http://localhost:8081
//!
//! # Diagnose a saved scrape
//! imgproxy-doctor --file metrics.txt --reports reports.json
//!
//! # Export one poll as JSON and exit
//! imgproxy-doctor --export state.json
//! ```
//!
//! ### As a library
//!
//! ```
//! use imgproxy_doctor::data::{parse, MetricView};
//!
//! let families = parse("# TYPE errors counter\nerrors 4\n").unwrap();
//! assert_eq!(MetricView::first(&families, "errors").value(), Some(4.0));
//! assert_eq!(MetricView::first(&families, "missing").value_or(0.0), 0.0);
//! ```
//!
//! ### Sampling a proxy
//!
//! ```no_run
//! use std::sync::Arc;
//! use imgproxy_doctor::{HttpSource, Sampler, SamplerConfig};
//!
//! # tokio_test::block_on(async {
//! let source = HttpSource::builder().endpoint("http://localhost:8081").build().unwrap();
//! let (handle, mut feed) = Sampler::spawn(Arc::new(source), SamplerConfig::default());
//!
//! if let Some(state) = feed.next_metrics().await {
//!     println!("{} requests so far", state.total_requests);
//! }
//! handle.shutdown();
//! # });
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod logging;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    AggregatedReport, DescribedDocument, History, MetricFamily, MetricKind, MetricView,
    MetricsOverview, RawReport, SampleValue, SlidingWindow,
};
pub use error::{Error, ParseError, Result};
pub use source::{
    BuildInfo, DataSource, Fetched, FileSource, HttpSource, MetricsFeed, MetricsState, Sampler,
    SamplerConfig, SamplerHandle,
};
