//! Data models and processing for proxy metrics and reports.
//!
//! This module turns raw exposition text and report JSON into structured
//! data suitable for display.
//!
//! ## Submodules
//!
//! - [`exposition`]: Parsing (and rendering) of the text exposition format
//! - [`family`]: Core data models ([`MetricFamily`], [`MetricSample`], [`SampleValue`])
//! - [`lookup`]: Family/sample lookups and the [`MetricView`] fallback policy
//! - [`rate`]: Per-second rates from cumulative counters
//! - [`window`]: Fixed-depth rolling series
//! - [`history`]: The dashboard's four series, updated once per poll
//! - [`overview`]: Stat blocks for the metrics view
//! - [`reports`]: Report aggregation and document descriptions
//! - [`sort`]: Column-driven table sorting
//!
//! ## Data Flow
//!
//! ```text
//! /metrics text
//!        │
//!        ▼
//! exposition::parse()
//!        │
//!        ├──▶ MetricsOverview::from_families() (stat blocks)
//!        │
//!        └──▶ History::record() ──▶ RateDeriver ──▶ SlidingWindow (charts)
//!
//! report JSON ──▶ reports::aggregate() ──▶ SortEngine (tables)
//! ```

pub mod exposition;
pub mod family;
pub mod history;
pub mod lookup;
pub mod overview;
pub mod rate;
pub mod reports;
pub mod sort;
pub mod window;

#[cfg(test)]
pub(crate) mod fixtures;

pub use exposition::{parse, ExpositionParser};
pub use family::{Bucket, Labels, MetricFamily, MetricKind, MetricSample, Quantile, SampleValue};
pub use history::{History, Series};
pub use lookup::{find_family, find_nested, find_nested_buckets, find_sample_by_label, MetricView};
pub use overview::{MetricsOverview, StatBlock};
pub use rate::{CounterResetPolicy, RateBasis, RateDeriver};
pub use reports::{aggregate, AggregatedReport, DescribedDocument, DocumentStatus, RawReport};
pub use sort::{SortDirection, SortEngine, SortKey, SortState, Sortable};
pub use window::{SlidingWindow, TimePoint};
