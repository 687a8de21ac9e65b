//! Data source abstraction for reading proxy metrics and reports.
//!
//! This module provides a trait-based abstraction over where data comes
//! from (a running proxy over HTTP, or files saved from one), and the
//! [`Sampler`] that polls a source on a schedule.

mod file;
mod http;
pub mod rpc;
mod sampler;

pub use file::FileSource;
pub use http::{HttpSource, HttpSourceBuilder};
pub use sampler::{
    feed_channel, Availability, FeedPublisher, Fetched, MetricsFeed, MetricsState, Sampler,
    SamplerConfig, SamplerHandle,
};

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data::{DescribedDocument, RawReport};
use crate::error::Result;

/// Build information served on the proxy's info endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildInfo {
    pub package_version: String,
    pub git_version: String,
}

/// Trait for reading proxy data from various sources.
///
/// # Example
///
/// ```no_run
/// use imgproxy_doctor::{DataSource, FileSource};
///
/// # async fn run() -> imgproxy_doctor::Result<()> {
/// let source = FileSource::new("metrics.txt");
/// let text = source.fetch_metrics().await?;
/// println!("{} lines", text.lines().count());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DataSource: Send + Sync + Debug {
    /// Fetch the raw exposition text.
    ///
    /// A non-success HTTP status is reported as
    /// [`Error::EndpointUnavailable`](crate::Error::EndpointUnavailable).
    async fn fetch_metrics(&self) -> Result<String>;

    /// Fetch every moderation report.
    async fn fetch_reports(&self) -> Result<Vec<RawReport>>;

    /// Describe the given documents; `"*"` selects all of them.
    async fn fetch_documents(&self, urls: &[String]) -> Result<Vec<DescribedDocument>>;

    /// Fetch build information.
    async fn fetch_info(&self) -> Result<BuildInfo>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
