//! File-based data source.
//!
//! Reads a saved `/metrics` scrape (and optionally a saved report listing)
//! from disk, for diagnosing a proxy after the fact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use super::rpc::{RpcMethod, RpcResponse};
use super::{BuildInfo, DataSource};
use crate::data::{DescribedDocument, RawReport};
use crate::error::{Error, Result};

/// A data source that reads exposition text and reports from files.
///
/// The metrics file is re-read on every poll, so a file that is being
/// overwritten by a scraper shows up as live data.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    reports_path: Option<PathBuf>,
    description: String,
}

/// A saved report listing: either the bare array or the whole response.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReportsFile {
    Bare(Vec<RawReport>),
    Envelope(RpcResponse<Vec<RawReport>>),
}

impl FileSource {
    /// Create a new file source for the given metrics path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            reports_path: None,
            description,
        }
    }

    /// Also read reports from `path`.
    pub fn with_reports<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.reports_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Returns the metrics path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataSource for FileSource {
    async fn fetch_metrics(&self) -> Result<String> {
        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    async fn fetch_reports(&self) -> Result<Vec<RawReport>> {
        let Some(path) = &self.reports_path else {
            return Ok(Vec::new());
        };

        let content = tokio::fs::read_to_string(path).await?;
        match serde_json::from_str(&content)? {
            ReportsFile::Bare(reports) => Ok(reports),
            ReportsFile::Envelope(response) => response.into_result(RpcMethod::DescribeReports),
        }
    }

    async fn fetch_documents(&self, _urls: &[String]) -> Result<Vec<DescribedDocument>> {
        Ok(Vec::new())
    }

    async fn fetch_info(&self) -> Result<BuildInfo> {
        Err(Error::Transport("build info is not recorded in files".to_string()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
