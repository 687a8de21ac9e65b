//! Moderation reports and document descriptions.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::sort::{SortKey, Sortable};

/// Public gateway used to turn `ipfs://` document URLs into browsable links.
pub const DEFAULT_GATEWAY: &str = "https://cloudflare-ipfs.com/ipfs/";

/// One report record as returned by the proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReport {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub updated_at: String,
    /// Service-specific fields not used for aggregation.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// All reports for one URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedReport {
    /// Position at creation; never renumbered by sorting.
    pub index: usize,
    pub id: Vec<String>,
    pub url: String,
    pub categories: Vec<String>,
    pub updated_at: String,
    pub num_reports: usize,
}

impl AggregatedReport {
    fn from_first(index: usize, report: &RawReport) -> Self {
        let mut categories = Vec::with_capacity(report.categories.len());
        merge_categories(&mut categories, &report.categories);
        Self {
            index,
            id: vec![report.id.clone()],
            url: report.url.clone(),
            categories,
            updated_at: report.updated_at.clone(),
            num_reports: 1,
        }
    }

    fn merge(&mut self, report: &RawReport) {
        self.num_reports += 1;
        self.id.push(report.id.clone());
        if report.updated_at > self.updated_at {
            self.updated_at = report.updated_at.clone();
        }
        merge_categories(&mut self.categories, &report.categories);
    }

    pub fn gateway_link(&self, gateway: &str) -> String {
        gateway_link(gateway, &self.url)
    }
}

fn merge_categories(into: &mut Vec<String>, categories: &[String]) {
    for category in categories {
        if !into.contains(category) {
            into.push(category.clone());
        }
    }
}

/// Collapse reports by URL, in first-seen order.
pub fn aggregate(reports: &[RawReport]) -> Vec<AggregatedReport> {
    let mut aggregated: Vec<AggregatedReport> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for report in reports {
        match positions.get(report.url.as_str()) {
            Some(&pos) => aggregated[pos].merge(report),
            None => {
                let index = aggregated.len();
                positions.insert(report.url.as_str(), index);
                aggregated.push(AggregatedReport::from_first(index, report));
            }
        }
    }

    aggregated
}

/// Moderation status of a document known to the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Blocked,
    Allowed,
    NeverSeen,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DocumentStatus::Blocked => "Blocked",
            DocumentStatus::Allowed => "Allowed",
            DocumentStatus::NeverSeen => "Never seen",
        };
        f.write_str(s)
    }
}

/// One entry of a document description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescribedDocument {
    #[serde(default)]
    pub index: usize,
    pub url: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub provider: String,
}

impl DescribedDocument {
    pub fn gateway_link(&self, gateway: &str) -> String {
        gateway_link(gateway, &self.url)
    }
}

/// Number documents in the order the proxy returned them.
pub fn index_documents(mut documents: Vec<DescribedDocument>) -> Vec<DescribedDocument> {
    for (index, doc) in documents.iter_mut().enumerate() {
        doc.index = index;
    }
    documents
}

/// Gateway URL for the last path segment (the content id) of `url`.
pub fn gateway_link(gateway: &str, url: &str) -> String {
    let cid = url.rsplit('/').next().unwrap_or(url);
    format!("{}{}", gateway, cid)
}

impl Sortable for AggregatedReport {
    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "index" => Some(self.index.into()),
            "url" => Some(self.url.as_str().into()),
            "categories" => Some(SortKey::Text(self.categories.join(","))),
            "num_reports" => Some(self.num_reports.into()),
            "updated_at" => Some(self.updated_at.as_str().into()),
            _ => None,
        }
    }
}

impl Sortable for DescribedDocument {
    fn sort_key(&self, field: &str) -> Option<SortKey> {
        match field {
            "index" => Some(self.index.into()),
            "url" => Some(self.url.as_str().into()),
            "categories" => Some(SortKey::Text(self.categories.join(","))),
            "status" => Some(SortKey::Text(self.status.to_string())),
            "provider" => Some(self.provider.as_str().into()),
            _ => None,
        }
    }
}
