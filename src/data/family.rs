//! Metric families and samples as parsed from one exposition snapshot.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label name to label value. Keys are unique.
pub type Labels = BTreeMap<String, String>;

/// The declared type of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
    Summary,
    #[default]
    Unknown,
}

impl MetricKind {
    /// Parse the kind token of a `# TYPE` line.
    ///
    /// Unrecognised tokens (including `untyped`) map to [`MetricKind::Unknown`].
    pub fn from_token(token: &str) -> Self {
        match token {
            "counter" => MetricKind::Counter,
            "gauge" => MetricKind::Gauge,
            "histogram" => MetricKind::Histogram,
            "summary" => MetricKind::Summary,
            _ => MetricKind::Unknown,
        }
    }

    /// The token written on a `# TYPE` line.
    pub fn as_token(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Summary => "summary",
            MetricKind::Unknown => "untyped",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// One histogram bucket: upper bound and cumulative count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: f64,
}

/// One summary quantile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

/// Kind-specific value of a sample, resolved at parse time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SampleValue {
    /// Counter, gauge and untyped samples.
    Single { value: f64 },
    Histogram {
        buckets: Vec<Bucket>,
        sum: f64,
        count: f64,
    },
    Summary {
        quantiles: Vec<Quantile>,
        sum: f64,
        count: f64,
    },
}

/// A labeled sample within a family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub labels: Labels,
    pub value: SampleValue,
}

impl MetricSample {
    /// Create a single-valued sample.
    pub fn single(labels: Labels, value: f64) -> Self {
        Self {
            labels,
            value: SampleValue::Single { value },
        }
    }

    /// The numeric value of this sample.
    ///
    /// Histograms and summaries report their observation count.
    pub fn value(&self) -> f64 {
        match &self.value {
            SampleValue::Single { value } => *value,
            SampleValue::Histogram { count, .. } | SampleValue::Summary { count, .. } => *count,
        }
    }

    /// Bucket mapping, for histogram samples only.
    pub fn buckets(&self) -> Option<&[Bucket]> {
        match &self.value {
            SampleValue::Histogram { buckets, .. } => Some(buckets),
            _ => None,
        }
    }

    /// Look up a label value.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels.get(name).map(String::as_str)
    }
}

/// All samples sharing one metric name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub samples: Vec<MetricSample>,
}

impl MetricFamily {
    /// Create an empty family with no help text and unknown kind.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: String::new(),
            kind: MetricKind::Unknown,
            samples: Vec::new(),
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_kind(mut self, kind: MetricKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_sample(mut self, sample: MetricSample) -> Self {
        self.samples.push(sample);
        self
    }

    /// The first sample, if any.
    pub fn first(&self) -> Option<&MetricSample> {
        self.samples.first()
    }
}

/// Build a label map from pairs. Mostly useful in tests and fixtures.
pub fn labels<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Labels {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tokens() {
        assert_eq!(MetricKind::from_token("counter"), MetricKind::Counter);
        assert_eq!(MetricKind::from_token("histogram"), MetricKind::Histogram);
        assert_eq!(MetricKind::from_token("untyped"), MetricKind::Unknown);
        assert_eq!(MetricKind::from_token("bogus"), MetricKind::Unknown);
        assert_eq!(MetricKind::Unknown.as_token(), "untyped");
    }

    #[test]
    fn histogram_value_is_count() {
        let sample = MetricSample {
            labels: Labels::new(),
            value: SampleValue::Histogram {
                buckets: vec![Bucket {
                    upper_bound: 5.0,
                    cumulative_count: 2.0,
                }],
                sum: 7.5,
                count: 3.0,
            },
        };
        assert_eq!(sample.value(), 3.0);
        assert_eq!(sample.buckets().map(|b| b.len()), Some(1));
    }

    #[test]
    fn single_sample_has_no_buckets() {
        let sample = MetricSample::single(labels([("metric", "fetched")]), 42.0);
        assert_eq!(sample.value(), 42.0);
        assert!(sample.buckets().is_none());
        assert_eq!(sample.label("metric"), Some("fetched"));
        assert_eq!(sample.label("missing"), None);
    }
}
