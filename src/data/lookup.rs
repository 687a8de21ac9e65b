//! Lookups over a parsed snapshot.
//!
//! Every lookup returns `None` on a miss; callers decide the fallback,
//! usually through [`MetricView::value_or`].

use serde::Serialize;

use super::family::{Bucket, MetricFamily, MetricSample};

/// Metric names exported by the image proxy.
pub mod names {
    pub const ERRORS: &str = "errors";
    pub const API_REQUESTS: &str = "api_requests";
    pub const API_RESPONSE_TIME: &str = "api_response_time";
    pub const CACHE_METRICS: &str = "cache_metrics";
    pub const DOCUMENT: &str = "document";
    pub const TRAFFIC: &str = "traffic";
    pub const PROCESS_CPU_SECONDS: &str = "process_cpu_seconds_total";
    pub const PROCESS_RESIDENT_MEMORY: &str = "process_resident_memory_bytes";
    pub const PROCESS_START_TIME: &str = "process_start_time_seconds";
    pub const PROCESS_VIRTUAL_MEMORY: &str = "process_virtual_memory_bytes";
}

/// First family with the given name.
pub fn find_family<'a>(families: &'a [MetricFamily], name: &str) -> Option<&'a MetricFamily> {
    families.iter().find(|f| f.name == name)
}

/// First sample of `family` whose `label_name` equals `label_value`.
pub fn find_sample_by_label<'a>(
    family: &'a MetricFamily,
    label_name: &str,
    label_value: &str,
) -> Option<&'a MetricSample> {
    family.samples.iter().find(|s| s.label(label_name) == Some(label_value))
}

/// Find a family by name, then a sample in it by label.
pub fn find_nested<'a>(
    families: &'a [MetricFamily],
    name: &str,
    label_name: &str,
    label_value: &str,
) -> Option<&'a MetricSample> {
    find_family(families, name).and_then(|f| find_sample_by_label(f, label_name, label_value))
}

/// Buckets of a nested histogram sample.
pub fn find_nested_buckets<'a>(
    families: &'a [MetricFamily],
    name: &str,
    label_name: &str,
    label_value: &str,
) -> Option<&'a [Bucket]> {
    find_nested(families, name, label_name, label_value).and_then(MetricSample::buckets)
}

/// A possibly-missing metric together with its family.
///
/// Carries the fallback policy for lookup misses so display code never
/// has to branch on `Option` itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricView<'a> {
    family: Option<&'a MetricFamily>,
    sample: Option<&'a MetricSample>,
}

impl<'a> MetricView<'a> {
    /// View of the first sample of the named family.
    pub fn first(families: &'a [MetricFamily], name: &str) -> Self {
        let family = find_family(families, name);
        Self {
            family,
            sample: family.and_then(MetricFamily::first),
        }
    }

    /// View of the sample of `name` whose label matches.
    pub fn nested(
        families: &'a [MetricFamily],
        name: &str,
        label_name: &str,
        label_value: &str,
    ) -> Self {
        let family = find_family(families, name);
        Self {
            family,
            sample: family.and_then(|f| find_sample_by_label(f, label_name, label_value)),
        }
    }

    pub fn family(&self) -> Option<&'a MetricFamily> {
        self.family
    }

    pub fn sample(&self) -> Option<&'a MetricSample> {
        self.sample
    }

    pub fn is_available(&self) -> bool {
        self.sample.is_some()
    }

    pub fn value(&self) -> Option<f64> {
        self.sample.map(MetricSample::value)
    }

    pub fn value_or(&self, default: f64) -> f64 {
        self.value().unwrap_or(default)
    }

    /// Family help text, or `default` when missing or empty.
    pub fn help_or<'b>(&self, default: &'b str) -> &'b str
    where
        'a: 'b,
    {
        match self.family {
            Some(f) if !f.help.is_empty() => f.help.as_str(),
            _ => default,
        }
    }
}

/// Requests served for one RPC method; 0 when the proxy has not seen any.
pub fn api_requests(families: &[MetricFamily], method: &str) -> f64 {
    MetricView::nested(families, names::API_REQUESTS, "rpc_method", method).value_or(0.0)
}

/// One `cache_metrics` gauge, e.g. `items` or `mem_used_bytes`.
pub fn cache_metric<'a>(families: &'a [MetricFamily], metric: &str) -> MetricView<'a> {
    MetricView::nested(families, names::CACHE_METRICS, "metric", metric)
}

/// One bar of the response-time chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBar {
    /// Upper bound in milliseconds, rendered for the axis.
    pub label: String,
    pub upper_bound: f64,
    /// Requests that fell in this bucket only (not cumulative).
    pub count: u64,
}

/// Response-time distribution summed over every RPC method.
///
/// Buckets are de-accumulated so each bar counts only its own interval.
/// Returns an empty list when the histogram is missing.
pub fn response_time_histogram(families: &[MetricFamily]) -> Vec<HistogramBar> {
    let Some(family) = find_family(families, names::API_RESPONSE_TIME) else {
        return Vec::new();
    };

    let mut bars: Vec<HistogramBar> = Vec::new();
    for buckets in family.samples.iter().filter_map(MetricSample::buckets) {
        let mut previous = 0.0;
        for bucket in buckets {
            let own = (bucket.cumulative_count - previous).max(0.0);
            previous = bucket.cumulative_count;

            match bars.iter_mut().find(|b| b.upper_bound == bucket.upper_bound) {
                Some(bar) => bar.count = bar.count.saturating_add(own as u64),
                None => bars.push(HistogramBar {
                    label: bucket_label(bucket.upper_bound),
                    upper_bound: bucket.upper_bound,
                    count: own as u64,
                }),
            }
        }
    }

    bars.sort_by(|a, b| a.upper_bound.total_cmp(&b.upper_bound));
    bars
}

fn bucket_label(upper_bound: f64) -> String {
    if upper_bound.is_infinite() {
        "+Inf".to_string()
    } else {
        format!("{}", upper_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::exposition::parse;
    use crate::data::family::{labels, MetricKind};
    use crate::data::fixtures::PROXY_METRICS;

    fn two_fetched() -> Vec<MetricFamily> {
        vec![MetricFamily::new("traffic")
            .with_kind(MetricKind::Counter)
            .with_sample(MetricSample::single(labels([("metric", "fetched")]), 1.0))
            .with_sample(MetricSample::single(labels([("metric", "fetched")]), 2.0))]
    }

    #[test]
    fn find_nested_returns_first_match() {
        let families = two_fetched();
        let sample = find_nested(&families, "traffic", "metric", "fetched").unwrap();
        assert_eq!(sample.value(), 1.0);
    }

    #[test]
    fn misses_return_none() {
        let families = two_fetched();
        assert!(find_family(&families, "errors").is_none());
        assert!(find_nested(&families, "traffic", "metric", "served").is_none());
        assert!(find_nested(&families, "traffic", "kind", "fetched").is_none());
        assert!(find_nested_buckets(&families, "traffic", "metric", "fetched").is_none());
    }

    #[test]
    fn view_defaults_on_miss() {
        let families = two_fetched();
        let missing = MetricView::first(&families, "errors");
        assert!(!missing.is_available());
        assert_eq!(missing.value(), None);
        assert_eq!(missing.value_or(0.0), 0.0);
        assert_eq!(missing.help_or("Errors seen"), "Errors seen");

        let present = MetricView::nested(&families, "traffic", "metric", "fetched");
        assert!(present.is_available());
        assert_eq!(present.value_or(0.0), 1.0);
        // Empty help falls back too.
        assert_eq!(present.help_or("Traffic"), "Traffic");
    }

    #[test]
    fn domain_accessors_read_fixture() {
        let families = parse(PROXY_METRICS).unwrap();
        assert_eq!(api_requests(&families, "img_proxy_fetch"), 900.0);
        assert_eq!(api_requests(&families, "img_proxy_unknown"), 0.0);
        assert_eq!(cache_metric(&families, "items").value(), Some(311.0));
        assert_eq!(
            cache_metric(&families, "items").help_or(""),
            "Cache metics by cache type"
        );

        let buckets =
            find_nested_buckets(&families, "api_response_time", "method", "img_proxy_describe")
                .unwrap();
        assert_eq!(buckets.len(), 4);
        assert_eq!(buckets[0].cumulative_count, 50.0);
    }

    #[test]
    fn response_time_histogram_sums_methods_per_bucket() {
        let families = parse(PROXY_METRICS).unwrap();
        let bars = response_time_histogram(&families);
        let labels: Vec<&str> = bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["5", "50", "500", "+Inf"]);
        let counts: Vec<u64> = bars.iter().map(|b| b.count).collect();
        // fetch: 400, 400, 80, 20; describe: 50, 10, 0, 0
        assert_eq!(counts, vec![450, 410, 80, 20]);
    }

    #[test]
    fn response_time_histogram_saturates_infinite_counts() {
        let text = "# TYPE api_response_time histogram\n\
            api_response_time_bucket{method=\"a\",le=\"5\"} +Inf\n\
            api_response_time_bucket{method=\"a\",le=\"+Inf\"} +Inf\n\
            api_response_time_bucket{method=\"b\",le=\"5\"} +Inf\n\
            api_response_time_bucket{method=\"b\",le=\"+Inf\"} +Inf\n";
        let families = parse(text).unwrap();
        let bars = response_time_histogram(&families);
        assert_eq!(bars[0].label, "5");
        assert_eq!(bars[0].count, u64::MAX);
    }

    #[test]
    fn find_family_returns_first_of_repeated_name() {
        let families = vec![
            MetricFamily::new("errors").with_help("first"),
            MetricFamily::new("errors").with_help("second"),
        ];
        assert_eq!(find_family(&families, "errors").unwrap().help, "first");
        assert_eq!(MetricView::first(&families, "errors").help_or(""), "first");
    }

    #[test]
    fn response_time_histogram_empty_when_missing() {
        assert!(response_time_histogram(&two_fetched()).is_empty());
    }
}
