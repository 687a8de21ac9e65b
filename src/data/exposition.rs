//! Text exposition format parsing and rendering.
//!
//! Parses the line-based format served on `/metrics` into an ordered list of
//! [`MetricFamily`], one per distinct metric name in first-seen order.
//!
//! ## Error policy
//!
//! An unterminated label set aborts the parse with a [`ParseError`]. Any
//! other malformed sample line is skipped: its family keeps the samples it
//! already has (or gets later), and the problem is recorded in
//! [`ExpositionParser::skipped`].

use std::collections::HashMap;

use tracing::debug;

use super::family::{Bucket, Labels, MetricFamily, MetricKind, MetricSample, Quantile, SampleValue};
use crate::error::{ParseError, ParseErrorKind};

/// Parse exposition text with a fresh parser.
pub fn parse(text: &str) -> Result<Vec<MetricFamily>, ParseError> {
    ExpositionParser::new().parse(text)
}

/// Exposition parser that remembers which lines it skipped.
#[derive(Debug, Default)]
pub struct ExpositionParser {
    skipped: Vec<ParseError>,
}

impl ExpositionParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines skipped by the last call to [`parse`](Self::parse).
    pub fn skipped(&self) -> &[ParseError] {
        &self.skipped
    }

    /// Parse a complete exposition.
    pub fn parse(&mut self, text: &str) -> Result<Vec<MetricFamily>, ParseError> {
        self.skipped.clear();
        let mut builder = FamiliesBuilder::default();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(comment) = line.strip_prefix('#') {
                builder.comment(comment);
                continue;
            }

            let result = parse_sample_line(line).and_then(|sample| builder.sample(sample));
            if let Err(kind) = result {
                let err = ParseError::new(line_no, kind);
                if err.is_fatal() {
                    return Err(err);
                }
                debug!("Skipping exposition {}", err);
                self.skipped.push(err);
            }
        }

        Ok(builder.finish())
    }
}

/// A sample line before it is attached to a family.
#[derive(Debug)]
struct RawSample {
    name: String,
    labels: Labels,
    value: f64,
}

/// Accumulates families while lines are read.
#[derive(Debug, Default)]
struct FamiliesBuilder {
    families: Vec<FamilyDraft>,
    index: HashMap<String, usize>,
}

#[derive(Debug)]
struct FamilyDraft {
    name: String,
    help: String,
    kind: MetricKind,
    samples: Vec<SampleDraft>,
    groups: HashMap<Labels, usize>,
}

#[derive(Debug)]
enum SampleDraft {
    Single(MetricSample),
    Group(GroupDraft),
}

/// Histogram or summary lines sharing one label set.
#[derive(Debug, Default)]
struct GroupDraft {
    labels: Labels,
    buckets: Vec<Bucket>,
    quantiles: Vec<Quantile>,
    sum: Option<f64>,
    count: Option<f64>,
}

enum GroupPart {
    Bucket(f64),
    Quantile(f64),
    Sum,
    Count,
}

impl FamiliesBuilder {
    fn family_mut(&mut self, name: &str) -> &mut FamilyDraft {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.families.push(FamilyDraft {
                    name: name.to_string(),
                    help: String::new(),
                    kind: MetricKind::Unknown,
                    samples: Vec::new(),
                    groups: HashMap::new(),
                });
                let idx = self.families.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.families[idx]
    }

    fn kind_of(&self, name: &str) -> Option<MetricKind> {
        self.index.get(name).map(|&idx| self.families[idx].kind)
    }

    /// Handle a comment line (without the leading `#`).
    fn comment(&mut self, comment: &str) {
        let comment = comment.trim_start();
        let Some((keyword, rest)) = comment.split_once(char::is_whitespace) else {
            return;
        };
        let rest = rest.trim_start();
        let (name, tail) = match rest.split_once(char::is_whitespace) {
            Some((name, tail)) => (name, tail.trim_start()),
            None => (rest, ""),
        };
        if name.is_empty() || !is_metric_name(name) {
            return;
        }

        match keyword {
            "HELP" => self.family_mut(name).help = unescape_help(tail),
            "TYPE" => {
                let kind = MetricKind::from_token(tail.trim());
                self.family_mut(name).kind = kind;
            }
            _ => {}
        }
    }

    fn sample(&mut self, sample: RawSample) -> Result<(), ParseErrorKind> {
        if let Some((base, part)) = self.group_target(&sample)? {
            let mut labels = sample.labels;
            labels.remove("le");
            labels.remove("quantile");
            let family = self.family_mut(&base);
            let group = family.group_mut(labels);
            match part {
                GroupPart::Bucket(upper_bound) => group.buckets.push(Bucket {
                    upper_bound,
                    cumulative_count: sample.value,
                }),
                GroupPart::Quantile(quantile) => group.quantiles.push(Quantile {
                    quantile,
                    value: sample.value,
                }),
                GroupPart::Sum => group.sum = Some(sample.value),
                GroupPart::Count => group.count = Some(sample.value),
            }
            return Ok(());
        }

        let family = self.family_mut(&sample.name);
        family.samples.push(SampleDraft::Single(MetricSample::single(
            sample.labels,
            sample.value,
        )));
        Ok(())
    }

    /// Decide whether a sample line belongs to a histogram or summary group.
    fn group_target(
        &self,
        sample: &RawSample,
    ) -> Result<Option<(String, GroupPart)>, ParseErrorKind> {
        if self.kind_of(&sample.name) == Some(MetricKind::Summary) {
            let quantile = sample
                .labels
                .get("quantile")
                .ok_or_else(|| ParseErrorKind::InvalidLabel("missing quantile".to_string()))?;
            let quantile = parse_value(quantile)?;
            return Ok(Some((sample.name.clone(), GroupPart::Quantile(quantile))));
        }

        if let Some(base) = sample.name.strip_suffix("_bucket") {
            if self.kind_of(base) == Some(MetricKind::Histogram) {
                let le = sample
                    .labels
                    .get("le")
                    .ok_or_else(|| ParseErrorKind::InvalidLabel("missing le".to_string()))?;
                let upper_bound = parse_value(le)?;
                return Ok(Some((base.to_string(), GroupPart::Bucket(upper_bound))));
            }
        }

        let (base, part) = if let Some(base) = sample.name.strip_suffix("_sum") {
            (base, GroupPart::Sum)
        } else if let Some(base) = sample.name.strip_suffix("_count") {
            (base, GroupPart::Count)
        } else {
            return Ok(None);
        };
        match self.kind_of(base) {
            Some(MetricKind::Histogram) | Some(MetricKind::Summary) => {
                Ok(Some((base.to_string(), part)))
            }
            _ => Ok(None),
        }
    }

    fn finish(self) -> Vec<MetricFamily> {
        self.families.into_iter().map(FamilyDraft::finish).collect()
    }
}

impl FamilyDraft {
    fn group_mut(&mut self, labels: Labels) -> &mut GroupDraft {
        let idx = match self.groups.get(&labels) {
            Some(&idx) => idx,
            None => {
                self.samples.push(SampleDraft::Group(GroupDraft {
                    labels: labels.clone(),
                    ..GroupDraft::default()
                }));
                let idx = self.samples.len() - 1;
                self.groups.insert(labels, idx);
                idx
            }
        };
        match &mut self.samples[idx] {
            SampleDraft::Group(group) => group,
            SampleDraft::Single(_) => unreachable!("group index points at a single sample"),
        }
    }

    fn finish(self) -> MetricFamily {
        let kind = self.kind;
        let samples = self
            .samples
            .into_iter()
            .map(|draft| match draft {
                SampleDraft::Single(sample) => sample,
                SampleDraft::Group(group) => group.finish(kind),
            })
            .collect();

        MetricFamily {
            name: self.name,
            help: self.help,
            kind,
            samples,
        }
    }
}

impl GroupDraft {
    fn finish(self, kind: MetricKind) -> MetricSample {
        let sum = self.sum.unwrap_or(0.0);
        let value = if kind == MetricKind::Summary {
            SampleValue::Summary {
                count: self.count.unwrap_or(0.0),
                quantiles: self.quantiles,
                sum,
            }
        } else {
            // Without an explicit _count the +Inf bucket holds the total.
            let count = self
                .count
                .or_else(|| self.buckets.last().map(|b| b.cumulative_count))
                .unwrap_or(0.0);
            SampleValue::Histogram {
                buckets: self.buckets,
                sum,
                count,
            }
        };
        MetricSample {
            labels: self.labels,
            value,
        }
    }
}

fn is_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(is_metric_char)
}

fn is_metric_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn parse_sample_line(line: &str) -> Result<RawSample, ParseErrorKind> {
    let name_len = line.find(|c: char| !is_metric_char(c)).unwrap_or(line.len());
    let name = &line[..name_len];
    if !is_metric_name(name) {
        return Err(ParseErrorKind::InvalidMetricName);
    }

    let mut rest = &line[name_len..];
    let mut labels = Labels::new();
    if let Some(after_brace) = rest.strip_prefix('{') {
        let end = find_label_set_end(after_brace).ok_or(ParseErrorKind::UnterminatedLabelSet)?;
        labels = parse_label_pairs(&after_brace[..end])?;
        rest = &after_brace[end + 1..];
    } else if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(ParseErrorKind::InvalidMetricName);
    }

    let mut tokens = rest.split_whitespace();
    let value = parse_value(tokens.next().ok_or(ParseErrorKind::MissingValue)?)?;
    if let Some(timestamp) = tokens.next() {
        // Timestamps are accepted but not used.
        timestamp
            .parse::<i64>()
            .map_err(|_| ParseErrorKind::InvalidValue(timestamp.to_string()))?;
    }
    if let Some(extra) = tokens.next() {
        return Err(ParseErrorKind::InvalidValue(extra.to_string()));
    }

    Ok(RawSample {
        name: name.to_string(),
        labels,
        value,
    })
}

/// Index of the `}` closing a label set, ignoring braces inside quoted values.
fn find_label_set_end(s: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            '}' if !in_quotes => return Some(i),
            _ => {}
        }
    }
    None
}

fn parse_label_pairs(body: &str) -> Result<Labels, ParseErrorKind> {
    let mut labels = Labels::new();
    let mut rest = body.trim_start();

    while !rest.is_empty() {
        let name_len = rest.find(|c: char| !is_label_char(c)).unwrap_or(rest.len());
        let name = &rest[..name_len];
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(ParseErrorKind::InvalidLabel(rest.to_string()));
        }

        rest = rest[name_len..].trim_start();
        rest = rest
            .strip_prefix('=')
            .ok_or_else(|| ParseErrorKind::InvalidLabel(name.to_string()))?
            .trim_start();
        rest = rest
            .strip_prefix('"')
            .ok_or_else(|| ParseErrorKind::InvalidLabel(name.to_string()))?;
        let (value, after) =
            read_quoted(rest).ok_or_else(|| ParseErrorKind::InvalidLabel(name.to_string()))?;

        if labels.insert(name.to_string(), value).is_some() {
            return Err(ParseErrorKind::InvalidLabel(format!("duplicate {}", name)));
        }

        rest = after.trim_start();
        match rest.strip_prefix(',') {
            Some(next) => rest = next.trim_start(),
            None if rest.is_empty() => {}
            None => return Err(ParseErrorKind::InvalidLabel(rest.to_string())),
        }
    }

    Ok(labels)
}

/// Read a quoted label value (opening quote already consumed).
fn read_quoted(s: &str) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = s.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Some((out, &s[i + 1..])),
            '\\' => match chars.next()?.1 {
                'n' => out.push('\n'),
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            },
            c => out.push(c),
        }
    }
    None
}

fn parse_value(token: &str) -> Result<f64, ParseErrorKind> {
    match token {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => token
            .parse::<f64>()
            .map_err(|_| ParseErrorKind::InvalidValue(token.to_string())),
    }
}

fn unescape_help(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Render families back into exposition text.
pub fn render(families: &[MetricFamily]) -> String {
    let mut output = String::new();

    for family in families {
        let name = &family.name;
        if !family.help.is_empty() {
            output.push_str(&format!("# HELP {} {}\n", name, escape_help(&family.help)));
        }
        if family.kind != MetricKind::Unknown {
            output.push_str(&format!("# TYPE {} {}\n", name, family.kind));
        }

        for sample in &family.samples {
            match &sample.value {
                SampleValue::Single { value } => {
                    push_sample(&mut output, name, &sample.labels, None, *value);
                }
                SampleValue::Histogram {
                    buckets,
                    sum,
                    count,
                } => {
                    let bucket_name = format!("{}_bucket", name);
                    for bucket in buckets {
                        let le = format_value(bucket.upper_bound);
                        push_sample(
                            &mut output,
                            &bucket_name,
                            &sample.labels,
                            Some(("le", &le)),
                            bucket.cumulative_count,
                        );
                    }
                    push_sample(&mut output, &format!("{}_sum", name), &sample.labels, None, *sum);
                    push_sample(&mut output, &format!("{}_count", name), &sample.labels, None, *count);
                }
                SampleValue::Summary {
                    quantiles,
                    sum,
                    count,
                } => {
                    for quantile in quantiles {
                        let q = format_value(quantile.quantile);
                        push_sample(
                            &mut output,
                            name,
                            &sample.labels,
                            Some(("quantile", &q)),
                            quantile.value,
                        );
                    }
                    push_sample(&mut output, &format!("{}_sum", name), &sample.labels, None, *sum);
                    push_sample(&mut output, &format!("{}_count", name), &sample.labels, None, *count);
                }
            }
        }
    }

    output
}

fn push_sample(
    output: &mut String,
    name: &str,
    labels: &Labels,
    extra: Option<(&str, &str)>,
    value: f64,
) {
    let mut pairs: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
        .collect();
    if let Some((k, v)) = extra {
        pairs.push(format!("{}=\"{}\"", k, escape_label_value(v)));
    }

    if pairs.is_empty() {
        output.push_str(&format!("{} {}\n", name, format_value(value)));
    } else {
        output.push_str(&format!("{}{{{}}} {}\n", name, pairs.join(","), format_value(value)));
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}

/// Escape a label value: backslash, double-quote and newline.
fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::family::labels;
    use crate::data::fixtures::PROXY_METRICS;

    #[test]
    fn parses_help_type_and_samples() {
        let text = "\
# HELP errors Total errors
# TYPE errors counter
errors 3
";
        let families = parse(text).unwrap();
        assert_eq!(families.len(), 1);
        let errors = &families[0];
        assert_eq!(errors.name, "errors");
        assert_eq!(errors.help, "Total errors");
        assert_eq!(errors.kind, MetricKind::Counter);
        assert_eq!(errors.samples.len(), 1);
        assert_eq!(errors.samples[0].value(), 3.0);
        assert!(errors.samples[0].labels.is_empty());
    }

    #[test]
    fn missing_help_and_type_use_defaults() {
        let families = parse("hits 12\n").unwrap();
        assert_eq!(families[0].help, "");
        assert_eq!(families[0].kind, MetricKind::Unknown);
    }

    #[test]
    fn keeps_first_seen_order_and_groups_labeled_samples() {
        let text = "\
traffic{metric=\"fetched\"} 100
hits 5
traffic{metric=\"served\"} 80
";
        let families = parse(text).unwrap();
        let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["traffic", "hits"]);
        assert_eq!(families[0].samples.len(), 2);
        assert_eq!(families[0].samples[1].label("metric"), Some("served"));
    }

    #[test]
    fn groups_histogram_lines_per_label_set() {
        let text = "\
# HELP api_response_time Api Response Time in milliseconds
# TYPE api_response_time histogram
api_response_time_bucket{method=\"fetch\",le=\"5\"} 1
api_response_time_bucket{method=\"fetch\",le=\"10\"} 3
api_response_time_bucket{method=\"fetch\",le=\"+Inf\"} 4
api_response_time_sum{method=\"fetch\"} 42.5
api_response_time_count{method=\"fetch\"} 4
api_response_time_bucket{method=\"describe\",le=\"5\"} 2
api_response_time_bucket{method=\"describe\",le=\"10\"} 2
api_response_time_bucket{method=\"describe\",le=\"+Inf\"} 2
api_response_time_sum{method=\"describe\"} 3
api_response_time_count{method=\"describe\"} 2
";
        let families = parse(text).unwrap();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.kind, MetricKind::Histogram);
        assert_eq!(family.samples.len(), 2);

        let fetch = &family.samples[0];
        assert_eq!(fetch.labels, labels([("method", "fetch")]));
        let buckets = fetch.buckets().unwrap();
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[1].upper_bound, 10.0);
        assert_eq!(buckets[1].cumulative_count, 3.0);
        assert!(buckets[2].upper_bound.is_infinite());
        assert_eq!(fetch.value(), 4.0);
        match &fetch.value {
            SampleValue::Histogram { sum, .. } => assert_eq!(*sum, 42.5),
            other => panic!("expected histogram, got {:?}", other),
        }
    }

    #[test]
    fn groups_summary_quantiles() {
        let text = "\
# TYPE rpc_duration summary
rpc_duration{quantile=\"0.5\"} 0.2
rpc_duration{quantile=\"0.99\"} 1.5
rpc_duration_sum 10
rpc_duration_count 30
";
        let families = parse(text).unwrap();
        assert_eq!(families.len(), 1);
        match &families[0].samples[0].value {
            SampleValue::Summary {
                quantiles,
                sum,
                count,
            } => {
                assert_eq!(quantiles.len(), 2);
                assert_eq!(quantiles[1].quantile, 0.99);
                assert_eq!(*sum, 10.0);
                assert_eq!(*count, 30.0);
            }
            other => panic!("expected summary, got {:?}", other),
        }
    }

    #[test]
    fn bucket_lines_without_histogram_type_are_plain_families() {
        let families = parse("latency_bucket{le=\"1\"} 3\n").unwrap();
        assert_eq!(families[0].name, "latency_bucket");
        assert_eq!(families[0].samples[0].label("le"), Some("1"));
    }

    #[test]
    fn unterminated_label_set_fails_with_line_number() {
        let text = "hits 1\ntraffic{metric=\"fetched\" 10\n";
        let err = parse(text).unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.kind, ParseErrorKind::UnterminatedLabelSet);
    }

    #[test]
    fn unterminated_quote_is_unterminated_label_set() {
        let err = parse("traffic{metric=\"fetched} 10\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedLabelSet);
    }

    #[test]
    fn brace_inside_quoted_value_does_not_close_label_set() {
        let families = parse("doc{url=\"ipfs://a}b\"} 1\n").unwrap();
        assert_eq!(families[0].samples[0].label("url"), Some("ipfs://a}b"));
    }

    #[test]
    fn malformed_line_is_skipped_and_family_left_partial() {
        let text = "\
# TYPE document counter
document{status=\"fetched\"} 10
document{status=\"forced\"} not-a-number
document{status=\"blocked\"} 2
";
        let mut parser = ExpositionParser::new();
        let families = parser.parse(text).unwrap();
        assert_eq!(families[0].samples.len(), 2);
        assert_eq!(parser.skipped().len(), 1);
        assert_eq!(parser.skipped()[0].line, 3);
        assert_eq!(
            parser.skipped()[0].kind,
            ParseErrorKind::InvalidValue("not-a-number".to_string())
        );
    }

    #[test]
    fn skipped_lines_reset_between_parses() {
        let mut parser = ExpositionParser::new();
        parser.parse("hits\n").unwrap();
        assert_eq!(parser.skipped().len(), 1);
        assert_eq!(parser.skipped()[0].kind, ParseErrorKind::MissingValue);
        parser.parse("hits 1\n").unwrap();
        assert!(parser.skipped().is_empty());
    }

    #[test]
    fn decodes_escapes_special_values_and_timestamps() {
        let text = "\
# HELP quoted Line one\\nline two
quoted{path=\"C:\\\\tmp\",say=\"\\\"hi\\\"\"} +Inf 1700000000000
quoted{path=\"other\"} NaN
quoted{path=\"neg\"} -Inf
";
        let families = parse(text).unwrap();
        let family = &families[0];
        assert_eq!(family.help, "Line one\nline two");
        assert_eq!(family.samples[0].label("path"), Some("C:\\tmp"));
        assert_eq!(family.samples[0].label("say"), Some("\"hi\""));
        assert!(family.samples[0].value().is_infinite());
        assert!(family.samples[1].value().is_nan());
        assert_eq!(family.samples[2].value(), f64::NEG_INFINITY);
    }

    #[test]
    fn non_contiguous_samples_merge_into_one_family() {
        let text = "a 1\nb 2\na{x=\"y\"} 3\n";
        let families = parse(text).unwrap();
        assert_eq!(families.len(), 2);
        assert_eq!(families[0].samples.len(), 2);
    }

    #[test]
    fn parses_proxy_fixture() {
        let families = parse(PROXY_METRICS).unwrap();
        let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
        assert!(names.contains(&"api_requests"));
        assert!(names.contains(&"api_response_time"));
        assert!(names.contains(&"process_resident_memory_bytes"));
        let unique: std::collections::HashSet<&str> = names.iter().copied().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn render_then_parse_recovers_counters_and_gauges() {
        let families = vec![
            MetricFamily::new("api_requests")
                .with_help("Api request by method")
                .with_kind(MetricKind::Counter)
                .with_sample(MetricSample::single(labels([("rpc_method", "img_proxy_fetch")]), 120.0))
                .with_sample(MetricSample::single(
                    labels([("rpc_method", "img_proxy_describe")]),
                    7.0,
                )),
            MetricFamily::new("cache_metrics")
                .with_help("Cache metics by cache type")
                .with_kind(MetricKind::Gauge)
                .with_sample(MetricSample::single(
                    labels([("metric", "mem_used_bytes"), ("type", "memory")]),
                    1234.5,
                )),
            MetricFamily::new("process_start_time_seconds")
                .with_kind(MetricKind::Gauge)
                .with_sample(MetricSample::single(labels([]), 1_700_000_000.25)),
            MetricFamily::new("odd_labels")
                .with_help("Escapes \\ and\nnewlines")
                .with_kind(MetricKind::Counter)
                .with_sample(MetricSample::single(labels([("v", "a\"b\\c\nd")]), 0.1)),
        ];

        let text = render(&families);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, families);
    }

    #[test]
    fn render_expands_histograms() {
        let family = MetricFamily::new("doc_size")
            .with_kind(MetricKind::Histogram)
            .with_sample(MetricSample {
                labels: Labels::new(),
                value: SampleValue::Histogram {
                    buckets: vec![
                        Bucket {
                            upper_bound: 25600.0,
                            cumulative_count: 1.0,
                        },
                        Bucket {
                            upper_bound: f64::INFINITY,
                            cumulative_count: 2.0,
                        },
                    ],
                    sum: 30000.0,
                    count: 2.0,
                },
            });
        let text = render(std::slice::from_ref(&family));
        assert!(text.contains("doc_size_bucket{le=\"25600\"} 1\n"));
        assert!(text.contains("doc_size_bucket{le=\"+Inf\"} 2\n"));
        assert!(text.contains("doc_size_count 2\n"));
        assert_eq!(parse(&text).unwrap(), vec![family]);
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("simple"), "simple");
        assert_eq!(escape_label_value("with\"quote"), "with\\\"quote");
        assert_eq!(escape_label_value("with\\backslash"), "with\\\\backslash");
        assert_eq!(escape_label_value("with\nnewline"), "with\\nnewline");
    }
}
