//! Error types for fetching and parsing proxy data.

use thiserror::Error;

/// Errors that can occur while sampling the image proxy.
///
/// None of these are fatal to the dashboard: every variant degrades to a
/// stale or partial display until the next poll cycle.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed before a response was received.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The metrics endpoint answered with a non-success status.
    #[error("Metrics endpoint unavailable (status {status})")]
    EndpointUnavailable { status: u16 },

    /// The exposition text was structurally malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Failed to decode a JSON response.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A JSON-RPC call returned no result.
    #[error("RPC method {method} failed with code {code}")]
    Rpc { method: String, code: String },

    /// Reading a local source failed.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_decode() {
            Error::Decode(err.to_string())
        } else {
            Error::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}

/// A problem found on one line of exposition text.
///
/// Only [`ParseErrorKind::UnterminatedLabelSet`] aborts a parse; the other
/// kinds are recorded for skipped lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// What was wrong with an exposition line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unterminated label set")]
    UnterminatedLabelSet,

    #[error("invalid metric name")]
    InvalidMetricName,

    #[error("invalid label: {0}")]
    InvalidLabel(String),

    #[error("missing sample value")]
    MissingValue,

    #[error("invalid sample value: {0}")]
    InvalidValue(String),
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }

    /// Whether this error aborts the whole parse.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, ParseErrorKind::UnterminatedLabelSet)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
