//! Provider contract and the request/error types it speaks.
//!
//! The orchestrator only sees a [`DataSource`] trait object, so tests can
//! swap in scripted providers and production wires in
//! [`YahooChartSource`](crate::adapters::YahooChartSource).

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{Interval, RawSeries, Symbol};

/// Default look-back window forwarded to the provider.
pub const DEFAULT_PERIOD: &str = "6mo";

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    EmptyResult,
    Internal,
}

/// Structured provider error. Every kind counts as one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::InvalidRequest, message)
    }

    pub fn empty_result() -> Self {
        Self::new(SourceErrorKind::EmptyResult, "Empty series returned")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::EmptyResult => "source.empty_result",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for SourceError {}

/// One provider download: symbol, interval and look-back period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub symbol: Symbol,
    pub interval: Interval,
    pub period: String,
}

impl HistoryRequest {
    pub fn new(symbol: Symbol, interval: Interval, period: impl Into<String>) -> Self {
        Self {
            symbol,
            interval,
            period: period.into(),
        }
    }
}

/// Future returned by [`DataSource::history`].
pub type HistoryFuture<'a> = Pin<Box<dyn Future<Output = Result<RawSeries, SourceError>> + Send + 'a>>;

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; one instance serves every request.
pub trait DataSource: Send + Sync {
    /// Human-readable provider name, rendered as the `source` field.
    fn name(&self) -> &str;

    /// Downloads the series for `req`. An empty series is a valid answer here;
    /// the orchestrator decides it is a failure.
    fn history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a>;
}
