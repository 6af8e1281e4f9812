//! Request handling: validation, orchestration, truncation, normalization
//! and rendering of one `/stock/{symbol}` call.

use std::sync::Arc;

use tracing::{error, warn};

use crate::cache::SeriesCache;
use crate::config::GatewayConfig;
use crate::data_source::DataSource;
use crate::error::{GatewayError, ValidationError};
use crate::gate::DownloadGate;
use crate::normalize::normalize_rows;
use crate::orchestrator::FetchOrchestrator;
use crate::render::{render_error, render_result, ResponseFormat};
use crate::{Interval, RawSeries, StockResult, Symbol};

/// Number of most recent rows kept when the caller does not say.
pub const DEFAULT_MAX_RECORDS: usize = 180;

/// Raw query as received by the transport. Values stay strings so that
/// malformed input is reported through the gateway's own error bodies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockQuery {
    pub symbol: String,
    pub interval: Option<String>,
    pub period: Option<String>,
    pub max_records: Option<String>,
}

impl StockQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }

    pub fn with_max_records(mut self, max_records: impl Into<String>) -> Self {
        self.max_records = Some(max_records.into());
        self
    }
}

#[derive(Debug, Clone)]
struct ValidatedQuery {
    symbol: Symbol,
    interval: Interval,
    period: String,
    max_records: usize,
}

/// Fully rendered response, ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl GatewayResponse {
    fn ok(format: ResponseFormat, body: String) -> Self {
        Self {
            status: 200,
            content_type: format.content_type(),
            body,
        }
    }

    fn from_error(error: &GatewayError, format: ResponseFormat) -> Self {
        let status = error.status();
        if status >= 500 {
            error!(code = error.code(), %error, status, "request failed");
        } else {
            warn!(code = error.code(), %error, status, "request rejected");
        }

        Self {
            status,
            content_type: format.content_type(),
            body: render_error(&error.to_string(), format),
        }
    }
}

/// Entry point the HTTP layer calls into.
#[derive(Clone)]
pub struct StockService {
    orchestrator: Arc<FetchOrchestrator>,
    default_period: String,
    default_max_records: usize,
}

impl StockService {
    pub fn new(orchestrator: Arc<FetchOrchestrator>) -> Self {
        let defaults = GatewayConfig::default();
        Self {
            orchestrator,
            default_period: defaults.default_period,
            default_max_records: defaults.default_max_records,
        }
    }

    /// Builds the cache, gate and orchestrator once for the whole process.
    pub fn from_config(source: Arc<dyn DataSource>, config: &GatewayConfig) -> Self {
        let orchestrator = FetchOrchestrator::new(
            source,
            SeriesCache::new(config.cache_ttl),
            DownloadGate::new(config.max_concurrent_downloads),
        )
        .with_policies(config.primary_retry, config.fallback_retry);

        Self {
            orchestrator: Arc::new(orchestrator),
            default_period: config.default_period.clone(),
            default_max_records: config.default_max_records,
        }
    }

    pub fn orchestrator(&self) -> &Arc<FetchOrchestrator> {
        &self.orchestrator
    }

    /// Validates, fetches and builds the result.
    ///
    /// The pipeline runs in its own task: a client that goes away does not
    /// cancel an in-flight download, and a panic after the fetch still comes
    /// back as a processing error.
    pub async fn quote(&self, query: &StockQuery) -> Result<StockResult, GatewayError> {
        let validated = self.validate(query)?;
        let service = self.clone();

        tokio::spawn(async move { service.run(validated).await })
            .await
            .map_err(|join_error| {
                GatewayError::Processing(format!("request processing failed: {join_error}"))
            })?
    }

    /// Like [`quote`](Self::quote) but always produces a rendered body.
    pub async fn respond(&self, query: &StockQuery, format: ResponseFormat) -> GatewayResponse {
        let rendered = self.quote(query).await.and_then(|result| {
            render_result(&result, format)
                .map_err(|render_error| GatewayError::Processing(render_error.to_string()))
        });

        match rendered {
            Ok(body) => GatewayResponse::ok(format, body),
            Err(error) => GatewayResponse::from_error(&error, format),
        }
    }

    fn validate(&self, query: &StockQuery) -> Result<ValidatedQuery, ValidationError> {
        let interval = match query.interval.as_deref() {
            Some(raw) => Interval::parse(raw)?,
            None => Interval::default(),
        };

        let symbol = Symbol::parse(&query.symbol)?;

        let period = match query.period.as_deref().map(str::trim) {
            Some("") => return Err(ValidationError::EmptyPeriod),
            Some(period) => period.to_owned(),
            None => self.default_period.clone(),
        };

        let max_records = match query.max_records.as_deref() {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ValidationError::InvalidMaxRecords {
                    value: raw.to_owned(),
                })?,
            None => self.default_max_records,
        };

        Ok(ValidatedQuery {
            symbol,
            interval,
            period,
            max_records,
        })
    }

    async fn run(&self, query: ValidatedQuery) -> Result<StockResult, GatewayError> {
        let outcome = self
            .orchestrator
            .fetch(&query.symbol, query.interval, &query.period)
            .await?;

        build_result(
            query.symbol,
            self.orchestrator.source_name(),
            query.interval,
            &outcome.series,
            query.max_records,
        )
    }
}

/// Truncates to the most recent `max_records` rows and normalizes them.
fn build_result(
    symbol: Symbol,
    source: &str,
    interval: Interval,
    series: &RawSeries,
    max_records: usize,
) -> Result<StockResult, GatewayError> {
    if series.is_empty() {
        return Err(GatewayError::Processing(String::from(
            "Empty data after fetch",
        )));
    }

    let rows = series.tail(max_records);
    if rows.is_empty() {
        return Err(GatewayError::Processing(format!(
            "No records left after keeping the most recent {max_records}"
        )));
    }

    Ok(StockResult::new(symbol, source, interval, normalize_rows(rows)))
}
