use std::sync::Arc;

use serde::Deserialize;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

use crate::data_source::{DataSource, HistoryFuture, HistoryRequest, SourceError};
use crate::domain::columns;
use crate::http_client::{HttpClient, HttpRequest, DEFAULT_TIMEOUT_MS};
use crate::{RawRow, RawSeries, RowTimestamp};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

const SOURCE_NAME: &str = "Yahoo Finance";
const REFERER: &str = "https://finance.yahoo.com/";

/// Yahoo Finance chart endpoint as a [`DataSource`].
///
/// Prices come back auto-adjusted: `Close` is the adjusted close and
/// `Open`/`High`/`Low` are scaled by the same factor.
#[derive(Clone)]
pub struct YahooChartSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl YahooChartSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            base_url: String::from(DEFAULT_BASE_URL),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    fn endpoint(&self, req: &HistoryRequest) -> String {
        format!(
            "{}/v8/finance/chart/{}?range={}&interval={}&includeAdjustedClose=true",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            urlencoding::encode(&req.period),
            req.interval.as_str(),
        )
    }

    async fn fetch(&self, req: HistoryRequest) -> Result<RawSeries, SourceError> {
        let request = HttpRequest::get(self.endpoint(&req))
            .with_header("referer", REFERER)
            .with_timeout_ms(self.timeout_ms);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(|e| SourceError::unavailable(format!("yahoo transport error: {}", e.message())))?;

        match response.status {
            429 => {
                return Err(SourceError::rate_limited("yahoo returned status 429"));
            }
            status if !(200..300).contains(&status) => {
                return Err(SourceError::unavailable(format!(
                    "yahoo returned status {status}"
                )));
            }
            _ => {}
        }

        let series = parse_chart(&response.body, req.interval.is_intraday())?;
        debug!(
            symbol = %req.symbol,
            interval = %req.interval,
            rows = series.len(),
            "yahoo chart parsed"
        );
        Ok(series)
    }
}

impl DataSource for YahooChartSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn history<'a>(&'a self, req: HistoryRequest) -> HistoryFuture<'a> {
        Box::pin(self.fetch(req))
    }
}

/// Parses a chart payload into rows. A payload without a result or without
/// timestamps parses to an empty series.
pub(crate) fn parse_chart(body: &str, intraday: bool) -> Result<RawSeries, SourceError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::internal(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::invalid_request(format!(
            "yahoo chart API error: {}",
            error.describe()
        )));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(RawSeries::default());
    };
    let Some(timestamps) = result.timestamp else {
        return Ok(RawSeries::default());
    };

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|a| a.adjclose)
        .unwrap_or_default();

    let mut rows = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let mut open = value_at(&quote.open, i);
        let mut high = value_at(&quote.high, i);
        let mut low = value_at(&quote.low, i);
        let mut close = value_at(&quote.close, i);
        let volume = value_at(&quote.volume, i);

        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            continue;
        }

        if let (Some(raw_close), Some(adjusted)) = (close, value_at(&adjclose, i)) {
            if raw_close != 0.0 {
                let ratio = adjusted / raw_close;
                open = open.map(|v| v * ratio);
                high = high.map(|v| v * ratio);
                low = low.map(|v| v * ratio);
                close = Some(adjusted);
            }
        }

        rows.push(
            RawRow::new(local_timestamp(ts, offset, intraday)?)
                .with_field(columns::OPEN, open)
                .with_field(columns::HIGH, high)
                .with_field(columns::LOW, low)
                .with_field(columns::CLOSE, close)
                .with_field(columns::VOLUME, volume),
        );
    }

    Ok(RawSeries::new(rows))
}

fn value_at(values: &[Option<f64>], index: usize) -> Option<f64> {
    values.get(index).copied().flatten().filter(|v| v.is_finite())
}

/// Shifts a UTC epoch into exchange-local wall time.
fn local_timestamp(ts: i64, gmtoffset: i64, intraday: bool) -> Result<RowTimestamp, SourceError> {
    let local = OffsetDateTime::from_unix_timestamp(ts.saturating_add(gmtoffset))
        .map_err(|e| SourceError::internal(format!("invalid timestamp {ts}: {e}")))?;

    Ok(if intraday {
        RowTimestamp::DateTime(PrimitiveDateTime::new(local.date(), local.time()))
    } else {
        RowTimestamp::Date(local.date())
    })
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => String::from("unknown error"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
    #[serde(default)]
    adjclose: Vec<YahooAdjClose>,
}

#[derive(Debug, Default, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct YahooAdjClose {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}
