use std::sync::{Arc, Mutex};

use quotegate_core::{
    DataSource, GatewayConfig, HistoryRequest, HttpClient, HttpError, HttpFuture, HttpRequest,
    HttpResponse, Interval, ResponseFormat, SourceErrorKind, StockQuery, StockService, Symbol,
    YahooChartSource,
};
use serde_json::{json, Value};

/// Replays one canned chart payload and remembers the URLs it was asked for.
struct FixtureHttpClient {
    status: u16,
    body: String,
    urls: Mutex<Vec<String>>,
}

impl FixtureHttpClient {
    fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            urls: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("url log should not be poisoned").clone()
    }
}

impl HttpClient for FixtureHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        self.urls
            .lock()
            .expect("url log should not be poisoned")
            .push(request.url);
        let response: Result<HttpResponse, HttpError> =
            Ok(HttpResponse::with_status(self.status, self.body.clone()));
        Box::pin(async move { response })
    }
}

fn daily_chart() -> String {
    json!({
        "chart": {
            "result": [{
                "meta": {"symbol": "AAPL", "currency": "USD", "gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600, 1704465000],
                "indicators": {
                    "quote": [{
                        "open": [185.0, 184.0, null, 181.0],
                        "high": [186.0, 185.0, null, 182.0],
                        "low": [183.0, 182.5, null, 180.0],
                        "close": [185.5, 184.25, null, 181.5],
                        "volume": [82488700, 58414500, null, 62303300]
                    }],
                    "adjclose": [{"adjclose": [185.5, 184.25, null, 181.5]}]
                }
            }],
            "error": null
        }
    })
    .to_string()
}

#[tokio::test]
async fn chart_payload_flows_through_to_rendered_history() {
    let client = FixtureHttpClient::new(200, daily_chart());
    let source = YahooChartSource::new(client.clone()).with_base_url("http://chart.test");
    let service = StockService::from_config(Arc::new(source), &GatewayConfig::default());

    let response = service
        .respond(&StockQuery::new("aapl"), ResponseFormat::Json)
        .await;

    assert_eq!(response.status, 200);
    let payload: Value = serde_json::from_str(&response.body).expect("json body");
    assert_eq!(payload["symbol"], "AAPL");
    assert_eq!(payload["source"], "Yahoo Finance");
    assert_eq!(payload["records_returned"], 3);
    assert_eq!(payload["current_price"], 181.5);
    assert_eq!(
        payload["history"],
        json!([
            {"date": "2024-01-02", "open": 185.0, "close": 185.5},
            {"date": "2024-01-03", "open": 184.0, "close": 184.25},
            {"date": "2024-01-05", "open": 181.0, "close": 181.5}
        ])
    );

    assert_eq!(
        client.urls(),
        vec![String::from(
            "http://chart.test/v8/finance/chart/AAPL?range=6mo&interval=1d&includeAdjustedClose=true"
        )]
    );
}

#[tokio::test]
async fn split_adjusted_history_scales_open_with_close() {
    let body = json!({
        "chart": {
            "result": [{
                "meta": {"gmtoffset": 0},
                "timestamp": [1704153600],
                "indicators": {
                    "quote": [{"open": [190.0], "high": [210.0], "low": [180.0], "close": [200.0], "volume": [10]}],
                    "adjclose": [{"adjclose": [100.0]}]
                }
            }],
            "error": null
        }
    })
    .to_string();
    let source = YahooChartSource::new(FixtureHttpClient::new(200, body));

    let series = source
        .history(HistoryRequest::new(
            Symbol::parse("XYZ").expect("valid symbol"),
            Interval::OneDay,
            "1mo",
        ))
        .await
        .expect("history parses");

    let records = quotegate_core::normalize_rows(series.rows());
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].date, "2024-01-02");
    assert_eq!(records[0].open, Some(95.0));
    assert_eq!(records[0].close, Some(100.0));
}

#[tokio::test]
async fn unknown_symbol_surfaces_as_source_error() {
    let body = json!({
        "chart": {
            "result": null,
            "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
        }
    })
    .to_string();
    let source = YahooChartSource::new(FixtureHttpClient::new(404, body));

    let error = source
        .history(HistoryRequest::new(
            Symbol::parse("NOPE").expect("valid symbol"),
            Interval::OneDay,
            "6mo",
        ))
        .await
        .expect_err("404 must fail");

    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
}
