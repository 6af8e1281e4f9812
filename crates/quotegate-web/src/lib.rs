//! HTTP surface for quotegate.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /` | Liveness probe, always `{"status":"ok"}` |
//! | `GET /stock/:symbol` | Price history, XML by default or JSON on `Accept: application/json` |

pub mod config;
pub mod telemetry;

use std::sync::Arc;

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use quotegate_core::{render_error, GatewayResponse, ResponseFormat, StockQuery, StockService};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Query string of `/stock/:symbol`. Values are kept as strings; the service
/// validates them and answers malformed ones with a negotiated 400 body.
#[derive(Debug, Default, Deserialize)]
pub struct StockParams {
    pub interval: Option<String>,
    pub period: Option<String>,
    pub max_records: Option<String>,
}

pub fn app_router(service: StockService) -> Router {
    Router::new()
        .route("/", get(liveness))
        .route("/stock/:symbol", get(stock_history))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(service))
}

async fn liveness() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn stock_history(
    State(service): State<Arc<StockService>>,
    headers: HeaderMap,
    symbol: Result<Path<String>, PathRejection>,
    params: Result<Query<StockParams>, QueryRejection>,
) -> Response {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok());
    let format = ResponseFormat::from_accept(accept);

    let Path(symbol) = match symbol {
        Ok(symbol) => symbol,
        Err(rejection) => return rejected(&rejection.body_text(), format),
    };
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return rejected(&rejection.body_text(), format),
    };

    let query = StockQuery {
        symbol,
        interval: params.interval,
        period: params.period,
        max_records: params.max_records,
    };

    into_http(service.respond(&query, format).await)
}

/// Malformed path or query string, answered in the negotiated format.
fn rejected(message: &str, format: ResponseFormat) -> Response {
    warn!(error = message, "request rejected before validation");
    into_http(GatewayResponse {
        status: 400,
        content_type: format.content_type(),
        body: render_error(message, format),
    })
}

fn into_http(response: GatewayResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, response.content_type)],
        response.body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use quotegate_core::{
        columns, Backoff, DataSource, GatewayConfig, HistoryFuture, HistoryRequest, RawRow,
        RawSeries, RetryPolicy, RowTimestamp, SourceError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use time::{Date, Month};
    use tower::ServiceExt;

    struct StubSource {
        rows: usize,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn with_rows(rows: usize) -> Arc<Self> {
            Arc::new(Self {
                rows,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl DataSource for StubSource {
        fn name(&self) -> &str {
            "stub"
        }

        fn history<'a>(&'a self, _req: HistoryRequest) -> HistoryFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rows = self.rows;
            Box::pin(async move {
                if rows == 0 {
                    return Err(SourceError::unavailable("provider down"));
                }
                Ok((1..=rows)
                    .map(|day| {
                        let day = u8::try_from(day).expect("small day");
                        RawRow::new(RowTimestamp::Date(
                            Date::from_calendar_date(2024, Month::March, day).expect("valid date"),
                        ))
                        .with_field(columns::OPEN, f64::from(day) * 10.0)
                        .with_field(columns::CLOSE, f64::from(day) * 10.0 + 0.25)
                    })
                    .collect::<RawSeries>())
            })
        }
    }

    fn router(source: Arc<StubSource>) -> Router {
        let no_wait = Backoff::Fixed {
            delay: Duration::ZERO,
        };
        let config = GatewayConfig::default()
            .with_retry(RetryPolicy::new(3, no_wait), RetryPolicy::new(2, no_wait));
        app_router(StockService::from_config(source, &config))
    }

    async fn send(app: Router, uri: &str, accept: Option<&str>) -> (StatusCode, String, String) {
        let mut request = Request::builder().uri(uri);
        if let Some(accept) = accept {
            request = request.header(header::ACCEPT, accept);
        }
        let response = app
            .oneshot(request.body(Body::empty()).expect("request"))
            .await
            .expect("router is infallible");

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, content_type, String::from_utf8(body.to_vec()).expect("utf-8"))
    }

    #[tokio::test]
    async fn liveness_reports_ok() {
        let (status, content_type, body) = send(router(StubSource::with_rows(1)), "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("application/json"));
        assert_eq!(serde_json::from_str::<Value>(&body).expect("json"), json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn json_history_when_accept_asks_for_it() {
        let (status, content_type, body) = send(
            router(StubSource::with_rows(5)),
            "/stock/acme?interval=1d",
            Some("application/json"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/json");
        let payload: Value = serde_json::from_str(&body).expect("json");
        assert_eq!(payload["symbol"], "ACME");
        assert_eq!(payload["source"], "stub");
        assert_eq!(payload["interval"], "1d");
        assert_eq!(payload["records_returned"], 5);
        assert_eq!(payload["current_price"], 50.25);
        assert_eq!(payload["history"].as_array().map(Vec::len), Some(5));
    }

    #[tokio::test]
    async fn xml_is_the_default() {
        let (status, content_type, body) = send(
            router(StubSource::with_rows(2)),
            "/stock/ACME?max_records=1",
            Some("text/html"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, "application/xml");
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<records_returned>1</records_returned>"));
        assert!(body.contains("<date>2024-03-02</date>"));
    }

    #[tokio::test]
    async fn unsupported_interval_is_rejected_without_fetching() {
        let source = StubSource::with_rows(5);
        let (status, _, body) = send(
            router(source.clone()),
            "/stock/ACME?interval=7d",
            Some("application/json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let payload: Value = serde_json::from_str(&body).expect("json");
        assert!(payload["message"]
            .as_str()
            .is_some_and(|m| m.contains("Unsupported interval '7d'")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_max_records_is_a_bad_request() {
        let (status, content_type, body) = send(
            router(StubSource::with_rows(5)),
            "/stock/ACME?max_records=lots",
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/xml");
        assert!(body.contains("<error>"));
    }

    #[tokio::test]
    async fn duplicate_query_parameter_gets_negotiated_error_body() {
        let source = StubSource::with_rows(5);
        let (status, content_type, body) = send(
            router(source.clone()),
            "/stock/ACME?interval=1d&interval=5m",
            Some("application/json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/json");
        let payload: Value = serde_json::from_str(&body).expect("json");
        assert!(payload["message"]
            .as_str()
            .is_some_and(|m| m.contains("duplicate field `interval`")));
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn undecodable_symbol_gets_negotiated_error_body() {
        let (status, content_type, body) =
            send(router(StubSource::with_rows(5)), "/stock/%FF", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(content_type, "application/xml");
        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<error><message>"));
    }

    #[tokio::test]
    async fn exhausted_provider_maps_to_bad_gateway() {
        let source = StubSource::with_rows(0);
        let (status, _, body) = send(
            router(source.clone()),
            "/stock/ACME?interval=60m",
            Some("application/json"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("No data returned for symbol 'ACME'"));
        assert_eq!(source.calls.load(Ordering::SeqCst), 5);
    }
}
