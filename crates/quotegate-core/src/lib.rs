//! # Quotegate Core
//!
//! Caching, concurrency-limited, retrying gateway logic in front of a
//! time-series market data provider.
//!
//! ## Overview
//!
//! - **Validation** of symbols, intervals and query parameters
//! - **TTL cache** of provider series keyed by symbol and interval
//! - **Download gate** bounding concurrent provider calls
//! - **Fetch orchestration** with retry, exponential backoff and a daily fallback
//! - **Normalization** of heterogeneous rows into `{date, open, close}` records
//! - **Rendering** to XML (default) or JSON
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Yahoo chart API) |
//! | [`cache`] | TTL cache of raw series |
//! | [`config`] | Gateway tunables |
//! | [`data_source`] | Data source trait and request/error types |
//! | [`domain`] | Symbols, intervals, raw series and result models |
//! | [`error`] | Validation and gateway errors |
//! | [`gate`] | Concurrency gate for provider downloads |
//! | [`http_client`] | HTTP client abstraction |
//! | [`normalize`] | Row normalization |
//! | [`orchestrator`] | Fetch state machine and orchestrator |
//! | [`render`] | XML/JSON rendering and content negotiation |
//! | [`retry`] | Retry policies and backoff |
//! | [`service`] | Request handling entry point |
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  HTTP / Caller  │
//! └────────┬────────┘
//!          │ StockQuery
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  StockService   │────▶│ Renderer         │
//! └────────┬────────┘     │ (XML / JSON)     │
//!          │              └──────────────────┘
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Orchestrator    │────▶│ SeriesCache      │
//! │ (retry/fallback)│     └──────────────────┘
//! └────────┬────────┘
//!          │ DownloadGate
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Source     │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use quotegate_core::{
//!     GatewayConfig, ReqwestHttpClient, ResponseFormat, StockQuery, StockService,
//!     YahooChartSource,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = YahooChartSource::new(Arc::new(ReqwestHttpClient::new()?));
//!     let service = StockService::from_config(Arc::new(source), &GatewayConfig::default());
//!
//!     let query = StockQuery::new("AAPL").with_max_records("5");
//!     let response = service.respond(&query, ResponseFormat::Json).await;
//!     println!("{} {}", response.status, response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every failure surfaces as a [`GatewayError`] with an HTTP status:
//!
//! ```rust
//! use quotegate_core::GatewayError;
//!
//! fn status_of(error: &GatewayError) -> u16 {
//!     match error {
//!         GatewayError::Validation(_) => 400,
//!         GatewayError::FetchExhausted { .. } => 502,
//!         GatewayError::Processing(_) => 500,
//!     }
//! }
//! ```

pub mod adapters;
pub mod cache;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod gate;
pub mod http_client;
pub mod normalize;
pub mod orchestrator;
pub mod render;
pub mod retry;
pub mod service;

// Adapter implementations
pub use adapters::YahooChartSource;

// Caching and throttling
pub use cache::{CacheKey, SeriesCache};
pub use gate::{DownloadGate, GateClosed};

// Configuration
pub use config::GatewayConfig;

// Data source trait and types
pub use data_source::{
    DataSource, HistoryFuture, HistoryRequest, SourceError, SourceErrorKind,
};

// Domain models
pub use domain::{
    columns, FieldValue, Interval, NormalizedRecord, RawRow, RawSeries, RowTimestamp, SeriesRow,
    StockResult, Symbol,
};

// Error types
pub use error::{GatewayError, ValidationError};

// HTTP client types
pub use http_client::{HttpClient, HttpError, HttpFuture, HttpRequest, HttpResponse, ReqwestHttpClient};

// Orchestration
pub use orchestrator::{
    FetchEvent, FetchOrchestrator, FetchOutcome, FetchPhase, FetchPlan, FetchState,
    InvalidTransition,
};
pub use normalize::{normalize_row, normalize_rows};
pub use render::{render_error, render_result, RenderError, ResponseFormat};
pub use retry::{Backoff, RetryPolicy};
pub use service::{GatewayResponse, StockQuery, StockService};
