use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use quotegate_core::{ReqwestHttpClient, StockService, YahooChartSource};
use quotegate_web::config::ServerArgs;
use quotegate_web::telemetry::init_tracing;
use quotegate_web::app_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServerArgs::parse();
    init_tracing(args.log_format)?;

    let http_client = ReqwestHttpClient::new().context("failed to build provider http client")?;
    let source = YahooChartSource::new(Arc::new(http_client))
        .with_timeout_ms(args.upstream_timeout_ms);
    let config = args.gateway_config();
    let service = StockService::from_config(Arc::new(source), &config);

    tracing::info!(
        cache_ttl_secs = config.cache_ttl.as_secs(),
        max_concurrent_downloads = config.max_concurrent_downloads,
        "Listening on {}",
        args.listen_addr
    );
    let listener = tokio::net::TcpListener::bind(args.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", args.listen_addr))?;
    axum::serve(listener, app_router(service)).await?;
    Ok(())
}
