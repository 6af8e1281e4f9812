//! Server arguments. Every flag falls back to a `QUOTEGATE_*` environment
//! variable.
//!
//! | Option | Env | Default |
//! |--------|-----|---------|
//! | `--listen-addr` | `QUOTEGATE_LISTEN_ADDR` | `0.0.0.0:8000` |
//! | `--cache-ttl-secs` | `QUOTEGATE_CACHE_TTL_SECS` | `90` |
//! | `--max-concurrent-downloads` | `QUOTEGATE_MAX_CONCURRENT_DOWNLOADS` | `3` |
//! | `--upstream-timeout-ms` | `QUOTEGATE_UPSTREAM_TIMEOUT_MS` | `10000` |
//! | `--log-format` | `QUOTEGATE_LOG_FORMAT` | `text` |

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use quotegate_core::GatewayConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per event.
    Json,
}

/// quotegate - caching gateway for historical stock prices
#[derive(Debug, Clone, Parser)]
#[command(name = "quotegate", author, version, about)]
pub struct ServerArgs {
    /// Socket address to listen on.
    #[arg(long, env = "QUOTEGATE_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// Seconds a downloaded series stays fresh in the cache.
    #[arg(long, env = "QUOTEGATE_CACHE_TTL_SECS", default_value_t = 90)]
    pub cache_ttl_secs: u64,

    /// Upper bound on simultaneous provider downloads.
    #[arg(long, env = "QUOTEGATE_MAX_CONCURRENT_DOWNLOADS", default_value_t = 3)]
    pub max_concurrent_downloads: usize,

    /// Timeout for a single provider request in milliseconds.
    #[arg(long, env = "QUOTEGATE_UPSTREAM_TIMEOUT_MS", default_value_t = 10_000)]
    pub upstream_timeout_ms: u64,

    #[arg(long, env = "QUOTEGATE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl ServerArgs {
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig::default()
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
            .with_max_concurrent_downloads(self.max_concurrent_downloads)
    }
}
