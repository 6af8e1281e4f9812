use std::time::Duration;

use crate::cache::DEFAULT_TTL;
use crate::data_source::DEFAULT_PERIOD;
use crate::gate::DEFAULT_MAX_CONCURRENT_DOWNLOADS;
use crate::retry::RetryPolicy;
use crate::service::DEFAULT_MAX_RECORDS;

/// Tunables for one gateway instance. `Default` matches production behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub cache_ttl: Duration,
    pub max_concurrent_downloads: usize,
    pub primary_retry: RetryPolicy,
    pub fallback_retry: RetryPolicy,
    pub default_period: String,
    pub default_max_records: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            max_concurrent_downloads: DEFAULT_MAX_CONCURRENT_DOWNLOADS,
            primary_retry: RetryPolicy::primary(),
            fallback_retry: RetryPolicy::fallback(),
            default_period: String::from(DEFAULT_PERIOD),
            default_max_records: DEFAULT_MAX_RECORDS,
        }
    }
}

impl GatewayConfig {
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.max_concurrent_downloads = limit;
        self
    }

    pub fn with_retry(mut self, primary: RetryPolicy, fallback: RetryPolicy) -> Self {
        self.primary_retry = primary;
        self.fallback_retry = fallback;
        self
    }
}
