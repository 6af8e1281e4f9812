//! Fetch orchestration: cache lookup, gated retrying download, fallback to
//! daily bars, cache store.
//!
//! The control flow is an explicit state machine. [`FetchPlan::advance`] is a
//! pure transition function; [`FetchOrchestrator::fetch`] performs the side
//! effect each state asks for and feeds the resulting event back in.
//!
//! ```text
//! Start ──CacheHit──▶ Done
//! Start ──CacheMiss──▶ Attempt(Primary, requested, 1)
//! Attempt ──Succeeded──▶ Done
//! Attempt(p, n) ──Failed, n < max──▶ Backoff(p, n + 1) ──Elapsed──▶ Attempt(p, n + 1)
//! Attempt(Primary, max) ──Failed, requested != 1d──▶ Attempt(Fallback, 1d, 1)
//! Attempt(Primary, max) ──Failed, requested == 1d──▶ Exhausted
//! Attempt(Fallback, max) ──Failed──▶ Exhausted
//! ```

use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cache::SeriesCache;
use crate::data_source::{DataSource, HistoryRequest, SourceError};
use crate::error::GatewayError;
use crate::gate::DownloadGate;
use crate::retry::RetryPolicy;
use crate::{Interval, RawSeries, Symbol};

/// Which retry sequence an attempt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Primary,
    Fallback,
}

impl Display for FetchPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Start,
    Attempt {
        phase: FetchPhase,
        interval: Interval,
        attempt: u32,
    },
    Backoff {
        phase: FetchPhase,
        interval: Interval,
        next_attempt: u32,
        delay: Duration,
    },
    Done {
        series: Arc<RawSeries>,
        served: Interval,
        from_cache: bool,
    },
    Exhausted {
        message: String,
        fallback_tried: bool,
    },
}

impl FetchState {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Attempt { .. } => "attempt",
            Self::Backoff { .. } => "backoff",
            Self::Done { .. } => "done",
            Self::Exhausted { .. } => "exhausted",
        }
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. } | Self::Exhausted { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    CacheHit(Arc<RawSeries>),
    CacheMiss,
    /// A non-empty series came back.
    Succeeded(Arc<RawSeries>),
    /// Provider error or empty series; both count the same.
    Failed(String),
    Elapsed,
}

impl FetchEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CacheHit(_) => "cache_hit",
            Self::CacheMiss => "cache_miss",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
            Self::Elapsed => "elapsed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid fetch transition: {event} in state {state}")]
pub struct InvalidTransition {
    pub state: &'static str,
    pub event: &'static str,
}

/// Retry budget for one request, fixed at the requested interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchPlan {
    pub requested: Interval,
    pub primary: RetryPolicy,
    pub fallback: RetryPolicy,
}

impl FetchPlan {
    pub fn new(requested: Interval, primary: RetryPolicy, fallback: RetryPolicy) -> Self {
        Self {
            requested,
            primary,
            fallback,
        }
    }

    /// Fallback only applies when the requested interval is not already the fallback one.
    pub fn has_fallback(&self) -> bool {
        self.requested != Interval::FALLBACK
    }

    fn policy(&self, phase: FetchPhase) -> &RetryPolicy {
        match phase {
            FetchPhase::Primary => &self.primary,
            FetchPhase::Fallback => &self.fallback,
        }
    }

    pub fn advance(
        &self,
        state: FetchState,
        event: FetchEvent,
    ) -> Result<FetchState, InvalidTransition> {
        let next = match (state, event) {
            (FetchState::Start, FetchEvent::CacheHit(series)) => FetchState::Done {
                series,
                served: self.requested,
                from_cache: true,
            },
            (FetchState::Start, FetchEvent::CacheMiss) => FetchState::Attempt {
                phase: FetchPhase::Primary,
                interval: self.requested,
                attempt: 1,
            },
            (FetchState::Attempt { interval, .. }, FetchEvent::Succeeded(series)) => {
                FetchState::Done {
                    series,
                    served: interval,
                    from_cache: false,
                }
            }
            (
                FetchState::Attempt {
                    phase,
                    interval,
                    attempt,
                },
                FetchEvent::Failed(message),
            ) => match self.policy(phase).delay_after(attempt) {
                Some(delay) => FetchState::Backoff {
                    phase,
                    interval,
                    next_attempt: attempt + 1,
                    delay,
                },
                None if phase == FetchPhase::Primary && self.has_fallback() => {
                    FetchState::Attempt {
                        phase: FetchPhase::Fallback,
                        interval: Interval::FALLBACK,
                        attempt: 1,
                    }
                }
                None => FetchState::Exhausted {
                    message,
                    fallback_tried: phase == FetchPhase::Fallback,
                },
            },
            (
                FetchState::Backoff {
                    phase,
                    interval,
                    next_attempt,
                    ..
                },
                FetchEvent::Elapsed,
            ) => FetchState::Attempt {
                phase,
                interval,
                attempt: next_attempt,
            },
            (state, event) => {
                return Err(InvalidTransition {
                    state: state.name(),
                    event: event.name(),
                })
            }
        };

        Ok(next)
    }
}

/// Result of a successful orchestration.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub series: Arc<RawSeries>,
    /// Interval the data was actually downloaded with. Differs from the
    /// requested one after a fallback; unknown (reported as requested) on a cache hit.
    pub served_interval: Interval,
    pub from_cache: bool,
}

/// Drives [`FetchPlan`] against a provider, a shared cache and a shared gate.
pub struct FetchOrchestrator {
    source: Arc<dyn DataSource>,
    cache: SeriesCache,
    gate: DownloadGate,
    primary: RetryPolicy,
    fallback: RetryPolicy,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn DataSource>, cache: SeriesCache, gate: DownloadGate) -> Self {
        Self {
            source,
            cache,
            gate,
            primary: RetryPolicy::primary(),
            fallback: RetryPolicy::fallback(),
        }
    }

    pub fn with_policies(mut self, primary: RetryPolicy, fallback: RetryPolicy) -> Self {
        self.primary = primary;
        self.fallback = fallback;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    pub fn gate(&self) -> &DownloadGate {
        &self.gate
    }

    #[tracing::instrument(skip_all, fields(symbol = %symbol, interval = %interval, period = %period))]
    pub async fn fetch(
        &self,
        symbol: &Symbol,
        interval: Interval,
        period: &str,
    ) -> Result<FetchOutcome, GatewayError> {
        let plan = FetchPlan::new(interval, self.primary, self.fallback);
        let mut state = FetchState::Start;

        loop {
            let event = match &state {
                FetchState::Start => match self.cache.get(symbol, interval) {
                    Some(series) => {
                        debug!("cache hit");
                        FetchEvent::CacheHit(series)
                    }
                    None => {
                        debug!("cache miss");
                        FetchEvent::CacheMiss
                    }
                },
                FetchState::Attempt {
                    phase,
                    interval: attempt_interval,
                    attempt,
                } => match self.attempt(symbol, *attempt_interval, period).await {
                    Ok(series) => FetchEvent::Succeeded(series),
                    Err(source_error) => {
                        warn!(
                            %phase,
                            attempt,
                            attempt_interval = %attempt_interval,
                            code = source_error.code(),
                            error = %source_error,
                            "fetch attempt failed"
                        );
                        FetchEvent::Failed(source_error.message().to_owned())
                    }
                },
                FetchState::Backoff { delay, .. } => {
                    tokio::time::sleep(*delay).await;
                    FetchEvent::Elapsed
                }
                FetchState::Done {
                    series,
                    served,
                    from_cache,
                } => {
                    if !from_cache {
                        if *served != interval {
                            warn!(
                                served = %served,
                                "caching fallback-interval data under the requested interval"
                            );
                        }
                        self.cache.put(symbol, interval, Arc::clone(series));
                    }
                    return Ok(FetchOutcome {
                        series: Arc::clone(series),
                        served_interval: *served,
                        from_cache: *from_cache,
                    });
                }
                FetchState::Exhausted {
                    message,
                    fallback_tried,
                } => {
                    error!(error = %message, fallback_tried, "fetch exhausted");
                    let scope = if *fallback_tried { " or fallback" } else { "" };
                    return Err(GatewayError::FetchExhausted {
                        message: format!(
                            "No data returned for symbol '{symbol}' with interval '{interval}'{scope}: {message}"
                        ),
                    });
                }
            };

            state = plan
                .advance(state, event)
                .map_err(|transition| GatewayError::Processing(transition.to_string()))?;

            if let FetchState::Attempt {
                phase: FetchPhase::Fallback,
                attempt: 1,
                ..
            } = state
            {
                warn!(fallback = %Interval::FALLBACK, "primary retries exhausted, falling back");
            }
        }
    }

    /// One gated provider call. Empty series are failures.
    async fn attempt(
        &self,
        symbol: &Symbol,
        interval: Interval,
        period: &str,
    ) -> Result<Arc<RawSeries>, SourceError> {
        let request = HistoryRequest::new(symbol.clone(), interval, period);
        let series = self
            .gate
            .run(self.source.history(request))
            .await
            .map_err(|closed| SourceError::internal(closed.to_string()))??;

        if series.is_empty() {
            return Err(SourceError::empty_result());
        }
        Ok(Arc::new(series))
    }
}
