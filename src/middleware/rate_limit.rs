//! Request admission.
//!
//! Two shapes, picked by [`RateLimitConfig::mode`]:
//!
//! - global: one token source for the whole process. It admits one request
//!   per tick, starts with a single token and never accumulates more.
//! - per client: one bucket per client address with the configured burst.
//!
//! Both are non-blocking. A request that finds no token is answered with 429
//! at once and never queued.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, header::RETRY_AFTER},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    DefaultDirectRateLimiter, DefaultKeyedRateLimiter, NotUntil, RateLimiter,
    clock::{Clock, DefaultClock},
};
use lectern_config::{RateLimitConfig, RateLimitMode};
use lectern_core::AppError;
use tracing::{debug, warn};

use crate::metrics::track_gate_rejection;
use crate::state::AppState;

#[derive(Clone)]
pub enum Throttle {
    Global(Arc<DefaultDirectRateLimiter>),
    PerClient(Arc<DefaultKeyedRateLimiter<String>>),
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Throttle::Global(_) => f.write_str("Throttle::Global"),
            Throttle::PerClient(limiter) => {
                write!(f, "Throttle::PerClient({} clients)", limiter.len())
            }
        }
    }
}

impl Throttle {
    pub fn from_config(config: &RateLimitConfig) -> Self {
        let quota = config.quota();
        match config.mode {
            RateLimitMode::Global => Throttle::Global(Arc::new(RateLimiter::direct(quota))),
            RateLimitMode::PerClient => Throttle::PerClient(Arc::new(RateLimiter::keyed(quota))),
        }
    }

    /// Takes a token for `client` if one is available.
    ///
    /// On refusal returns how long until the next token.
    pub fn check(&self, client: &str) -> Result<(), Duration> {
        let refused = match self {
            Throttle::Global(limiter) => limiter.check().err(),
            Throttle::PerClient(limiter) => limiter.check_key(&client.to_owned()).err(),
        };

        match refused {
            None => Ok(()),
            Some(not_until) => Err(wait_time(&not_until)),
        }
    }

    /// Periodically drops per-client buckets that have refilled completely.
    pub fn spawn_pruner(&self, every: Duration) {
        if let Throttle::PerClient(limiter) = self {
            let limiter = Arc::clone(limiter);
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(every);
                loop {
                    interval.tick().await;
                    limiter.retain_recent();
                    limiter.shrink_to_fit();
                    debug!(clients = limiter.len(), "Pruned rate limiter buckets");
                }
            });
        }
    }
}

fn wait_time(not_until: &NotUntil<<DefaultClock as Clock>::Instant>) -> Duration {
    not_until.wait_time_from(DefaultClock::default().now())
}

/// Best-effort client address: first `X-Forwarded-For` hop, then the socket
/// peer, then a shared bucket.
fn client_key(req: &Request) -> String {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return forwarded.to_owned();
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(&req);

    match state.throttle.check(&client) {
        Ok(()) => next.run(req).await,
        Err(wait) => {
            warn!(
                method = %req.method(),
                path = %req.uri().path(),
                client = %client,
                retry_after_ms = wait.as_millis() as u64,
                "Rate limit exceeded"
            );
            track_gate_rejection("rate_limit");

            let mut response =
                AppError::too_many_requests(anyhow!("Too many requests")).into_response();
            let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
            if let Ok(value) = HeaderValue::from_str(&secs.max(1).to_string()) {
                response.headers_mut().insert(RETRY_AFTER, value);
            }
            response
        }
    }
}
