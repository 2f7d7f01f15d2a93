//! Rate limiting configuration.
//!
//! # Environment Variables
//!
//! - `RATE_LIMIT_MODE`: `global` or `per_client` (default: `global`)
//! - `RATE_LIMIT_TICK_MS`: interval at which one token is replenished (default: `1000`)
//! - `RATE_LIMIT_BURST`: bucket capacity in `per_client` mode (default: `1`)
//!
//! # Modes
//!
//! `global` is a single process-wide bucket of capacity one: one request is
//! admitted per tick regardless of who sends it, and the bucket starts full.
//! `per_client` keeps one bucket per client address with a configurable
//! burst capacity, so one noisy client cannot starve the others.

use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use governor::Quota;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitMode {
    Global,
    PerClient,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub mode: RateLimitMode,
    /// Time to replenish one token.
    pub tick: Duration,
    /// Bucket capacity. Always one in global mode.
    pub burst: NonZeroU32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            mode: RateLimitMode::Global,
            tick: Duration::from_millis(1000),
            burst: NonZeroU32::MIN,
        }
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let mode = match lookup("RATE_LIMIT_MODE").as_deref() {
            Some("per_client") => RateLimitMode::PerClient,
            _ => RateLimitMode::Global,
        };

        let tick = lookup("RATE_LIMIT_TICK_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(defaults.tick);

        let burst = match mode {
            RateLimitMode::Global => NonZeroU32::MIN,
            RateLimitMode::PerClient => lookup("RATE_LIMIT_BURST")
                .and_then(|v| v.parse::<u32>().ok())
                .and_then(NonZeroU32::new)
                .unwrap_or(defaults.burst),
        };

        Self { mode, tick, burst }
    }

    /// Global admission: one token per tick.
    #[must_use]
    pub fn global(tick: Duration) -> Self {
        Self {
            mode: RateLimitMode::Global,
            tick,
            burst: NonZeroU32::MIN,
        }
    }

    #[must_use]
    pub fn per_client(tick: Duration, burst: NonZeroU32) -> Self {
        Self {
            mode: RateLimitMode::PerClient,
            tick,
            burst,
        }
    }

    /// Governor quota for this configuration.
    ///
    /// A zero tick is clamped to one millisecond.
    #[must_use]
    pub fn quota(&self) -> Quota {
        let tick = self.tick.max(Duration::from_millis(1));
        let burst = match self.mode {
            RateLimitMode::Global => NonZeroU32::MIN,
            RateLimitMode::PerClient => self.burst,
        };
        Quota::with_period(tick)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst)
    }
}
