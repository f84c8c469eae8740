//! Per-source call pacing.
//!
//! Two independent gates live here:
//!
//! | Gate | Purpose |
//! |------|---------|
//! | [`RateLimiter`] | minimum spacing between consecutive calls to one source |
//! | [`QuotaGuard`] | coarse request budget per window (e.g. SAM.gov daily key quota) |
//!
//! The spacing gate reserves its next slot under a short lock and then waits
//! on a tokio timer with the lock released, so idle waiters never pin a worker
//! thread and never block callers that only need to read or update the slot.

use std::fmt::{Debug, Formatter};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::Quota;
use tokio::sync::watch;
use tokio::time::Instant;

/// Mutable pacing state owned by exactly one [`RateLimiter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Most recently reserved call slot.
    pub last_call_at: Option<Instant>,
    pub min_interval: Duration,
}

impl RateLimitState {
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_call_at: None,
            min_interval,
        }
    }

    fn reserve(&mut self, now: Instant) -> Instant {
        let slot = match self.last_call_at {
            Some(last) => (last + self.min_interval).max(now),
            None => now,
        };
        self.last_call_at = Some(slot);
        slot
    }
}

/// How a call to [`RateLimiter::acquire`] was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    Immediate,
    Waited(Duration),
    /// Shutdown was signalled during the wait; the caller proceeds early.
    Interrupted,
}

/// Source-global minimum-interval gate.
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<RateLimitState>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(RateLimitState::new(min_interval)),
            shutdown: None,
        }
    }

    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    /// Ends pending waits early once the receiver observes `true`.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn min_interval(&self) -> Duration {
        self.snapshot().min_interval
    }

    pub fn snapshot(&self) -> RateLimitState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until this source's next call slot and claims it.
    pub async fn acquire(&self) -> AcquireOutcome {
        let now = Instant::now();
        let slot = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.reserve(now)
        };

        if slot <= now {
            return AcquireOutcome::Immediate;
        }
        let wait = slot - now;

        let Some(shutdown) = &self.shutdown else {
            tokio::time::sleep_until(slot).await;
            return AcquireOutcome::Waited(wait);
        };

        let mut shutdown = shutdown.clone();
        tokio::select! {
            _ = tokio::time::sleep_until(slot) => AcquireOutcome::Waited(wait),
            // The watch guard must not live across the fallback sleep.
            signalled = async { shutdown.wait_for(|stopped| *stopped).await.is_ok() } => {
                if signalled {
                    return AcquireOutcome::Interrupted;
                }
                // Sender dropped without signalling; finish the normal wait.
                tokio::time::sleep_until(slot).await;
                AcquireOutcome::Waited(wait)
            }
        }
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

type DirectRateLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Request budget per window, checked without waiting.
#[derive(Clone)]
pub struct QuotaGuard {
    limiter: Arc<DirectRateLimiter>,
    limit: u32,
    window: Duration,
}

impl QuotaGuard {
    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(governor::RateLimiter::direct(quota_from_window(
                window, limit,
            ))),
            limit: limit.max(1),
            window,
        }
    }

    pub fn per_day(limit: u32) -> Self {
        Self::new(Duration::from_secs(86_400), limit)
    }

    /// Consumes one unit of budget, or reports how long until one frees up.
    pub fn try_consume(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(DefaultClock::default().now()))
    }

    pub const fn limit(&self) -> u32 {
        self.limit
    }

    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl Debug for QuotaGuard {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuotaGuard")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish()
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit.max(1)).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .map(|quota| quota.allow_burst(burst))
        .unwrap_or_else(|| Quota::per_second(burst))
}
