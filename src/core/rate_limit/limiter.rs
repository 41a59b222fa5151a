use std::time::Duration;

use tokio::time::Instant;

use super::{CallerKey, RequestCounter};

/// Proof that a request was counted against a caller's quota.
///
/// Handing it back through [`RateLimiter::refund`] returns the slot when the
/// request ended before it reached anything worth charging for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permit {
    caller: CallerKey,
    window_start: Instant,
    remaining: u32,
}

impl Permit {
    pub fn caller(&self) -> &CallerKey {
        &self.caller
    }

    /// Requests still allowed in the current window after this one.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed(Permit),
    Denied { retry_after: Duration },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Fixed-window rate limiter: at most `quota` requests per caller per window.
pub struct RateLimiter {
    quota: u32,
    counter: RequestCounter,
}

impl RateLimiter {
    pub fn new(quota: u32, window: Duration) -> Self {
        Self {
            quota,
            counter: RequestCounter::new(window),
        }
    }

    pub fn quota(&self) -> u32 {
        self.quota
    }

    pub fn window(&self) -> Duration {
        self.counter.window()
    }

    /// Count a request for `caller` and decide whether it may proceed.
    ///
    /// The request that brings the count to exactly `quota` is allowed; the
    /// next one in the same window is denied with the time left until the
    /// window closes.
    pub fn allow(&self, caller: &CallerKey) -> RateLimitDecision {
        let now = Instant::now();
        let snapshot = self.counter.record_at(caller, now);

        if snapshot.count > self.quota {
            let window_end = snapshot.window_start + self.counter.window();
            let retry_after = window_end.saturating_duration_since(now);
            tracing::debug!(
                caller = %caller,
                count = snapshot.count,
                quota = self.quota,
                retry_after_ms = retry_after.as_millis() as u64,
                "Rate limit exceeded"
            );
            return RateLimitDecision::Denied { retry_after };
        }

        RateLimitDecision::Allowed(Permit {
            caller: caller.clone(),
            window_start: snapshot.window_start,
            remaining: self.quota - snapshot.count,
        })
    }

    /// Return a permit's slot to its window.
    pub fn refund(&self, permit: Permit) {
        self.counter.release(&permit.caller, permit.window_start);
    }

    /// Requests left for `caller` in its current window.
    pub fn remaining(&self, caller: &CallerKey) -> u32 {
        self.counter
            .current(caller)
            .map(|snapshot| self.quota.saturating_sub(snapshot.count))
            .unwrap_or(self.quota)
    }

    pub fn evict_idle(&self) -> usize {
        self.counter.evict_idle()
    }

    pub fn tracked_callers(&self) -> usize {
        self.counter.len()
    }
}
