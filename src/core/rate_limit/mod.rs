//! Per-caller fixed-window rate limiting.
//!
//! The [`RequestCounter`] owns one window per caller and serializes updates to
//! it; the [`RateLimiter`] turns the counter's result into an allow/deny
//! decision against the configured quota.
//!
//! Window arithmetic uses `tokio::time::Instant`, which is monotonic, so a
//! wall-clock jump can never shrink a caller's count.

mod counter;
mod limiter;

use std::fmt;
use std::sync::Arc;

pub use counter::{RequestCounter, WindowSnapshot};
pub use limiter::{Permit, RateLimitDecision, RateLimiter};

/// Identity a rate limit is applied to. In this service it is the session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerKey(Arc<str>);

impl CallerKey {
    pub fn new(key: impl Into<Arc<str>>) -> Self {
        Self(key.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CallerKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CallerKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CallerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
