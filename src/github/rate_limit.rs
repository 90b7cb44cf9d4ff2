//! Rate limit state consulted when rotating pooled tokens.

use std::time::{SystemTime, UNIX_EPOCH};

/// Remaining budget and reset time reported by the `/rate_limit` endpoint.
///
/// Token rotation logs these values when a pooled credential is swapped
/// out, so an operator can tell whether waiting would have been cheaper
/// than rotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    remaining: u32,
    reset_at: u64,
}

impl RateLimitInfo {
    /// Creates rate limit info from the remaining budget and the Unix
    /// timestamp at which the window resets.
    #[must_use]
    pub const fn new(remaining: u32, reset_at: u64) -> Self {
        Self {
            remaining,
            reset_at,
        }
    }

    /// Requests left in the current window.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Seconds until the window resets.
    ///
    /// Returns 0 if the reset time has already passed or if the system time
    /// cannot be determined.
    #[must_use]
    pub fn seconds_until_reset(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_secs())
            .unwrap_or(0);

        self.reset_at.saturating_sub(now)
    }
}
