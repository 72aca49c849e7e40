//! Per-IP join rate limiting.
//!
//! Fresh joins are capped over a sliding window; reconnections bypass the
//! limiter entirely so a flaky network never locks a player out of their
//! seat.

use std::collections::{HashMap, VecDeque};
use std::net::IpAddr;
use std::time::{Duration, Instant};

const DEFAULT_MAX_JOINS: usize = 10;
const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Sliding-window counter keyed by client IP.
pub struct JoinLimiter {
    max: usize,
    window: Duration,
    hits: HashMap<IpAddr, VecDeque<Instant>>,
}

impl JoinLimiter {
    pub fn new(max: usize, window: Duration) -> Self {
        Self {
            max,
            window,
            hits: HashMap::new(),
        }
    }

    /// Records an attempt and says whether it is allowed.
    pub fn check(&mut self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let hits = self.hits.entry(ip).or_default();
        while hits
            .front()
            .is_some_and(|&t| now.duration_since(t) >= self.window)
        {
            hits.pop_front();
        }
        if hits.len() >= self.max {
            tracing::warn!(%ip, "join rate limit hit");
            return false;
        }
        hits.push_back(now);
        true
    }
}

impl Default for JoinLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_JOINS, DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([10, 0, 0, last])
    }

    #[test]
    fn test_allows_up_to_max_within_window() {
        let mut limiter = JoinLimiter::new(3, Duration::from_secs(3600));
        assert!(limiter.check(ip(1)));
        assert!(limiter.check(ip(1)));
        assert!(limiter.check(ip(1)));
        assert!(!limiter.check(ip(1)), "fourth join is refused");
    }

    #[test]
    fn test_ips_are_independent() {
        let mut limiter = JoinLimiter::new(1, Duration::from_secs(3600));
        assert!(limiter.check(ip(1)));
        assert!(limiter.check(ip(2)));
        assert!(!limiter.check(ip(1)));
    }

    #[test]
    fn test_zero_window_never_blocks() {
        let mut limiter = JoinLimiter::new(1, Duration::ZERO);
        for _ in 0..5 {
            assert!(limiter.check(ip(1)));
        }
    }
}
