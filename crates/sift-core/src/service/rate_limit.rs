//! Fixed-window request cap per caller.
//!
//! Each caller IP gets a window that opens on its first request. Up to
//! `max_requests` are admitted until the window expires; the next request
//! after expiry opens a fresh window.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Prune expired windows once the map grows past this many callers.
const PRUNE_THRESHOLD: usize = 1024;

/// Rejection carrying how long until the caller's window resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryAfter(pub Duration);

impl RetryAfter {
    /// Whole seconds, rounded up, for the `Retry-After` header.
    pub fn as_secs_ceil(&self) -> u64 {
        let secs = self.0.as_secs();
        if self.0.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Per-caller fixed-window limiter. A `max_requests` of zero disables it.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.max_requests > 0
    }

    /// Admit or reject one request from `caller`.
    pub fn check(&self, caller: IpAddr) -> Result<(), RetryAfter> {
        self.check_at(caller, Instant::now())
    }

    /// `check` with an explicit clock.
    pub fn check_at(&self, caller: IpAddr, now: Instant) -> Result<(), RetryAfter> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > PRUNE_THRESHOLD {
            let window = self.window;
            windows.retain(|_, w| now.saturating_duration_since(w.started) < window);
        }

        let entry = windows.entry(caller).or_insert(Window {
            started: now,
            count: 0,
        });

        let elapsed = now.saturating_duration_since(entry.started);
        if elapsed >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            let remaining = self.window - now.saturating_duration_since(entry.started);
            return Err(RetryAfter(remaining));
        }

        entry.count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn limiter(max_requests: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs,
        })
    }

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn test_eleventh_request_in_window_is_rejected() {
        let limiter = limiter(10, 60);
        let start = Instant::now();
        for i in 0..10 {
            assert!(limiter
                .check_at(ip(1), start + Duration::from_secs(i))
                .is_ok());
        }
        let err = limiter
            .check_at(ip(1), start + Duration::from_secs(15))
            .unwrap_err();
        assert_eq!(err.0, Duration::from_secs(45));
        assert_eq!(err.as_secs_ceil(), 45);
    }

    #[test]
    fn test_window_expiry_admits_again() {
        let limiter = limiter(10, 60);
        let start = Instant::now();
        for _ in 0..10 {
            limiter.check_at(ip(1), start).unwrap();
        }
        assert!(limiter.check_at(ip(1), start + Duration::from_secs(59)).is_err());
        assert!(limiter.check_at(ip(1), start + Duration::from_secs(60)).is_ok());
    }

    #[test]
    fn test_callers_are_isolated() {
        let limiter = limiter(1, 60);
        let now = Instant::now();
        assert!(limiter.check_at(ip(1), now).is_ok());
        assert!(limiter.check_at(ip(1), now).is_err());
        assert!(limiter.check_at(ip(2), now).is_ok());
    }

    #[test]
    fn test_disabled_limiter_admits_everything() {
        let limiter = limiter(0, 60);
        let now = Instant::now();
        for _ in 0..1000 {
            assert!(limiter.check_at(ip(1), now).is_ok());
        }
    }

    #[test]
    fn test_retry_after_rounds_up() {
        assert_eq!(RetryAfter(Duration::from_millis(1500)).as_secs_ceil(), 2);
        assert_eq!(RetryAfter(Duration::from_millis(0)).as_secs_ceil(), 1);
    }
}
