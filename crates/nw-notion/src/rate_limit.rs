//! Sliding-window rate limiter shared by all fetch workers.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Allows at most `max_calls` acquisitions in any window of `period`.
///
/// Callers over the limit block until the oldest call leaves the window.
#[derive(Debug)]
pub struct RateLimiter {
    max_calls: usize,
    period: Duration,
    calls: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter. A `max_calls` of zero is treated as one.
    #[must_use]
    pub fn new(max_calls: u32, period: Duration) -> Self {
        let max_calls = usize::try_from(max_calls.max(1)).unwrap_or(usize::MAX);
        Self {
            max_calls,
            period,
            calls: Mutex::new(VecDeque::with_capacity(max_calls)),
        }
    }

    /// Block until a call is allowed, then record it.
    pub fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self
                    .calls
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                let now = Instant::now();
                while calls
                    .front()
                    .is_some_and(|oldest| now.duration_since(*oldest) >= self.period)
                {
                    calls.pop_front();
                }
                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    return;
                }
                match calls.front() {
                    Some(oldest) => self.period.saturating_sub(now.duration_since(*oldest)),
                    None => Duration::ZERO,
                }
            };
            tracing::trace!("rate limit reached, waiting {wait:?}");
            std::thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_calls_under_limit_do_not_wait() {
        let limiter = RateLimiter::new(3, Duration::from_secs(10));
        let start = Instant::now();
        limiter.acquire();
        limiter.acquire();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_call_over_limit_waits_for_window() {
        let limiter = RateLimiter::new(2, Duration::from_millis(100));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire();
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_limit_is_shared_across_threads() {
        let limiter = Arc::new(RateLimiter::new(2, Duration::from_millis(100)));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || limiter.acquire())
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[test]
    fn test_zero_max_calls_is_one() {
        let limiter = RateLimiter::new(0, Duration::from_millis(50));
        let start = Instant::now();
        limiter.acquire();
        limiter.acquire();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
