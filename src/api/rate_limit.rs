//! Sliding-window rate limiting for the public endpoints
//!
//! Tracks request timestamps per client key over two windows, minute and
//! day. The limiter is constructed in startup wiring and handed to the
//! handlers as app data; nothing here is global. Login endpoints use the
//! actix-governor token bucket instead (see the admin auth module).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use tracing::debug;

const MINUTE_WINDOW_SECS: i64 = 60;
const DAY_WINDOW_SECS: i64 = 86_400;

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Denied. `retry_after_secs` is the time until the oldest blocking
    /// entry leaves its window.
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Default)]
struct ClientWindows {
    minute: VecDeque<i64>,
    day: VecDeque<i64>,
}

impl ClientWindows {
    fn evict_expired(&mut self, now: i64) {
        while self
            .minute
            .front()
            .is_some_and(|&t| now - t >= MINUTE_WINDOW_SECS)
        {
            self.minute.pop_front();
        }
        while self
            .day
            .front()
            .is_some_and(|&t| now - t >= DAY_WINDOW_SECS)
        {
            self.day.pop_front();
        }
    }

    fn is_idle(&self) -> bool {
        self.minute.is_empty() && self.day.is_empty()
    }
}

/// Per-key sliding window limiter with minute and day caps
pub struct SlidingWindowLimiter {
    windows: DashMap<String, ClientWindows>,
    per_minute: u32,
    per_day: u32,
    enabled: bool,
}

impl SlidingWindowLimiter {
    pub fn new(per_minute: u32, per_day: u32) -> Self {
        Self {
            windows: DashMap::new(),
            per_minute,
            per_day,
            enabled: true,
        }
    }

    pub fn from_config() -> Self {
        let cfg = &crate::config::get_config().rate_limit;
        Self {
            windows: DashMap::new(),
            per_minute: cfg.per_minute,
            per_day: cfg.per_day,
            enabled: cfg.enabled,
        }
    }

    /// Check and record one request for `key`.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Utc::now().timestamp())
    }

    /// Clock-explicit variant of [`Self::check`], driven directly by tests.
    pub fn check_at(&self, key: &str, now: i64) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed;
        }

        let mut entry = self.windows.entry(key.to_string()).or_default();
        entry.evict_expired(now);

        if entry.minute.len() >= self.per_minute as usize {
            let oldest = entry.minute.front().copied().unwrap_or(now);
            return RateDecision::Limited {
                retry_after_secs: (oldest + MINUTE_WINDOW_SECS - now).max(1) as u64,
            };
        }

        if entry.day.len() >= self.per_day as usize {
            let oldest = entry.day.front().copied().unwrap_or(now);
            return RateDecision::Limited {
                retry_after_secs: (oldest + DAY_WINDOW_SECS - now).max(1) as u64,
            };
        }

        entry.minute.push_back(now);
        entry.day.push_back(now);
        RateDecision::Allowed
    }

    /// Drop expired entries for every key and remove idle keys.
    ///
    /// Per-check eviction only touches the key being checked; this sweep
    /// is what frees keys that stopped sending requests.
    pub fn sweep_idle(&self) {
        let now = Utc::now().timestamp();
        self.windows.retain(|_, windows| {
            windows.evict_expired(now);
            !windows.is_idle()
        });
    }

    /// Forget one key entirely.
    pub fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    /// Forget all keys.
    pub fn reset_all(&self) {
        self.windows.clear();
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    /// Spawn the periodic sweep task.
    pub fn spawn_sweep_task(self: &Arc<Self>, interval: Duration) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let before = limiter.tracked_keys();
                limiter.sweep_idle();
                debug!(
                    "Rate limiter sweep: {} -> {} tracked keys",
                    before,
                    limiter.tracked_keys()
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_under_minute_limit() {
        let limiter = SlidingWindowLimiter::new(3, 100);
        let now = 1_000_000;

        for i in 0..3 {
            assert!(limiter.check_at("1.2.3.4", now + i).is_allowed());
        }
    }

    #[test]
    fn test_denies_over_minute_limit_with_retry_after() {
        let limiter = SlidingWindowLimiter::new(2, 100);
        let now = 1_000_000;

        assert!(limiter.check_at("k", now).is_allowed());
        assert!(limiter.check_at("k", now + 10).is_allowed());

        match limiter.check_at("k", now + 20) {
            RateDecision::Limited { retry_after_secs } => {
                // 最早的一条在 now，60 秒后离开窗口
                assert_eq!(retry_after_secs, 40);
            }
            RateDecision::Allowed => panic!("expected limit to kick in"),
        }
    }

    #[test]
    fn test_minute_window_slides() {
        let limiter = SlidingWindowLimiter::new(2, 100);
        let now = 1_000_000;

        assert!(limiter.check_at("k", now).is_allowed());
        assert!(limiter.check_at("k", now + 1).is_allowed());
        assert!(!limiter.check_at("k", now + 2).is_allowed());

        // 60 秒后第一条过期，重新放行
        assert!(limiter.check_at("k", now + 60).is_allowed());
    }

    #[test]
    fn test_day_limit_kicks_in_after_minute_limit_passes() {
        let limiter = SlidingWindowLimiter::new(100, 3);
        let now = 1_000_000;

        // 隔开 61 秒避免撞分钟窗
        for i in 0..3 {
            assert!(limiter.check_at("k", now + i * 61).is_allowed());
        }

        match limiter.check_at("k", now + 4 * 61) {
            RateDecision::Limited { retry_after_secs } => {
                assert!(retry_after_secs > 0 && retry_after_secs <= DAY_WINDOW_SECS as u64);
            }
            RateDecision::Allowed => panic!("expected day limit to kick in"),
        }
    }

    #[test]
    fn test_keys_do_not_interfere() {
        let limiter = SlidingWindowLimiter::new(1, 100);
        let now = 1_000_000;

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(!limiter.check_at("a", now + 1).is_allowed());
        assert!(limiter.check_at("b", now + 1).is_allowed());
    }

    #[test]
    fn test_reset_forgets_key() {
        let limiter = SlidingWindowLimiter::new(1, 100);
        let now = 1_000_000;

        assert!(limiter.check_at("k", now).is_allowed());
        assert!(!limiter.check_at("k", now + 1).is_allowed());

        limiter.reset("k");
        assert!(limiter.check_at("k", now + 2).is_allowed());
    }

    #[test]
    fn test_reset_all() {
        let limiter = SlidingWindowLimiter::new(1, 100);
        let now = 1_000_000;

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(limiter.check_at("b", now).is_allowed());
        limiter.reset_all();
        assert_eq!(limiter.tracked_keys(), 0);
        assert!(limiter.check_at("a", now + 1).is_allowed());
    }

    #[test]
    fn test_sweep_removes_idle_keys_only() {
        let limiter = SlidingWindowLimiter::new(10, 100);

        // 很久以前的请求，两个窗口都已过期
        let stale = Utc::now().timestamp() - DAY_WINDOW_SECS - 10;
        assert!(limiter.check_at("stale", stale).is_allowed());
        // 刚发生的请求
        assert!(limiter.check("fresh").is_allowed());
        assert_eq!(limiter.tracked_keys(), 2);

        limiter.sweep_idle();
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = SlidingWindowLimiter {
            windows: DashMap::new(),
            per_minute: 0,
            per_day: 0,
            enabled: false,
        };

        for i in 0..50 {
            assert!(limiter.check_at("k", 1_000_000 + i).is_allowed());
        }
    }
}
