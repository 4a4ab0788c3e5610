use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::config::Config;

use super::UserId;

/// Sliding-window request limiter keyed by user id
///
/// A request is admitted when fewer than `max_requests` admitted requests
/// from the same user fall inside the trailing window. Rejected requests
/// are not recorded. Users with no request left in the window are dropped
/// at most once per window, so the map only holds recently active users.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    history: Mutex<History>,
}

#[derive(Debug, Default)]
struct History {
    users: HashMap<UserId, Arc<Mutex<VecDeque<Instant>>>>,
    last_sweep: Option<Instant>,
}

fn expire(requests: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = requests.front() {
        if now.saturating_duration_since(oldest) >= window {
            requests.pop_front();
        } else {
            break;
        }
    }
}

impl History {
    /// Drops users whose window is empty and whom no caller is checking
    fn sweep(&mut self, now: Instant, window: Duration) {
        let before = self.users.len();
        self.users.retain(|_, entry| {
            if Arc::strong_count(entry) > 1 {
                return true;
            }
            let mut requests = entry.lock().unwrap_or_else(PoisonError::into_inner);
            expire(&mut requests, now, window);
            !requests.is_empty()
        });
        self.last_sweep = Some(now);
        tracing::debug!(
            removed = before - self.users.len(),
            remaining = self.users.len(),
            "Swept idle rate limit entries"
        );
    }
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            history: Mutex::default(),
        }
    }

    /// Limiter allowing `max_requests` per minute
    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn from_config(config: &Config) -> Self {
        Self::per_minute(config.max_requests_per_user_per_minute)
    }

    pub fn check(&self, user: UserId) -> bool {
        self.check_at(user, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading
    pub fn check_at(&self, user: UserId, now: Instant) -> bool {
        let entry = {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            let sweep_due = history
                .last_sweep
                .map_or(true, |last| now.saturating_duration_since(last) >= self.window);
            if sweep_due {
                history.sweep(now, self.window);
            }
            Arc::clone(history.users.entry(user).or_default())
        };
        let mut requests = entry.lock().unwrap_or_else(PoisonError::into_inner);
        expire(&mut requests, now, self.window);

        if requests.len() >= self.max_requests {
            tracing::warn!(user, limit = self.max_requests, "Rate limit exceeded");
            return false;
        }

        requests.push_back(now);
        true
    }

    /// Number of users currently tracked
    pub fn tracked_users(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .users
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_request_in_a_minute_is_rejected() {
        let limiter = RateLimiter::per_minute(5);
        let start = Instant::now();

        for second in 0..5 {
            assert!(limiter.check_at(1, start + Duration::from_secs(second)));
        }
        assert!(!limiter.check_at(1, start + Duration::from_secs(10)));
    }

    #[test]
    fn window_slides() {
        let limiter = RateLimiter::per_minute(2);
        let start = Instant::now();

        assert!(limiter.check_at(1, start));
        assert!(limiter.check_at(1, start + Duration::from_secs(30)));
        assert!(!limiter.check_at(1, start + Duration::from_secs(59)));
        // The first request has left the window
        assert!(limiter.check_at(1, start + Duration::from_secs(60)));
        assert!(!limiter.check_at(1, start + Duration::from_secs(61)));
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::per_minute(1);
        let start = Instant::now();

        assert!(limiter.check_at(1, start));
        assert!(!limiter.check_at(1, start + Duration::from_secs(50)));
        assert!(limiter.check_at(1, start + Duration::from_secs(60)));
    }

    #[test]
    fn users_have_separate_budgets() {
        let limiter = RateLimiter::per_minute(1);
        let now = Instant::now();

        assert!(limiter.check_at(1, now));
        assert!(limiter.check_at(2, now));
        assert!(!limiter.check_at(1, now));
    }

    #[test]
    fn idle_users_are_dropped_once_their_window_passes() {
        let limiter = RateLimiter::per_minute(5);
        let start = Instant::now();

        for user in 0..100 {
            assert!(limiter.check_at(user, start));
        }
        assert_eq!(limiter.tracked_users(), 100);

        // Still inside the window: nobody is dropped
        assert!(limiter.check_at(500, start + Duration::from_secs(30)));
        assert_eq!(limiter.tracked_users(), 101);

        assert!(limiter.check_at(1000, start + Duration::from_secs(61)));
        // Only user 500 (still in its window) and the caller remain
        assert_eq!(limiter.tracked_users(), 2);
    }

    #[test]
    fn sweep_keeps_the_budget_of_active_users() {
        let limiter = RateLimiter::per_minute(2);
        let start = Instant::now();

        assert!(limiter.check_at(2, start));
        assert!(limiter.check_at(1, start + Duration::from_secs(30)));
        assert!(limiter.check_at(1, start + Duration::from_secs(40)));
        // Sweeps user 2, keeps user 1
        assert!(limiter.check_at(3, start + Duration::from_secs(65)));
        assert_eq!(limiter.tracked_users(), 2);
        assert!(!limiter.check_at(1, start + Duration::from_secs(75)));
    }
}
