use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitSettings {
    pub max_requests: usize,
    pub window: Duration,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: usize },
    Limited,
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Per-key sliding-window counter.
///
/// Constructed once at startup and injected wherever request admission is
/// needed; `reset` gives tests a clean slate. Stale timestamps are pruned
/// lazily on every `check` and in bulk by the periodic `sweep`.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    settings: RateLimitSettings,
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            settings,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> RateLimitSettings {
        self.settings
    }

    /// Records a request for `key` if it is still under the limit.
    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Clock-injected variant of [`check`](Self::check) so tests can move
    /// time forward deterministically.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entries = self.entries.lock().expect("rate limiter poisoned");
        let hits = entries.entry(key.to_owned()).or_default();
        hits.retain(|stamp| now.duration_since(*stamp) < self.settings.window);
        if hits.len() >= self.settings.max_requests {
            return RateDecision::Limited;
        }
        hits.push(now);
        RateDecision::Allowed {
            remaining: self.settings.max_requests - hits.len(),
        }
    }

    /// Drops keys whose whole window has expired. Called from a periodic
    /// task so idle clients do not accumulate forever.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    pub fn sweep_at(&self, now: Instant) {
        let mut entries = self.entries.lock().expect("rate limiter poisoned");
        entries.retain(|_, hits| {
            hits.retain(|stamp| now.duration_since(*stamp) < self.settings.window);
            !hits.is_empty()
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.entries.lock().expect("rate limiter poisoned").len()
    }

    /// Forgets all recorded requests.
    pub fn reset(&self) {
        self.entries.lock().expect("rate limiter poisoned").clear();
    }
}
