use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use actix_web::HttpRequest;
use chrono::{DateTime, Utc, Duration};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::extract::client_identifier;
use crate::error::AppError;

/// Maximum number of admitted actions inside a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RateLimitPolicy {
    pub requests: u32,
    pub window_ms: u64,
}

impl RateLimitPolicy {
    pub fn window(&self) -> Duration {
        Duration::milliseconds(self.window_ms as i64)
    }
}

/// Logical action a caller is being throttled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitAction {
    Login,
    Signup,
    Api,
    Score,
}

impl RateLimitAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            RateLimitAction::Login => "login",
            RateLimitAction::Signup => "signup",
            RateLimitAction::Api => "api",
            RateLimitAction::Score => "score",
        }
    }

    /// Composite limiter key for this action and caller.
    pub fn key(&self, caller: &str) -> String {
        format!("{}:{}", self.as_str(), caller)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub login: RateLimitPolicy,
    pub signup: RateLimitPolicy,
    pub api: RateLimitPolicy,
    pub score: RateLimitPolicy,
    /// Upper bound on tracked keys.
    pub max_entries: usize,
}

impl RateLimitConfig {
    pub fn policy(&self, action: RateLimitAction) -> RateLimitPolicy {
        match action {
            RateLimitAction::Login => self.login,
            RateLimitAction::Signup => self.signup,
            RateLimitAction::Api => self.api,
            RateLimitAction::Score => self.score,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            login: RateLimitPolicy { requests: 5, window_ms: 15 * 60 * 1000 },
            signup: RateLimitPolicy { requests: 3, window_ms: 60 * 60 * 1000 },
            api: RateLimitPolicy { requests: 100, window_ms: 60 * 1000 },
            score: RateLimitPolicy { requests: 50, window_ms: 60 * 1000 },
            max_entries: 100_000,
        }
    }
}

/// Share of the map dropped when it is full of active keys.
const EVICTION_FRACTION: usize = 10;

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Whole seconds until `reset_at`, never less than one.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        ((millis + 999) / 1000).max(1)
    }
}

#[derive(Debug)]
struct RequestWindow {
    timestamps: Vec<DateTime<Utc>>,
    last_cleanup: DateTime<Utc>,
}

impl RequestWindow {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            timestamps: Vec::new(),
            last_cleanup: now,
        }
    }

    fn cleanup_old_requests(&mut self, window_size: Duration, now: DateTime<Utc>) {
        let cutoff = now - window_size;
        self.timestamps.retain(|ts| *ts > cutoff);
        self.last_cleanup = now;
    }

    fn add_request(&mut self, now: DateTime<Utc>) {
        self.timestamps.push(now);
    }

    fn request_count(&self) -> usize {
        self.timestamps.len()
    }

    fn last_activity(&self) -> DateTime<Utc> {
        self.timestamps.last().copied().unwrap_or(self.last_cleanup)
    }
}

/// Sliding-window admission control keyed by `action:caller`.
///
/// State lives in process memory only; every check holds the write lock for
/// its whole read-modify-write so concurrent calls on one key cannot both be
/// admitted past the ceiling.
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, RequestWindow>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    /// Checks `caller` against the configured policy for `action`.
    pub async fn check_action(&self, action: RateLimitAction, caller: &str) -> RateLimitDecision {
        let decision = self.check(&action.key(caller), self.config.policy(action)).await;
        if !decision.allowed {
            warn!("Rate limit exceeded for {} from {}", action.as_str(), caller);
        }
        decision
    }

    /// Admission for an incoming request; a denial becomes `AppError::RateLimited`.
    pub async fn enforce(&self, action: RateLimitAction, req: &HttpRequest) -> Result<RateLimitDecision, AppError> {
        let decision = self.check_action(action, &client_identifier(req)).await;
        if decision.allowed {
            Ok(decision)
        } else {
            Err(AppError::RateLimited {
                retry_after: decision.retry_after_secs(Utc::now()),
            })
        }
    }

    pub async fn check(&self, identifier: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.check_at(identifier, policy, Utc::now()).await
    }

    pub async fn check_at(
        &self,
        identifier: &str,
        policy: RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let window_size = policy.window();
        let mut windows = self.windows.write().await;

        if !windows.contains_key(identifier) && windows.len() >= self.config.max_entries {
            Self::evict(&mut windows, self.longest_window(), self.config.max_entries, now);
        }

        // Get or create window for the key
        let window = windows
            .entry(identifier.to_string())
            .or_insert_with(|| RequestWindow::new(now));

        // Periodic compaction, at most once per window
        if now - window.last_cleanup > window_size {
            window.cleanup_old_requests(window_size, now);
        }

        let limit = policy.requests as usize;
        if window.request_count() >= limit {
            // Stale timestamps must not keep a caller locked out past the window.
            window.cleanup_old_requests(window_size, now);
        }

        if window.request_count() >= limit {
            let oldest = window.timestamps.first().copied().unwrap_or(now);
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: oldest + window_size,
            };
        }

        window.add_request(now);
        RateLimitDecision {
            allowed: true,
            remaining: policy.requests - window.request_count() as u32,
            reset_at: now + window_size,
        }
    }

    /// Makes room for new keys: drops idle entries, then, if the map is still
    /// full, the least recently active tenth of it.
    fn evict(
        windows: &mut HashMap<String, RequestWindow>,
        window_size: Duration,
        max_entries: usize,
        now: DateTime<Utc>,
    ) {
        let cutoff = now - window_size;
        windows.retain(|_, window| window.last_activity() > cutoff);

        if windows.len() < max_entries {
            return;
        }

        let batch = (max_entries / EVICTION_FRACTION).max(1);
        let count = (windows.len() + batch - max_entries).min(windows.len());

        let mut by_activity: Vec<(DateTime<Utc>, &String)> = windows
            .iter()
            .map(|(key, window)| (window.last_activity(), key))
            .collect();
        if count < by_activity.len() {
            by_activity.select_nth_unstable_by_key(count, |(last, _)| *last);
        }
        let victims: Vec<String> = by_activity
            .into_iter()
            .take(count)
            .map(|(_, key)| key.clone())
            .collect();

        for key in &victims {
            windows.remove(key);
        }
        debug!("Evicted {} rate limit entries at capacity", victims.len());
    }

    /// Keys of every action share one map, so sweeps use the longest window.
    fn longest_window(&self) -> Duration {
        [
            self.config.login,
            self.config.signup,
            self.config.api,
            self.config.score,
        ]
        .iter()
        .map(RateLimitPolicy::window)
        .max()
        .unwrap_or_else(Duration::zero)
    }

    /// Removes expired timestamps and forgets keys with no recent requests.
    pub async fn cleanup(&self) -> usize {
        let window_size = self.longest_window();
        let now = Utc::now();
        let mut windows = self.windows.write().await;
        let before = windows.len();

        // Remove windows with no recent requests
        windows.retain(|_, window| {
            window.cleanup_old_requests(window_size, now);
            !window.timestamps.is_empty()
        });

        before - windows.len()
    }

    pub async fn tracked_keys(&self) -> usize {
        self.windows.read().await.len()
    }
}
