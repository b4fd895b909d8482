//! Fixed-window rate limiting for the posting endpoints

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests allowed per window
    pub max_requests: u32,
    /// Time window in seconds
    pub window_seconds: u64,
}

impl RateLimiterConfig {
    /// Create a new rate limiter configuration
    pub const fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests,
            window_seconds,
        }
    }
}

/// Rate limiter entry
#[derive(Debug)]
struct RateLimiterEntry {
    /// Requests seen in the current window
    count: u32,
    /// When the current window opened
    window_start: Instant,
}

/// Per-key fixed-window rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    /// Rate limiter configuration
    config: RateLimiterConfig,
    /// Rate limiter entries
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if the key is allowed another request in the current window
    pub async fn is_allowed(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            count: 0,
            window_start: now,
        });

        // Check if the window has expired
        if now.duration_since(entry.window_start)
            >= Duration::from_secs(self.config.window_seconds)
        {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.config.max_requests {
            info!(
                "Rate limit of {} per {}s hit for key {}",
                self.config.max_requests, self.config.window_seconds, key
            );
            return false;
        }

        entry.count += 1;
        true
    }

    /// Get the rate limiter configuration
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }
}
