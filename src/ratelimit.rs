use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant};
use tracing::debug;

/// Allowance for one window.
#[derive(Debug, Clone, Copy)]
pub struct RateQuota {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateQuota {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window: Duration::from_secs(60),
        }
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
}

struct Window {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window request counter keyed by authenticated identity.
///
/// Windows reset lazily on the first request after expiry; the optional
/// sweeper only bounds memory. State lives in process memory, so this is
/// correct for a single-process deployment only — scaling out requires a
/// shared counter instead.
pub struct RateLimiter {
    quota: RateQuota,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(quota: RateQuota) -> Self {
        Self {
            quota,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request against the default quota.
    pub async fn check(&self, key: &str) -> RateDecision {
        self.check_with(key, self.quota).await
    }

    /// Count a request against an endpoint-specific quota. Callers wanting an
    /// independent window (e.g. the costlier summarization endpoint) scope
    /// the key accordingly.
    pub async fn check_with(&self, key: &str, quota: RateQuota) -> RateDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        match windows.get_mut(key) {
            Some(window) if now < window.reset_at => {
                window.count += 1;
                RateDecision {
                    allowed: window.count <= quota.max_requests,
                    remaining: quota.max_requests.saturating_sub(window.count),
                }
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + quota.window,
                    },
                );
                RateDecision {
                    allowed: quota.max_requests >= 1,
                    remaining: quota.max_requests.saturating_sub(1),
                }
            }
        }
    }

    /// Drop expired windows. Bounds memory only; never required for
    /// correctness.
    pub async fn sweep(&self) {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| now < window.reset_at);
        let dropped = before - windows.len();
        if dropped > 0 {
            debug!("rate limiter sweep dropped {dropped} expired windows");
        }
    }

    /// Periodic sweep task, tied to the server process lifetime.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(every);
            tick.tick().await; // first tick completes immediately
            loop {
                tick.tick().await;
                self.sweep().await;
            }
        })
    }
}
