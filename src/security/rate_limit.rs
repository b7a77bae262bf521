//! Per-client sliding-window rate limiting.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::config::RateLimitConfig;

/// Admission timestamps of one client, oldest first.
#[derive(Debug, Default)]
struct ClientWindow {
    admitted: VecDeque<Instant>,
}

impl ClientWindow {
    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(&oldest) = self.admitted.front() {
            if now.saturating_duration_since(oldest) >= window {
                self.admitted.pop_front();
            } else {
                break;
            }
        }
    }

    fn try_admit(&mut self, now: Instant, window: Duration, limit: usize) -> bool {
        self.prune(now, window);
        if self.admitted.len() < limit {
            self.admitted.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Admits at most `limit` requests per client within any `window`-long period.
///
/// Check-and-record happens under the map shard lock for the client key, so
/// concurrent requests from one client can never overshoot the limit.
pub struct RateLimiter {
    windows: DashMap<String, ClientWindow>,
    limit: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit: limit as usize,
            window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_minute, config.window())
    }

    /// Record a request from `key` if it fits in the window.
    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        // Fast path avoids allocating the key for known clients.
        if let Some(mut window) = self.windows.get_mut(key) {
            return window.try_admit(now, self.window, self.limit);
        }
        self.windows
            .entry(key.to_string())
            .or_default()
            .try_admit(now, self.window, self.limit)
    }

    /// Drop clients with nothing left in their window. Returns how many were removed.
    pub fn evict_idle(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| {
            window.prune(now, self.window);
            !window.admitted.is_empty()
        });
        before.saturating_sub(self.windows.len())
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.windows.len()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

/// Background task that periodically evicts idle client windows.
pub struct WindowSweeper {
    limiter: Arc<RateLimiter>,
    interval: Duration,
}

impl WindowSweeper {
    pub fn new(limiter: Arc<RateLimiter>, interval: Duration) -> Self {
        Self { limiter, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = self.limiter.evict_idle(Instant::now());
                    if evicted > 0 {
                        tracing::debug!(
                            evicted,
                            remaining = self.limiter.tracked_clients(),
                            "Evicted idle rate limit windows"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Window sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
