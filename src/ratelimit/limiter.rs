use crate::config::RateLimitConfig;
use crate::error::{AppError, AppResult};
use crate::ratelimit::identity::{client_identity, UNKNOWN_IDENTITY};
use axum::http::HeaderMap;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Request count for one identity within its current window
#[derive(Clone, Debug)]
pub struct RateLimitRecord {
    pub count: u32,
    pub window_reset_at: Instant,
}

impl RateLimitRecord {
    fn fresh(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            window_reset_at: now + window,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.window_reset_at
    }
}

/// Fixed-window request limiter keyed by client identity.
///
/// The table is a concurrent map owned by this value; it shares no lock
/// with the instance registry.
pub struct RateLimiter {
    records: DashMap<String, RateLimitRecord>,
    window: Duration,
    max_requests: u32,
    reject_unattributed: bool,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            records: DashMap::new(),
            window,
            max_requests,
            reject_unattributed: false,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            reject_unattributed: config.reject_unattributed,
            ..Self::new(config.window(), config.max_requests)
        }
    }

    /// Count a request from `identity` and decide whether to let it through.
    pub fn admit(&self, identity: &str) -> bool {
        self.admit_at(identity, Instant::now())
    }

    fn admit_at(&self, identity: &str, now: Instant) -> bool {
        match self.records.entry(identity.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(RateLimitRecord::fresh(now, self.window));
                true
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                if record.is_expired(now) {
                    *record = RateLimitRecord::fresh(now, self.window);
                    return true;
                }
                record.count = record.count.saturating_add(1);
                record.count <= self.max_requests
            }
        }
    }

    /// Admission check for an incoming HTTP request.
    ///
    /// Requests without a client address share the `"unknown"` bucket
    /// unless the limiter was configured to reject them outright.
    pub fn admit_request(&self, headers: &HeaderMap) -> AppResult<()> {
        let identity = match client_identity(headers) {
            Some(identity) => identity,
            None if self.reject_unattributed => {
                warn!("Rejected request with no client address");
                return Err(AppError::validation("client address required"));
            }
            None => UNKNOWN_IDENTITY.to_string(),
        };

        if self.admit(&identity) {
            Ok(())
        } else {
            warn!("Rate limit exceeded for {}", identity);
            Err(AppError::RateLimitExceeded)
        }
    }

    /// Drop every record whose window has already closed.
    pub fn evict_expired(&self) -> usize {
        self.evict_expired_at(Instant::now())
    }

    fn evict_expired_at(&self, now: Instant) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        before.saturating_sub(self.records.len())
    }

    /// Number of identities currently tracked
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            tracked_identities: self.records.len(),
            window_secs: self.window.as_secs(),
            max_requests: self.max_requests,
        }
    }

    /// Run [`RateLimiter::evict_expired`] every `every` until the handle is aborted.
    pub fn spawn_eviction_sweep(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = self.evict_expired();
                if evicted > 0 {
                    let stats = self.stats();
                    debug!(
                        "Evicted {} expired rate limit record(s), {} still tracked",
                        evicted, stats.tracked_identities
                    );
                }
            }
        })
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct RateLimitStats {
    pub tracked_identities: usize,
    pub window_secs: u64,
    pub max_requests: u32,
}
