use crate::ratelimit::RateLimiter;
use crate::registry::SharedRegistry;
use std::sync::Arc;

/// Application state for web handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub limiter: Arc<RateLimiter>,
    /// Require HTTPS (as reported by the proxy) on management routes
    pub production: bool,
}
