pub mod identity;
pub mod limiter;

pub use identity::{client_identity, UNKNOWN_IDENTITY};
pub use limiter::{RateLimitRecord, RateLimitStats, RateLimiter};
