pub mod config;
pub mod error;
pub mod ratelimit;
pub mod registry;
pub mod store;
pub mod vault;
pub mod web;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use registry::InstanceRegistry;
