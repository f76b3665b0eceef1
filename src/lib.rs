pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use errors::{ConfigError, UpstreamError};
pub use models::{AppState, CacheEntry, CachePolicy, Credential, UpstreamRequest};
pub use services::{RateGate, RequestPipeline, ResponseCache, UpstreamClient};
