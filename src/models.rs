use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::Method;
use tokio::time::Instant;

use crate::config::Config;
use crate::services::{RateGate, RequestPipeline, ResponseCache, UpstreamClient};

/// Authorization attached to an outbound call.
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    BearerToken(String),
    ApplicationKey(String),
}

impl Credential {
    /// The single auth query parameter appended to every upstream URL.
    pub fn query_param(&self) -> (&'static str, &str) {
        match self {
            Self::BearerToken(token) => ("access_token", token.as_str()),
            Self::ApplicationKey(key) => ("key", key.as_str()),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BearerToken(_) => f.write_str("BearerToken(<redacted>)"),
            Self::ApplicationKey(_) => f.write_str("ApplicationKey(<redacted>)"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    pub path: String,
    pub method: Method,
    pub query: BTreeMap<String, String>,
    pub credential: Credential,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>, credential: Credential) -> Self {
        Self {
            path: path.into(),
            method,
            query: BTreeMap::new(),
            credential,
        }
    }

    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query.insert(name.to_string(), value.into());
        self
    }

    /// Adds the parameter only when the caller actually supplied it.
    pub fn optional_param(self, name: &str, value: Option<String>) -> Self {
        match value {
            Some(value) => self.param(name, value),
            None => self,
        }
    }
}

/// Whether a route's successful responses may be served from the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CachePolicy {
    Cached { key: String, ttl: Duration },
    Bypass,
}

impl CachePolicy {
    /// Key from the inbound route path plus raw query string.
    pub fn cached(path: &str, query: &str, ttl: Duration) -> Self {
        let key = if query.is_empty() {
            path.to_string()
        } else {
            format!("{}?{}", path, query)
        };
        Self::Cached { key, ttl }
    }
}

pub struct CacheEntry {
    pub body: Bytes,
    pub stored_at: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.stored_at + self.ttl
    }
}

/// Process-scoped services shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<ResponseCache>,
    pub pipeline: Arc<RequestPipeline>,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, crate::errors::ConfigError> {
        let gate = Arc::new(RateGate::new(
            config.rate_limit_requests,
            config.rate_limit_window,
        ));
        let cache = Arc::new(ResponseCache::new());
        let client = UpstreamClient::new(&config.upstream_root, config.request_timeout)?;
        let pipeline = Arc::new(RequestPipeline::new(gate, cache.clone(), client));

        Ok(Self {
            config: Arc::new(config),
            cache,
            pipeline,
        })
    }

    /// Upstream path for a resource under the configured group.
    pub fn group_path(&self, suffix: &str) -> String {
        format!("{}{}", self.config.group_url_name, suffix)
    }
}
