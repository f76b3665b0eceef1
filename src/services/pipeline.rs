use std::sync::Arc;

use bytes::Bytes;

use crate::errors::UpstreamError;
use crate::models::{CachePolicy, UpstreamRequest};
use crate::services::{RateGate, ResponseCache, UpstreamClient};

/// Cache lookup, rate-gate admission, upstream call and cache fill, in that order.
pub struct RequestPipeline {
    gate: Arc<RateGate>,
    cache: Arc<ResponseCache>,
    client: UpstreamClient,
}

impl RequestPipeline {
    pub fn new(gate: Arc<RateGate>, cache: Arc<ResponseCache>, client: UpstreamClient) -> Self {
        Self { gate, cache, client }
    }

    /// Runs one request. Cache hits are answered without spending a permit.
    pub async fn execute(
        &self,
        policy: &CachePolicy,
        request: UpstreamRequest,
    ) -> Result<Bytes, UpstreamError> {
        if let CachePolicy::Cached { key, .. } = policy {
            if let Some(body) = self.cache.lookup(key).await {
                tracing::debug!(%key, "cache hit");
                return Ok(body);
            }
            tracing::debug!(%key, "cache miss");
        }

        self.gate.acquire().await;
        // An earlier waiter for the same key may have filled it while we queued.
        if let CachePolicy::Cached { key, .. } = policy {
            if let Some(body) = self.cache.lookup(key).await {
                tracing::debug!(%key, "cache filled while queued");
                return Ok(body);
            }
        }
        let payload = self.client.call(&request).await?;
        let body = serde_json::to_vec(&payload)
            .map(Bytes::from)
            .map_err(|e| UpstreamError::Parse { source: e })?;

        if let CachePolicy::Cached { key, ttl } = policy {
            self.cache.store(key, body.clone(), *ttl).await;
        }

        Ok(body)
    }
}
