use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::models::CacheEntry;

/// Route+query keyed store of successful upstream bodies. Stale entries are
/// never swept; they stop matching and get overwritten by the next store.
#[derive(Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, key: &str) -> Option<Bytes> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(entry) if entry.is_fresh(Instant::now()) => Some(entry.body.clone()),
            _ => None,
        }
    }

    pub async fn store(&self, key: &str, body: Bytes, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Number of fresh entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.read().await;
        entries.values().filter(|entry| entry.is_fresh(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
