//! services/api/src/adapters/cache.rs
//!
//! Adapters implementing the `CacheService` port. `RedisCacheAdapter` is the
//! shared cache for deployments; `MokaCacheAdapter` is an in-process fallback
//! used when no Redis URL is configured, and by the HTTP tests.

use async_trait::async_trait;
use flashmind_core::ports::{CacheService, PortError, PortResult};
use moka::future::Cache;
use moka::Expiry;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::{Duration, Instant};
use tracing::info;

//=========================================================================================
// Redis
//=========================================================================================

/// A cache adapter backed by Redis. The connection manager reconnects on its own,
/// so a Redis outage surfaces as individual command errors, never as a panic.
#[derive(Clone)]
pub struct RedisCacheAdapter {
    conn: ConnectionManager,
}

impl RedisCacheAdapter {
    /// Opens a managed connection and checks it with a `PING`.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let mut conn = ConnectionManager::new(client).await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Connected to Redis cache.");
        Ok(Self { conn })
    }
}

fn redis_error(e: redis::RedisError) -> PortError {
    PortError::Unexpected(format!("redis: {}", e))
}

#[async_trait]
impl CacheService for RedisCacheAdapter {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get::<_, Option<String>>(key).await.map_err(redis_error)
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()> {
        let mut conn = self.conn.clone();
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, seconds)
            .await
            .map_err(redis_error)
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(redis_error)
    }
}

//=========================================================================================
// In-process (moka)
//=========================================================================================

type Entry = (Duration, String);

/// Expires each entry after the TTL it was stored with. Overwriting a key restarts
/// its clock.
struct PerEntryExpiry;

impl Expiry<String, Entry> for PerEntryExpiry {
    fn expire_after_create(&self, _: &String, value: &Entry, _: Instant) -> Option<Duration> {
        Some(value.0)
    }

    fn expire_after_update(
        &self,
        _: &String,
        value: &Entry,
        _: Instant,
        _: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.0)
    }
}

/// An in-process cache adapter with per-entry expiry.
#[derive(Clone)]
pub struct MokaCacheAdapter {
    inner: Cache<String, Entry>,
}

impl MokaCacheAdapter {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { inner }
    }
}

impl Default for MokaCacheAdapter {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheService for MokaCacheAdapter {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.inner.get(key).await.map(|(_, value)| value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> PortResult<()> {
        self.inner.insert(key.to_string(), (ttl, value.to_string())).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> PortResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_deletes_values() {
        let cache = MokaCacheAdapter::default();
        cache
            .set("chats:1", "[]", Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("chats:1").await.unwrap().as_deref(), Some("[]"));

        cache.delete("chats:1").await.unwrap();
        assert_eq!(cache.get("chats:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_a_missing_key_is_not_an_error() {
        let cache = MokaCacheAdapter::default();
        assert!(cache.delete("lectures:nothing").await.is_ok());
    }

    #[tokio::test]
    async fn entries_expire_after_their_ttl() {
        let cache = MokaCacheAdapter::default();
        cache
            .set("short", "a", Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("long", "b", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        cache.inner.run_pending_tasks().await;

        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn overwriting_replaces_the_value() {
        let cache = MokaCacheAdapter::default();
        cache.set("k", "old", Duration::from_secs(60)).await.unwrap();
        cache.set("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap().as_deref(), Some("new"));
    }
}
