//! Redis cache store
//!
//! Key layout below the configured prefix:
//!
//! - `<prefix>:<key>` cached value, expiring after its TTL
//! - `<prefix>:cache-hit-keys` / `<prefix>:cache-miss-keys` sets of bucket names
//! - `<prefix>:cache-hit-<bucket>` / `<prefix>:cache-miss-<bucket>` per bucket counters
//! - `<prefix>:cache-hit-total` / `<prefix>:cache-miss-total` grand totals

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::store::{CacheMetrics, CacheStore};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use slurmgate_shared::CacheConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy)]
enum Direction {
    Hit,
    Miss,
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Hit => "hit",
            Direction::Miss => "miss",
        }
    }
}

/// Cache store backed by a shared Redis server
#[derive(Clone)]
pub struct RedisCacheStore {
    connection_manager: ConnectionManager,
    prefix: String,
}

impl RedisCacheStore {
    /// Connect to Redis and check the server answers
    pub async fn connect(config: &CacheConfig) -> CacheResult<Self> {
        info!("Connecting to Redis cache at {}", config.redis_url);

        let client = Client::open(config.redis_url.as_str()).map_err(|e| {
            CacheError::connection(format!("Failed to create Redis client: {}", e))
        })?;

        let connection_manager = timeout(config.connect_timeout(), ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::connection(format!(
                    "Redis connection timed out after {} seconds",
                    config.connect_timeout_seconds
                ))
            })?
            .map_err(|e| {
                CacheError::connection(format!("Failed to create connection manager: {}", e))
            })?;

        let store = Self {
            connection_manager,
            prefix: config.key_prefix.clone(),
        };
        store.health_check().await?;

        info!("Successfully connected to Redis cache");
        Ok(store)
    }

    /// Ping the server
    pub async fn health_check(&self) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await.map_err(|e| {
            error!("Redis health check failed: {}", e);
            CacheError::from(e)
        })?;

        if pong != "PONG" {
            return Err(CacheError::operation(format!(
                "Unexpected PING response: {}",
                pong
            )));
        }
        debug!("Redis health check successful");
        Ok(())
    }

    fn value_key(&self, key: &CacheKey) -> String {
        format!("{}:{}", self.prefix, key.primary())
    }

    fn bucket_set(&self, direction: Direction) -> String {
        format!("{}:cache-{}-keys", self.prefix, direction.as_str())
    }

    fn counter(&self, direction: Direction, bucket: &str) -> String {
        format!("{}:cache-{}-{}", self.prefix, direction.as_str(), bucket)
    }

    fn total(&self, direction: Direction) -> String {
        format!("{}:cache-{}-total", self.prefix, direction.as_str())
    }

    async fn count(&self, direction: Direction, key: &CacheKey) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        redis::pipe()
            .atomic()
            .sadd(self.bucket_set(direction), key.bucket())
            .ignore()
            .incr(self.counter(direction, key.bucket()), 1)
            .ignore()
            .incr(self.total(direction), 1)
            .ignore()
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn bucket_counts(&self, direction: Direction) -> CacheResult<BTreeMap<String, u64>> {
        let mut conn = self.connection_manager.clone();
        let buckets: Vec<String> = conn.smembers(self.bucket_set(direction)).await?;
        if buckets.is_empty() {
            return Ok(BTreeMap::new());
        }

        let counters: Vec<String> = buckets
            .iter()
            .map(|bucket| self.counter(direction, bucket))
            .collect();
        let values: Vec<Option<u64>> = redis::cmd("MGET")
            .arg(&counters)
            .query_async(&mut conn)
            .await?;

        Ok(buckets
            .into_iter()
            .zip(values)
            .map(|(bucket, value)| (bucket, value.unwrap_or(0)))
            .collect())
    }

    async fn total_count(&self, direction: Direction) -> CacheResult<u64> {
        let mut conn = self.connection_manager.clone();
        let total: Option<u64> = conn.get(self.total(direction)).await?;
        Ok(total.unwrap_or(0))
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn put(&self, key: &CacheKey, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        let ttl_seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(self.value_key(key), value, ttl_seconds)
            .await?;

        debug!("Set cache key '{}' with TTL {} seconds", key, ttl_seconds);
        Ok(())
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        let mut conn = self.connection_manager.clone();
        let value: Option<String> = conn.get(self.value_key(key)).await?;
        Ok(value)
    }

    async fn count_hit(&self, key: &CacheKey) -> CacheResult<()> {
        self.count(Direction::Hit, key).await
    }

    async fn count_miss(&self, key: &CacheKey) -> CacheResult<()> {
        self.count(Direction::Miss, key).await
    }

    async fn metrics(&self) -> CacheResult<CacheMetrics> {
        Ok(CacheMetrics {
            hits: self.bucket_counts(Direction::Hit).await?,
            misses: self.bucket_counts(Direction::Miss).await?,
            total_hits: self.total_count(Direction::Hit).await?,
            total_misses: self.total_count(Direction::Miss).await?,
        })
    }

    async fn reset(&self) -> CacheResult<()> {
        let mut conn = self.connection_manager.clone();
        let mut keys = Vec::new();

        for direction in [Direction::Hit, Direction::Miss] {
            let buckets: Vec<String> = conn.smembers(self.bucket_set(direction)).await?;
            keys.extend(
                buckets
                    .iter()
                    .map(|bucket| self.counter(direction, bucket)),
            );
            keys.push(self.bucket_set(direction));
            keys.push(self.total(direction));
        }

        conn.del::<_, ()>(&keys).await?;
        info!("Reset cache metrics ({} keys deleted)", keys.len());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
