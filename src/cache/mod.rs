use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const KEY_PREFIX: &str = "melodot:";
const TIMESTAMP_SUFFIX: &str = "_timestamp";

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(RedisStore { client })
    }

    pub async fn ping(&self) -> bool {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: std::result::Result<String, _> =
                    redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let val: Option<String> = conn.get(format!("{KEY_PREFIX}{key}")).await?;
        Ok(val)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(format!("{KEY_PREFIX}{key}"), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.del(format!("{KEY_PREFIX}{key}")).await?;
        Ok(())
    }
}

/// Process-local store, used when Redis is unreachable.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub key: String,
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.stored_at);
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => age < ttl,
            // a ttl chrono cannot represent never expires
            Err(_) => true,
        }
    }
}

/// JSON under `<key>`, store time in epoch milliseconds under `<key>_timestamp`.
#[derive(Clone)]
pub struct TimedCache {
    store: Arc<dyn KeyValueStore>,
}

impl TimedCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        TimedCache { store }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CacheEntry<T>> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache read failed for {key}: {e}");
                return None;
            }
        };
        let millis = match self.store.get(&timestamp_key(key)).await {
            Ok(Some(ts)) => ts.trim().parse::<i64>().ok()?,
            Ok(None) => return None,
            Err(e) => {
                warn!("Cache timestamp read failed for {key}: {e}");
                return None;
            }
        };
        let stored_at = Utc.timestamp_millis_opt(millis).single()?;
        match serde_json::from_str::<T>(&raw) {
            Ok(value) => Some(CacheEntry {
                key: key.to_string(),
                value,
                stored_at,
            }),
            Err(e) => {
                debug!("Ignoring undecodable cache entry {key}: {e}");
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put_at(key, value, Utc::now()).await
    }

    pub async fn put_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        stored_at: DateTime<Utc>,
    ) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json).await?;
        self.store
            .set(&timestamp_key(key), &stored_at.timestamp_millis().to_string())
            .await?;
        Ok(())
    }
}

fn timestamp_key(key: &str) -> String {
    format!("{key}{TIMESTAMP_SUFFIX}")
}
