use std::time::Duration;

use async_trait::async_trait;
use log::{info, warn};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use tokio::sync::OnceCell;
use tokio::time::timeout;

use crate::error::StoreError;

use super::MetricsStore;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);
// Upper bound for the whole initial connect, retries included.
const ESTABLISH_TIMEOUT: Duration = Duration::from_secs(3);

/// Redis list backend.
///
/// The connection is opened on first use and then shared; a
/// `ConnectionManager` reconnects on its own after that. If the first
/// connect fails, the next operation tries again. Every call is bounded by
/// the timeouts above so an outage fails fast instead of stalling callers.
pub struct RedisStore {
    client: Client,
    key: String,
    conn: OnceCell<ConnectionManager>,
}

impl RedisStore {
    pub fn open(url: &str, key: impl Into<String>) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        Ok(RedisStore {
            client,
            key: key.into(),
            conn: OnceCell::new(),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager, StoreError> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let config = ConnectionManagerConfig::new()
                    .set_number_of_retries(1)
                    .set_connection_timeout(CONNECT_TIMEOUT)
                    .set_response_timeout(RESPONSE_TIMEOUT);
                let conn = timeout(
                    ESTABLISH_TIMEOUT,
                    ConnectionManager::new_with_config(self.client.clone(), config),
                )
                .await
                .map_err(|_| StoreError::Unavailable("redis connect timed out".to_string()))??;
                info!("connected to redis for history key {:?}", self.key);
                Ok::<_, StoreError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }

    /// Opens the connection eagerly. Failure is not fatal: operations will
    /// report it and retry the connect.
    pub async fn warm_up(&self) {
        if let Err(err) = self.connection().await {
            warn!("redis unreachable at startup: {}", err);
        }
    }
}

#[async_trait]
impl MetricsStore for RedisStore {
    async fn push_front(&self, value: String) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.lpush::<_, _, ()>(&self.key, value).await?;
        Ok(())
    }

    async fn trim(&self, start: isize, stop: isize) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        conn.ltrim::<_, ()>(&self.key, start, stop).await?;
        Ok(())
    }

    async fn range(&self, start: isize, stop: isize) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection().await?;
        let values: Vec<String> = conn.lrange(&self.key, start, stop).await?;
        Ok(values)
    }

    async fn push_front_capped(&self, value: String, capacity: usize) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        redis::pipe()
            .atomic()
            .lpush(&self.key, value)
            .ignore()
            .ltrim(&self.key, 0, capacity as isize - 1)
            .ignore()
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::store::RollingStore;

    #[tokio::test]
    async fn unreachable_server_fails_fast() {
        let store = RedisStore::open("redis://127.0.0.1:1", "metrics").unwrap();

        let started = Instant::now();
        assert!(store.push_front_capped("x".to_string(), 100).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));

        let started = Instant::now();
        assert!(store.range(0, -1).await.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    // Runs only when REDIS_URL points at a live server.
    #[tokio::test]
    async fn round_trip_against_live_server() {
        let Ok(url) = std::env::var("REDIS_URL") else {
            return;
        };
        let key = format!("metrics-test-{}", uuid::Uuid::new_v4());
        let backend = std::sync::Arc::new(RedisStore::open(&url, key.clone()).unwrap());
        let store = RollingStore::new(backend.clone());

        for i in 0..(store.capacity() + 5) {
            store.append(&format!("{{\"cpu_usage\":{i}}}")).await.unwrap();
        }
        let all = store.range_query(0, -1).await.unwrap();
        assert_eq!(all.len(), store.capacity());
        assert_eq!(all[0], format!("{{\"cpu_usage\":{}}}", store.capacity() + 4));
        assert_eq!(store.range_query(0, 0).await.unwrap(), vec![all[0].clone()]);

        backend.trim(1, 0).await.unwrap();
        assert!(store.range_query(0, -1).await.unwrap().is_empty());
    }
}
