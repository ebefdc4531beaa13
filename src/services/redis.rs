//! Redis-backed session records

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::error::{AppError, AppResult};

use super::sessions::{SessionData, SessionStore};

#[derive(Clone)]
pub struct RedisService {
    client: Client,
}

impl RedisService {
    /// Create a new Redis service
    pub async fn new(url: &str) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Session(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Session(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Session(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisService {
    async fn load(&self, token: &str) -> AppResult<Option<SessionData>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(Self::key(token)).await?;

        // Unreadable records count as missing
        Ok(raw.and_then(|json| serde_json::from_str(&json).ok()))
    }

    async fn save(&self, token: &str, data: &SessionData, ttl: Duration) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(data)?;
        conn.set_ex::<_, _, ()>(Self::key(token), json, ttl.as_secs().max(1))
            .await?;
        Ok(())
    }

    async fn destroy(&self, token: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(Self::key(token)).await?;
        Ok(())
    }
}
