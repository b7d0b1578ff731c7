//! Redis-backed session storage.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::db::SessionStore;
use crate::error::{AppError, AppResult};
use crate::models::SessionData;

const SESSION_PREFIX: &str = "portal:sess:";

fn session_key(id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, id)
}

/// Sessions stored as JSON strings under `portal:sess:<id>` with a TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    client: Arc<redis::Client>,
}

impl RedisSessionStore {
    /// Create store from Redis URL.
    pub fn new(redis_url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Get a multiplexed connection for commands.
    pub async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, AppError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: &str) -> AppResult<Option<SessionData>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(session_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn store(&self, id: &str, data: &SessionData, ttl: Duration) -> AppResult<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(data)?;
        redis::cmd("SET")
            .arg(session_key(id))
            .arg(json)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(ttl_secs = ttl.as_secs(), "session stored");
        Ok(())
    }

    async fn destroy(&self, id: &str) -> AppResult<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(session_key(id)).await?;
        Ok(())
    }
}
