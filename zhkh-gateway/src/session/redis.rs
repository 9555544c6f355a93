/// Redis session store
///
/// Sessions are JSON strings under `zhkh:session:<token hash>` with a native
/// Redis expiry, so several gateway instances can share them.

use super::{Session, SessionError, SessionStore};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::time::Duration;

const KEY_PREFIX: &str = "zhkh:session:";

#[derive(Clone)]
pub struct RedisSessionStore {
    manager: ConnectionManager,
}

impl RedisSessionStore {
    /// Connects to Redis
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the server is unreachable
    pub async fn connect(url: &str) -> Result<Self, SessionError> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;

        tracing::info!("Session store connected to Redis at {}", sanitize_url(url));

        Ok(Self { manager })
    }
}

fn key(hash: &str) -> String {
    format!("{}{}", KEY_PREFIX, hash)
}

/// Hides credentials in a Redis URL for logging
fn sanitize_url(url: &str) -> String {
    if let (Some(at_pos), Some(scheme_end)) = (url.find('@'), url.find("://")) {
        let scheme = &url[..scheme_end + 3];
        let host = &url[at_pos + 1..];
        return format!("{}***:***@{}", scheme, host);
    }
    url.to_string()
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, hash: &str, session: &Session, ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.manager.clone();
        let value = serde_json::to_string(session)?;

        redis::cmd("SET")
            .arg(key(hash))
            .arg(value)
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn get(&self, hash: &str) -> Result<Option<Session>, SessionError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key(hash)).await?;

        match value {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, hash: &str) -> Result<(), SessionError> {
        let mut conn = self.manager.clone();
        let _: u32 = conn.del(key(hash)).await?;
        Ok(())
    }

    async fn ping(&self) -> bool {
        let mut conn = self.manager.clone();
        match redis::cmd("PING").query_async::<_, String>(&mut conn).await {
            Ok(pong) => pong == "PONG",
            Err(e) => {
                tracing::error!("Redis health check failed: {}", e);
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
