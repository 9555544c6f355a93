/// Server-side sessions
///
/// The browser only ever sees an opaque random token in the `zhkh_session`
/// cookie. The store is keyed by the SHA-256 of that token and never holds
/// raw tokens.
///
/// - `token`: Token generation and hashing
/// - `cookie`: `Set-Cookie` values and reading the token back
/// - `memory`: In-process store (default)
/// - `redis`: Redis store shared between gateway instances
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use zhkh_gateway::session::{memory::MemorySessionStore, SessionManager};
///
/// # async fn example() -> Result<(), zhkh_gateway::session::SessionError> {
/// let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()), Duration::from_secs(3600));
///
/// let token = sessions.start(7, "operator@example.com").await?;
/// let session = sessions.resolve(&token).await?;
/// assert_eq!(session.map(|s| s.user_id), Some(7));
/// # Ok(())
/// # }
/// ```

pub mod cookie;
pub mod memory;
pub mod redis;
pub mod token;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use zhkh_shared::api::ApiError;

/// Session store errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Backend(#[from] ::redis::RedisError),

    #[error("corrupt session record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Data kept for a logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Storage backend for sessions
///
/// Keys are token hashes; the store never sees raw tokens.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a session that expires after `ttl`
    async fn put(&self, key: &str, session: &Session, ttl: Duration) -> Result<(), SessionError>;

    /// Returns the session if it exists and has not expired
    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError>;

    /// Removes a session; removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<(), SessionError>;

    /// Whether the backend is reachable
    async fn ping(&self) -> bool;

    /// Backend name for logs and health output
    fn name(&self) -> &'static str;
}

/// Session lifecycle on top of a store
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Creates a session and returns the raw token for the cookie
    pub async fn start(&self, user_id: i64, email: &str) -> Result<String, SessionError> {
        let token = token::generate_token();
        let session = Session {
            user_id,
            email: email.to_string(),
            created_at: Utc::now(),
        };

        self.store
            .put(&token::hash_token(&token), &session, self.ttl)
            .await?;
        info!(user_id, backend = self.store.name(), "Session created");

        Ok(token)
    }

    /// Looks up the session of a raw token
    pub async fn resolve(&self, raw_token: &str) -> Result<Option<Session>, SessionError> {
        if !token::is_well_formed(raw_token) {
            return Ok(None);
        }
        self.store.get(&token::hash_token(raw_token)).await
    }

    /// Destroys the session of a raw token
    pub async fn end(&self, raw_token: &str) -> Result<(), SessionError> {
        if !token::is_well_formed(raw_token) {
            return Ok(());
        }
        self.store.remove(&token::hash_token(raw_token)).await
    }

    pub async fn ping(&self) -> bool {
        self.store.ping().await
    }
}
