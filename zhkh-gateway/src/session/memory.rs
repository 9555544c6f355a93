/// In-process session store
///
/// Sessions live in a map guarded by a tokio `RwLock` and are lost when the
/// gateway restarts. Expired entries are dropped on lookup, and every write
/// sweeps whatever has expired so abandoned sessions do not accumulate.

use super::{Session, SessionError, SessionStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, (Session, Instant)>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, key: &str, session: &Session, ttl: Duration) -> Result<(), SessionError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        entries.insert(key.to_string(), (session.clone(), now + ttl));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Session>, SessionError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some((session, expires_at)) if Instant::now() < *expires_at => {
                    return Ok(Some(session.clone()));
                }
                Some(_) => {}
            }
        }

        // expired
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn ping(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn session() -> Session {
        Session {
            user_id: 1,
            email: "a@example.com".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = MemorySessionStore::new();
        store.put("k", &session(), Duration::from_secs(60)).await.unwrap();

        assert_eq!(store.get("k").await.unwrap().unwrap().user_id, 1);
        assert!(store.get("other").await.unwrap().is_none());

        store.remove("k").await.unwrap();
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.remove("k").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemorySessionStore::new();
        store.put("k", &session(), Duration::from_secs(10)).await.unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert!(store.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_sessions_swept_on_put() {
        let store = MemorySessionStore::new();
        for i in 0..1000 {
            store
                .put(&format!("abandoned-{i}"), &session(), Duration::from_secs(10))
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;

        for i in 0..10 {
            store
                .put(&format!("fresh-{i}"), &session(), Duration::from_secs(10))
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 10);
        assert!(store.get("fresh-9").await.unwrap().is_some());
        assert!(store.get("abandoned-0").await.unwrap().is_none());
    }
}
