use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::OAuthTokenSet;

/// Per-user credential persistence contract. Implementations must not leak
/// entries across user ids; a `set` replaces any previous token set wholesale.
/// One local writer per user id is assumed.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<OAuthTokenSet>>;
    async fn set(&self, user_id: &str, tokens: OAuthTokenSet) -> Result<()>;
    async fn clear(&self, user_id: &str) -> Result<()>;
}

/// In-process store backing the CLI session and the tests.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, OAuthTokenSet>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, user_id: &str) -> Result<Option<OAuthTokenSet>> {
        Ok(self.entries.lock().await.get(user_id).cloned())
    }

    async fn set(&self, user_id: &str, tokens: OAuthTokenSet) -> Result<()> {
        self.entries.lock().await.insert(user_id.to_string(), tokens);
        Ok(())
    }

    async fn clear(&self, user_id: &str) -> Result<()> {
        self.entries.lock().await.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(name: &str) -> OAuthTokenSet {
        OAuthTokenSet {
            token: format!("{}-token", name),
            token_secret: format!("{}-secret", name),
            username: name.to_string(),
        }
    }

    #[tokio::test]
    async fn entries_do_not_leak_across_user_ids() {
        let store = MemoryTokenStore::new();
        store.set("alice", tokens("alice")).await.unwrap();
        store.set("bob", tokens("bob")).await.unwrap();

        assert_eq!(store.get("alice").await.unwrap(), Some(tokens("alice")));
        assert_eq!(store.get("bob").await.unwrap(), Some(tokens("bob")));
        assert_eq!(store.get("carol").await.unwrap(), None);

        store.clear("alice").await.unwrap();
        assert_eq!(store.get("alice").await.unwrap(), None);
        assert_eq!(store.get("bob").await.unwrap(), Some(tokens("bob")));
    }

    #[tokio::test]
    async fn set_replaces_wholesale() {
        let store = MemoryTokenStore::new();
        store.set("alice", tokens("old")).await.unwrap();
        store.set("alice", tokens("new")).await.unwrap();
        assert_eq!(store.get("alice").await.unwrap(), Some(tokens("new")));
    }
}
