// src/db/session_store.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct SessionEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

// Chave -> usuário serializado (JSON). Gravado no login, apagado no logout ou ao expirar.
#[derive(Debug, Default)]
pub struct SessionStore {
    entries: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grava a sessão e varre as expiradas. Uma entrada já vencida não é guardada.
    pub async fn put(&self, key: &str, value: String, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, entry| entry.expires_at > now);
        if expires_at > now {
            entries.insert(key.to_string(), SessionEntry { value, expires_at });
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Utc::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        self.entries.write().await.remove(key);
        None
    }

    pub async fn remove(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
