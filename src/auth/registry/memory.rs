use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::Error;

use super::{RefreshTokenStore, fingerprint};

/// Process-local registry. Empty after every restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl MemoryStore {
    fn with_entries<T>(&self, f: impl FnOnce(&mut HashMap<String, DateTime<Utc>>) -> T) -> T {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut entries)
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryStore {
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), Error> {
        let key = fingerprint(token);
        self.with_entries(|entries| entries.insert(key, expires_at));
        Ok(())
    }

    async fn contains(&self, token: &str) -> Result<bool, Error> {
        let key = fingerprint(token);
        Ok(self.with_entries(|entries| entries.contains_key(&key)))
    }

    async fn take(&self, token: &str) -> Result<bool, Error> {
        let key = fingerprint(token);
        Ok(self.with_entries(|entries| entries.remove(&key).is_some()))
    }

    async fn remove(&self, token: &str) -> Result<(), Error> {
        self.take(token).await.map(|_| ())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        Ok(self.with_entries(|entries| {
            let before = entries.len();
            entries.retain(|_, expires_at| *expires_at > now);
            before - entries.len()
        }))
    }
}
