//! Server-side record of refresh tokens that may still be exchanged.
//!
//! Tokens are stored by fingerprint only, together with their expiry so
//! stale entries can be swept.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::{DbPool, Error, config::RegistryKind};

mod database;
mod memory;
mod sweeper;

pub use database::DatabaseStore;
pub use memory::MemoryStore;
pub use sweeper::launch as launch_sweeper;

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), Error>;

    /// Membership only; expiry is judged by the token signature, not here.
    async fn contains(&self, token: &str) -> Result<bool, Error>;

    /// Removes the token and reports whether this call was the one that removed it.
    async fn take(&self, token: &str) -> Result<bool, Error>;

    async fn remove(&self, token: &str) -> Result<(), Error>;

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, Error>;
}

pub fn build(kind: RegistryKind, pool: DbPool) -> Arc<dyn RefreshTokenStore> {
    match kind {
        RegistryKind::Memory => Arc::new(MemoryStore::default()),
        RegistryKind::Database => Arc::new(DatabaseStore::new(pool)),
    }
}

fn fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}
