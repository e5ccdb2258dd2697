use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{DbPool, Error, db::RefreshTokenRecord};

use super::{RefreshTokenStore, fingerprint};

/// Registry backed by the `refresh_tokens` table, so sessions survive restarts.
pub struct DatabaseStore {
    pool: DbPool,
}

impl DatabaseStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for DatabaseStore {
    async fn insert(&self, token: &str, expires_at: DateTime<Utc>) -> Result<(), Error> {
        let conn = self.pool.get().await?;
        let record = RefreshTokenRecord {
            fingerprint: fingerprint(token),
            expires_at: expires_at.naive_utc(),
            created_at: Utc::now().naive_utc(),
        };
        RefreshTokenRecord::insert(&conn, record).await
    }

    async fn contains(&self, token: &str) -> Result<bool, Error> {
        let conn = self.pool.get().await?;
        RefreshTokenRecord::exists(&conn, &fingerprint(token)).await
    }

    async fn take(&self, token: &str) -> Result<bool, Error> {
        let conn = self.pool.get().await?;
        let removed = RefreshTokenRecord::delete(&conn, &fingerprint(token)).await?;
        Ok(removed == 1)
    }

    async fn remove(&self, token: &str) -> Result<(), Error> {
        let conn = self.pool.get().await?;
        RefreshTokenRecord::delete(&conn, &fingerprint(token)).await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, Error> {
        let conn = self.pool.get().await?;
        RefreshTokenRecord::delete_expired(&conn, now.naive_utc()).await
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn take_succeeds_once() {
        let store = DatabaseStore::new(test_pool().await);
        store.insert("token-a", Utc::now() + Duration::days(7)).await.unwrap();

        assert!(store.contains("token-a").await.unwrap());
        assert!(store.take("token-a").await.unwrap());
        assert!(!store.take("token-a").await.unwrap());
        assert!(!store.contains("token-a").await.unwrap());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = DatabaseStore::new(test_pool().await);
        store.insert("token-a", Utc::now() + Duration::days(7)).await.unwrap();

        store.remove("token-a").await.unwrap();
        store.remove("token-a").await.unwrap();
        assert!(!store.contains("token-a").await.unwrap());
    }

    #[tokio::test]
    async fn purge_drops_only_expired_entries() {
        let store = DatabaseStore::new(test_pool().await);
        let now = Utc::now();
        store.insert("stale", now - Duration::seconds(1)).await.unwrap();
        store.insert("live", now + Duration::days(1)).await.unwrap();

        assert_eq!(store.purge_expired(now).await.unwrap(), 1);
        assert!(!store.contains("stale").await.unwrap());
        assert!(store.contains("live").await.unwrap());
    }

    #[tokio::test]
    async fn raw_tokens_are_not_stored() {
        let pool = test_pool().await;
        let store = DatabaseStore::new(pool.clone());
        store.insert("token-a", Utc::now() + Duration::days(7)).await.unwrap();

        let conn = pool.get().await.unwrap();
        assert!(!RefreshTokenRecord::exists(&conn, "token-a").await.unwrap());
        assert!(RefreshTokenRecord::exists(&conn, &fingerprint("token-a")).await.unwrap());
    }
}
