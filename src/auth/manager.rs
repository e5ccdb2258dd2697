use std::{sync::Arc, time::Duration as StdDuration};

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;

use crate::{
    DbPool, Error,
    config::Auth as AuthConfig,
    db::{AuthSecretRecord, SecretKind, User},
};

use super::{
    password::{hash_password, verify_password},
    registry::{self, RefreshTokenStore},
    token::{AccessClaims, AccessTokenService, RefreshToken, RefreshTokenService},
};

/// Verified when the login id is unknown so both failure paths cost the same.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("clouddrive-timing-equaliser").ok());

pub struct SessionManager {
    pool: DbPool,
    access: AccessTokenService,
    refresh: RefreshTokenService,
    registry: Arc<dyn RefreshTokenStore>,
}

/// Freshly minted credential pair. The refresh token only ever leaves through the cookie.
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub user: User,
}

impl SessionManager {
    pub async fn new(config: &AuthConfig, pool: DbPool) -> Result<Self, String> {
        let access_secret =
            resolve_secret(&pool, &config.access_secret, SecretKind::Access).await?;
        let refresh_secret =
            resolve_secret(&pool, &config.refresh_secret, SecretKind::Refresh).await?;
        let access_ttl = Duration::from_std(StdDuration::from_secs(config.access_token_ttl_seconds))
            .map_err(|err| format!("invalid access token ttl: {err}"))?;
        let refresh_ttl =
            Duration::from_std(StdDuration::from_secs(config.refresh_token_ttl_seconds))
                .map_err(|err| format!("invalid refresh token ttl: {err}"))?;
        let registry = registry::build(config.registry, pool.clone());
        info!("refresh token registry: {:?}", config.registry);

        Ok(Self::from_parts(
            pool,
            AccessTokenService::new(&access_secret, access_ttl),
            RefreshTokenService::new(&refresh_secret, refresh_ttl),
            registry,
        ))
    }

    pub fn from_parts(
        pool: DbPool,
        access: AccessTokenService,
        refresh: RefreshTokenService,
        registry: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            pool,
            access,
            refresh,
            registry,
        }
    }

    pub fn registry(&self) -> Arc<dyn RefreshTokenStore> {
        self.registry.clone()
    }

    pub async fn login(&self, login_id: &str, password: &str) -> Result<Session, Error> {
        let login_id = login_id.trim();
        if login_id.is_empty() || password.is_empty() {
            return Err(Error::validation_failed(
                "Login ID and password are required",
            ));
        }

        let user = {
            let conn = self.pool.get().await?;
            User::find_by_login_id(&conn, login_id).await?
        };
        let stored_hash = user.as_ref().map(|user| user.password_hash.clone());
        if !check_password(password, stored_hash).await? {
            debug!("rejected login for {}", login_id);
            return Err(Error::invalid_credentials());
        }
        let Some(user) = user else {
            return Err(Error::invalid_credentials());
        };

        let session = self.start_session(user, Utc::now()).await?;
        info!(user = session.user.id, "login");
        Ok(session)
    }

    pub async fn refresh(&self, presented: Option<&str>) -> Result<Session, Error> {
        let Some(token) = presented.filter(|token| !token.is_empty()) else {
            return Err(Error::missing_token("Refresh token not found"));
        };
        if !self.registry.contains(token).await? {
            return Err(Error::revoked_token());
        }
        let claims = match self.refresh.verify(token) {
            Ok(claims) => claims,
            Err(_) => {
                self.registry.remove(token).await?;
                return Err(Error::invalid_token("Invalid refresh token"));
            }
        };
        let Some(user) = self.find_user(claims.id).await? else {
            self.registry.remove(token).await?;
            return Err(Error::not_found("User not found"));
        };

        let now = Utc::now();
        let (access_token, _) = self.access.issue(&user, now)?;
        let RefreshToken {
            token: refresh_token,
            expires_at: refresh_expires_at,
        } = self.refresh.issue(user.id, now)?;

        // Whoever removes the old token wins; a concurrent caller holding the
        // same token gets nothing and has to log in again.
        if !self.registry.take(token).await? {
            warn!(user = user.id, "refresh token consumed concurrently");
            return Err(Error::revoked_token());
        }
        self.registry
            .insert(&refresh_token, refresh_expires_at)
            .await?;
        debug!(user = user.id, "rotated refresh token");

        Ok(Session {
            access_token,
            refresh_token,
            refresh_expires_at,
            user,
        })
    }

    pub async fn logout(&self, presented: Option<&str>) -> Result<(), Error> {
        if let Some(token) = presented.filter(|token| !token.is_empty()) {
            self.registry.remove(token).await?;
        }
        Ok(())
    }

    /// Stateless: signature and expiry only, the registry is never consulted.
    pub fn authenticate(&self, token: &str) -> Result<AccessClaims, Error> {
        self.access
            .verify(token)
            .map_err(|_| Error::invalid_token("Invalid or expired token"))
    }

    async fn start_session(&self, user: User, now: DateTime<Utc>) -> Result<Session, Error> {
        let (access_token, _) = self.access.issue(&user, now)?;
        let RefreshToken {
            token: refresh_token,
            expires_at: refresh_expires_at,
        } = self.refresh.issue(user.id, now)?;
        self.registry
            .insert(&refresh_token, refresh_expires_at)
            .await?;

        Ok(Session {
            access_token,
            refresh_token,
            refresh_expires_at,
            user,
        })
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, Error> {
        let conn = self.pool.get().await?;
        User::find_by_id(&conn, id).await
    }
}

async fn resolve_secret(pool: &DbPool, configured: &str, kind: SecretKind) -> Result<String, String> {
    if !configured.is_empty() {
        return Ok(configured.to_owned());
    }
    AuthSecretRecord::load_or_create(pool, kind)
        .await
        .map_err(|err| err.to_string())
}

async fn check_password(password: &str, stored_hash: Option<String>) -> Result<bool, Error> {
    let password = password.to_owned();
    let verified = tokio::task::spawn_blocking(move || match stored_hash {
        Some(hash) => verify_password(&password, &hash),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                verify_password(&password, dummy);
            }
            false
        }
    })
    .await?;
    Ok(verified)
}
