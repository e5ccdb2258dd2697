use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Codec, TokenError, TokenKind, TypedClaims};

pub struct RefreshTokenService {
    codec: Codec,
    ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub id: i32,
    #[serde(rename = "tokenId")]
    pub token_id: String,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl TypedClaims for RefreshClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }
}

pub struct RefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            codec: Codec::new(secret),
            ttl,
        }
    }

    /// Every call mints a fresh `tokenId`, so two tokens for the same user never collide.
    pub fn issue(&self, user_id: i32, now: DateTime<Utc>) -> Result<RefreshToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = RefreshClaims {
            id: user_id,
            token_id: Uuid::new_v4().to_string(),
            kind: TokenKind::Refresh,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.codec.sign(&claims)?;

        Ok(RefreshToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.codec.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::AccessTokenService;

    fn service() -> RefreshTokenService {
        RefreshTokenService::new("refresh-secret", Duration::days(7))
    }

    #[test]
    fn issued_claims_verify() {
        let service = service();
        let issued = service.issue(42, Utc::now()).unwrap();

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims.id, 42);
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.exp, issued.expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 60 * 60);
        assert!(Uuid::parse_str(&claims.token_id).is_ok());
    }

    #[test]
    fn each_issuance_is_unique() {
        let service = service();
        let now = Utc::now();
        let a = service.issue(42, now).unwrap();
        let b = service.issue(42, now).unwrap();

        assert_ne!(a.token, b.token);
        assert_ne!(
            service.verify(&a.token).unwrap().token_id,
            service.verify(&b.token).unwrap().token_id
        );
    }

    #[test]
    fn token_past_its_window_is_invalid() {
        let service = service();
        let issued = service.issue(42, Utc::now() - Duration::days(8)).unwrap();

        assert!(matches!(service.verify(&issued.token), Err(TokenError::Invalid)));
    }

    #[test]
    fn refresh_token_is_not_an_access_token() {
        let shared = "shared-secret";
        let refresh = RefreshTokenService::new(shared, Duration::days(7));
        let access = AccessTokenService::new(shared, Duration::minutes(15));
        let issued = refresh.issue(42, Utc::now()).unwrap();

        assert!(matches!(access.verify(&issued.token), Err(TokenError::Invalid)));
    }
}
