use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::db::User;

use super::{Codec, TokenError, TokenKind, TypedClaims};

pub struct AccessTokenService {
    codec: Codec,
    ttl: Duration,
}

/// Identity attached to every authenticated request.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    pub id: i32,
    pub email: String,
    pub role: String,
    #[serde(rename = "typ")]
    pub kind: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

impl TypedClaims for AccessClaims {
    fn kind(&self) -> TokenKind {
        self.kind
    }
}

impl AccessTokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            codec: Codec::new(secret),
            ttl,
        }
    }

    pub fn issue(
        &self,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), TokenError> {
        let expires_at = now + self.ttl;
        let claims = AccessClaims {
            id: user.id,
            email: user.login_id.clone(),
            role: user.role.clone(),
            kind: TokenKind::Access,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = self.codec.sign(&claims)?;

        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.codec.verify(token, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn user() -> User {
        User {
            id: 7,
            name: "Alice".into(),
            login_id: "a@b.com".into(),
            password_hash: String::new(),
            role: "admin".into(),
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    fn service(secret: &str) -> AccessTokenService {
        AccessTokenService::new(secret, Duration::minutes(15))
    }

    #[test]
    fn issued_claims_verify() {
        let service = service("access-secret");
        let now = Utc::now();
        let (token, expires_at) = service.issue(&user(), now).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.id, 7);
        assert_eq!(claims.email, "a@b.com");
        assert_eq!(claims.role, "admin");
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.exp, expires_at.timestamp());
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn expired_token_is_invalid() {
        let service = service("access-secret");
        let issued = Utc::now() - Duration::minutes(16);
        let (token, _) = service.issue(&user(), issued).unwrap();

        assert!(matches!(service.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn foreign_signature_is_invalid() {
        let (token, _) = service("one-secret").issue(&user(), Utc::now()).unwrap();

        assert!(matches!(
            service("another-secret").verify(&token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            service("access-secret").verify("not.a.jwt"),
            Err(TokenError::Invalid)
        ));
    }
}
