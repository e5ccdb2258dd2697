use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

mod access;
mod refresh;

pub use access::{AccessClaims, AccessTokenService};
pub use refresh::{RefreshToken, RefreshTokenService};

/// Carried as the `typ` claim so one kind of token is never accepted as the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to encode token: {0}")]
    Encode(jsonwebtoken::errors::Error),
    /// Expired, tampered, wrongly signed and malformed tokens all end up here.
    #[error("Invalid or expired token")]
    Invalid,
}

trait TypedClaims {
    fn kind(&self) -> TokenKind;
}

struct Codec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl Codec {
    fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    fn sign<C: Serialize>(&self, claims: &C) -> Result<String, TokenError> {
        let header = Header::new(Algorithm::HS256);
        jsonwebtoken::encode(&header, claims, &self.encoding_key).map_err(TokenError::Encode)
    }

    fn verify<C>(&self, token: &str, kind: TokenKind) -> Result<C, TokenError>
    where
        C: DeserializeOwned + Clone + TypedClaims,
    {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let token_data = jsonwebtoken::decode::<C>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?;
        if token_data.claims.kind() != kind {
            return Err(TokenError::Invalid);
        }
        Ok(token_data.claims)
    }
}
