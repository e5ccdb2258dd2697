use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use deadpool_diesel::{InteractError, PoolError};
use diesel::result::Error as DieselError;
use serde::Serialize;
use tokio::task::JoinError;

use crate::auth::{PasswordError, TokenError};

const INTERNAL_MESSAGE: &str = "Internal server error";
const INVALID_BODY_MESSAGE: &str = "Invalid request body";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("DeadPoolError: {0}")]
    DeadPool(DeadPoolError),
    #[error("DieselError: {0}")]
    Diesel(#[from] DieselError),
    #[error("{reason}")]
    Custom {
        status: StatusCode,
        reason: String,
        code: Option<&'static str>,
    },
    #[error("{0}")]
    Token(#[from] TokenError),
    #[error("{0}")]
    Password(#[from] PasswordError),
    #[error("{0}")]
    Json(#[from] JsonRejection),
    #[error("Tokio JoinError: {0}")]
    Join(#[from] JoinError),
}

#[derive(Serialize)]
struct ErrorJson {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            error!("{}", self);
            INTERNAL_MESSAGE.to_string()
        } else {
            debug!("{}", self);
            self.public_message()
        };
        (
            status,
            Json(ErrorJson {
                success: false,
                message,
                code: self.code(),
            }),
        )
            .into_response()
    }
}

impl Error {
    pub fn custom(status: StatusCode, reason: impl Into<String>, code: &'static str) -> Self {
        Self::Custom {
            status,
            reason: reason.into(),
            code: Some(code),
        }
    }

    pub fn validation_failed(reason: impl Into<String>) -> Self {
        Self::custom(StatusCode::BAD_REQUEST, reason, "validation_error")
    }

    pub fn invalid_credentials() -> Self {
        Self::custom(
            StatusCode::UNAUTHORIZED,
            "Invalid credentials",
            "invalid_credentials",
        )
    }

    pub fn missing_token(reason: impl Into<String>) -> Self {
        Self::custom(StatusCode::UNAUTHORIZED, reason, "missing_token")
    }

    pub fn revoked_token() -> Self {
        Self::custom(
            StatusCode::FORBIDDEN,
            "Invalid refresh token",
            "revoked_token",
        )
    }

    pub fn invalid_token(reason: impl Into<String>) -> Self {
        Self::custom(StatusCode::FORBIDDEN, reason, "invalid_token")
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::custom(StatusCode::NOT_FOUND, reason, "not_found")
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Diesel(DieselError::NotFound) => StatusCode::NOT_FOUND,
            Error::Custom { status, .. } => *status,
            Error::Token(TokenError::Invalid) => StatusCode::FORBIDDEN,
            Error::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::DeadPool(_) => Some("database_error"),
            Error::Diesel(DieselError::NotFound) => Some("not_found"),
            Error::Diesel(_) => Some("database_error"),
            Error::Custom { code, .. } => *code,
            Error::Token(TokenError::Invalid) => Some("invalid_token"),
            Error::Token(_) => Some("internal_error"),
            Error::Password(_) => Some("internal_error"),
            Error::Json(_) => Some("invalid_json"),
            Error::Join(_) => Some("internal_error"),
        }
    }

    /// Serde and content-type rejections describe our types, so only a fixed message leaves.
    fn public_message(&self) -> String {
        match self {
            Error::Json(_) => INVALID_BODY_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<InteractError> for Error {
    fn from(e: InteractError) -> Self {
        Self::DeadPool(e.into())
    }
}

impl From<PoolError> for Error {
    fn from(e: PoolError) -> Self {
        Self::DeadPool(e.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DeadPoolError {
    #[error("InteractError: {0}")]
    Interact(#[from] InteractError),
    #[error("PoolError: {0}")]
    Pool(#[from] PoolError),
}
