mod cookies;
mod manager;
mod password;
pub mod registry;
mod token;

pub use cookies::{CookiePolicy, REFRESH_COOKIE_NAME, read_refresh_token};
pub use manager::{Session, SessionManager};
pub use password::{PasswordError, hash_password, verify_password};
pub use token::{AccessClaims, AccessTokenService, RefreshTokenService, TokenError};
