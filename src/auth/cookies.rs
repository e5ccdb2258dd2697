use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use chrono::{DateTime, Utc};
use cookie::time::Duration;

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Attributes of the refresh token cookie.
#[derive(Debug, Clone)]
pub struct CookiePolicy {
    secure: bool,
}

impl CookiePolicy {
    pub fn new(secure: bool) -> Self {
        Self { secure }
    }

    /// The cookie lives exactly as long as the token it carries.
    pub fn refresh_cookie(
        &self,
        token: String,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Cookie<'static> {
        let max_age = (expires_at - now).num_seconds().max(0);
        Cookie::build((REFRESH_COOKIE_NAME, token))
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(Duration::seconds(max_age))
            .build()
    }

    /// Must share path and flags with [`Self::refresh_cookie`] or browsers keep the old one.
    pub fn removal(&self) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE_NAME)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .path("/")
            .build()
    }
}

pub fn read_refresh_token(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};

    use super::*;

    #[test]
    fn refresh_cookie_is_locked_down() {
        let now = Utc::now();
        let cookie = CookiePolicy::new(false)
            .refresh_cookie("abc".into(), now + chrono::Duration::days(7), now)
            .to_string();

        assert!(cookie.starts_with("refreshToken=abc"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn production_cookie_is_secure() {
        let now = Utc::now();
        let cookie = CookiePolicy::new(true).refresh_cookie(
            "abc".into(),
            now + chrono::Duration::minutes(1),
            now,
        );
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn expired_token_gets_a_zero_max_age() {
        let now = Utc::now();
        let cookie = CookiePolicy::new(false).refresh_cookie(
            "abc".into(),
            now - chrono::Duration::seconds(5),
            now,
        );
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[test]
    fn reads_refresh_token_from_jar() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=xyz"),
        );
        let jar = CookieJar::from_headers(&headers);
        assert_eq!(read_refresh_token(&jar).as_deref(), Some("xyz"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(read_refresh_token(&CookieJar::from_headers(&headers)), None);
        assert_eq!(read_refresh_token(&CookieJar::new()), None);
    }
}
