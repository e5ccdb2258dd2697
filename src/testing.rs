//! Fixtures shared by the unit tests.

use std::{fs, path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Duration;
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    AppState, DbPool, api,
    auth::{
        AccessTokenService, CookiePolicy, RefreshTokenService, SessionManager, hash_password,
        registry::{self, RefreshTokenStore},
    },
    config::RegistryKind,
    db::{NewUser, User, test_pool},
};

pub const PASSWORD: &str = "secret1";

pub async fn create_user(pool: &DbPool, name: &str, login_id: &str) -> User {
    let conn = pool.get().await.unwrap();
    let hash = hash_password(PASSWORD).unwrap();
    User::create(&conn, NewUser::new(name, login_id, hash, "user"))
        .await
        .unwrap()
}

pub const REGISTRIES: [RegistryKind; 2] = [RegistryKind::Memory, RegistryKind::Database];

pub fn manager(pool: DbPool, registry: Arc<dyn RefreshTokenStore>) -> SessionManager {
    SessionManager::from_parts(
        pool,
        AccessTokenService::new("test-access-secret", Duration::minutes(15)),
        RefreshTokenService::new("test-refresh-secret", Duration::days(7)),
        registry,
    )
}

/// A manager over a fresh database holding `a@b.com` / [`PASSWORD`].
pub async fn manager_with_user_in(kind: RegistryKind) -> (SessionManager, User) {
    let pool = test_pool().await;
    let user = create_user(&pool, "Alice", "a@b.com").await;
    (manager(pool.clone(), registry::build(kind, pool)), user)
}

pub async fn manager_with_user() -> (SessionManager, User) {
    manager_with_user_in(RegistryKind::Memory).await
}

/// SQLite file under the temp dir, removed with its WAL files on drop.
pub struct TempDatabase {
    path: PathBuf,
    url: String,
}

impl TempDatabase {
    pub fn new() -> Self {
        let path = std::env::temp_dir().join(format!("clouddrive-{}.db", uuid::Uuid::new_v4()));
        let url = path.to_string_lossy().into_owned();
        Self { path, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for TempDatabase {
    fn drop(&mut self) {
        fs::remove_file(&self.path).ok();
        for suffix in ["-wal", "-shm"] {
            fs::remove_file(format!("{}{suffix}", self.url)).ok();
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub sessions: Arc<SessionManager>,
}

impl TestApp {
    pub async fn new() -> Self {
        let pool = test_pool().await;
        create_user(&pool, "Alice", "a@b.com").await;
        let registry = registry::build(RegistryKind::Memory, pool.clone());
        let sessions = Arc::new(manager(pool.clone(), registry));
        let state = AppState {
            pool: pool.clone(),
            sessions: sessions.clone(),
            cookies: CookiePolicy::new(false),
        };
        let router = Router::new()
            .nest("/api", api::routes(&state))
            .with_state(state);
        Self {
            router,
            pool,
            sessions,
        }
    }

    pub async fn access_token(&self, login_id: &str) -> String {
        self.sessions
            .login(login_id, PASSWORD)
            .await
            .unwrap()
            .access_token
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, body)
    }
}

pub struct RequestBuilder {
    builder: axum::http::request::Builder,
    body: Body,
}

pub fn request(method: Method, uri: &str) -> RequestBuilder {
    RequestBuilder {
        builder: Request::builder().method(method).uri(uri),
        body: Body::empty(),
    }
}

impl RequestBuilder {
    pub fn bearer(mut self, token: &str) -> Self {
        self.builder = self
            .builder
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        self
    }

    pub fn cookie(mut self, cookie: &str) -> Self {
        self.builder = self.builder.header(header::COOKIE, cookie);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.builder = self
            .builder
            .header(header::CONTENT_TYPE, "application/json");
        self.body = Body::from(body.to_string());
        self
    }

    pub fn build(self) -> Request<Body> {
        self.builder.body(self.body).unwrap()
    }
}

/// `name=value` pair of the first Set-Cookie header.
pub fn set_cookie_pair(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::SET_COOKIE)?.to_str().ok()?;
    value.split(';').next().map(|pair| pair.trim().to_owned())
}
