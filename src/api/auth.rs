use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    auth::{CookiePolicy, Session, SessionManager, read_refresh_token},
    db::UserView,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct LoginRequest {
    login_id: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    access_token: String,
    user: UserView,
}

#[derive(Serialize)]
struct LogoutResponse {
    success: bool,
    message: &'static str,
}

async fn login(
    State(sessions): State<Arc<SessionManager>>,
    State(cookies): State<CookiePolicy>,
    jar: CookieJar,
    request: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<SessionResponse>), Error> {
    let Json(request) = request?;
    let session = sessions.login(&request.login_id, &request.password).await?;
    Ok(respond(jar, &cookies, session, Some("Login successful")))
}

async fn refresh(
    State(sessions): State<Arc<SessionManager>>,
    State(cookies): State<CookiePolicy>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionResponse>), Error> {
    let presented = read_refresh_token(&jar);
    let session = sessions.refresh(presented.as_deref()).await?;
    Ok(respond(jar, &cookies, session, None))
}

async fn logout(
    State(sessions): State<Arc<SessionManager>>,
    State(cookies): State<CookiePolicy>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>), Error> {
    let presented = read_refresh_token(&jar);
    sessions.logout(presented.as_deref()).await?;
    Ok((
        jar.remove(cookies.removal()),
        Json(LogoutResponse {
            success: true,
            message: "Logged out successfully",
        }),
    ))
}

fn respond(
    jar: CookieJar,
    cookies: &CookiePolicy,
    session: Session,
    message: Option<&'static str>,
) -> (CookieJar, Json<SessionResponse>) {
    let cookie = cookies.refresh_cookie(
        session.refresh_token,
        session.refresh_expires_at,
        Utc::now(),
    );
    let jar = jar.add(cookie);
    (
        jar,
        Json(SessionResponse {
            success: true,
            message,
            access_token: session.access_token,
            user: session.user.view(),
        }),
    )
}
