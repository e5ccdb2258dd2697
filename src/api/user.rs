use axum::{Extension, Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    AppState, DbPool, Error,
    auth::AccessClaims,
    db::{User, UserView},
};

use super::extract::Valid;

pub fn routes() -> Router<AppState> {
    Router::new().route("/profile", get(profile).put(update_profile))
}

#[derive(Deserialize, Validate)]
struct UpdateProfile {
    #[validate(length(min = 1, max = 100))]
    name: String,
}

#[derive(Serialize)]
struct ProfileResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    user: UserView,
}

async fn profile(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
) -> Result<Json<ProfileResponse>, Error> {
    let conn = pool.get().await?;
    let Some(user) = User::find_by_id(&conn, claims.id).await? else {
        return Err(Error::not_found("User not found"));
    };
    Ok(Json(ProfileResponse {
        success: true,
        message: None,
        user: user.profile(),
    }))
}

async fn update_profile(
    State(pool): State<DbPool>,
    Extension(claims): Extension<AccessClaims>,
    Valid(request): Valid<UpdateProfile>,
) -> Result<Json<ProfileResponse>, Error> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(Error::validation_failed("name must not be blank"));
    }
    let conn = pool.get().await?;
    let Some(user) = User::update_name(&conn, claims.id, name.to_owned()).await? else {
        return Err(Error::not_found("User not found"));
    };
    Ok(Json(ProfileResponse {
        success: true,
        message: Some("Profile updated successfully"),
        user: user.profile(),
    }))
}
