use axum::Router;

use crate::{AppState, Error, middleware::AuthLayer};

mod auth;
mod drive;
mod extract;
mod user;

pub fn routes(state: &AppState) -> Router<AppState> {
    let auth_layer = AuthLayer::new(state.sessions.clone());
    let protected_routes = Router::new()
        .nest("/user", user::routes().merge(drive::routes()))
        .route_layer(auth_layer);

    Router::new()
        .nest("/auth", auth::routes())
        .merge(protected_routes)
        .fallback(|| async { Error::not_found("Route not found") })
}
