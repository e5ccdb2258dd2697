#[macro_use]
extern crate tracing;

use std::{process, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::FromRef,
    http::{HeaderValue, Method, header},
};

use axum_extra::middleware::option_layer;
use dotenvy::dotenv;
use tokio::{net::TcpListener, sync::watch};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

mod api;
mod auth;
mod config;
mod db;
mod error;
mod middleware;
#[cfg(test)]
mod testing;
mod trace;
mod util;

pub use config::CONFIG;
pub use error::Error;

use auth::{CookiePolicy, SessionManager, registry};

pub type DbPool = deadpool_diesel::sqlite::Pool;
pub type DbConn = deadpool_diesel::sqlite::Object;

#[tokio::main]
async fn main() {
    launch_info();
    dotenv().ok();
    trace::init(&CONFIG.log);
    if let Err(err) = db::run_migrations(&CONFIG.database_url) {
        fatal(format!("failed to run migrations: {err}"));
    }
    let pool = init_dbpool();
    if let Err(err) = db::seed_admin(&pool, &CONFIG.admin).await {
        fatal(format!("failed to seed admin account: {err}"));
    }
    let sessions = match SessionManager::new(&CONFIG.auth, pool.clone()).await {
        Ok(sessions) => Arc::new(sessions),
        Err(err) => fatal(format!("failed to initialise sessions: {err}")),
    };

    let state = AppState {
        pool,
        sessions: sessions.clone(),
        cookies: CookiePolicy::new(CONFIG.production),
    };
    let cors = option_layer(cors_layer(&CONFIG.cors_origin));
    let layer = ServiceBuilder::new()
        .layer(middleware::TraceLayer)
        .layer(cors);
    let app = Router::new()
        .nest("/api", api::routes(&state))
        .with_state(state)
        .layer(layer);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = tokio::spawn(registry::launch_sweeper(
        sessions.registry(),
        Duration::from_secs(CONFIG.auth.sweep_interval_seconds),
        shutdown_rx,
    ));

    let listener = match TcpListener::bind(CONFIG.addr).await {
        Ok(listener) => listener,
        Err(err) => fatal(format!("failed to bind {}: {err}", CONFIG.addr)),
    };
    if let Ok(local_addr) = listener.local_addr() {
        info!("listening on http://{}", local_addr);
    }
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("server error: {}", err);
    }

    shutdown_tx.send(true).ok();
    if let Err(err) = sweeper.await {
        error!("refresh token sweeper failed: {}", err);
    }
    info!("shutdown complete");
}

#[derive(FromRef, Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub sessions: Arc<SessionManager>,
    pub cookies: CookiePolicy,
}

fn init_dbpool() -> DbPool {
    match db::build_pool(&CONFIG.database_url, None) {
        Ok(pool) => pool,
        Err(err) => fatal(format!("failed to build database pool: {err}")),
    }
}

/// Credentialed CORS for the single configured front-end origin.
fn cors_layer(origin: &str) -> Option<CorsLayer> {
    if origin.is_empty() {
        return None;
    }
    let origin = match HeaderValue::from_str(origin) {
        Ok(origin) => origin,
        Err(err) => {
            warn!("ignoring invalid cors origin {}: {}", origin, err);
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::OPTIONS,
            ]),
    )
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn fatal(message: String) -> ! {
    error!("{}", message);
    process::exit(1);
}

fn launch_info() {
    println!();
    println!(
        "=================== Starting CloudDrive {} ===================",
        env!("CARGO_PKG_VERSION")
    );
    println!();
}
