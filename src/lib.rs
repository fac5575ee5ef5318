//! fintrack Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod auth;
pub mod domain;
pub mod mailer;
pub mod policy;
pub mod query;
pub mod store;
pub mod summary;

// Private modules (used only by main.rs binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use domain::{Amount, AmountError, DomainError, Principal, Role, TransactionType, TypeFilter};
pub use error::{AppError, AppResult};

use std::sync::Arc;

use axum::{middleware, Router};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use api::AppState;

/// Build the application router with the full middleware chain.
///
/// Layer order (outermost first): logging -> auth -> role gate -> handler.
/// Register/login/forgot/reset and /health stay outside the auth layer.
pub fn build_router(state: AppState) -> Router {
    let transaction_routes = api::routes::transaction_router()
        .layer(middleware::from_fn(api::middleware::require_elevated));

    let protected = Router::new()
        .nest("/transactions", transaction_routes)
        .nest("/auth", auth::routes::private_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::auth_middleware,
        ));

    let public = Router::new().nest("/auth", auth::routes::public_router());

    let api_router = public
        .merge(protected)
        .layer(middleware::from_fn(api::middleware::logging_middleware));

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api_router)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Convenience constructor for the default state (log-transport mailer).
pub fn app_state(pool: PgPool, session_ttl_hours: i64) -> AppState {
    AppState::new(pool, Arc::new(mailer::LogMailer), session_ttl_hours)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
