//! API module
//!
//! HTTP surface: shared state, middleware, and route definitions.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use chrono::Duration;
use sqlx::PgPool;

use crate::mailer::Mailer;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub mailer: Arc<dyn Mailer>,
    pub session_ttl: Duration,
}

impl AppState {
    pub fn new(pool: PgPool, mailer: Arc<dyn Mailer>, session_ttl_hours: i64) -> Self {
        Self {
            pool,
            mailer,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }
}
