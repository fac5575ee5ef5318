//! API Middleware
//!
//! Bearer-token authentication, the elevated-role gate, and request logging.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::auth::{password, UserRepository};
use crate::domain::Principal;

use super::AppState;

/// Pull the bearer token out of the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty())
}

fn unauthorized(message: &str, error_code: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": message,
            "error_code": error_code
        })),
    )
        .into_response()
}

// =========================================================================
// Session Authentication Middleware
// =========================================================================

/// Resolve the bearer token into a `Principal` and store it in request
/// extensions. Unknown and expired tokens, and tokens for blocked users,
/// are all rejected here; business logic below this layer can assume a
/// principal is always present.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => {
            return Err(unauthorized(
                "No Authorization header with Bearer token",
                "missing_token",
            ));
        }
    };

    let repo = UserRepository::new(state.pool.clone());
    let principal = match repo.find_principal(&password::hash_token(token)).await {
        Ok(Some(principal)) => principal,
        Ok(None) => {
            return Err(unauthorized(
                "Token expired or invalid. Please login again",
                "invalid_token",
            ));
        }
        Err(e) => {
            tracing::error!("Database error during session validation: {}", e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Internal server error",
                    "error_code": "database_error"
                })),
            )
                .into_response());
        }
    };

    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

// =========================================================================
// Elevated-role Gate
// =========================================================================

/// Reject principals without an elevated role (admin or super_admin).
/// Applied to the whole transaction router; the policy still re-checks per
/// operation.
pub async fn require_elevated(request: Request<Body>, next: Next) -> Result<Response, Response> {
    let allowed = request
        .extensions()
        .get::<Principal>()
        .map(Principal::is_elevated)
        .unwrap_or(false);

    if !allowed {
        return Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "Access denied",
                "error_code": "forbidden"
            })),
        )
            .into_response());
    }

    Ok(next.run(request).await)
}

// =========================================================================
// Request Logging
// =========================================================================

/// Headers that should be masked in logs
const SENSITIVE_HEADERS: &[&str] = &["authorization", "cookie", "set-cookie"];

/// Mask sensitive headers for logging
pub fn mask_headers_for_logging(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name_lower = name.as_str().to_lowercase();
            let masked_value = if SENSITIVE_HEADERS.contains(&name_lower.as_str()) {
                "[REDACTED]".to_string()
            } else {
                value.to_str().unwrap_or("[invalid utf8]").to_string()
            };
            (name.to_string(), masked_value)
        })
        .collect()
}

/// Request logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    let headers = mask_headers_for_logging(request.headers());

    let start = std::time::Instant::now();

    tracing::info!(
        method = %method,
        uri = %uri,
        headers = ?headers,
        "Incoming request"
    );

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}
