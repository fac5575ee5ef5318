//! Auth Routes
//!
//! HTTP surface of the identity provider: registration, login/logout,
//! profile and password management, block/unblock, and the password-reset
//! flow.

use axum::{
    extract::{Extension, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::bearer_token;
use crate::api::AppState;
use crate::domain::{Principal, Role};
use crate::error::AppError;
use crate::mailer::EmailMessage;

use super::password;
use super::repository::{NewUser, ProfilePatch, UserAccount, UserRepository};

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub mobile: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    pub role: Role,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id,
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
            mobile: account.mobile,
            role: account.role,
            is_blocked: account.is_blocked,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

fn message(text: impl Into<String>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: text.into(),
    })
}

// =========================================================================
// Routers
// =========================================================================

/// Routes reachable without a session.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", put(reset_password))
}

/// Routes that require an authenticated principal. The auth middleware is
/// layered on by the caller.
pub fn private_router() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/password", put(update_password))
        .route("/profile", put(update_profile))
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).delete(delete_user))
        .route("/block/:id", put(block_user))
        .route("/unblock/:id", put(unblock_user))
}

fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::MalformedId(raw.to_string()))
}

fn require_super_admin(principal: &Principal) -> Result<(), AppError> {
    if principal.role != Role::SuperAdmin {
        return Err(AppError::Authorization(
            "super_admin role required".to_string(),
        ));
    }
    Ok(())
}

// =========================================================================
// POST /auth/register
// =========================================================================

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("email is required".to_string()));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let salt = password::generate_salt();
    let hash = password::hash_password(&request.password, &salt);

    let repo = UserRepository::new(state.pool);
    let account = repo
        .create(NewUser {
            email: request.email.trim().to_string(),
            first_name: request.first_name,
            last_name: request.last_name,
            mobile: request.mobile,
            password_salt: salt,
            password_hash: hash,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

// =========================================================================
// POST /auth/login
// =========================================================================

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let repo = UserRepository::new(state.pool);

    let credentials = repo
        .find_credentials(&request.email)
        .await?
        .ok_or_else(|| AppError::Authentication("Invalid credentials".to_string()))?;

    if !password::verify_password(
        &request.password,
        &credentials.password_salt,
        &credentials.password_hash,
    ) {
        return Err(AppError::Authentication("Invalid credentials".to_string()));
    }

    if credentials.account.is_blocked {
        return Err(AppError::Authentication("Account is blocked".to_string()));
    }

    let token = password::generate_token();
    repo.create_session(
        credentials.account.id,
        &password::hash_token(&token),
        state.session_ttl,
    )
    .await?;

    Ok(Json(LoginResponse {
        token,
        user: credentials.account.into(),
    }))
}

// =========================================================================
// POST /auth/logout
// =========================================================================

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, AppError> {
    // The auth middleware already validated this token; it only needs to be
    // re-read to know which session to drop.
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Authentication("Missing bearer token".to_string()))?;

    UserRepository::new(state.pool)
        .delete_session(&password::hash_token(token))
        .await?;

    Ok(message("Logged out"))
}

// =========================================================================
// PUT /auth/password
// =========================================================================

async fn update_password(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if request.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let salt = password::generate_salt();
    let hash = password::hash_password(&request.password, &salt);

    UserRepository::new(state.pool)
        .update_password(principal.id, &salt, &hash)
        .await?;

    Ok(message("Password updated"))
}

// =========================================================================
// PUT /auth/profile
// =========================================================================

async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let patch = ProfilePatch {
        email: request.email,
        first_name: request.first_name,
        last_name: request.last_name,
        mobile: request.mobile,
    };

    let account = UserRepository::new(state.pool)
        .update_profile(principal.id, &patch)
        .await?;

    Ok(Json(account.into()))
}

// =========================================================================
// GET /auth/users, GET/DELETE /auth/users/:id
// =========================================================================

async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let accounts = UserRepository::new(state.pool).list().await?;
    Ok(Json(accounts.into_iter().map(Into::into).collect()))
}

async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, AppError> {
    let id = parse_id(&id)?;
    let account = UserRepository::new(state.pool)
        .get(id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;
    Ok(Json(account.into()))
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    require_super_admin(&principal)?;
    let id = parse_id(&id)?;
    UserRepository::new(state.pool).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =========================================================================
// PUT /auth/block/:id, PUT /auth/unblock/:id
// =========================================================================

async fn block_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    require_super_admin(&principal)?;
    let id = parse_id(&id)?;
    UserRepository::new(state.pool).set_blocked(id, true).await?;
    Ok(message("User blocked"))
}

async fn unblock_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    require_super_admin(&principal)?;
    let id = parse_id(&id)?;
    UserRepository::new(state.pool)
        .set_blocked(id, false)
        .await?;
    Ok(message("User unblocked"))
}

// =========================================================================
// POST /auth/forgot-password
// =========================================================================

/// Issue a password-reset token and hand the reset link to the email
/// collaborator. Delivery is fire-and-forget; a send failure is logged and
/// the request still succeeds.
async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let repo = UserRepository::new(state.pool);

    let account = repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| AppError::UserNotFound(request.email.clone()))?;

    let token = password::generate_token();
    repo.set_reset_token(account.id, &password::hash_token(&token))
        .await?;

    let email = EmailMessage {
        to: account.email.clone(),
        subject: "Forgot Password Link".to_string(),
        text: "Hey User".to_string(),
        html: format!(
            "Hi, please follow this link to reset your password. \
             This link is valid for 30 minutes. \
             <a href='/reset-password?token={token}'>Click Here</a>"
        ),
    };

    if let Err(e) = state.mailer.send(&email) {
        tracing::warn!("Password reset email delivery failed: {}", e);
    }

    Ok(message("Password reset link sent"))
}

// =========================================================================
// PUT /auth/reset-password/:token
// =========================================================================

async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<PasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if request.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let salt = password::generate_salt();
    let hash = password::hash_password(&request.password, &salt);

    let repo = UserRepository::new(state.pool);
    let user_id = repo
        .reset_password(&password::hash_token(&token), &salt, &hash)
        .await?;

    match user_id {
        Some(_) => Ok(message("Password reset successfully")),
        None => Err(AppError::Validation(
            "Reset token expired or invalid. Please try again".to_string(),
        )),
    }
}
