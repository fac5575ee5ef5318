//! User and session repository
//!
//! Persistence for the identity provider: user accounts, opaque sessions,
//! and password-reset tokens. All queries are runtime-checked against the
//! pool; callers translate absence into the appropriate error kind.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Principal, Role};
use crate::error::{AppError, AppResult};

/// A user account as exposed to callers (no secret columns).
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: Option<String>,
    pub role: Role,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Credentials row used only by login.
#[derive(Debug)]
pub struct CredentialRow {
    pub account: UserAccount,
    pub password_salt: String,
    pub password_hash: String,
}

/// Fields for registering a new user.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub mobile: Option<String>,
    pub password_salt: String,
    pub password_hash: String,
}

/// Partial profile update; None leaves the column untouched.
#[derive(Debug, Default)]
pub struct ProfilePatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub mobile: Option<String>,
}

type UserRow = (
    Uuid,
    String,
    String,
    String,
    Option<String>,
    String,
    bool,
    DateTime<Utc>,
    DateTime<Utc>,
);

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, mobile, role, is_blocked, created_at, updated_at";

fn row_to_account(row: UserRow) -> AppResult<UserAccount> {
    let (id, email, first_name, last_name, mobile, role, is_blocked, created_at, updated_at) = row;
    let role = role
        .parse::<Role>()
        .map_err(|e| AppError::Internal(format!("Corrupt role column for user {id}: {e}")))?;

    Ok(UserAccount {
        id,
        email,
        first_name,
        last_name,
        mobile,
        role,
        is_blocked,
        created_at,
        updated_at,
    })
}

/// Repository over users, sessions, and reset tokens.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new user. Email uniqueness is enforced here, before any
    /// insert is attempted.
    pub async fn create(&self, user: NewUser) -> AppResult<UserAccount> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(&user.email)
                .fetch_one(&self.pool)
                .await?;

        if exists {
            return Err(AppError::UserAlreadyExists(user.email));
        }

        let sql = format!(
            "INSERT INTO users (id, email, first_name, last_name, mobile, role, password_salt, password_hash) \
             VALUES ($1, $2, $3, $4, $5, 'user', $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.mobile)
            .bind(&user.password_salt)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await?;

        row_to_account(row)
    }

    /// Fetch account plus credential columns for login.
    pub async fn find_credentials(&self, email: &str) -> AppResult<Option<CredentialRow>> {
        let sql = format!(
            "SELECT {USER_COLUMNS}, password_salt, password_hash FROM users WHERE email = $1"
        );
        let row: Option<(
            Uuid,
            String,
            String,
            String,
            Option<String>,
            String,
            bool,
            DateTime<Utc>,
            DateTime<Utc>,
            String,
            String,
        )> = sqlx::query_as(&sql).bind(email).fetch_optional(&self.pool).await?;

        row.map(|r| {
            let (id, email, first_name, last_name, mobile, role, is_blocked, created_at, updated_at, password_salt, password_hash) = r;
            let account = row_to_account((
                id, email, first_name, last_name, mobile, role, is_blocked, created_at, updated_at,
            ))?;
            Ok(CredentialRow {
                account,
                password_salt,
                password_hash,
            })
        })
        .transpose()
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Option<UserAccount>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_account).transpose()
    }

    pub async fn list(&self) -> AppResult<Vec<UserAccount>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at");
        let rows: Vec<UserRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_account).collect()
    }

    /// Patch the caller's own profile; absent fields keep their value.
    pub async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> AppResult<UserAccount> {
        let sql = format!(
            "UPDATE users SET \
                email = COALESCE($2, email), \
                first_name = COALESCE($3, first_name), \
                last_name = COALESCE($4, last_name), \
                mobile = COALESCE($5, mobile), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(&patch.email)
            .bind(&patch.first_name)
            .bind(&patch.last_name)
            .bind(&patch.mobile)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_account)
            .transpose()?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Block or unblock a user. Blocked users fail session verification on
    /// their next request.
    pub async fn set_blocked(&self, id: Uuid, blocked: bool) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET is_blocked = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(blocked)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn update_password(&self, id: Uuid, salt: &str, hash: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE users SET password_salt = $2, password_hash = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(salt)
        .bind(hash)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    // -- Sessions ---------------------------------------------------------

    pub async fn create_session(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> AppResult<()> {
        let expires_at = Utc::now() + ttl;
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Resolve a session token hash into a Principal. Expired sessions,
    /// unknown tokens, and blocked users all resolve to None; the caller
    /// turns that into an authentication failure.
    pub async fn find_principal(&self, token_hash: &str) -> AppResult<Option<Principal>> {
        let row: Option<(Uuid, String, bool)> = sqlx::query_as(
            r#"
            SELECT u.id, u.role, u.is_blocked
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((_, _, true)) | None => Ok(None),
            Some((id, role, false)) => {
                let role = role.parse::<Role>().map_err(|e| {
                    AppError::Internal(format!("Corrupt role column for user {id}: {e}"))
                })?;
                Ok(Some(Principal::new(id, role)))
            }
        }
    }

    pub async fn delete_session(&self, token_hash: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- Password reset ---------------------------------------------------

    /// Persist a hashed reset token on the user row, valid for 30 minutes.
    pub async fn set_reset_token(&self, user_id: Uuid, token_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_hash = $2,
                password_reset_expires = NOW() + INTERVAL '30 minutes',
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Consume a reset token: set the new credentials and clear the token
    /// in one statement, only if the token is still valid.
    pub async fn reset_password(
        &self,
        token_hash: &str,
        salt: &str,
        hash: &str,
    ) -> AppResult<Option<Uuid>> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE users
            SET password_salt = $2,
                password_hash = $3,
                password_reset_hash = NULL,
                password_reset_expires = NULL,
                updated_at = NOW()
            WHERE password_reset_hash = $1 AND password_reset_expires > NOW()
            RETURNING id
            "#,
        )
        .bind(token_hash)
        .bind(salt)
        .bind(hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user_id)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserAccount>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_account).transpose()
    }
}
