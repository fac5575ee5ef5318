//! Common test utilities

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use fintrack::auth::password::{generate_salt, hash_password, hash_token};

/// Seeded principals and their session tokens.
pub const ADMIN_A_TOKEN: &str = "admin-a-test-token";
pub const ADMIN_B_TOKEN: &str = "admin-b-test-token";
pub const SUPER_ADMIN_TOKEN: &str = "super-admin-test-token";
pub const PLAIN_USER_TOKEN: &str = "plain-user-test-token";
pub const EXPIRED_TOKEN: &str = "expired-test-token";

pub const ADMIN_A_ID: &str = "00000000-0000-0000-0000-00000000000a";
pub const ADMIN_B_ID: &str = "00000000-0000-0000-0000-00000000000b";
pub const SUPER_ADMIN_ID: &str = "00000000-0000-0000-0000-00000000000c";
pub const PLAIN_USER_ID: &str = "00000000-0000-0000-0000-00000000000d";

/// The suite shares one database; tests that mutate it take this lock so a
/// truncation in one test cannot interleave with another.
static DB_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Setup test database: truncate tables and seed principals with sessions.
/// Returns None (skip) when DATABASE_URL is not set, so the suite stays
/// green without a database.
pub async fn setup_test_db() -> Option<(PgPool, MutexGuard<'static, ()>)> {
    dotenvy::dotenv().ok();
    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: DATABASE_URL not set");
            return None;
        }
    };

    let guard = DB_LOCK.get_or_init(|| Mutex::new(())).lock().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    sqlx::query("TRUNCATE TABLE transactions, sessions, users CASCADE")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    seed_user(&pool, ADMIN_A_ID, "admin.a@test.local", "admin", false).await;
    seed_user(&pool, ADMIN_B_ID, "admin.b@test.local", "admin", false).await;
    seed_user(&pool, SUPER_ADMIN_ID, "super@test.local", "super_admin", false).await;
    seed_user(&pool, PLAIN_USER_ID, "user@test.local", "user", false).await;

    seed_session(&pool, ADMIN_A_ID, ADMIN_A_TOKEN, false).await;
    seed_session(&pool, ADMIN_B_ID, ADMIN_B_TOKEN, false).await;
    seed_session(&pool, SUPER_ADMIN_ID, SUPER_ADMIN_TOKEN, false).await;
    seed_session(&pool, PLAIN_USER_ID, PLAIN_USER_TOKEN, false).await;
    seed_session(&pool, PLAIN_USER_ID, EXPIRED_TOKEN, true).await;

    Some((pool, guard))
}

async fn seed_user(pool: &PgPool, id: &str, email: &str, role: &str, blocked: bool) {
    let id: Uuid = id.parse().expect("Invalid seed user id");
    let salt = generate_salt();
    let hash = hash_password("test-password", &salt);

    sqlx::query(
        r#"
        INSERT INTO users (id, email, first_name, last_name, role, is_blocked, password_salt, password_hash)
        VALUES ($1, $2, 'Test', 'User', $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(email)
    .bind(role)
    .bind(blocked)
    .bind(&salt)
    .bind(&hash)
    .execute(pool)
    .await
    .expect("Failed to seed user");
}

async fn seed_session(pool: &PgPool, user_id: &str, token: &str, expired: bool) {
    let user_id: Uuid = user_id.parse().expect("Invalid seed user id");
    let interval = if expired { "-1 hour" } else { "72 hours" };

    let sql = format!(
        "INSERT INTO sessions (token_hash, user_id, expires_at) VALUES ($1, $2, NOW() + INTERVAL '{interval}')"
    );
    sqlx::query(&sql)
        .bind(hash_token(token))
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to seed session");
}
