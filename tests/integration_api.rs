//! API Integration Tests
//!
//! Exercise the full router against a live PostgreSQL. Each test skips
//! (and says so) when DATABASE_URL is not set.

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

mod common;

fn app(pool: sqlx::PgPool) -> Router {
    fintrack::build_router(fintrack::app_state(pool, 72))
}

fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"));

    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn create_transaction(app: &Router, token: &str, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(authed("POST", "/api/v1/transactions", token, Some(body)))
        .await
        .unwrap();
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "transaction creation failed"
    );
    body_json(response).await
}

// =========================================================================
// Round-trip and validation
// =========================================================================

#[tokio::test]
async fn test_create_and_read_back() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    let created = create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({
            "type": "expense",
            "amount": 42.50,
            "category": "food",
            "transaction_date": "2024-03-01"
        }),
    )
    .await;

    assert_eq!(created["type"], "expense");
    assert_eq!(created["amount"], "42.50");
    assert_eq!(created["category"], "food");
    assert_eq!(created["owner_id"], common::ADMIN_A_ID);

    // Read back through the listing
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", common::ADMIN_A_TOKEN, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let listed = body_json(response).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], created["id"]);
    assert_eq!(listed[0]["type"], "expense");
    assert_eq!(listed[0]["amount"], "42.50");
    assert_eq!(listed[0]["category"], "food");
    assert_eq!(listed[0]["transaction_date"], created["transaction_date"]);
}

#[tokio::test]
async fn test_create_validation_failures() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    let cases = [
        // missing amount
        json!({"type": "expense", "category": "food", "transaction_date": "2024-03-01"}),
        // amount not positive
        json!({"type": "expense", "amount": 0, "category": "food", "transaction_date": "2024-03-01"}),
        json!({"type": "expense", "amount": -5, "category": "food", "transaction_date": "2024-03-01"}),
        // type outside the closed set
        json!({"type": "transfer", "amount": 10, "category": "food", "transaction_date": "2024-03-01"}),
        // blank category
        json!({"type": "income", "amount": 10, "category": "   ", "transaction_date": "2024-03-01"}),
        // unparseable date
        json!({"type": "income", "amount": 10, "category": "pay", "transaction_date": "03/01/2024"}),
        // future date
        json!({"type": "income", "amount": 10, "category": "pay", "transaction_date": "2099-01-01"}),
    ];

    for body in cases {
        let response = app
            .clone()
            .oneshot(authed(
                "POST",
                "/api/v1/transactions",
                common::ADMIN_A_TOKEN,
                Some(body.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected validation failure for {body}"
        );
    }

    // Nothing was written
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", common::ADMIN_A_TOKEN, None))
        .await
        .unwrap();
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_future_date_rejected_on_update_too() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    let created = create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "expense", "amount": 10, "category": "food", "transaction_date": "2024-03-01"}),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/transactions/{id}"),
            common::ADMIN_A_TOKEN,
            Some(json!({"type": "expense", "amount": 10, "category": "food", "transaction_date": "2099-01-01"})),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =========================================================================
// Filtering
// =========================================================================

#[tokio::test]
async fn test_filter_date_boundaries_inclusive() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    // One record exactly at the lower bound, one a millisecond before it
    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "income", "amount": 100, "category": "salary",
               "transaction_date": "2024-01-01T00:00:00.000Z"}),
    )
    .await;
    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "income", "amount": 200, "category": "salary",
               "transaction_date": "2023-12-31T23:59:59.999Z"}),
    )
    .await;

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/filter?from_date=2024-01-01",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["amount"], "100.00");

    // The boundary record is also inside an inclusive to_date of its own day
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/filter?to_date=2023-12-31",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["amount"], "200.00");
}

#[tokio::test]
async fn test_filter_type_and_ordering() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "expense", "amount": 30, "category": "later",
               "transaction_date": "2024-02-15"}),
    )
    .await;
    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "expense", "amount": 10, "category": "earlier",
               "transaction_date": "2024-02-01"}),
    )
    .await;
    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "income", "amount": 500, "category": "salary",
               "transaction_date": "2024-02-10"}),
    )
    .await;

    // Type restriction plus ascending date order
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/filter?type=expense",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["data"][0]["category"], "earlier");
    assert_eq!(body["data"][1]["category"], "later");

    // type=both imposes no restriction
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/filter?type=both",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["total"], 3);

    // An unknown type value is a client error, not an empty result
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/filter?type=garbage",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =========================================================================
// Summary
// =========================================================================

#[tokio::test]
async fn test_summary_balance_identity() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    // Empty table summarizes to zeroes
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/summary",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_income"], "0");
    assert_eq!(body["total_expense"], "0");
    assert_eq!(body["balance"], "0");

    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "income", "amount": 1500, "category": "salary", "transaction_date": "2024-01-05"}),
    )
    .await;
    create_transaction(
        &app,
        common::ADMIN_B_TOKEN,
        json!({"type": "expense", "amount": 400.25, "category": "rent", "transaction_date": "2024-01-06"}),
    )
    .await;
    create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "expense", "amount": 99.75, "category": "food", "transaction_date": "2024-01-07"}),
    )
    .await;

    // The aggregate spans all owners
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/summary",
            common::ADMIN_B_TOKEN,
            None,
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total_income"], "1500.00");
    assert_eq!(body["total_expense"], "500.00");
    assert_eq!(body["balance"], "1000.00");
}

// =========================================================================
// Ownership gate
// =========================================================================

#[tokio::test]
async fn test_cross_admin_ownership_gate() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    let created = create_transaction(
        &app,
        common::ADMIN_A_TOKEN,
        json!({"type": "expense", "amount": 50, "category": "tools", "transaction_date": "2024-04-01"}),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_string();
    let update_body = json!({
        "type": "expense", "amount": 60, "category": "tools", "transaction_date": "2024-04-01"
    });

    // Admin B cannot update or delete A's record
    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/transactions/{id}"),
            common::ADMIN_B_TOKEN,
            Some(update_body.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error_code"], "forbidden");

    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/v1/transactions/{id}"),
            common::ADMIN_B_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Admin B can still read it
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", common::ADMIN_B_TOKEN, None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

    // Super admin may update another owner's record
    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/transactions/{id}"),
            common::SUPER_ADMIN_TOKEN,
            Some(update_body),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["amount"], "60.00");

    // The owner deletes it; a second delete is NotFound
    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/v1/transactions/{id}"),
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            &format!("/api/v1/transactions/{id}"),
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_never_reaches_store() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            "/api/v1/transactions/not-a-uuid",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error_code"], "malformed_id");

    // Well-formed but unknown id is a distinct NotFound
    let response = app
        .clone()
        .oneshot(authed(
            "DELETE",
            "/api/v1/transactions/550e8400-e29b-41d4-a716-446655440000",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// =========================================================================
// Recent query
// =========================================================================

#[tokio::test]
async fn test_recent_returns_single_latest() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    for i in 1..=5 {
        create_transaction(
            &app,
            common::ADMIN_A_TOKEN,
            json!({"type": "expense", "amount": i, "category": format!("cat-{i}"),
                   "transaction_date": "2024-01-01"}),
        )
        .await;
    }

    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/recent",
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let records = body.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["category"], "cat-5");

    // Recent is scoped to the caller; admin B has none
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions/recent",
            common::ADMIN_B_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 0);
}

// =========================================================================
// Authentication and roles
// =========================================================================

#[tokio::test]
async fn test_authentication_and_role_gate() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    // No token
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/transactions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Unknown token
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", "bogus-token", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Expired session
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", common::EXPIRED_TOKEN, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Valid session, but plain user role
    let response = app
        .clone()
        .oneshot(authed(
            "GET",
            "/api/v1/transactions",
            common::PLAIN_USER_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_blocked_user_token_rejected() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool.clone());

    // Super admin blocks admin B
    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/auth/block/{}", common::ADMIN_B_ID),
            common::SUPER_ADMIN_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // B's existing session no longer verifies
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", common::ADMIN_B_TOKEN, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Plain admin cannot block
    let response = app
        .clone()
        .oneshot(authed(
            "PUT",
            &format!("/api/v1/auth/block/{}", common::ADMIN_A_ID),
            common::ADMIN_A_TOKEN,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_login_logout_flow() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool);

    // Register
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": "carol@example.com",
                        "first_name": "Carol",
                        "last_name": "Jones",
                        "password": "hunter2!"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["role"], "user");

    // Duplicate registration fails
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "email": "carol@example.com",
                        "first_name": "Carol",
                        "last_name": "Jones",
                        "password": "hunter2!"
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Login with bad password
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"email": "carol@example.com", "password": "wrong"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Login
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"email": "carol@example.com", "password": "hunter2!"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["email"], "carol@example.com");

    // The fresh session authenticates (though the plain role is still
    // denied transaction access)
    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Logout, then the session is gone
    let response = app
        .clone()
        .oneshot(authed("POST", "/api/v1/auth/logout", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(authed("GET", "/api/v1/transactions", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_password_reset_flow() {
    let Some((pool, _guard)) = common::setup_test_db().await else {
        return;
    };
    let app = app(pool.clone());

    // Request a reset for a seeded user
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/forgot-password")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({"email": "admin.a@test.local"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // An unknown reset token is rejected
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/api/v1/auth/reset-password/deadbeef")
                .header("content-type", "application/json")
                .body(Body::from(json!({"password": "newpass"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown email is a NotFound
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/forgot-password")
                .header("content-type", "application/json")
                .body(Body::from(json!({"email": "nobody@test.local"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
