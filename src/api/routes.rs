//! API Routes
//!
//! Transaction endpoint definitions. Every handler receives the resolved
//! `Principal` from the auth middleware, gates the operation through the
//! authorization policy, then drives the query engine and store.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Principal, TransactionType};
use crate::error::AppError;
use crate::policy::{can_access, Operation};
use crate::query::{self, FilterCriteria, Visibility};
use crate::store::{TransactionDraft, TransactionRecord, TransactionStore};
use crate::summary::summarize;

use super::AppState;

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub transaction_date: Option<String>,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
}

impl TransactionRequest {
    /// Convert to a store draft, parsing the type string eagerly so an
    /// invalid value surfaces as a validation error rather than a
    /// deserialization failure. `default_owner` is the acting principal;
    /// an explicit owner_id in the body overrides it.
    fn into_draft(self, default_owner: Option<Uuid>) -> Result<TransactionDraft, AppError> {
        let kind = self
            .kind
            .map(|k| k.parse::<TransactionType>())
            .transpose()?;

        Ok(TransactionDraft {
            owner_id: self.owner_id.or(default_owner),
            kind,
            amount: self.amount,
            category: self.category,
            notes: self.notes,
            transaction_date: self.transaction_date,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionRecord> for TransactionResponse {
    fn from(record: TransactionRecord) -> Self {
        Self {
            id: record.id,
            owner_id: record.owner_id,
            kind: record.kind,
            amount: record.amount,
            category: record.category,
            notes: record.notes,
            transaction_date: record.transaction_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FilteredListResponse {
    pub data: Vec<TransactionResponse>,
    pub total: usize,
}

// =========================================================================
// Router
// =========================================================================

/// Transaction routes. The elevated-role gate and auth middleware are
/// layered on by the caller.
pub fn transaction_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_transaction))
        .route("/", get(list_transactions))
        .route("/recent", get(recent_transaction))
        .route("/filter", get(filter_transactions))
        .route("/summary", get(overall_summary))
        .route("/:id", put(update_transaction))
        .route("/:id", delete(delete_transaction))
}

/// Parse a path segment as a record identifier, before any store access.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::MalformedId(raw.to_string()))
}

// =========================================================================
// POST /transactions
// =========================================================================

/// Create a transaction. The owner defaults to the acting principal; the
/// body may name a different owner.
async fn create_transaction(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<TransactionRequest>,
) -> Result<(StatusCode, Json<TransactionResponse>), AppError> {
    can_access(&principal, None, Operation::Create)?;

    let draft = request.into_draft(Some(principal.id))?;
    let record = TransactionStore::new(state.pool).create(&draft).await?;

    Ok((StatusCode::CREATED, Json(record.into())))
}

// =========================================================================
// GET /transactions
// =========================================================================

/// Unfiltered listing across all owners, newest insertion first.
async fn list_transactions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    can_access(&principal, None, Operation::List)?;

    let spec = query::list_all(Visibility::All);
    let records = TransactionStore::new(state.pool).find(&spec).await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

// =========================================================================
// GET /transactions/recent
// =========================================================================

/// The caller's most recently created transaction; zero or one record.
async fn recent_transaction(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    can_access(&principal, None, Operation::List)?;

    let spec = query::most_recent(Visibility::Mine(principal.id));
    let records = TransactionStore::new(state.pool).find(&spec).await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

// =========================================================================
// GET /transactions/filter
// =========================================================================

/// Date-range and type filtered listing, ascending by transaction date,
/// across all owners.
async fn filter_transactions(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(criteria): Query<FilterCriteria>,
) -> Result<Json<FilteredListResponse>, AppError> {
    can_access(&principal, None, Operation::List)?;

    let spec = query::build_filter(&criteria, Visibility::All);
    let records = TransactionStore::new(state.pool).find(&spec).await?;

    let data: Vec<TransactionResponse> = records.into_iter().map(Into::into).collect();
    let total = data.len();

    Ok(Json(FilteredListResponse { data, total }))
}

// =========================================================================
// GET /transactions/summary
// =========================================================================

/// Global income/expense totals and balance, unfiltered.
async fn overall_summary(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<crate::summary::Summary>, AppError> {
    can_access(&principal, None, Operation::Summarize)?;

    let totals = TransactionStore::new(state.pool).aggregate_by_type().await?;

    Ok(Json(summarize(totals)))
}

// =========================================================================
// PUT /transactions/:id
// =========================================================================

/// Full replace of the mutable fields. Ownership is checked against the
/// existing record before anything is written.
async fn update_transaction(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<TransactionResponse>, AppError> {
    let id = parse_id(&id)?;
    let store = TransactionStore::new(state.pool);

    let existing = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))?;

    can_access(&principal, Some(existing.owner_id), Operation::Update)?;

    let draft = request.into_draft(None)?;
    let record = store.update(id, &draft).await?;

    Ok(Json(record.into()))
}

// =========================================================================
// DELETE /transactions/:id
// =========================================================================

/// Hard delete.
async fn delete_transaction(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_id(&id)?;
    let store = TransactionStore::new(state.pool);

    let existing = store
        .get(id)
        .await?
        .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))?;

    can_access(&principal, Some(existing.owner_id), Operation::Delete)?;

    store.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
