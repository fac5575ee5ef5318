//! Transaction Store
//!
//! CRUD and aggregation over the `transactions` table. Field validation
//! lives here so create and update share one rule set; nothing is written
//! unless the whole draft validates. Query execution interprets the opaque
//! `QuerySpec` produced by the query engine.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use crate::domain::{Amount, DomainError, TransactionType};
use crate::error::{AppError, AppResult};
use crate::query::{Ordering, QuerySpec, Visibility};
use crate::summary::TypeTotals;

/// A persisted transaction record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub category: String,
    pub notes: Option<String>,
    pub transaction_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for create/update. Everything is optional at this
/// stage; `validate_fields` decides what is required, so a missing field
/// surfaces as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub owner_id: Option<Uuid>,
    pub kind: Option<TransactionType>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub transaction_date: Option<String>,
}

/// A draft that passed validation, ready to persist.
#[derive(Debug, Clone)]
struct ValidatedFields {
    kind: TransactionType,
    amount: Amount,
    category: String,
    notes: Option<String>,
    transaction_date: DateTime<Utc>,
}

/// Parse a transaction date: full RFC 3339 timestamp or a bare calendar
/// date (interpreted as midnight UTC).
pub fn parse_transaction_date(input: &str) -> Result<DateTime<Utc>, DomainError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(date) = input.parse::<NaiveDate>() {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(DomainError::InvalidDate(input.to_string()))
}

/// Validate the mutable field set shared by create and update.
///
/// The future-date rule is applied here so it holds uniformly on both
/// paths, not just at creation.
fn validate_fields(draft: &TransactionDraft, now: DateTime<Utc>) -> Result<ValidatedFields, DomainError> {
    let kind = draft.kind.ok_or(DomainError::MissingField("type"))?;

    let amount = draft
        .amount
        .ok_or(DomainError::MissingField("amount"))
        .and_then(|value| Amount::new(value).map_err(DomainError::from))?;

    let category = draft
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(DomainError::MissingField("category"))?
        .to_string();

    let notes = draft
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let raw_date = draft
        .transaction_date
        .as_deref()
        .ok_or(DomainError::MissingField("transaction_date"))?;
    let transaction_date = parse_transaction_date(raw_date)?;

    if transaction_date > now {
        return Err(DomainError::FutureTransactionDate);
    }

    Ok(ValidatedFields {
        kind,
        amount,
        category,
        notes,
        transaction_date,
    })
}

type TransactionRow = (
    Uuid,
    Uuid,
    String,
    Decimal,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn row_to_record(row: TransactionRow) -> AppResult<TransactionRecord> {
    let (id, owner_id, kind, amount, category, notes, transaction_date, created_at, updated_at) =
        row;
    let kind = kind
        .parse::<TransactionType>()
        .map_err(|_| AppError::Internal(format!("Corrupt type column for transaction {id}")))?;

    Ok(TransactionRecord {
        id,
        owner_id,
        kind,
        amount,
        category,
        notes,
        transaction_date,
        created_at,
        updated_at,
    })
}

const SELECT_COLUMNS: &str =
    "id, owner_id, type, amount, category, notes, transaction_date, created_at, updated_at";

/// Transaction store over the PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct TransactionStore {
    pool: PgPool,
}

impl TransactionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new transaction after validating the full draft.
    /// `owner_id` is required in the draft; no partial write occurs on any
    /// validation failure.
    pub async fn create(&self, draft: &TransactionDraft) -> AppResult<TransactionRecord> {
        let owner_id = draft.owner_id.ok_or(DomainError::MissingField("owner_id"))?;
        let fields = validate_fields(draft, Utc::now())?;

        let row: TransactionRow = sqlx::query_as(
            r#"
            INSERT INTO transactions (id, owner_id, type, amount, category, notes, transaction_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, owner_id, type, amount, category, notes, transaction_date, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(fields.kind.as_str())
        .bind(fields.amount.value())
        .bind(&fields.category)
        .bind(&fields.notes)
        .bind(fields.transaction_date)
        .fetch_one(&self.pool)
        .await?;

        row_to_record(row)
    }

    /// Point lookup by id.
    pub async fn get(&self, id: Uuid) -> AppResult<Option<TransactionRecord>> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM transactions WHERE id = $1");
        let row: Option<TransactionRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_record).transpose()
    }

    /// Execute a query spec, preserving its ordering contract.
    pub async fn find(&self, spec: &QuerySpec) -> AppResult<Vec<TransactionRecord>> {
        let mut qb: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {SELECT_COLUMNS} FROM transactions WHERE 1=1"));

        if let Some(from) = spec.date_from {
            qb.push(" AND transaction_date >= ").push_bind(from);
        }
        if let Some(to) = spec.date_to {
            qb.push(" AND transaction_date <= ").push_bind(to);
        }
        if let Some(kind) = spec.type_restriction {
            qb.push(" AND type = ").push_bind(kind.as_str());
        }
        if let Visibility::Mine(owner_id) = spec.visibility {
            qb.push(" AND owner_id = ").push_bind(owner_id);
        }

        match spec.ordering {
            Ordering::DateAsc => qb.push(" ORDER BY transaction_date ASC, created_at ASC"),
            Ordering::InsertionDesc | Ordering::CreatedDesc => {
                qb.push(" ORDER BY created_at DESC, id DESC")
            }
        };

        if let Some(limit) = spec.limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows: Vec<TransactionRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(row_to_record).collect()
    }

    /// Overwrite the mutable fields of an existing record in a single
    /// UPDATE. The id must resolve to an existing record; the same
    /// validation as create applies, including the future-date rule.
    pub async fn update(&self, id: Uuid, draft: &TransactionDraft) -> AppResult<TransactionRecord> {
        let fields = validate_fields(draft, Utc::now())?;

        let row: Option<TransactionRow> = sqlx::query_as(
            r#"
            UPDATE transactions
            SET type = $2,
                category = $3,
                amount = $4,
                notes = $5,
                transaction_date = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, type, amount, category, notes, transaction_date, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(fields.kind.as_str())
        .bind(&fields.category)
        .bind(fields.amount.value())
        .bind(&fields.notes)
        .bind(fields.transaction_date)
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_record)
            .transpose()?
            .ok_or_else(|| AppError::TransactionNotFound(id.to_string()))
    }

    /// Hard delete. Deleting an id that no longer exists is a NotFound, so
    /// a second delete of the same id fails rather than succeeding silently.
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::TransactionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Full-table grouped aggregate: total amount per transaction type
    /// across all owners, no filter applied.
    pub async fn aggregate_by_type(&self) -> AppResult<TypeTotals> {
        let rows: Vec<(String, Decimal)> =
            sqlx::query_as("SELECT type, SUM(amount) FROM transactions GROUP BY type")
                .fetch_all(&self.pool)
                .await?;

        let mut totals = TypeTotals::default();
        for (kind, total) in rows {
            match kind.as_str() {
                "income" => totals.income = Some(total),
                "expense" => totals.expense = Some(total),
                other => tracing::warn!("Unexpected transaction type in aggregate: {}", other),
            }
        }
        Ok(totals)
    }
}
