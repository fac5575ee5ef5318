//! Query/Filter Engine
//!
//! Translates caller-supplied date-range and type criteria into a
//! store-agnostic `QuerySpec`, normalizing calendar-date boundaries to
//! inclusive UTC instants. The spec is opaque to callers; only the store
//! interprets it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{TransactionType, TypeFilter};

/// Caller-supplied filter criteria, as parsed from the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub from_date: Option<NaiveDate>,
    #[serde(default)]
    pub to_date: Option<NaiveDate>,
    #[serde(default, rename = "type")]
    pub type_filter: TypeFilter,
}

/// Which owners' records a query may see.
///
/// Visibility is an explicit, named mode selected by the caller's role at
/// the route layer, never an implicit global default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only records owned by the given principal.
    Mine(Uuid),
    /// Records across all owners.
    All,
}

/// Result ordering for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ordering {
    /// Ascending by transaction date (filtered listings).
    DateAsc,
    /// Descending by insertion order (unfiltered listing).
    InsertionDesc,
    /// Descending by creation time (the "recent" query).
    CreatedDesc,
}

/// Opaque query specification consumed by the transaction store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub type_restriction: Option<TransactionType>,
    pub visibility: Visibility,
    pub ordering: Ordering,
    pub limit: Option<i64>,
}

/// Inclusive lower bound: start of day UTC (00:00:00.000).
fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Inclusive upper bound: end of day UTC (23:59:59.999).
fn end_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
        .expect("23:59:59.999 is a valid time of day");
    date.and_time(end).and_utc()
}

/// Build the spec for a filtered listing: date bounds from the criteria,
/// optional type restriction, ascending by transaction date.
pub fn build_filter(criteria: &FilterCriteria, visibility: Visibility) -> QuerySpec {
    QuerySpec {
        date_from: criteria.from_date.map(start_of_day_utc),
        date_to: criteria.to_date.map(end_of_day_utc),
        type_restriction: criteria.type_filter.restriction(),
        visibility,
        ordering: Ordering::DateAsc,
        limit: None,
    }
}

/// Spec for the unfiltered "all transactions" listing, newest insertion
/// first.
pub fn list_all(visibility: Visibility) -> QuerySpec {
    QuerySpec {
        date_from: None,
        date_to: None,
        type_restriction: None,
        visibility,
        ordering: Ordering::InsertionDesc,
        limit: None,
    }
}

/// Spec for the "recent" query: most recently created record, limit 1.
pub fn most_recent(visibility: Visibility) -> QuerySpec {
    QuerySpec {
        date_from: None,
        date_to: None,
        type_restriction: None,
        visibility,
        ordering: Ordering::CreatedDesc,
        limit: Some(1),
    }
}
