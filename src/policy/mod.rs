//! Authorization Policy
//!
//! Per-operation access decisions over transaction records. The policy is a
//! pure function of the acting principal, the record's owner, and the
//! requested operation; it never touches the store and never silently
//! filters data. A denial always carries a human-readable reason that the
//! request boundary surfaces as a 403.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Principal, Role};

/// Operation requested against a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    List,
    Summarize,
    Update,
    Delete,
}

impl Operation {
    /// Operations that mutate an existing record.
    fn is_mutation_of_existing(&self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }
}

/// Structured denial with a caller-facing reason.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct PolicyDenial {
    pub reason: String,
}

impl PolicyDenial {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Decide whether `principal` may perform `operation` on a transaction owned
/// by `owner_id`.
///
/// Rules:
/// - Plain users are denied every transaction operation (the endpoints are
///   elevated-only; the policy answers for itself rather than trusting that
///   the role gate ran upstream).
/// - Elevated principals may create/read/list/summarize without ownership
///   restriction.
/// - For update/delete, a principal whose role is exactly `admin` may only
///   touch records it owns; `super_admin` and the owning admin are
///   unrestricted.
///
/// For `Create`, `List`, and `Summarize` there is no specific record;
/// callers pass `None` for `owner_id`.
pub fn can_access(
    principal: &Principal,
    owner_id: Option<Uuid>,
    operation: Operation,
) -> Result<(), PolicyDenial> {
    if !principal.is_elevated() {
        return Err(PolicyDenial::new(
            "elevated role required for transaction access",
        ));
    }

    if operation.is_mutation_of_existing() && principal.role == Role::Admin {
        match owner_id {
            Some(owner) if owner != principal.id => {
                return Err(PolicyDenial::new("cross-admin edit/delete forbidden"));
            }
            _ => {}
        }
    }

    Ok(())
}
