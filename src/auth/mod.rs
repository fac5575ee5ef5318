//! Identity & Session Provider
//!
//! Registration, login, opaque session tokens, block/unblock, and the
//! password-reset flow. Transaction business logic never touches this
//! module directly; it only sees the `Principal` the middleware resolves.

pub mod password;
mod repository;
pub mod routes;

pub use repository::{CredentialRow, NewUser, ProfilePatch, UserAccount, UserRepository};
