//! Password and token digests
//!
//! Salted SHA-256 digests for passwords, random opaque tokens for sessions
//! and password resets. Tokens are stored hashed; the cleartext only ever
//! travels to the caller once.

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a random 16-byte salt, hex encoded.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a random 32-byte opaque token, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest a password with its salt.
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a password against a stored digest.
pub fn verify_password(password: &str, salt: &str, expected: &str) -> bool {
    // Hex digests have fixed length, so a simple comparison does not leak
    // length information.
    hash_password(password, salt) == expected
}

/// Digest an opaque token for at-rest storage and lookup.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
