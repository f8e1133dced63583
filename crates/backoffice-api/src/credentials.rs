//! Password hashing off the async workers.
//!
//! Argon2 is deliberately slow, so both directions run on tokio's blocking
//! pool. Passwords are hashed and verified exactly as received; no path
//! trims or normalizes them.

use backoffice_auth::password::{hash_password, verify_password};

use crate::{ApiError, Result};

/// Hash `password` on the blocking pool.
pub async fn hash(password: String) -> Result<String> {
    let hashed = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("password hashing task failed: {e}")))??;
    Ok(hashed)
}

/// Check `password` against the stored `hash` on the blocking pool.
pub async fn verify(password: String, hash: String) -> Result<bool> {
    let matched = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("password check task failed: {e}")))??;
    Ok(matched)
}
