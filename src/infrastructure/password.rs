//! Argon2id password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking thread pool.

use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::RngCore;
use thiserror::Error;
use tokio::sync::OnceCell;

const SALT_SIZE: usize = 16;

/// Hash of a throwaway password, computed on first use.
static DUMMY_HASH: OnceCell<String> = OnceCell::const_new();

/// Errors raised while hashing or verifying passwords.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    /// The hasher rejected its input.
    #[error("Password hashing failed: {0}")]
    Hash(String),

    /// The stored hash is not a valid PHC string.
    #[error("Stored password hash is invalid: {0}")]
    InvalidHash(String),

    /// The blocking task panicked or was cancelled.
    #[error("Password task failed: {0}")]
    TaskFailed(String),
}

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    let mut salt = [0u8; SALT_SIZE];
    rand::rng().fill_bytes(&mut salt);
    let salt =
        SaltString::encode_b64(&salt).map_err(|error| PasswordError::Hash(error.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|error| PasswordError::Hash(error.to_string()))
}

fn verify_blocking(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|error| PasswordError::InvalidHash(error.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(error) => Err(PasswordError::InvalidHash(error.to_string())),
    }
}

/// Hashes `password` into an Argon2id PHC string with a random salt.
///
/// # Errors
///
/// Returns `PasswordError` if hashing fails or the blocking task dies.
pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|error| PasswordError::TaskFailed(error.to_string()))?
}

/// Checks `password` against a stored PHC string.
///
/// A wrong password is `Ok(false)`, not an error.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `stored_hash` cannot be parsed.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_blocking(&password, &stored_hash))
        .await
        .map_err(|error| PasswordError::TaskFailed(error.to_string()))?
}

/// Runs a full Argon2 verify against a throwaway hash and discards the result.
///
/// Used when there is no stored hash to check, so that the caller spends the
/// same time as it would on a wrong password.
///
/// # Errors
///
/// Returns `PasswordError` if the throwaway hash cannot be created or checked.
pub async fn verify_dummy_password(password: String) -> Result<(), PasswordError> {
    let hash = DUMMY_HASH
        .get_or_try_init(|| hash_password("no-such-user-password".to_string()))
        .await?
        .clone();
    verify_password(password, hash).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("correct horse".to_string()).await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(
            verify_password("correct horse".to_string(), hash.clone())
                .await
                .unwrap()
        );
        assert!(
            !verify_password("battery staple".to_string(), hash)
                .await
                .unwrap()
        );
    }

    #[rstest]
    #[tokio::test]
    async fn test_same_password_gets_distinct_salts() {
        let first = hash_password("password123".to_string()).await.unwrap();
        let second = hash_password("password123".to_string()).await.unwrap();
        assert_ne!(first, second);
    }

    #[rstest]
    #[tokio::test]
    async fn test_verify_rejects_garbage_hash() {
        let result = verify_password("password123".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }

    #[rstest]
    #[tokio::test]
    async fn test_dummy_verify_runs_against_a_real_hash() {
        verify_dummy_password("anything".to_string()).await.unwrap();
        verify_dummy_password("something else".to_string())
            .await
            .unwrap();

        let hash = DUMMY_HASH.get().unwrap();
        assert!(hash.starts_with("$argon2id$"));
    }
}
