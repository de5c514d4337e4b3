//! User accounts.

use serde::{Deserialize, Serialize};

use super::task::Timestamp;

/// Unique identifier for a user, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a `UserId` from a raw store identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A registered user.
///
/// Owns every task and done entry created under its identity; deleting the
/// user deletes all of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Unique identifier.
    pub user_id: UserId,
    /// Login name, unique across users.
    pub username: String,
    /// Optional contact address.
    pub email: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Registration time.
    pub date_joined: Timestamp,
}

/// Data required to insert a user; the store assigns id and join date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}
