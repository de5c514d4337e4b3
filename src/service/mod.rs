//! Application services.
//!
//! Services own the business rules (tag resolution, order assignment,
//! ownership scoping, credential checks) and sit between the HTTP handlers and
//! the repositories. Every operation takes the owner explicitly.

pub mod accounts;
pub mod done_entries;
pub mod tasks;

pub use accounts::{AccountService, RegisterInput, Registration};
pub use done_entries::{CreateDoneEntryInput, DoneEntryService, UpdateDoneEntryInput};
pub use tasks::{CreateTaskInput, TaskService, UpdateTaskInput};

use thiserror::Error;

use crate::domain::{FieldError, MAX_TEXT_LENGTH, ValidationError};
use crate::infrastructure::{PasswordError, RepositoryError, TokenError};

pub(crate) const BLANK_MESSAGE: &str = "This field may not be blank.";
pub(crate) const REQUIRED_MESSAGE: &str = "This field is required.";

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The resource does not exist for this owner.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A reorder named ids that are missing or owned by someone else.
    #[error("Some task IDs are invalid or do not belong to you")]
    NotOwned,

    /// Credentials or token were rejected.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Hashing or signing failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<PasswordError> for ServiceError {
    fn from(error: PasswordError) -> Self {
        Self::Internal(error.to_string())
    }
}

impl From<TokenError> for ServiceError {
    fn from(error: TokenError) -> Self {
        match error {
            TokenError::Signing(message) => Self::Internal(message),
            other => Self::Authentication(other.to_string()),
        }
    }
}

/// Checks journal and task text: non-empty and at most 500 characters.
pub(crate) fn validate_text(field: &str, text: String) -> Result<String, FieldError> {
    if text.is_empty() {
        return Err(FieldError::new(field, BLANK_MESSAGE));
    }
    if text.chars().count() > MAX_TEXT_LENGTH {
        return Err(FieldError::new(
            field,
            format!("Ensure this field has no more than {MAX_TEXT_LENGTH} characters."),
        ));
    }
    Ok(text)
}
