//! Repository traits for domain entities.
//!
//! Every task and done-entry operation takes the owner explicitly and only
//! ever sees rows belonging to that owner. A row owned by someone else is
//! indistinguishable from a row that does not exist.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{
    DoneEntry, DoneEntryId, NewDoneEntry, NewTask, NewUser, Task, TaskFilter, TaskId, User,
    UserId,
};

// =============================================================================
// Repository Error
// =============================================================================

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Entity was not found (or is owned by someone else).
    #[error("Entity not found: {0}")]
    NotFound(String),

    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Outcome of a bulk reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderOutcome {
    /// Every id belonged to the owner and received its new position.
    Applied,
    /// At least one id was unknown or owned by someone else; nothing changed.
    UnknownIds,
}

// =============================================================================
// User Repository
// =============================================================================

/// Repository trait for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user.
    ///
    /// Returns `RepositoryError::Conflict` if the username is taken.
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Finds a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Finds a user by exact username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Deletes a user together with all of their tasks and done entries.
    ///
    /// Returns `Ok(true)` if the user was deleted, `Ok(false)` if it didn't exist.
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError>;
}

// =============================================================================
// Task Repository
// =============================================================================

/// Repository trait for Task entities.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a task at the end of its owner's list.
    ///
    /// The new `order` is one more than the owner's current maximum, or 0 if
    /// the owner has no tasks. The max lookup and the insert are atomic with
    /// respect to other inserts by the same owner.
    async fn insert_next(&self, task: NewTask) -> Result<Task, RepositoryError>;

    /// Lists the owner's tasks in display order.
    async fn list_for_owner(
        &self,
        owner: UserId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, RepositoryError>;

    /// Finds one of the owner's tasks.
    async fn find_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Task>, RepositoryError>;

    /// Persists text, tag, schedule and completion of an existing task.
    ///
    /// `order`, `owner` and `created_at` are never written. Returns the stored
    /// task with a fresh `updated_at`, or `RepositoryError::NotFound` if the
    /// task no longer exists for `task.owner`.
    async fn update(&self, task: &Task) -> Result<Task, RepositoryError>;

    /// Deletes one of the owner's tasks. Remaining `order` values are untouched.
    ///
    /// Returns `Ok(true)` if the task was deleted, `Ok(false)` if it didn't exist.
    async fn delete_for_owner(&self, owner: UserId, id: TaskId) -> Result<bool, RepositoryError>;

    /// Sets `order = position` for each id in `ordered`, all or nothing.
    ///
    /// `ordered` must not contain duplicates.
    async fn reorder(
        &self,
        owner: UserId,
        ordered: &[TaskId],
    ) -> Result<ReorderOutcome, RepositoryError>;
}

// =============================================================================
// Done Entry Repository
// =============================================================================

/// Repository trait for journal entries.
#[async_trait]
pub trait DoneEntryRepository: Send + Sync {
    /// Inserts an entry.
    async fn insert(&self, entry: NewDoneEntry) -> Result<DoneEntry, RepositoryError>;

    /// Lists the owner's entries in display order, optionally for one date only.
    async fn list_for_owner(
        &self,
        owner: UserId,
        entry_date: Option<NaiveDate>,
    ) -> Result<Vec<DoneEntry>, RepositoryError>;

    /// Finds one of the owner's entries.
    async fn find_for_owner(
        &self,
        owner: UserId,
        id: DoneEntryId,
    ) -> Result<Option<DoneEntry>, RepositoryError>;

    /// Persists date, type and text of an existing entry.
    async fn update(&self, entry: &DoneEntry) -> Result<DoneEntry, RepositoryError>;

    /// Deletes one of the owner's entries.
    async fn delete_for_owner(
        &self,
        owner: UserId,
        id: DoneEntryId,
    ) -> Result<bool, RepositoryError>;
}
