//! In-memory repository implementations.
//!
//! All three repositories share one [`InMemoryDatabase`], so deleting a user
//! cascades to that user's tasks and done entries the same way the
//! `PostgreSQL` foreign keys do. Suitable for tests and local development.
//!
//! # Features
//!
//! - Thread-safe with `Arc<RwLock<...>>`
//! - Order assignment and reorder run under a single write lock

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;

use crate::domain::{
    DoneEntry, DoneEntryId, NewDoneEntry, NewTask, NewUser, Task, TaskFilter, TaskId, Timestamp,
    User, UserId, display_order,
};
use crate::infrastructure::{
    DoneEntryRepository, ReorderOutcome, RepositoryError, TaskRepository, UserRepository,
};

// =============================================================================
// Shared Tables
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    tasks: BTreeMap<TaskId, Task>,
    done_entries: BTreeMap<DoneEntryId, DoneEntry>,
    last_user_id: i64,
    last_task_id: i64,
    last_done_entry_id: i64,
}

impl Tables {
    fn next_order_for(&self, owner: UserId) -> Result<u32, RepositoryError> {
        self.tasks
            .values()
            .filter(|task| task.owner == owner)
            .map(|task| task.order)
            .max()
            .map_or(Ok(0), |max| {
                max.checked_add(1).ok_or_else(|| {
                    RepositoryError::DatabaseError("Task order overflow".to_string())
                })
            })
    }
}

/// Shared in-memory storage backing the user, task and done-entry repositories.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    /// Creates a new empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a user repository backed by this database.
    #[must_use]
    pub fn user_repository(&self) -> InMemoryUserRepository {
        InMemoryUserRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    /// Returns a task repository backed by this database.
    #[must_use]
    pub fn task_repository(&self) -> InMemoryTaskRepository {
        InMemoryTaskRepository {
            tables: Arc::clone(&self.tables),
        }
    }

    /// Returns a done-entry repository backed by this database.
    #[must_use]
    pub fn done_entry_repository(&self) -> InMemoryDoneEntryRepository {
        InMemoryDoneEntryRepository {
            tables: Arc::clone(&self.tables),
        }
    }
}

// =============================================================================
// In-Memory User Repository
// =============================================================================

/// In-memory implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryUserRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut guard = self.tables.write().await;

        if guard
            .users
            .values()
            .any(|existing| existing.username == user.username)
        {
            return Err(RepositoryError::Conflict(format!(
                "username '{}' already exists",
                user.username
            )));
        }

        guard.last_user_id += 1;
        let stored = User {
            user_id: UserId::new(guard.last_user_id),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            date_joined: Timestamp::now(),
        };
        guard.users.insert(stored.user_id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let guard = self.tables.read().await;
        Ok(guard.users.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let guard = self.tables.read().await;
        Ok(guard
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut guard = self.tables.write().await;
        if guard.users.remove(&id).is_none() {
            return Ok(false);
        }
        guard.tasks.retain(|_, task| task.owner != id);
        guard.done_entries.retain(|_, entry| entry.owner != id);
        Ok(true)
    }
}

// =============================================================================
// In-Memory Task Repository
// =============================================================================

/// In-memory implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let database = InMemoryDatabase::new();
/// let repository = database.task_repository();
///
/// let task = repository.insert_next(new_task).await?;
/// let found = repository.find_for_owner(task.owner, task.task_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTaskRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl TaskRepository for InMemoryTaskRepository {
    async fn insert_next(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let mut guard = self.tables.write().await;

        // Max lookup and insert happen under the same write lock.
        let order = guard.next_order_for(task.owner)?;
        guard.last_task_id += 1;
        let now = Timestamp::now();
        let stored = Task {
            task_id: TaskId::new(guard.last_task_id),
            owner: task.owner,
            text: task.text,
            tag: task.tag,
            scheduled_for: task.scheduled_for,
            done: false,
            order,
            created_at: now,
            updated_at: now,
        };
        guard.tasks.insert(stored.task_id, stored.clone());
        Ok(stored)
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, RepositoryError> {
        let guard = self.tables.read().await;
        let mut tasks: Vec<Task> = guard
            .tasks
            .values()
            .filter(|task| task.owner == owner && filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(display_order);
        Ok(tasks)
    }

    async fn find_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Task>, RepositoryError> {
        let guard = self.tables.read().await;
        Ok(guard
            .tasks
            .get(&id)
            .filter(|task| task.owner == owner)
            .cloned())
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let mut guard = self.tables.write().await;
        let stored = guard
            .tasks
            .get_mut(&task.task_id)
            .filter(|stored| stored.owner == task.owner)
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", task.task_id)))?;

        stored.text.clone_from(&task.text);
        stored.tag.clone_from(&task.tag);
        stored.scheduled_for = task.scheduled_for;
        stored.done = task.done;
        stored.updated_at = Timestamp::now();
        Ok(stored.clone())
    }

    async fn delete_for_owner(&self, owner: UserId, id: TaskId) -> Result<bool, RepositoryError> {
        let mut guard = self.tables.write().await;
        let owned = guard.tasks.get(&id).is_some_and(|task| task.owner == owner);
        if owned {
            guard.tasks.remove(&id);
        }
        Ok(owned)
    }

    async fn reorder(
        &self,
        owner: UserId,
        ordered: &[TaskId],
    ) -> Result<ReorderOutcome, RepositoryError> {
        let mut guard = self.tables.write().await;

        let all_owned = ordered
            .iter()
            .all(|id| guard.tasks.get(id).is_some_and(|task| task.owner == owner));
        if !all_owned {
            return Ok(ReorderOutcome::UnknownIds);
        }

        for (position, id) in ordered.iter().enumerate() {
            let order = u32::try_from(position).map_err(|_| {
                RepositoryError::DatabaseError("Task order overflow".to_string())
            })?;
            if let Some(task) = guard.tasks.get_mut(id) {
                task.order = order;
            }
        }
        Ok(ReorderOutcome::Applied)
    }
}

// =============================================================================
// In-Memory Done Entry Repository
// =============================================================================

/// In-memory implementation of `DoneEntryRepository`.
#[derive(Debug, Clone)]
pub struct InMemoryDoneEntryRepository {
    tables: Arc<RwLock<Tables>>,
}

#[async_trait]
#[allow(clippy::significant_drop_tightening)]
impl DoneEntryRepository for InMemoryDoneEntryRepository {
    async fn insert(&self, entry: NewDoneEntry) -> Result<DoneEntry, RepositoryError> {
        let mut guard = self.tables.write().await;
        guard.last_done_entry_id += 1;
        let stored = DoneEntry {
            entry_id: DoneEntryId::new(guard.last_done_entry_id),
            owner: entry.owner,
            entry_date: entry.entry_date,
            entry_type: entry.entry_type,
            text: entry.text,
            created_at: Timestamp::now(),
        };
        guard.done_entries.insert(stored.entry_id, stored.clone());
        Ok(stored)
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        entry_date: Option<NaiveDate>,
    ) -> Result<Vec<DoneEntry>, RepositoryError> {
        let guard = self.tables.read().await;
        let mut entries: Vec<DoneEntry> = guard
            .done_entries
            .values()
            .filter(|entry| entry.owner == owner)
            .filter(|entry| entry_date.is_none_or(|date| entry.entry_date == date))
            .cloned()
            .collect();
        entries.sort_by(DoneEntry::display_order);
        Ok(entries)
    }

    async fn find_for_owner(
        &self,
        owner: UserId,
        id: DoneEntryId,
    ) -> Result<Option<DoneEntry>, RepositoryError> {
        let guard = self.tables.read().await;
        Ok(guard
            .done_entries
            .get(&id)
            .filter(|entry| entry.owner == owner)
            .cloned())
    }

    async fn update(&self, entry: &DoneEntry) -> Result<DoneEntry, RepositoryError> {
        let mut guard = self.tables.write().await;
        let stored = guard
            .done_entries
            .get_mut(&entry.entry_id)
            .filter(|stored| stored.owner == entry.owner)
            .ok_or_else(|| RepositoryError::NotFound(format!("done entry {}", entry.entry_id)))?;

        stored.entry_date = entry.entry_date;
        stored.entry_type = entry.entry_type;
        stored.text.clone_from(&entry.text);
        Ok(stored.clone())
    }

    async fn delete_for_owner(
        &self,
        owner: UserId,
        id: DoneEntryId,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.tables.write().await;
        let owned = guard
            .done_entries
            .get(&id)
            .is_some_and(|entry| entry.owner == owner);
        if owned {
            guard.done_entries.remove(&id);
        }
        Ok(owned)
    }
}

// =============================================================================
// Tests
// =============================================================================
