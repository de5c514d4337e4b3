//! `PostgreSQL` repository implementations.
//!
//! These implementations use `sqlx` with plain column mapping. The schema
//! lives in `migrations/` and is applied by [`run_migrations`] at startup.
//!
//! # Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - `ON DELETE CASCADE` from users to tasks and done entries
//! - Task creation locks the owner's row so concurrent inserts never share an `order`
//! - Reorder validates and rewrites positions inside one transaction
//!
//! # Table Schema
//!
//! ```sql
//! CREATE TABLE tasks (
//!     id BIGSERIAL PRIMARY KEY,
//!     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     text VARCHAR(500) NOT NULL,
//!     tag VARCHAR(50),
//!     scheduled_for DATE,
//!     done BOOLEAN NOT NULL DEFAULT FALSE,
//!     "order" INTEGER NOT NULL DEFAULT 0,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::domain::{
    DoneEntry, DoneEntryId, EntryType, NewDoneEntry, NewTask, NewUser, Tag, Task, TaskFilter,
    TaskId, Timestamp, User, UserId,
};
use crate::infrastructure::{
    DoneEntryRepository, ReorderOutcome, RepositoryError, TaskRepository, UserRepository,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, date_joined";

const TASK_COLUMNS: &str =
    r#"id, user_id, text, tag, scheduled_for, done, "order", created_at, updated_at"#;

const DONE_ENTRY_COLUMNS: &str = "id, user_id, entry_date, entry_type, text, created_at";

/// Applies the embedded schema migrations.
///
/// # Errors
///
/// Returns `RepositoryError::DatabaseError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|error| RepositoryError::DatabaseError(error.to_string()))
}

fn database_error(error: sqlx::Error) -> RepositoryError {
    RepositoryError::DatabaseError(error.to_string())
}

// =============================================================================
// Row Mapping
// =============================================================================

type UserRow = (i64, String, Option<String>, String, DateTime<Utc>);

type TaskRow = (
    i64,
    i64,
    String,
    Option<String>,
    Option<NaiveDate>,
    bool,
    i32,
    DateTime<Utc>,
    DateTime<Utc>,
);

type DoneEntryRow = (i64, i64, NaiveDate, String, String, DateTime<Utc>);

fn user_from_row(row: UserRow) -> User {
    let (id, username, email, password_hash, date_joined) = row;
    User {
        user_id: UserId::new(id),
        username,
        email,
        password_hash,
        date_joined: Timestamp::from_datetime(date_joined),
    }
}

fn task_from_row(row: TaskRow) -> Result<Task, RepositoryError> {
    let (id, user_id, text, tag, scheduled_for, done, order, created_at, updated_at) = row;
    let order = u32::try_from(order).map_err(|_| {
        RepositoryError::DatabaseError(format!("task {id} has negative order {order}"))
    })?;
    Ok(Task {
        task_id: TaskId::new(id),
        owner: UserId::new(user_id),
        text,
        tag: tag.map(Tag::new),
        scheduled_for,
        done,
        order,
        created_at: Timestamp::from_datetime(created_at),
        updated_at: Timestamp::from_datetime(updated_at),
    })
}

fn done_entry_from_row(row: DoneEntryRow) -> Result<DoneEntry, RepositoryError> {
    let (id, user_id, entry_date, entry_type, text, created_at) = row;
    let entry_type = entry_type
        .parse::<EntryType>()
        .map_err(|error| RepositoryError::DatabaseError(error.to_string()))?;
    Ok(DoneEntry {
        entry_id: DoneEntryId::new(id),
        owner: UserId::new(user_id),
        entry_date,
        entry_type,
        text,
        created_at: Timestamp::from_datetime(created_at),
    })
}

fn order_to_database(position: usize) -> Result<i32, RepositoryError> {
    i32::try_from(position)
        .map_err(|_| RepositoryError::DatabaseError("Task order overflow".to_string()))
}

// =============================================================================
// PostgreSQL User Repository
// =============================================================================

/// `PostgreSQL` implementation of `UserRepository`.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new `PostgreSQL` user repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|error| match error.as_database_error() {
                Some(database) if database.is_unique_violation() => RepositoryError::Conflict(
                    format!("username '{}' already exists", user.username),
                ),
                _ => database_error(error),
            })?;

        Ok(user_from_row(row))
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(row.map(user_from_row))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(row.map(user_from_row))
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// PostgreSQL Task Repository
// =============================================================================

/// `PostgreSQL` implementation of `TaskRepository`.
///
/// # Example
///
/// ```ignore
/// let pool = PgPool::connect("postgres://localhost/tasks").await?;
/// let repository = PostgresTaskRepository::new(pool);
///
/// let task = repository.insert_next(new_task).await?;
/// let listed = repository.list_for_owner(task.owner, &TaskFilter::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: PgPool,
}

impl PostgresTaskRepository {
    /// Creates a new `PostgreSQL` task repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    async fn insert_next(&self, task: NewTask) -> Result<Task, RepositoryError> {
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        // The owner's row serializes concurrent inserts for the same owner.
        let owner_row: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
                .bind(task.owner.get())
                .fetch_optional(&mut *transaction)
                .await
                .map_err(database_error)?;
        if owner_row.is_none() {
            return Err(RepositoryError::NotFound(format!("user {}", task.owner)));
        }

        let sql = format!(
            r#"INSERT INTO tasks (user_id, text, tag, scheduled_for, "order")
               SELECT $1, $2, $3, $4, COALESCE(MAX("order") + 1, 0)
               FROM tasks WHERE user_id = $1
               RETURNING {TASK_COLUMNS}"#
        );
        let row: TaskRow = sqlx::query_as(&sql)
            .bind(task.owner.get())
            .bind(&task.text)
            .bind(task.tag.as_ref().map(Tag::as_str))
            .bind(task.scheduled_for)
            .fetch_one(&mut *transaction)
            .await
            .map_err(database_error)?;

        transaction.commit().await.map_err(database_error)?;

        task_from_row(row)
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, RepositoryError> {
        let sql = format!(
            r#"SELECT {TASK_COLUMNS} FROM tasks
               WHERE user_id = $1
                 AND ($2::date IS NULL OR scheduled_for = $2)
                 AND ($3::text IS NULL OR tag = $3)
               ORDER BY "order" ASC, created_at DESC, id DESC"#
        );
        let rows: Vec<TaskRow> = sqlx::query_as(&sql)
            .bind(owner.get())
            .bind(filter.scheduled_for)
            .bind(filter.tag.as_ref().map(Tag::as_str))
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.into_iter().map(task_from_row).collect()
    }

    async fn find_for_owner(
        &self,
        owner: UserId,
        id: TaskId,
    ) -> Result<Option<Task>, RepositoryError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
        let row: Option<TaskRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .bind(owner.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(task_from_row).transpose()
    }

    async fn update(&self, task: &Task) -> Result<Task, RepositoryError> {
        let sql = format!(
            "UPDATE tasks SET text = $1, tag = $2, scheduled_for = $3, done = $4, \
             updated_at = NOW() WHERE id = $5 AND user_id = $6 RETURNING {TASK_COLUMNS}"
        );
        let row: Option<TaskRow> = sqlx::query_as(&sql)
            .bind(&task.text)
            .bind(task.tag.as_ref().map(Tag::as_str))
            .bind(task.scheduled_for)
            .bind(task.done)
            .bind(task.task_id.get())
            .bind(task.owner.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map_or_else(
            || Err(RepositoryError::NotFound(format!("task {}", task.task_id))),
            task_from_row,
        )
    }

    async fn delete_for_owner(&self, owner: UserId, id: TaskId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn reorder(
        &self,
        owner: UserId,
        ordered: &[TaskId],
    ) -> Result<ReorderOutcome, RepositoryError> {
        if ordered.is_empty() {
            return Ok(ReorderOutcome::Applied);
        }
        order_to_database(ordered.len() - 1)?;

        let ids: Vec<i64> = ordered.iter().map(|id| id.get()).collect();
        let mut transaction = self.pool.begin().await.map_err(database_error)?;

        let owned: Vec<(i64,)> =
            sqlx::query_as("SELECT id FROM tasks WHERE user_id = $1 AND id = ANY($2) FOR UPDATE")
                .bind(owner.get())
                .bind(&ids)
                .fetch_all(&mut *transaction)
                .await
                .map_err(database_error)?;

        if owned.len() != ids.len() {
            transaction.rollback().await.map_err(database_error)?;
            return Ok(ReorderOutcome::UnknownIds);
        }

        sqlx::query(
            r#"UPDATE tasks AS t SET "order" = (v.position - 1)::integer
               FROM UNNEST($2::bigint[]) WITH ORDINALITY AS v(id, position)
               WHERE t.id = v.id AND t.user_id = $1"#,
        )
        .bind(owner.get())
        .bind(&ids)
        .execute(&mut *transaction)
        .await
        .map_err(database_error)?;

        transaction.commit().await.map_err(database_error)?;

        Ok(ReorderOutcome::Applied)
    }
}

// =============================================================================
// PostgreSQL Done Entry Repository
// =============================================================================

/// `PostgreSQL` implementation of `DoneEntryRepository`.
#[derive(Debug, Clone)]
pub struct PostgresDoneEntryRepository {
    pool: PgPool,
}

impl PostgresDoneEntryRepository {
    /// Creates a new `PostgreSQL` done-entry repository with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DoneEntryRepository for PostgresDoneEntryRepository {
    async fn insert(&self, entry: NewDoneEntry) -> Result<DoneEntry, RepositoryError> {
        let sql = format!(
            "INSERT INTO done_entries (user_id, entry_date, entry_type, text) \
             VALUES ($1, $2, $3, $4) RETURNING {DONE_ENTRY_COLUMNS}"
        );
        let row: DoneEntryRow = sqlx::query_as(&sql)
            .bind(entry.owner.get())
            .bind(entry.entry_date)
            .bind(entry.entry_type.as_str())
            .bind(&entry.text)
            .fetch_one(&self.pool)
            .await
            .map_err(database_error)?;

        done_entry_from_row(row)
    }

    async fn list_for_owner(
        &self,
        owner: UserId,
        entry_date: Option<NaiveDate>,
    ) -> Result<Vec<DoneEntry>, RepositoryError> {
        let sql = format!(
            "SELECT {DONE_ENTRY_COLUMNS} FROM done_entries \
             WHERE user_id = $1 AND ($2::date IS NULL OR entry_date = $2) \
             ORDER BY entry_date DESC, created_at DESC, id DESC"
        );
        let rows: Vec<DoneEntryRow> = sqlx::query_as(&sql)
            .bind(owner.get())
            .bind(entry_date)
            .fetch_all(&self.pool)
            .await
            .map_err(database_error)?;

        rows.into_iter().map(done_entry_from_row).collect()
    }

    async fn find_for_owner(
        &self,
        owner: UserId,
        id: DoneEntryId,
    ) -> Result<Option<DoneEntry>, RepositoryError> {
        let sql =
            format!("SELECT {DONE_ENTRY_COLUMNS} FROM done_entries WHERE id = $1 AND user_id = $2");
        let row: Option<DoneEntryRow> = sqlx::query_as(&sql)
            .bind(id.get())
            .bind(owner.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map(done_entry_from_row).transpose()
    }

    async fn update(&self, entry: &DoneEntry) -> Result<DoneEntry, RepositoryError> {
        let sql = format!(
            "UPDATE done_entries SET entry_date = $1, entry_type = $2, text = $3 \
             WHERE id = $4 AND user_id = $5 RETURNING {DONE_ENTRY_COLUMNS}"
        );
        let row: Option<DoneEntryRow> = sqlx::query_as(&sql)
            .bind(entry.entry_date)
            .bind(entry.entry_type.as_str())
            .bind(&entry.text)
            .bind(entry.entry_id.get())
            .bind(entry.owner.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)?;

        row.map_or_else(
            || Err(RepositoryError::NotFound(format!("done entry {}", entry.entry_id))),
            done_entry_from_row,
        )
    }

    async fn delete_for_owner(
        &self,
        owner: UserId,
        id: DoneEntryId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM done_entries WHERE id = $1 AND user_id = $2")
            .bind(id.get())
            .bind(owner.get())
            .execute(&self.pool)
            .await
            .map_err(database_error)?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Tests
// =============================================================================
