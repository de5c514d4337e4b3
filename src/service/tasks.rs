//! Task list operations.
//!
//! Creation runs the tag parser over the text, resolves the final tag and
//! appends the task after the owner's current highest `order`. Reorder
//! rewrites positions for a caller-supplied id sequence, all or nothing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use super::{ServiceError, validate_text};
use crate::domain::{
    FieldError, MAX_TAG_LENGTH, NewTask, Tag, Task, TaskFilter, TaskId, UserId, ValidationError,
    normalize_tag, parse_tag,
};
use crate::infrastructure::{ReorderOutcome, TaskRepository};

/// Input for [`TaskService::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTaskInput {
    /// Raw text, possibly containing `#hashtags`.
    pub text: String,
    /// Explicit tag; wins over an inferred one when non-empty.
    pub tag: Option<String>,
    pub scheduled_for: Option<NaiveDate>,
}

/// Input for [`TaskService::update`].
///
/// The outer `Option` is "field present"; the inner one is "value or null".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateTaskInput {
    pub text: Option<String>,
    pub tag: Option<Option<String>>,
    pub scheduled_for: Option<Option<NaiveDate>>,
    pub done: Option<bool>,
}

fn resolve_explicit_tag(raw: Option<&str>) -> Result<Option<Tag>, FieldError> {
    raw.map_or(Ok(None), |raw| {
        normalize_tag(raw).map_err(|_| {
            FieldError::new(
                "tag",
                format!("Ensure this field has no more than {MAX_TAG_LENGTH} characters."),
            )
        })
    })
}

/// Service for an owner's task list.
#[derive(Clone)]
pub struct TaskService {
    repository: Arc<dyn TaskRepository + Send + Sync>,
}

impl std::fmt::Debug for TaskService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TaskService")
            .field("repository", &"Arc<dyn TaskRepository>")
            .finish()
    }
}

impl TaskService {
    /// Creates a service over the given repository.
    #[must_use]
    pub fn new(repository: Arc<dyn TaskRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Creates a task at the end of the owner's list.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` if the cleaned text is blank or too long,
    ///   or the explicit tag is too long
    /// - `ServiceError::Repository` if the store fails
    pub async fn create(
        &self,
        owner: UserId,
        input: CreateTaskInput,
    ) -> Result<Task, ServiceError> {
        let explicit_tag = resolve_explicit_tag(input.tag.as_deref());
        let parsed = parse_tag(&input.text);
        let text = validate_text("text", parsed.text);

        let (text, explicit_tag) = match (text, explicit_tag) {
            (Ok(text), Ok(tag)) => (text, tag),
            (text, tag) => {
                let errors = [text.err(), tag.err()].into_iter().flatten().collect();
                return Err(ValidationError::new(errors).into());
            }
        };

        let task = self
            .repository
            .insert_next(NewTask {
                owner,
                text,
                tag: explicit_tag.or(parsed.tag),
                scheduled_for: input.scheduled_for,
            })
            .await?;

        tracing::info!(owner = %owner, task_id = %task.task_id, order = task.order, "Task created");
        Ok(task)
    }

    /// Lists the owner's tasks in display order.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list(
        &self,
        owner: UserId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, ServiceError> {
        let tasks = self.repository.list_for_owner(owner, filter).await?;
        tracing::debug!(owner = %owner, count = tasks.len(), "Tasks listed");
        Ok(tasks)
    }

    /// Fetches one of the owner's tasks.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the task does not exist for this owner.
    pub async fn get(&self, owner: UserId, id: TaskId) -> Result<Task, ServiceError> {
        self.repository
            .find_for_owner(owner, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Task {id}")))
    }

    /// Applies a partial update.
    ///
    /// With `text` present the text is re-parsed. An explicit non-empty tag
    /// wins; otherwise the inferred tag is used. When `tag` is absent and the
    /// new text carries no hashtag, the stored tag is kept. With only `tag`
    /// present it replaces the stored tag, and `null` or empty clears it.
    /// `order` is never changed.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the task does not exist for this owner
    /// - `ServiceError::Validation` under the same rules as `create`
    pub async fn update(
        &self,
        owner: UserId,
        id: TaskId,
        input: UpdateTaskInput,
    ) -> Result<Task, ServiceError> {
        let current = self.get(owner, id).await?;
        let mut errors = Vec::new();

        let explicit_tag = match input.tag.as_ref() {
            None => None,
            Some(raw) => match resolve_explicit_tag(raw.as_deref()) {
                Ok(tag) => Some(tag),
                Err(error) => {
                    errors.push(error);
                    None
                }
            },
        };

        let (text, tag) = match input.text {
            Some(raw) => {
                let parsed = parse_tag(&raw);
                let text = validate_text("text", parsed.text).unwrap_or_else(|error| {
                    errors.push(error);
                    String::new()
                });
                let tag = match explicit_tag {
                    Some(Some(tag)) => Some(tag),
                    Some(None) => parsed.tag,
                    None => parsed.tag.or_else(|| current.tag.clone()),
                };
                (text, tag)
            }
            None => (
                current.text.clone(),
                explicit_tag.unwrap_or_else(|| current.tag.clone()),
            ),
        };

        ValidationError::new(errors).into_result()?;

        let scheduled_for = input.scheduled_for.unwrap_or(current.scheduled_for);
        let done = input.done.unwrap_or(current.done);
        let changed = current
            .with_text(text)
            .with_tag(tag)
            .with_scheduled_for(scheduled_for)
            .with_done(done);

        let stored = self.repository.update(&changed).await?;
        tracing::info!(owner = %owner, task_id = %id, "Task updated");
        Ok(stored)
    }

    /// Deletes one of the owner's tasks without renumbering the rest.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the task does not exist for this owner.
    pub async fn delete(&self, owner: UserId, id: TaskId) -> Result<(), ServiceError> {
        if !self.repository.delete_for_owner(owner, id).await? {
            return Err(ServiceError::NotFound(format!("Task {id}")));
        }
        tracing::info!(owner = %owner, task_id = %id, "Task deleted");
        Ok(())
    }

    /// Sets each listed task's `order` to its position in `task_ids`.
    ///
    /// Tasks not in the list keep their `order`. An empty list is a no-op.
    ///
    /// # Errors
    ///
    /// - `ServiceError::Validation` if `task_ids` contains duplicates
    /// - `ServiceError::NotOwned` if any id is unknown or belongs to another owner;
    ///   nothing is changed in that case
    pub async fn reorder(&self, owner: UserId, task_ids: &[TaskId]) -> Result<(), ServiceError> {
        let mut seen = HashSet::with_capacity(task_ids.len());
        if let Some(duplicate) = task_ids.iter().find(|id| !seen.insert(**id)) {
            return Err(ValidationError::single(
                "task_ids",
                format!("Duplicate task ID {duplicate}."),
            )
            .into());
        }

        if task_ids.is_empty() {
            return Ok(());
        }

        match self.repository.reorder(owner, task_ids).await? {
            ReorderOutcome::Applied => {
                tracing::info!(owner = %owner, count = task_ids.len(), "Tasks reordered");
                Ok(())
            }
            ReorderOutcome::UnknownIds => {
                tracing::warn!(owner = %owner, count = task_ids.len(), "Reorder rejected");
                Err(ServiceError::NotOwned)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
