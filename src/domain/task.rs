//! Task domain model.
//!
//! Tasks form a per-owner manually ordered list. The `order` field decides
//! the display sequence; ties are broken by most recent creation first.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::tag::Tag;
use super::user::UserId;

/// Maximum length of task and done-entry text, in characters.
pub const MAX_TEXT_LENGTH: usize = 500;

// =============================================================================
// Value Objects - Newtypes
// =============================================================================

/// Unique identifier for a task, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(i64);

impl TaskId {
    /// Creates a `TaskId` from a raw store identifier.
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

impl std::fmt::Display for TaskId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A timestamp wrapper for `DateTime<Utc>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a `Timestamp` from a `DateTime<Utc>`.
    #[must_use]
    pub const fn from_datetime(datetime: DateTime<Utc>) -> Self {
        Self(datetime)
    }

    /// Returns the inner `DateTime<Utc>`.
    #[must_use]
    pub const fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Returns the current time as a `Timestamp`.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0.to_rfc3339())
    }
}

// =============================================================================
// Task
// =============================================================================

/// A single entry in an owner's task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Unique identifier for the task.
    pub task_id: TaskId,
    /// Owning user; never changes after creation.
    pub owner: UserId,
    /// Task text with inline hashtags removed.
    pub text: String,
    /// Optional lowercase tag.
    pub tag: Option<Tag>,
    /// Optional date the task is planned for.
    pub scheduled_for: Option<NaiveDate>,
    /// Completion flag.
    pub done: bool,
    /// Manual ordering key among the owner's tasks.
    pub order: u32,
    /// Timestamp when the task was created.
    pub created_at: Timestamp,
    /// Timestamp when the task was last updated.
    pub updated_at: Timestamp,
}

impl Task {
    /// Returns a new task with the given text.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..self
        }
    }

    /// Returns a new task with the given tag.
    #[must_use]
    pub fn with_tag(self, tag: Option<Tag>) -> Self {
        Self { tag, ..self }
    }

    /// Returns a new task scheduled for the given date.
    #[must_use]
    pub fn with_scheduled_for(self, scheduled_for: Option<NaiveDate>) -> Self {
        Self {
            scheduled_for,
            ..self
        }
    }

    /// Returns a new task with the completion flag set.
    #[must_use]
    pub fn with_done(self, done: bool) -> Self {
        Self { done, ..self }
    }
}

/// Data required to insert a task.
///
/// The store assigns the id, timestamps and the next `order` for the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub owner: UserId,
    pub text: String,
    pub tag: Option<Tag>,
    pub scheduled_for: Option<NaiveDate>,
}

/// Optional restrictions applied when listing an owner's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks scheduled for exactly this date.
    pub scheduled_for: Option<NaiveDate>,
    /// Only tasks carrying exactly this tag.
    pub tag: Option<Tag>,
}

impl TaskFilter {
    /// Returns true if `task` passes every restriction in the filter.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.scheduled_for
            .is_none_or(|date| task.scheduled_for == Some(date))
            && self
                .tag
                .as_ref()
                .is_none_or(|tag| task.tag.as_ref() == Some(tag))
    }
}

/// Display ordering for tasks: `order` ascending, then newest first.
///
/// Equal creation times fall back to the higher id first so the sequence is
/// total.
#[must_use]
pub fn display_order(left: &Task, right: &Task) -> Ordering {
    left.order
        .cmp(&right.order)
        .then_with(|| right.created_at.cmp(&left.created_at))
        .then_with(|| right.task_id.cmp(&left.task_id))
}
