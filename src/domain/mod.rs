//! Domain module for the task list and journal.
//!
//! This module contains domain models, value objects, and the pure
//! functions that operate on them. Nothing in here performs I/O.

pub mod done_entry;
pub mod tag;
pub mod task;
pub mod user;
pub mod validation;

pub use done_entry::{DoneEntry, DoneEntryId, EntryType, NewDoneEntry, UnknownEntryType};
pub use tag::{MAX_TAG_LENGTH, ParsedText, Tag, TagTooLong, normalize_tag, parse_tag};
pub use task::{MAX_TEXT_LENGTH, NewTask, Task, TaskFilter, TaskId, Timestamp, display_order};
pub use user::{NewUser, User, UserId};
pub use validation::{FieldError, ValidationError};
