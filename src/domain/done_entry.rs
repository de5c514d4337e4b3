//! Journal of dated "done" and "learned" entries.

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::Timestamp;
use super::user::UserId;

/// Unique identifier for a done entry, assigned by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoneEntryId(i64);

impl DoneEntryId {
    /// Creates a `DoneEntryId` from a raw store identifier.
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

impl std::fmt::Display for DoneEntryId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Classification of a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Something that got done.
    Done,
    /// Something that was learned.
    Learned,
}

impl EntryType {
    /// Returns the storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Learned => "learned",
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entry type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a valid choice.")]
pub struct UnknownEntryType(pub String);

impl FromStr for EntryType {
    type Err = UnknownEntryType;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "done" => Ok(Self::Done),
            "learned" => Ok(Self::Learned),
            other => Err(UnknownEntryType(other.to_string())),
        }
    }
}

/// A dated journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneEntry {
    /// Unique identifier.
    pub entry_id: DoneEntryId,
    /// Owning user.
    pub owner: UserId,
    /// Day the entry belongs to.
    pub entry_date: NaiveDate,
    /// Done or learned.
    pub entry_type: EntryType,
    /// Entry text.
    pub text: String,
    /// Timestamp when the entry was created.
    pub created_at: Timestamp,
}

/// Data required to insert a done entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDoneEntry {
    pub owner: UserId,
    pub entry_date: NaiveDate,
    pub entry_type: EntryType,
    pub text: String,
}

impl DoneEntry {
    /// Display ordering: newest `entry_date` first, then newest `created_at`.
    #[must_use]
    pub fn display_order(left: &Self, right: &Self) -> Ordering {
        right
            .entry_date
            .cmp(&left.entry_date)
            .then_with(|| right.created_at.cmp(&left.created_at))
            .then_with(|| right.entry_id.cmp(&left.entry_id))
    }
}
