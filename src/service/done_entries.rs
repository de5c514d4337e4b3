//! Done/learned journal operations.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use super::{ServiceError, validate_text};
use crate::domain::{
    DoneEntry, DoneEntryId, EntryType, FieldError, NewDoneEntry, UserId, ValidationError,
};
use crate::infrastructure::DoneEntryRepository;

/// Input for [`DoneEntryService::create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDoneEntryInput {
    /// Defaults to today's local date.
    pub entry_date: Option<NaiveDate>,
    pub entry_type: EntryType,
    pub text: String,
}

/// Input for [`DoneEntryService::update`]; absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateDoneEntryInput {
    pub entry_date: Option<NaiveDate>,
    pub entry_type: Option<EntryType>,
    pub text: Option<String>,
}

fn clean_text(raw: &str) -> Result<String, FieldError> {
    validate_text("text", raw.trim().to_string())
}

/// Service for an owner's journal entries.
#[derive(Clone)]
pub struct DoneEntryService {
    repository: Arc<dyn DoneEntryRepository + Send + Sync>,
}

impl std::fmt::Debug for DoneEntryService {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("DoneEntryService")
            .field("repository", &"Arc<dyn DoneEntryRepository>")
            .finish()
    }
}

impl DoneEntryService {
    /// Creates a service over the given repository.
    #[must_use]
    pub fn new(repository: Arc<dyn DoneEntryRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Records a new entry.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` if the trimmed text is blank or too long.
    pub async fn create(
        &self,
        owner: UserId,
        input: CreateDoneEntryInput,
    ) -> Result<DoneEntry, ServiceError> {
        let text = clean_text(&input.text).map_err(|error| ValidationError::new(vec![error]))?;
        let entry_date = input
            .entry_date
            .unwrap_or_else(|| Local::now().date_naive());

        let entry = self
            .repository
            .insert(NewDoneEntry {
                owner,
                entry_date,
                entry_type: input.entry_type,
                text,
            })
            .await?;

        tracing::info!(
            owner = %owner,
            entry_id = %entry.entry_id,
            entry_type = %entry.entry_type,
            "Done entry created"
        );
        Ok(entry)
    }

    /// Lists the owner's entries, newest date first, optionally for one date.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the store fails.
    pub async fn list(
        &self,
        owner: UserId,
        entry_date: Option<NaiveDate>,
    ) -> Result<Vec<DoneEntry>, ServiceError> {
        let entries = self.repository.list_for_owner(owner, entry_date).await?;
        tracing::debug!(owner = %owner, count = entries.len(), "Done entries listed");
        Ok(entries)
    }

    /// Fetches one of the owner's entries.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the entry does not exist for this owner.
    pub async fn get(&self, owner: UserId, id: DoneEntryId) -> Result<DoneEntry, ServiceError> {
        self.repository
            .find_for_owner(owner, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Done entry {id}")))
    }

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if the entry does not exist for this owner
    /// - `ServiceError::Validation` if new text is blank or too long
    pub async fn update(
        &self,
        owner: UserId,
        id: DoneEntryId,
        input: UpdateDoneEntryInput,
    ) -> Result<DoneEntry, ServiceError> {
        let current = self.get(owner, id).await?;

        let text = match input.text {
            Some(raw) => clean_text(&raw).map_err(|error| ValidationError::new(vec![error]))?,
            None => current.text.clone(),
        };
        let changed = DoneEntry {
            entry_date: input.entry_date.unwrap_or(current.entry_date),
            entry_type: input.entry_type.unwrap_or(current.entry_type),
            text,
            ..current
        };

        let stored = self.repository.update(&changed).await?;
        tracing::info!(owner = %owner, entry_id = %id, "Done entry updated");
        Ok(stored)
    }

    /// Deletes one of the owner's entries.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the entry does not exist for this owner.
    pub async fn delete(&self, owner: UserId, id: DoneEntryId) -> Result<(), ServiceError> {
        if !self.repository.delete_for_owner(owner, id).await? {
            return Err(ServiceError::NotFound(format!("Done entry {id}")));
        }
        tracing::info!(owner = %owner, entry_id = %id, "Done entry deleted");
        Ok(())
    }
}
