//! Application state and service-level handlers.

use axum::Json;

use crate::infrastructure::{Repositories, TokenSigner};
use crate::service::{AccountService, DoneEntryService, TaskService};

// =============================================================================
// Application State
// =============================================================================

/// Shared application dependencies.
///
/// Services hold trait objects so the storage backend chosen by
/// `RepositoryFactory` at start-up is invisible to the handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub task_service: TaskService,
    pub done_entry_service: DoneEntryService,
    pub account_service: AccountService,
}

impl AppState {
    /// Creates a new `AppState` from initialized repositories and a token signer.
    #[must_use]
    pub fn from_repositories(repositories: Repositories, signer: TokenSigner) -> Self {
        Self {
            task_service: TaskService::new(repositories.task_repository),
            done_entry_service: DoneEntryService::new(repositories.done_entry_repository),
            account_service: AccountService::new(repositories.user_repository, signer),
        }
    }
}

// =============================================================================
// GET /health Handler
// =============================================================================

/// Health check response body.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: &'static str,
    /// Service version.
    pub version: &'static str,
}

/// Health check endpoint; needs no authentication.
///
/// ```json
/// { "status": "healthy", "version": "0.1.0" }
/// ```
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn test_health_check_reports_version() {
        let Json(response) = health_check().await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }
}
