//! API module for HTTP handlers.
//!
//! This module contains route definitions and request/response handlers.

pub mod auth;
pub mod done_entries;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod tasks;

pub use auth::{AuthenticatedUser, delete_me, login, me, refresh, register};
pub use done_entries::{
    create_done_entry, delete_done_entry, get_done_entry, list_done_entries, patch_done_entry,
    replace_done_entry,
};
pub use dto::{CreateTaskRequest, DoneEntryResponse, TaskResponse, UpdateTaskRequest};
pub use error::{ApiError, ApiErrorResponse};
pub use handlers::{AppState, HealthResponse, health_check};
pub use tasks::{
    create_task, delete_task, get_task, list_tasks, patch_task, reorder_tasks, replace_task,
};

use axum::Router;
use axum::routing::{MethodRouter, get, post};

/// Registers `path` and `path/` so clients may use either form.
fn route_both(
    router: Router<AppState>,
    path: &str,
    method_router: MethodRouter<AppState>,
) -> Router<AppState> {
    router
        .route(path, method_router.clone())
        .route(&format!("{path}/"), method_router)
}

/// Builds the application router over the given state.
///
/// Transport layers (tracing, CORS) are added by the binary.
pub fn router(state: AppState) -> Router {
    let routes = [
        ("/health", get(health_check)),
        ("/auth/register", post(register)),
        ("/auth/login", post(login)),
        ("/auth/refresh", post(refresh)),
        ("/auth/me", get(me).delete(delete_me)),
        ("/tasks", get(list_tasks).post(create_task)),
        ("/tasks/reorder", post(reorder_tasks)),
        (
            "/tasks/{id}",
            get(get_task)
                .put(replace_task)
                .patch(patch_task)
                .delete(delete_task),
        ),
        (
            "/done-entries",
            get(list_done_entries).post(create_done_entry),
        ),
        (
            "/done-entries/{id}",
            get(get_done_entry)
                .put(replace_done_entry)
                .patch(patch_done_entry)
                .delete(delete_done_entry),
        ),
    ];

    routes
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            route_both(router, path, method_router)
        })
        .with_state(state)
}
