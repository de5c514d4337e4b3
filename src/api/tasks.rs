//! Task endpoints.
//!
//! Every handler is scoped to the authenticated owner: a task belonging to
//! someone else is indistinguishable from one that does not exist.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::auth::AuthenticatedUser;
use super::dto::{
    CreateTaskRequest, ErrorMessageResponse, ReorderRequest, StatusResponse, TaskListQuery,
    TaskResponse, UpdateTaskRequest, validate_create_task, validate_reorder, validate_task_query,
    validate_update_task,
};
use super::error::ApiErrorResponse;
use super::extract::{JsonBody, PathParam, QueryParams};
use super::handlers::AppState;
use crate::domain::TaskId;
use crate::service::ServiceError;

// =============================================================================
// Collection Handlers
// =============================================================================

/// `GET /tasks?scheduled_for=YYYY-MM-DD&tag=name`
///
/// Returns the owner's tasks ordered by `order`, newest first among equal
/// orders. Empty filter values are ignored.
///
/// # Errors
///
/// - **400 Bad Request**: malformed `scheduled_for`
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(query): QueryParams<TaskListQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiErrorResponse> {
    let filter = validate_task_query(&query)?;
    let tasks = state.task_service.list(user.user_id(), &filter).await?;
    Ok(Json(tasks.iter().map(TaskResponse::from).collect()))
}

/// `POST /tasks`: creates a task at the end of the owner's list.
///
/// A `#hashtag` in `text` becomes the tag and is removed from the text; a
/// non-empty explicit `tag` takes precedence over it.
///
/// # Errors
///
/// - **400 Bad Request**: blank or over-long text, over-long tag, bad date
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), ApiErrorResponse> {
    let input = validate_create_task(request)?;
    let task = state.task_service.create(user.user_id(), input).await?;
    Ok((StatusCode::CREATED, Json(TaskResponse::from(&task))))
}

/// `POST /tasks/reorder` with `{"task_ids": [..]}`.
///
/// Assigns `order = index` to each listed task in one step. Ids that are
/// unknown or owned by someone else reject the whole request with
/// `{"error": ".."}` and leave every task untouched.
///
/// # Errors
///
/// - **400 Bad Request**: missing list, non-integer or duplicate ids
pub async fn reorder_tasks(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<ReorderRequest>,
) -> Result<Response, ApiErrorResponse> {
    let task_ids = validate_reorder(request)?;

    match state.task_service.reorder(user.user_id(), &task_ids).await {
        Ok(()) => Ok(Json(StatusResponse::ok()).into_response()),
        Err(error @ ServiceError::NotOwned) => Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorMessageResponse {
                error: error.to_string(),
            }),
        )
            .into_response()),
        Err(error) => Err(error.into()),
    }
}

// =============================================================================
// Item Handlers
// =============================================================================

/// `GET /tasks/{id}`
///
/// # Errors
///
/// - **400 Bad Request**: non-integer id
/// - **404 Not Found**: no such task for this owner
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let task = state
        .task_service
        .get(user.user_id(), TaskId::new(id))
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

/// `PUT /tasks/{id}`: full update; `text` is required.
///
/// # Errors
///
/// - **400 Bad Request**: validation failure
/// - **404 Not Found**: no such task for this owner
pub async fn replace_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    apply_update(&state, &user, TaskId::new(id), request, true).await
}

/// `PATCH /tasks/{id}`: partial update.
///
/// # Errors
///
/// - **400 Bad Request**: validation failure
/// - **404 Not Found**: no such task for this owner
pub async fn patch_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateTaskRequest>,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    apply_update(&state, &user, TaskId::new(id), request, false).await
}

async fn apply_update(
    state: &AppState,
    user: &AuthenticatedUser,
    task_id: TaskId,
    request: UpdateTaskRequest,
    full: bool,
) -> Result<Json<TaskResponse>, ApiErrorResponse> {
    let input = validate_update_task(request, full)?;
    let task = state
        .task_service
        .update(user.user_id(), task_id, input)
        .await?;
    Ok(Json(TaskResponse::from(&task)))
}

/// `DELETE /tasks/{id}`
///
/// # Errors
///
/// - **404 Not Found**: no such task for this owner
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, ApiErrorResponse> {
    state
        .task_service
        .delete(user.user_id(), TaskId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
