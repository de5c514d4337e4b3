//! Done/learned journal endpoints.

use axum::{Json, extract::State, http::StatusCode};

use super::auth::AuthenticatedUser;
use super::dto::{
    CreateDoneEntryRequest, DoneEntryListQuery, DoneEntryResponse, UpdateDoneEntryRequest,
    validate_create_done_entry, validate_done_entry_query, validate_update_done_entry,
};
use super::error::ApiErrorResponse;
use super::extract::{JsonBody, PathParam, QueryParams};
use super::handlers::AppState;
use crate::domain::DoneEntryId;

/// `GET /done-entries?entry_date=YYYY-MM-DD`
///
/// Newest date first; entries on the same date newest first.
///
/// # Errors
///
/// - **400 Bad Request**: malformed `entry_date`
pub async fn list_done_entries(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    QueryParams(query): QueryParams<DoneEntryListQuery>,
) -> Result<Json<Vec<DoneEntryResponse>>, ApiErrorResponse> {
    let entry_date = validate_done_entry_query(&query)?;
    let entries = state
        .done_entry_service
        .list(user.user_id(), entry_date)
        .await?;
    Ok(Json(entries.iter().map(DoneEntryResponse::from).collect()))
}

/// `POST /done-entries`; `entry_date` defaults to today.
///
/// # Errors
///
/// - **400 Bad Request**: missing or unknown `entry_type`, blank text, bad date
pub async fn create_done_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    JsonBody(request): JsonBody<CreateDoneEntryRequest>,
) -> Result<(StatusCode, Json<DoneEntryResponse>), ApiErrorResponse> {
    let input = validate_create_done_entry(request)?;
    let entry = state
        .done_entry_service
        .create(user.user_id(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(DoneEntryResponse::from(&entry))))
}

/// `GET /done-entries/{id}`
///
/// # Errors
///
/// - **404 Not Found**: no such entry for this owner
pub async fn get_done_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
) -> Result<Json<DoneEntryResponse>, ApiErrorResponse> {
    let entry = state
        .done_entry_service
        .get(user.user_id(), DoneEntryId::new(id))
        .await?;
    Ok(Json(DoneEntryResponse::from(&entry)))
}

/// `PUT /done-entries/{id}`: `entry_type` and `text` are required.
///
/// # Errors
///
/// - **400 Bad Request**: validation failure
/// - **404 Not Found**: no such entry for this owner
pub async fn replace_done_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateDoneEntryRequest>,
) -> Result<Json<DoneEntryResponse>, ApiErrorResponse> {
    apply_update(&state, &user, DoneEntryId::new(id), request, true).await
}

/// `PATCH /done-entries/{id}`
///
/// # Errors
///
/// - **400 Bad Request**: validation failure
/// - **404 Not Found**: no such entry for this owner
pub async fn patch_done_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
    JsonBody(request): JsonBody<UpdateDoneEntryRequest>,
) -> Result<Json<DoneEntryResponse>, ApiErrorResponse> {
    apply_update(&state, &user, DoneEntryId::new(id), request, false).await
}

async fn apply_update(
    state: &AppState,
    user: &AuthenticatedUser,
    entry_id: DoneEntryId,
    request: UpdateDoneEntryRequest,
    full: bool,
) -> Result<Json<DoneEntryResponse>, ApiErrorResponse> {
    let input = validate_update_done_entry(request, full)?;
    let entry = state
        .done_entry_service
        .update(user.user_id(), entry_id, input)
        .await?;
    Ok(Json(DoneEntryResponse::from(&entry)))
}

/// `DELETE /done-entries/{id}`
///
/// # Errors
///
/// - **404 Not Found**: no such entry for this owner
pub async fn delete_done_entry(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    PathParam(id): PathParam<i64>,
) -> Result<StatusCode, ApiErrorResponse> {
    state
        .done_entry_service
        .delete(user.user_id(), DoneEntryId::new(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
