//! Bearer authentication and account endpoints.

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{StatusCode, header, request::Parts},
};

use super::dto::{
    AccessTokenResponse, LoginRequest, RefreshRequest, RegisterRequest, RegisterResponse,
    UserResponse, validate_login, validate_refresh, validate_register,
};
use super::error::ApiErrorResponse;
use super::extract::JsonBody;
use super::handlers::AppState;
use crate::domain::{User, UserId};
use crate::infrastructure::TokenPair;

const MISSING_CREDENTIALS: &str = "Authentication credentials were not provided.";

// =============================================================================
// AuthenticatedUser Extractor
// =============================================================================

/// The user resolved from a valid `Authorization: Bearer <access token>` header.
///
/// Every owner-scoped handler takes this extractor; the owner is never read
/// from the request body.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.0.user_id
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            tracing::debug!("Request without bearer token");
            ApiErrorResponse::unauthorized(MISSING_CREDENTIALS)
        })?;

        let user = state.account_service.authenticate(token).await?;
        Ok(Self(user))
    }
}

// =============================================================================
// Account Handlers
// =============================================================================

/// `POST /auth/register`: creates an account and returns its first token pair.
///
/// # Errors
///
/// - **400 Bad Request**: missing, invalid or taken fields
pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiErrorResponse> {
    let input = validate_register(request)?;
    let registration = state.account_service.register(input).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(&registration.user),
            tokens: registration.tokens,
        }),
    ))
}

/// `POST /auth/login`: exchanges credentials for a token pair.
///
/// # Errors
///
/// - **400 Bad Request**: missing username or password
/// - **401 Unauthorized**: unknown user or wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> Result<Json<TokenPair>, ApiErrorResponse> {
    let (username, password) = validate_login(request)?;
    let tokens = state.account_service.login(&username, password).await?;
    Ok(Json(tokens))
}

/// `POST /auth/refresh`: exchanges a refresh token for a new access token.
///
/// # Errors
///
/// - **400 Bad Request**: missing `refresh`
/// - **401 Unauthorized**: invalid, expired or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiErrorResponse> {
    let refresh_token = validate_refresh(request)?;
    let access = state.account_service.refresh(&refresh_token).await?;
    Ok(Json(AccessTokenResponse { access }))
}

/// `GET /auth/me`
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// `DELETE /auth/me`: removes the account with all of its tasks and entries.
///
/// # Errors
///
/// - **404 Not Found**: the account vanished between authentication and delete
pub async fn delete_me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<StatusCode, ApiErrorResponse> {
    state.account_service.delete_account(user.user_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
