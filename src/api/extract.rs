//! Extractors whose rejections use the API error body.

use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiErrorResponse;

/// `axum::Json` with rejections mapped to [`ApiErrorResponse`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiErrorResponse))]
pub struct JsonBody<T>(pub T);

/// `axum::extract::Path` with rejections mapped to [`ApiErrorResponse`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiErrorResponse))]
pub struct PathParam<T>(pub T);

/// `axum::extract::Query` with rejections mapped to [`ApiErrorResponse`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiErrorResponse))]
pub struct QueryParams<T>(pub T);
