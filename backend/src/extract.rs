//! Request extractors that reject with the application error envelope

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON body; decode failures become `VALIDATION_ERROR` responses
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Path parameters; malformed ids become `VALIDATION_ERROR` responses
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct PathParam<T>(pub T);

/// Query string; malformed parameters become `VALIDATION_ERROR` responses
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct QueryParams<T>(pub T);
