//! Request extractors whose rejections answer through [`AppError`].

use axum::extract::FromRequest;

use crate::error::AppError;

/// `axum::Form` whose rejection (wrong content type, undecodable body,
/// duplicate field) is a 400 JSON [`AppError::BadRequest`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Form), rejection(AppError))]
pub struct FormBody<T>(pub T);
