//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
///
/// The three auth-gate variants keep the wire shape the marketplace's
/// clients already expect: `{"message": ...}` with 401/400/403. Every other
/// failure responds with a real error status and `{"error": ...}`.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No bearer credential on the request.
  #[error("unauthorized access")]
  Unauthenticated,

  /// Credential present but malformed, tampered with, or expired.
  #[error("bad request")]
  InvalidCredential,

  /// Caller authenticated but the role gate rejected them.
  #[error("forbidden access")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid request: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("token error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("payment provider error: {0}")]
  PaymentProvider(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match &self {
      ApiError::Unauthenticated => {
        auth_rejection(StatusCode::UNAUTHORIZED, "unauthorized access")
      }
      ApiError::InvalidCredential => {
        auth_rejection(StatusCode::BAD_REQUEST, "bad request")
      }
      ApiError::Forbidden => {
        auth_rejection(StatusCode::FORBIDDEN, "forbidden access")
      }
      ApiError::NotFound(m) => failure(StatusCode::NOT_FOUND, m.clone()),
      ApiError::Validation(m) => {
        failure(StatusCode::UNPROCESSABLE_ENTITY, m.clone())
      }
      ApiError::Conflict(m) => failure(StatusCode::CONFLICT, m.clone()),
      ApiError::Token(e) => {
        failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      ApiError::PaymentProvider(e) => {
        failure(StatusCode::BAD_GATEWAY, e.to_string())
      }
      ApiError::Store(e) => {
        failure(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    }
  }
}

fn auth_rejection(status: StatusCode, message: &str) -> Response {
  (status, Json(json!({ "message": message }))).into_response()
}

fn failure(status: StatusCode, message: String) -> Response {
  (status, Json(json!({ "error": message }))).into_response()
}
