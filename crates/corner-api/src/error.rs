//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use corner_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A business rule blocked the write (duplicate, already done, …).
  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a backend error, surfacing domain errors with their own status.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.as_core() {
      Some(core) => Self::from_core(core),
      None => Self::Store(Box::new(e)),
    }
  }

  fn from_core(e: &corner_core::Error) -> Self {
    let message = e.to_string();
    if e.is_not_found() {
      Self::NotFound(message)
    } else if e.is_conflict() {
      Self::Conflict(message)
    } else {
      Self::BadRequest(message)
    }
  }
}

impl From<corner_core::Error> for ApiError {
  fn from(e: corner_core::Error) -> Self { Self::from_core(&e) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
