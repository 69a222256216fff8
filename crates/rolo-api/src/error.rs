//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("payload too large: {0}")]
  PayloadTooLarge(String),

  #[error("unsupported media type: {0}")]
  UnsupportedMediaType(String),

  /// Well-formed request whose content fails validation (e.g. a birthday
  /// that is not a `YYYY-MM-DD` date).
  #[error("unprocessable entity: {0}")]
  Unprocessable(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      ApiError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
      ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// Keep the status axum picked for an extractor rejection, with our body.
  fn rejected(status: StatusCode, text: String) -> Self {
    match status {
      StatusCode::NOT_FOUND => ApiError::NotFound(text),
      StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(text),
      StatusCode::UNSUPPORTED_MEDIA_TYPE => ApiError::UnsupportedMediaType(text),
      StatusCode::UNPROCESSABLE_ENTITY => ApiError::Unprocessable(text),
      s if s.is_server_error() => ApiError::Internal(text),
      _ => ApiError::BadRequest(text),
    }
  }
}

impl From<rolo_core::Error> for ApiError {
  fn from(e: rolo_core::Error) -> Self {
    match e {
      rolo_core::Error::NotFound(id) => ApiError::NotFound(format!("id {id} not found")),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { Self::rejected(r.status(), r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { Self::rejected(r.status(), r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { Self::rejected(r.status(), r.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(err = %self, status = status.as_u16(), "error occurred");
    } else {
      tracing::warn!(err = %self, status = status.as_u16(), "error occurred");
    }
    let message = match self {
      ApiError::NotFound(m)
      | ApiError::BadRequest(m)
      | ApiError::PayloadTooLarge(m)
      | ApiError::UnsupportedMediaType(m)
      | ApiError::Unprocessable(m)
      | ApiError::Internal(m) => m,
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn internal_is_500_with_json_body() {
    let (status, body) = body_of(ApiError::Internal("store unavailable".into())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "store unavailable");
  }

  #[tokio::test]
  async fn core_not_found_names_the_id() {
    let (status, body) = body_of(rolo_core::Error::not_found(7).into()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "id 7 not found");
  }

  #[test]
  fn rejection_statuses_are_kept() {
    let cases = [
      (StatusCode::UNPROCESSABLE_ENTITY, StatusCode::UNPROCESSABLE_ENTITY),
      (StatusCode::UNSUPPORTED_MEDIA_TYPE, StatusCode::UNSUPPORTED_MEDIA_TYPE),
      (StatusCode::PAYLOAD_TOO_LARGE, StatusCode::PAYLOAD_TOO_LARGE),
      (StatusCode::INTERNAL_SERVER_ERROR, StatusCode::INTERNAL_SERVER_ERROR),
      (StatusCode::METHOD_NOT_ALLOWED, StatusCode::BAD_REQUEST),
    ];
    for (from, to) in cases {
      assert_eq!(ApiError::rejected(from, String::new()).status(), to, "{from}");
    }
  }
}
