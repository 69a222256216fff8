//! Request observation and panic recovery for the API routes.

use std::{any::Any, net::SocketAddr, sync::Arc, time::Instant};

use axum::{
  BoxError, Json,
  extract::{ConnectInfo, MatchedPath, Request, State},
  http::{HeaderMap, HeaderName, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::Span;

use crate::metrics::Metrics;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

fn header_str(headers: &HeaderMap, name: HeaderName) -> String {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default()
    .to_owned()
}

/// Span wrapping each API request; carries the caller's request id.
pub fn request_span(req: &Request) -> Span {
  tracing::info_span!(
    "request",
    x_request_id = %header_str(req.headers(), X_REQUEST_ID),
  )
}

/// Log one line per request and feed the request metrics.
///
/// Installed with `Router::layer` so the matched route template is already
/// known; unmatched requests are labelled `unmatched`.
pub async fn observe(
  State(metrics): State<Arc<Metrics>>,
  req: Request,
  next: Next,
) -> Response {
  let start = Instant::now();
  let method = req.method().clone();
  let version = req.version();
  let path = req
    .extensions()
    .get::<MatchedPath>()
    .map_or("unmatched", MatchedPath::as_str)
    .to_owned();
  let from = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.to_string())
    .unwrap_or_default();
  let referer = header_str(req.headers(), header::REFERER);
  let ua = header_str(req.headers(), header::USER_AGENT);

  let resp = next.run(req).await;

  let elapsed = start.elapsed();
  let status = resp.status();
  metrics.observe_request(method.as_str(), &path, status.as_u16(), elapsed);
  tracing::info!(
    from = %from,
    referer = %referer,
    ua = %ua,
    status = status.as_u16(),
    dur = ?elapsed,
    "{method} {path} {version:?}"
  );
  resp
}

/// Turn a handler panic into a logged 500.
pub fn recover(payload: Box<dyn Any + Send + 'static>) -> Response {
  let detail = if let Some(s) = payload.downcast_ref::<&str>() {
    (*s).to_owned()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "non-string panic payload".to_owned()
  };
  tracing::error!(recovered = %detail, "panic occurred");
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({ "error": "internal server error" })),
  )
    .into_response()
}

/// Answer a request that outlived the configured timeout.
pub async fn timed_out(err: BoxError) -> Response {
  if err.is::<tower::timeout::error::Elapsed>() {
    tracing::warn!(status = 408, "request timed out");
    return (
      StatusCode::REQUEST_TIMEOUT,
      Json(json!({ "error": "request timed out" })),
    )
      .into_response();
  }
  tracing::error!(err = %err, "unhandled middleware error");
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({ "error": "internal server error" })),
  )
    .into_response()
}
