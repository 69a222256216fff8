//! Operational HTTP endpoints.
//!
//! - `/liveness`  : always 200 while the process serves requests
//! - `/readiness` : 200, or 503 once shutdown has begun
//! - `/metrics`   : Prometheus text format

use axum::{
  extract::State,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use rolo_core::store::ContactStore;

use crate::AppState;

pub async fn liveness() -> StatusCode { StatusCode::OK }

pub async fn readiness<S: ContactStore>(State(state): State<AppState<S>>) -> StatusCode {
  if state.is_ready() {
    StatusCode::OK
  } else {
    StatusCode::SERVICE_UNAVAILABLE
  }
}

pub async fn metrics<S: ContactStore>(State(state): State<AppState<S>>) -> Response {
  let contacts = u64::try_from(state.store.len()).unwrap_or(u64::MAX);
  let body = state.metrics.render(&[("rolo_contacts", contacts)]);
  (
    StatusCode::OK,
    [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
    body,
  )
    .into_response()
}
