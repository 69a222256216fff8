//! Handler for `GET /greeting/{name}`.

use axum::Json;
use serde::Serialize;

use crate::{error::ApiError, extract::PathParam};

/// Longest name accepted, in characters.
pub const MAX_NAME_LEN: usize = 30;

#[derive(Debug, Serialize)]
pub struct Greeting {
  pub message: String,
}

/// `GET /greeting/{name}` returns `{"message":"Hello, <name>!"}`.
pub async fn handler(PathParam(name): PathParam<String>) -> Result<Json<Greeting>, ApiError> {
  let len = name.chars().count();
  if len > MAX_NAME_LEN {
    return Err(ApiError::Unprocessable(format!(
      "name: expected length <= {MAX_NAME_LEN}, got {len}"
    )));
  }
  Ok(Json(Greeting { message: format!("Hello, {name}!") }))
}
