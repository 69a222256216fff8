//! Handlers for `/contacts` endpoints.
//!
//! | Method   | Path             | Notes |
//! |----------|------------------|-------|
//! | `GET`    | `/contacts`      | Optional `?offset=&limit=` |
//! | `GET`    | `/contacts/{id}` | 404 if not found |
//! | `PUT`    | `/contacts/{id}` | Assigned-id mode only; upsert, 204 |
//! | `POST`   | `/contacts`      | Generated-id mode only; 201 + stored contact |
//! | `DELETE` | `/contacts/{id}` | 204, also when nothing was there |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use rolo_core::{
  contact::{Contact, NewContact, parse_birthday},
  store::{ContactStore, Page},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
};

// ─── Request body ─────────────────────────────────────────────────────────────

/// JSON body accepted by `PUT /contacts/{id}` and `POST /contacts`.
///
/// `id` is read-only: if a client echoes it back it is ignored, the path (or
/// the store) decides.
#[derive(Debug, Deserialize)]
pub struct ContactBody {
  pub firstname: String,
  pub lastname:  String,
  /// `YYYY-MM-DD`. Kept as a string so the date error names the field.
  pub birthday:  String,
}

impl TryFrom<ContactBody> for NewContact {
  type Error = ApiError;

  fn try_from(b: ContactBody) -> Result<Self, Self::Error> {
    let birthday = parse_birthday(&b.birthday).map_err(|e| {
      ApiError::Unprocessable(format!("invalid format for birthday: {e}"))
    })?;
    Ok(NewContact::new(b.firstname, b.lastname, birthday))
  }
}

fn parse_id<S: ContactStore>(raw: &str) -> Result<S::Key, ApiError> {
  raw
    .parse()
    .map_err(|e| ApiError::BadRequest(format!("invalid id {raw:?}: {e}")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /contacts[?offset=<n>][&limit=<n>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  QueryParams(page): QueryParams<Page>,
) -> Result<Json<Vec<Contact<S::Key>>>, ApiError>
where
  S: ContactStore,
{
  Ok(Json(store.list(page).await?))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /contacts/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  PathParam(raw): PathParam<String>,
) -> Result<Json<Contact<S::Key>>, ApiError>
where
  S: ContactStore,
{
  let id = parse_id::<S>(&raw)?;
  Ok(Json(store.get(&id).await?))
}

// ─── Put ──────────────────────────────────────────────────────────────────────

/// `PUT /contacts/{id}`: full replace, creating the record if absent.
pub async fn put_one<S>(
  State(store): State<Arc<S>>,
  PathParam(raw): PathParam<String>,
  JsonBody(body): JsonBody<ContactBody>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore,
{
  let id = parse_id::<S>(&raw)?;
  let input = NewContact::try_from(body)?;
  let replaced = store.put(id.clone(), input).await?;
  tracing::debug!(%id, replaced, "contact stored");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /contacts`: returns 201 + the stored contact, including its new id.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  JsonBody(body): JsonBody<ContactBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ContactStore,
{
  let input = NewContact::try_from(body)?;
  let id = store.create(input.clone()).await?;
  tracing::debug!(%id, "contact created");
  Ok((StatusCode::CREATED, Json(input.with_id(id))))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /contacts/{id}`
pub async fn delete_one<S>(
  State(store): State<Arc<S>>,
  PathParam(raw): PathParam<String>,
) -> Result<StatusCode, ApiError>
where
  S: ContactStore,
{
  let id = parse_id::<S>(&raw)?;
  store.delete(&id).await?;
  Ok(StatusCode::NO_CONTENT)
}
