//! JSON REST API for rolo.
//!
//! Exposes an axum [`Router`] backed by any [`rolo_core::store::ContactStore`].
//! Logging, metrics, probes and panic recovery are the caller's
//! responsibility (see `rolo-server`).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rolo_api::api_router(store.clone(), IdMode::Generated))
//! ```

pub mod contacts;
pub mod error;
pub mod extract;
pub mod greeting;
pub mod panic;

use std::sync::Arc;

use axum::{
  Router,
  routing::{MethodRouter, get},
};
use rolo_core::store::ContactStore;
use serde::Deserialize;

pub use error::ApiError;

/// Who owns contact identifiers in a deployment.
///
/// The two contracts are deliberately kept apart: an upsert keyed by the
/// caller, or an insert that returns a key chosen by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMode {
  /// Integer ids chosen by the client. Exposes `PUT /contacts/{id}`.
  Assigned,
  /// Token ids chosen by the server. Exposes `POST /contacts`.
  #[default]
  Generated,
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, mode: IdMode) -> Router<()>
where
  S: ContactStore + 'static,
{
  let (collection, item): (MethodRouter<Arc<S>>, MethodRouter<Arc<S>>) = match mode {
    IdMode::Assigned => (
      get(contacts::list::<S>),
      get(contacts::get_one::<S>)
        .put(contacts::put_one::<S>)
        .delete(contacts::delete_one::<S>),
    ),
    IdMode::Generated => (
      get(contacts::list::<S>).post(contacts::create::<S>),
      get(contacts::get_one::<S>).delete(contacts::delete_one::<S>),
    ),
  };

  Router::new()
    // Greeting
    .route("/greeting/{name}", get(greeting::handler))
    // Contacts
    .route("/contacts", collection)
    .route("/contacts/{id}", item)
    // Panic
    .route("/panic", get(panic::handler))
    .with_state(store)
}

// ─── Integration tests ────────────────────────────────────────────────────────
