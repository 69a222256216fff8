//! The `ContactStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `rolo-store-mem`).
//! The API layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use serde::Deserialize;

use crate::{
  Result,
  contact::{Contact, NewContact},
  key::ContactKey,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// A window over [`ContactStore::list`] results.
///
/// Out-of-range values are clamped, never rejected: an offset past the end
/// yields an empty page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
  #[serde(default)]
  pub offset: usize,
  /// Maximum number of records; `None` means "everything after `offset`".
  pub limit:  Option<usize>,
}

impl Page {
  pub const ALL: Page = Page { offset: 0, limit: None };

  pub const fn new(offset: usize, limit: usize) -> Self {
    Self { offset, limit: Some(limit) }
  }

  /// The `start..end` range this page selects out of `len` records.
  pub fn bounds(&self, len: usize) -> std::ops::Range<usize> {
    let start = self.offset.min(len);
    let end = match self.limit {
      Some(limit) => start.saturating_add(limit).min(len),
      None => len,
    };
    start..end
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a contact repository.
///
/// Every method is safe to call concurrently. Operations on the same key are
/// linearised: the last writer wins. Records handed out are owned copies;
/// mutating them never touches the store.
///
/// Backends are in-memory and never block, so the futures complete on their
/// first poll. Dropping one is the only form of cancellation and cannot
/// interrupt an operation that has started.
pub trait ContactStore: Send + Sync {
  type Key: ContactKey;

  /// Store `input` under a freshly generated key and return that key.
  ///
  /// Candidate keys that are already taken are silently discarded and
  /// regenerated. The vacancy check and the insert are one atomic step.
  fn create(
    &self,
    input: NewContact,
  ) -> impl Future<Output = Result<Self::Key>> + Send + '_;

  /// Fetch the record stored under `id`.
  ///
  /// Fails with [`Error::NotFound`](crate::Error::NotFound) if there is none.
  fn get<'a>(
    &'a self,
    id: &'a Self::Key,
  ) -> impl Future<Output = Result<Contact<Self::Key>>> + Send + 'a;

  /// Return the records selected by `page`.
  fn list(
    &self,
    page: Page,
  ) -> impl Future<Output = Result<Vec<Contact<Self::Key>>>> + Send + '_;

  /// Store `input` under `id`, replacing any existing record.
  ///
  /// Returns `true` if a record was replaced, `false` if it was inserted.
  fn put(
    &self,
    id: Self::Key,
    input: NewContact,
  ) -> impl Future<Output = Result<bool>> + Send + '_;

  /// Remove the record under `id`.
  ///
  /// Deleting an absent key is a no-op; returns whether a record was removed.
  fn delete<'a>(
    &'a self,
    id: &'a Self::Key,
  ) -> impl Future<Output = Result<bool>> + Send + 'a;

  /// Number of records currently stored.
  fn len(&self) -> usize;

  fn is_empty(&self) -> bool { self.len() == 0 }
}
