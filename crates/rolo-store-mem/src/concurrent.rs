//! [`ConcurrentStore`]: unordered storage in a sharded concurrent map.

use dashmap::{DashMap, mapref::entry::Entry};
use rolo_core::{
  Error, Result,
  contact::{Contact, NewContact},
  key::{ContactKey, KeyGenerator},
  store::{ContactStore, Page},
};

/// A contact store backed by [`DashMap`].
///
/// Each operation locks only the shard owning its key. Listing walks the
/// shards one at a time, so a list running alongside writers sees each
/// record either before or after a given write, never half of one.
pub struct ConcurrentStore<K, G> {
  map:  DashMap<K, Contact<K>>,
  keys: G,
}

impl<K, G> ConcurrentStore<K, G>
where
  K: ContactKey,
  G: KeyGenerator<K>,
{
  pub fn new(keys: G) -> Self {
    Self { map: DashMap::new(), keys }
  }

  /// Build a store pre-populated with `seed`, each under a generated key.
  pub fn with_contacts(
    keys: G,
    seed: impl IntoIterator<Item = NewContact>,
  ) -> Self {
    let store = Self::new(keys);
    for contact in seed {
      store.insert_generated(contact);
    }
    store
  }

  fn insert_generated(&self, input: NewContact) -> K {
    loop {
      // The entry holds the shard lock until it is dropped, so nobody can
      // claim `candidate` between the vacancy check and the insert.
      match self.map.entry(self.keys.generate()) {
        Entry::Occupied(taken) => {
          tracing::debug!(key = %taken.key(), "generated key already taken, retrying");
        }
        Entry::Vacant(slot) => {
          let id = slot.key().clone();
          slot.insert(input.with_id(id.clone()));
          return id;
        }
      }
    }
  }
}

impl<K, G> ContactStore for ConcurrentStore<K, G>
where
  K: ContactKey,
  G: KeyGenerator<K>,
{
  type Key = K;

  async fn create(&self, input: NewContact) -> Result<K> {
    Ok(self.insert_generated(input))
  }

  async fn get<'a>(&'a self, id: &'a K) -> Result<Contact<K>> {
    self
      .map
      .get(id)
      .map(|entry| entry.value().clone())
      .ok_or_else(|| Error::not_found(id))
  }

  async fn list(&self, page: Page) -> Result<Vec<Contact<K>>> {
    Ok(
      self
        .map
        .iter()
        .skip(page.offset)
        .take(page.limit.unwrap_or(usize::MAX))
        .map(|entry| entry.value().clone())
        .collect(),
    )
  }

  async fn put(&self, id: K, input: NewContact) -> Result<bool> {
    let contact = input.with_id(id.clone());
    Ok(self.map.insert(id, contact).is_some())
  }

  async fn delete<'a>(&'a self, id: &'a K) -> Result<bool> {
    Ok(self.map.remove(id).is_some())
  }

  fn len(&self) -> usize { self.map.len() }
}
