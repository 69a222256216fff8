//! [`IndexedStore`]: ordered storage behind a single `RwLock`.

use std::{
  collections::HashMap,
  sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use rolo_core::{
  Error, Result,
  contact::{Contact, NewContact},
  key::{ContactKey, KeyGenerator},
  store::{ContactStore, Page},
};

/// A contact store that keeps records in insertion order.
///
/// `index` maps each key to its position in `contacts`. Both are only ever
/// touched together under the write lock, so they cannot disagree.
pub struct IndexedStore<K, G> {
  inner: RwLock<Inner<K>>,
  keys:  G,
}

struct Inner<K> {
  index:    HashMap<K, usize>,
  contacts: Vec<Contact<K>>,
}

impl<K, G> IndexedStore<K, G>
where
  K: ContactKey,
  G: KeyGenerator<K>,
{
  pub fn new(keys: G) -> Self {
    Self {
      inner: RwLock::new(Inner {
        index:    HashMap::new(),
        contacts: Vec::new(),
      }),
      keys,
    }
  }

  /// Build a store pre-populated with `seed`, each under a generated key.
  pub fn with_contacts(
    keys: G,
    seed: impl IntoIterator<Item = NewContact>,
  ) -> Self {
    let store = Self::new(keys);
    {
      let mut inner = store.write();
      for contact in seed {
        inner.insert_generated(&store.keys, contact);
      }
    }
    store
  }

  // A panic while holding the lock cannot leave `index` and `contacts`
  // out of step: every mutation below updates both before returning.
  fn read(&self) -> RwLockReadGuard<'_, Inner<K>> {
    self.inner.read().unwrap_or_else(PoisonError::into_inner)
  }

  fn write(&self) -> RwLockWriteGuard<'_, Inner<K>> {
    self.inner.write().unwrap_or_else(PoisonError::into_inner)
  }
}

impl<K: ContactKey> Inner<K> {
  fn insert_generated<G: KeyGenerator<K>>(
    &mut self,
    keys: &G,
    input: NewContact,
  ) -> K {
    let id = loop {
      let candidate = keys.generate();
      if !self.index.contains_key(&candidate) {
        break candidate;
      }
      tracing::debug!(key = %candidate, "generated key already taken, retrying");
    };
    self.push(id.clone(), input);
    id
  }

  fn push(&mut self, id: K, input: NewContact) {
    self.index.insert(id.clone(), self.contacts.len());
    self.contacts.push(input.with_id(id));
  }

  fn upsert(&mut self, id: K, input: NewContact) -> bool {
    match self.index.get(&id).and_then(|&pos| self.contacts.get_mut(pos)) {
      Some(slot) => {
        *slot = input.with_id(id);
        true
      }
      None => {
        self.push(id, input);
        false
      }
    }
  }

  fn remove(&mut self, id: &K) -> bool {
    let Some(pos) = self.index.remove(id) else {
      return false;
    };
    self.contacts.remove(pos);
    // Everything after `pos` moved down one slot.
    for contact in &self.contacts[pos..] {
      if let Some(p) = self.index.get_mut(&contact.id) {
        *p -= 1;
      }
    }
    true
  }
}

impl<K, G> ContactStore for IndexedStore<K, G>
where
  K: ContactKey,
  G: KeyGenerator<K>,
{
  type Key = K;

  async fn create(&self, input: NewContact) -> Result<K> {
    Ok(self.write().insert_generated(&self.keys, input))
  }

  async fn get<'a>(&'a self, id: &'a K) -> Result<Contact<K>> {
    let inner = self.read();
    inner
      .index
      .get(id)
      .and_then(|&pos| inner.contacts.get(pos))
      .cloned()
      .ok_or_else(|| Error::not_found(id))
  }

  async fn list(&self, page: Page) -> Result<Vec<Contact<K>>> {
    let inner = self.read();
    let bounds = page.bounds(inner.contacts.len());
    Ok(inner.contacts[bounds].to_vec())
  }

  async fn put(&self, id: K, input: NewContact) -> Result<bool> {
    Ok(self.write().upsert(id, input))
  }

  async fn delete<'a>(&'a self, id: &'a K) -> Result<bool> {
    Ok(self.write().remove(id))
  }

  fn len(&self) -> usize { self.read().contacts.len() }
}
