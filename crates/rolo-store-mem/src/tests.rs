//! Behavioural tests run against both in-memory backends.

use std::{
  collections::{HashSet, VecDeque},
  sync::{Arc, Mutex},
};

use chrono::NaiveDate;
use rolo_core::{
  Error,
  contact::NewContact,
  key::{KeyGenerator, RandomToken, Sequential, Token},
  store::{ContactStore, Page},
};

use crate::{ConcurrentStore, IndexedStore};

fn contact(first: &str, last: &str, y: i32, m: u32, d: u32) -> NewContact {
  NewContact::new(first, last, NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

fn john() -> NewContact { contact("john", "smith", 1999, 12, 31) }

/// Replays a fixed list of keys, then panics.
struct Scripted(Mutex<VecDeque<u64>>);

impl Scripted {
  fn new(keys: &[u64]) -> Self { Self(Mutex::new(keys.iter().copied().collect())) }
}

impl KeyGenerator<u64> for Scripted {
  fn generate(&self) -> u64 {
    self.0.lock().unwrap().pop_front().expect("key script exhausted")
  }
}

// ─── Shared properties ───────────────────────────────────────────────────────

async fn scenario<S: ContactStore>(s: S) {
  let id = s.create(john()).await.unwrap();

  let fetched = s.get(&id).await.unwrap();
  assert_eq!(fetched, john().with_id(id.clone()));

  assert!(s.delete(&id).await.unwrap());
  assert!(matches!(s.get(&id).await, Err(Error::NotFound(_))));
  assert!(s.list(Page::ALL).await.unwrap().iter().all(|c| c.id != id));
}

async fn put_round_trip<S: ContactStore>(s: S, id: S::Key) {
  let alice = contact("alice", "liddell", 1852, 5, 4);
  assert!(!s.put(id.clone(), alice.clone()).await.unwrap());
  assert_eq!(s.get(&id).await.unwrap(), alice.clone().with_id(id.clone()));

  let renamed = contact("alice", "hargreaves", 1852, 5, 4);
  assert!(s.put(id.clone(), renamed.clone()).await.unwrap());
  assert_eq!(s.get(&id).await.unwrap(), renamed.with_id(id.clone()));
  assert_eq!(s.len(), 1);
}

async fn delete_absent_is_noop<S: ContactStore>(s: S) {
  let kept = s.create(john()).await.unwrap();
  let gone = s.create(contact("jane", "doe", 1980, 1, 1)).await.unwrap();
  assert!(s.delete(&gone).await.unwrap());

  let before = s.list(Page::ALL).await.unwrap();
  assert!(!s.delete(&gone).await.unwrap());
  assert!(!s.delete(&gone).await.unwrap());
  assert_eq!(s.list(Page::ALL).await.unwrap(), before);
  assert!(s.get(&kept).await.is_ok());
}

async fn list_is_complete<S: ContactStore>(s: S) {
  let mut live = HashSet::new();
  for i in 0..10 {
    let id = s
      .create(contact("user", &format!("n{i}"), 2000, 1, 1 + i))
      .await
      .unwrap();
    live.insert(id);
  }
  let doomed: Vec<_> = live.iter().take(4).cloned().collect();
  for id in &doomed {
    s.delete(id).await.unwrap();
    live.remove(id);
  }

  let listed: HashSet<_> = s
    .list(Page::ALL)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.id)
    .collect();
  assert_eq!(listed, live);
  assert_eq!(s.len(), 6);
}

async fn pages_cover_everything_once<S: ContactStore>(s: S) {
  for i in 0..7 {
    s.create(contact("p", &i.to_string(), 2001, 1, 1)).await.unwrap();
  }
  let mut seen = Vec::new();
  let mut offset = 0;
  loop {
    let page = s.list(Page::new(offset, 3)).await.unwrap();
    if page.is_empty() {
      break;
    }
    assert!(page.len() <= 3);
    offset += page.len();
    seen.extend(page.into_iter().map(|c| c.id));
  }
  assert_eq!(seen.len(), 7);
  assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 7);
  assert!(s.list(Page::new(100, 3)).await.unwrap().is_empty());
}

async fn concurrent_creates<S>(s: S, n: usize)
where
  S: ContactStore + 'static,
{
  let s = Arc::new(s);
  let handles: Vec<_> = (0..n)
    .map(|i| {
      let s = Arc::clone(&s);
      tokio::spawn(async move {
        s.create(contact("c", &i.to_string(), 1990, 6, 15)).await
      })
    })
    .collect();

  let mut ids = HashSet::new();
  for h in handles {
    ids.insert(h.await.unwrap().unwrap());
  }
  assert_eq!(ids.len(), n);
  assert_eq!(s.len(), n);
  for id in &ids {
    assert!(s.get(id).await.is_ok());
  }
}

// ─── IndexedStore ────────────────────────────────────────────────────────────

#[tokio::test]
async fn indexed_scenario() {
  scenario(IndexedStore::new(RandomToken)).await;
  scenario(IndexedStore::new(Sequential::default())).await;
}

#[tokio::test]
async fn indexed_put_round_trip() {
  put_round_trip(IndexedStore::new(Sequential::default()), 12).await;
  put_round_trip(IndexedStore::new(RandomToken), Token::random()).await;
}

#[tokio::test]
async fn indexed_delete_absent_is_noop() {
  delete_absent_is_noop(IndexedStore::new(RandomToken)).await;
}

#[tokio::test]
async fn indexed_list_is_complete() {
  list_is_complete(IndexedStore::new(RandomToken)).await;
}

#[tokio::test]
async fn indexed_pages_cover_everything_once() {
  pages_cover_everything_once(IndexedStore::new(Sequential::default())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn indexed_concurrent_creates() {
  concurrent_creates(IndexedStore::new(RandomToken), 256).await;
  concurrent_creates(IndexedStore::new(Sequential::default()), 256).await;
}

#[tokio::test]
async fn indexed_list_keeps_insertion_order() {
  let s = IndexedStore::new(Sequential::default());
  for id in [3, 1, 2] {
    s.put(id, contact("n", &id.to_string(), 2000, 1, 1)).await.unwrap();
  }
  let order = |v: Vec<rolo_core::contact::Contact<u64>>| {
    v.into_iter().map(|c| c.id).collect::<Vec<_>>()
  };
  assert_eq!(order(s.list(Page::ALL).await.unwrap()), [3, 1, 2]);

  // Replacing keeps the slot.
  s.put(1, contact("m", "1", 2000, 1, 1)).await.unwrap();
  assert_eq!(order(s.list(Page::ALL).await.unwrap()), [3, 1, 2]);
  assert_eq!(order(s.list(Page::new(1, 1)).await.unwrap()), [1]);
}

#[tokio::test]
async fn indexed_delete_reindexes_later_records() {
  let s = IndexedStore::new(Sequential::default());
  for id in 1..=4 {
    s.put(id, contact("n", &id.to_string(), 2000, 1, 1)).await.unwrap();
  }
  s.delete(&2).await.unwrap();

  // Records behind the removed slot are still reachable by key.
  assert_eq!(s.get(&3).await.unwrap().last_name, "3");
  assert_eq!(s.get(&4).await.unwrap().last_name, "4");

  s.put(2, contact("n", "2 again", 2000, 1, 1)).await.unwrap();
  let ids: Vec<_> = s.list(Page::ALL).await.unwrap().into_iter().map(|c| c.id).collect();
  assert_eq!(ids, [1, 3, 4, 2]);
  s.delete(&3).await.unwrap();
  assert_eq!(s.get(&2).await.unwrap().last_name, "2 again");
}

#[tokio::test]
async fn indexed_create_retries_on_collision() {
  let s = IndexedStore::new(Scripted::new(&[1, 1, 1, 2]));
  assert_eq!(s.create(john()).await.unwrap(), 1);
  assert_eq!(s.create(john()).await.unwrap(), 2);
  assert_eq!(s.len(), 2);
}

#[tokio::test]
async fn indexed_sequential_skips_assigned_keys() {
  let s = IndexedStore::new(Sequential::default());
  s.put(1, john()).await.unwrap();
  s.put(2, john()).await.unwrap();
  assert_eq!(s.create(john()).await.unwrap(), 3);
}

#[tokio::test]
async fn indexed_seed() {
  let s = IndexedStore::with_contacts(Sequential::default(), [john()]);
  assert_eq!(s.get(&1).await.unwrap(), john().with_id(1));
}

#[tokio::test]
async fn returned_records_are_copies() {
  let s = IndexedStore::new(Sequential::default());
  let id = s.create(john()).await.unwrap();
  let mut copy = s.get(&id).await.unwrap();
  copy.first_name.push_str("ny");
  assert_eq!(s.get(&id).await.unwrap().first_name, "john");
}

// ─── ConcurrentStore ─────────────────────────────────────────────────────────

#[tokio::test]
async fn concurrent_scenario() {
  scenario(ConcurrentStore::new(RandomToken)).await;
  scenario(ConcurrentStore::new(Sequential::default())).await;
}

#[tokio::test]
async fn concurrent_put_round_trip() {
  put_round_trip(ConcurrentStore::new(Sequential::default()), 12).await;
  put_round_trip(ConcurrentStore::new(RandomToken), Token::random()).await;
}

#[tokio::test]
async fn concurrent_delete_absent_is_noop() {
  delete_absent_is_noop(ConcurrentStore::new(RandomToken)).await;
}

#[tokio::test]
async fn concurrent_list_is_complete() {
  list_is_complete(ConcurrentStore::new(RandomToken)).await;
}

#[tokio::test]
async fn concurrent_pages_cover_everything_once() {
  pages_cover_everything_once(ConcurrentStore::new(Sequential::default())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_concurrent_creates() {
  concurrent_creates(ConcurrentStore::new(RandomToken), 256).await;
  concurrent_creates(ConcurrentStore::new(Sequential::default()), 256).await;
}

#[tokio::test]
async fn concurrent_create_retries_on_collision() {
  let s = ConcurrentStore::new(Scripted::new(&[7, 7, 8]));
  assert_eq!(s.create(john()).await.unwrap(), 7);
  assert_eq!(s.create(john()).await.unwrap(), 8);
}

#[tokio::test]
async fn concurrent_sequential_skips_assigned_keys() {
  let s = ConcurrentStore::new(Sequential::default());
  s.put(1, john()).await.unwrap();
  assert_eq!(s.create(john()).await.unwrap(), 2);
}

#[tokio::test]
async fn concurrent_seed() {
  let s = ConcurrentStore::with_contacts(RandomToken, [john(), john()]);
  assert_eq!(s.len(), 2);
}
