//! In-memory backends for the rolo contact store.
//!
//! Two interchangeable implementations of [`rolo_core::store::ContactStore`]:
//!
//! - [`IndexedStore`]: one reader/writer lock over a key index and an
//!   insertion-ordered vector. Listing is stable, so pagination means
//!   something.
//! - [`ConcurrentStore`]: a sharded concurrent map. No global lock and no
//!   ordering; use it when only point lookups and bulk iteration matter.
//!
//! Nothing is persisted. Records live until deleted or the process exits.

mod concurrent;
mod indexed;

pub use concurrent::ConcurrentStore;
pub use indexed::IndexedStore;

#[cfg(test)]
mod tests;
