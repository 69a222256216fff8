//! Error types for `rolo-core`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// No record is stored under the requested key.
  #[error("object not found: {0}")]
  NotFound(String),
}

impl Error {
  pub fn not_found(key: impl std::fmt::Display) -> Self {
    Self::NotFound(key.to_string())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
