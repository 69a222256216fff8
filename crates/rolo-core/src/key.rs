//! Contact identifiers and the strategies that mint them.
//!
//! Two identifier shapes are supported behind [`ContactKey`]:
//!
//! - `u64`: small integers. Either assigned by the caller (`PUT
//!   /contacts/{id}`) or handed out by [`Sequential`].
//! - [`Token`]: 128 random bits rendered as 22 characters of unpadded
//!   URL-safe base64, handed out by [`RandomToken`].
//!
//! Generators only propose candidates. Uniqueness is the store's job: it
//! keeps asking for a new candidate until one is vacant, and claims it under
//! the same lock it checked with.

use std::{
  fmt,
  hash::Hash,
  str::FromStr,
  sync::atomic::{AtomicU64, Ordering},
};

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use thiserror::Error;
use uuid::Uuid;

// ─── Key trait ───────────────────────────────────────────────────────────────

/// Anything usable as a contact identifier.
///
/// Keys travel through URL paths and JSON bodies, so they must round-trip
/// through both `Display`/`FromStr` and serde.
pub trait ContactKey:
  Clone
  + Eq
  + Hash
  + fmt::Debug
  + fmt::Display
  + FromStr<Err: fmt::Display>
  + Serialize
  + DeserializeOwned
  + Send
  + Sync
  + 'static
{
}

impl ContactKey for u64 {}
impl ContactKey for Token {}

// ─── Token ───────────────────────────────────────────────────────────────────

/// Number of characters in the text form of a [`Token`].
pub const TOKEN_LEN: usize = 22;

/// A server-generated, fixed-width identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token([u8; 16]);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
  #[error("invalid length: expected {TOKEN_LEN} characters, got {0}")]
  InvalidLength(usize),

  #[error("invalid encoding: {0}")]
  InvalidEncoding(#[from] base64::DecodeError),
}

impl Token {
  /// A fresh token from the OS random source (UUID v4 bits).
  pub fn random() -> Self { Self(*Uuid::new_v4().as_bytes()) }

  pub const fn from_bytes(bytes: [u8; 16]) -> Self { Self(bytes) }

  pub const fn as_bytes(&self) -> &[u8; 16] { &self.0 }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
  }
}

impl fmt::Debug for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Token({self})")
  }
}

impl FromStr for Token {
  type Err = TokenError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s.len() != TOKEN_LEN {
      return Err(TokenError::InvalidLength(s.len()));
    }
    let decoded = URL_SAFE_NO_PAD.decode(s)?;
    let bytes = <[u8; 16]>::try_from(decoded.as_slice())
      .map_err(|_| TokenError::InvalidLength(s.len()))?;
    Ok(Self(bytes))
  }
}

impl Serialize for Token {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Token {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

// ─── Generators ──────────────────────────────────────────────────────────────

/// Proposes candidate keys for server-side creation.
///
/// Candidates may collide with keys already in use; stores retry.
pub trait KeyGenerator<K>: Send + Sync {
  fn generate(&self) -> K;
}

/// Hands out `1, 2, 3, …`.
///
/// Values already claimed through `put` are skipped by the store's retry
/// loop, so the counter never needs to know about them.
#[derive(Debug)]
pub struct Sequential {
  next: AtomicU64,
}

impl Sequential {
  pub const fn starting_at(first: u64) -> Self {
    Self { next: AtomicU64::new(first) }
  }
}

impl Default for Sequential {
  fn default() -> Self { Self::starting_at(1) }
}

impl KeyGenerator<u64> for Sequential {
  fn generate(&self) -> u64 { self.next.fetch_add(1, Ordering::Relaxed) }
}

/// Hands out [`Token::random`] values.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomToken;

impl KeyGenerator<Token> for RandomToken {
  fn generate(&self) -> Token { Token::random() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn token_text_is_fixed_width_and_url_safe() {
    for _ in 0..64 {
      let s = Token::random().to_string();
      assert_eq!(s.len(), TOKEN_LEN);
      assert!(
        s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
        "unexpected character in {s}"
      );
    }
  }

  #[test]
  fn token_parses_its_own_output() {
    let t = Token::from_bytes([0xfb; 16]);
    let parsed: Token = t.to_string().parse().unwrap();
    assert_eq!(parsed, t);
  }

  #[test]
  fn token_rejects_wrong_length() {
    assert_eq!(
      "abc".parse::<Token>(),
      Err(TokenError::InvalidLength(3))
    );
    let long = "A".repeat(TOKEN_LEN + 2);
    assert!(matches!(
      long.parse::<Token>(),
      Err(TokenError::InvalidLength(24))
    ));
  }

  #[test]
  fn token_rejects_foreign_alphabet() {
    let s = format!("{}+/", "A".repeat(TOKEN_LEN - 2));
    assert!(matches!(
      s.parse::<Token>(),
      Err(TokenError::InvalidEncoding(_))
    ));
  }

  #[test]
  fn token_serialises_as_string() {
    let t = Token::from_bytes([0; 16]);
    let json = serde_json::to_string(&t).unwrap();
    assert_eq!(json, format!("\"{}\"", "A".repeat(TOKEN_LEN)));
    let back: Token = serde_json::from_str(&json).unwrap();
    assert_eq!(back, t);
  }

  #[test]
  fn sequential_counts_up() {
    let g = Sequential::starting_at(5);
    assert_eq!(g.generate(), 5);
    assert_eq!(g.generate(), 6);
    assert_eq!(Sequential::default().generate(), 1);
  }
}
