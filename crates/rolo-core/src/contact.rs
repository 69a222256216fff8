//! The contact record.
//!
//! A contact is a flat record: two names and a birthday. It is generic over
//! its key type so the same record serves both identifier strategies (see
//! [`crate::key`]).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Wire and display format for birthdays, e.g. `1999-12-31`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A stored contact, bundled with the key it lives under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact<K> {
  pub id:         K,
  #[serde(rename = "firstname")]
  pub first_name: String,
  #[serde(rename = "lastname")]
  pub last_name:  String,
  /// Calendar date with no time-of-day; serialised as `YYYY-MM-DD`.
  pub birthday:   NaiveDate,
}

/// The caller-supplied part of a contact: everything except the key.
///
/// Stores accept this on `create` and `put` so the key is always decided by
/// the store call, never smuggled in through the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
  #[serde(rename = "firstname")]
  pub first_name: String,
  #[serde(rename = "lastname")]
  pub last_name:  String,
  pub birthday:   NaiveDate,
}

impl NewContact {
  pub fn new(
    first_name: impl Into<String>,
    last_name: impl Into<String>,
    birthday: NaiveDate,
  ) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      birthday,
    }
  }

  /// Attach a key, producing the stored form.
  pub fn with_id<K>(self, id: K) -> Contact<K> {
    Contact {
      id,
      first_name: self.first_name,
      last_name: self.last_name,
      birthday: self.birthday,
    }
  }
}

impl<K> From<Contact<K>> for NewContact {
  fn from(c: Contact<K>) -> Self {
    Self {
      first_name: c.first_name,
      last_name:  c.last_name,
      birthday:   c.birthday,
    }
  }
}

/// Parse a `YYYY-MM-DD` birthday.
pub fn parse_birthday(s: &str) -> Result<NaiveDate, chrono::ParseError> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
}
