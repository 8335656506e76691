//! User accounts and the marketplace role vocabulary.
//!
//! The email address is the identity key throughout the system; the UUID is
//! only an opaque handle for admin operations that address a row directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// What a user account is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
  Admin,
  TaskCreator,
  Worker,
}

impl Role {
  /// The string stored in the `role` column and sent on the wire.
  /// Must match the `rename_all = "kebab-case"` serde tags above.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Admin => "admin",
      Self::TaskCreator => "task-creator",
      Self::Worker => "worker",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "admin" => Ok(Self::Admin),
      "task-creator" => Ok(Self::TaskCreator),
      "worker" => Ok(Self::Worker),
      other => Err(Error::UnknownRole(other.to_string())),
    }
  }
}

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub user_email: String,
  pub user_name:  Option<String>,
  pub role:       Role,
  /// Internal credit balance. Mutated only through
  /// [`MarketStore::adjust_coins`](crate::store::MarketStore::adjust_coins);
  /// the ledger never floors at zero, so this can go negative.
  pub coin:       i64,
  pub photo_url:  Option<String>,
  pub created_at: DateTime<Utc>,
}

/// Input to [`MarketStore::insert_user`](crate::store::MarketStore::insert_user).
/// `user_id` and `created_at` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub user_email: String,
  pub user_name:  Option<String>,
  pub role:       Role,
  pub coin:       i64,
  pub photo_url:  Option<String>,
}

impl NewUser {
  /// Convenience constructor for a fresh registration: the given role, an
  /// empty balance, no profile fields.
  pub fn new(user_email: impl Into<String>, role: Role) -> Self {
    Self {
      user_email: user_email.into(),
      user_name: None,
      role,
      coin: 0,
      photo_url: None,
    }
  }
}
