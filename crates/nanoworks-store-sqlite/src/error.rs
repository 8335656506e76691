//! Error type for `nanoworks-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nanoworks_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// Email uniqueness violation surfaced from the `users` table.
  #[error("user already exists: {0}")]
  DuplicateUser(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
