//! Error types for `nanoworks-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("unknown submission status: {0:?}")]
  UnknownSubmissionStatus(String),

  #[error("unknown notification status: {0:?}")]
  UnknownNotificationStatus(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
