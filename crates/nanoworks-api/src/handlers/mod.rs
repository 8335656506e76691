//! Request handlers, grouped by resource.

pub mod notifications;
pub mod payments;
pub mod submissions;
pub mod tasks;
pub mod users;
pub mod withdrawals;

use nanoworks_core::{notification::NewNotification, store::MarketStore};
use serde::Serialize;
use uuid::Uuid;

// ─── Write acknowledgements ──────────────────────────────────────────────────

/// Body returned by every successful insert.
#[derive(Debug, Serialize)]
pub struct InsertResult {
  pub acknowledged: bool,
  pub inserted_id:  Uuid,
}

impl InsertResult {
  pub fn for_id(inserted_id: Uuid) -> Self {
    Self {
      acknowledged: true,
      inserted_id,
    }
  }
}

/// Body returned by every successful update.
#[derive(Debug, Serialize)]
pub struct UpdateResult {
  pub acknowledged:   bool,
  pub matched_count:  usize,
  pub modified_count: usize,
}

impl UpdateResult {
  /// An update that addressed exactly one row.
  pub fn single() -> Self {
    Self::counted(1)
  }

  pub fn counted(rows: usize) -> Self {
    Self {
      acknowledged:   true,
      matched_count:  rows,
      modified_count: rows,
    }
  }
}

/// Body returned by every successful delete.
#[derive(Debug, Serialize)]
pub struct DeleteResult {
  pub acknowledged:  bool,
  pub deleted_count: usize,
}

impl DeleteResult {
  pub fn single() -> Self {
    Self {
      acknowledged:  true,
      deleted_count: 1,
    }
  }
}

// ─── Notification fan-out ────────────────────────────────────────────────────

/// Append a feed entry for `to_email`, best effort. The triggering write has
/// already landed, so a failure here is logged rather than surfaced.
pub(crate) async fn notify<S>(store: &S, to_email: &str, message: String)
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let input = NewNotification::new(to_email, message);
  if let Err(e) = store.insert_notification(input).await {
    tracing::warn!(to_email, error = %e, "failed to insert notification");
  }
}
