//! Tasks — paid micro-work posted by task-creators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A posted micro-task offering `task_count` submission slots, each paying
/// `payable_amount` coins on approval. Posting one debits the creator by
/// [`total_cost`](Task::total_cost) with no sufficiency check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
  pub task_id:         Uuid,
  pub task_title:      String,
  pub task_detail:     String,
  /// Instructions telling workers what proof to attach when submitting.
  pub submission_info: String,
  pub task_count:      i64,
  pub payable_amount:  i64,
  pub creator_email:   String,
  pub created_at:      DateTime<Utc>,
}

impl Task {
  /// The coin cost of posting this task; also the refund on creator delete.
  /// `None` when the product falls outside the coin ledger's integer range.
  pub fn total_cost(&self) -> Option<i64> {
    self.task_count.checked_mul(self.payable_amount)
  }
}

/// Input to [`MarketStore::insert_task`](crate::store::MarketStore::insert_task).
#[derive(Debug, Clone)]
pub struct NewTask {
  pub task_title:      String,
  pub task_detail:     String,
  pub submission_info: String,
  pub task_count:      i64,
  pub payable_amount:  i64,
  pub creator_email:   String,
}

/// The creator-mutable subset of task fields. `None` leaves a field as is.
/// Counts, amounts, and ownership are never mutable after posting.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
  pub task_title:      Option<String>,
  pub task_detail:     Option<String>,
  pub submission_info: Option<String>,
}
