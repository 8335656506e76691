//! Submissions — completed work waiting for, or past, review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Review state of a submission. Terminal once it leaves `Pending`; a
/// reviewed submission is never re-opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
  Pending,
  Approved,
  Rejected,
}

impl SubmissionStatus {
  /// The string stored in the `status` column and sent on the wire.
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Pending => "pending",
      Self::Approved => "approved",
      Self::Rejected => "rejected",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(Self::Pending),
      "approved" => Ok(Self::Approved),
      "rejected" => Ok(Self::Rejected),
      other => Err(Error::UnknownSubmissionStatus(other.to_string())),
    }
  }

  pub fn is_terminal(&self) -> bool { !matches!(self, Self::Pending) }
}

/// A worker's completed-work record for one slot of a task.
///
/// `task_title` and `payable_amount` are copied from the task at submit
/// time. Approval credits the copied amount, never a caller-supplied one,
/// so the figure a reviewer sees is the figure the worker is paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:  Uuid,
  pub task_id:        Uuid,
  pub task_title:     String,
  pub payable_amount: i64,
  pub worker_email:   String,
  pub worker_name:    String,
  pub creator_email:  String,
  pub status:         SubmissionStatus,
  pub created_at:     DateTime<Utc>,
}

/// Input to [`MarketStore::insert_submission`](crate::store::MarketStore::insert_submission).
/// Status always starts at `Pending`.
#[derive(Debug, Clone)]
pub struct NewSubmission {
  pub task_id:        Uuid,
  pub task_title:     String,
  pub payable_amount: i64,
  pub worker_email:   String,
  pub worker_name:    String,
  pub creator_email:  String,
}
