//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Role and status enums are
//! stored as their wire strings. UUIDs are stored as hyphenated lowercase
//! strings.

use chrono::{DateTime, Utc};
use nanoworks_core::{
  notification::{Notification, NotificationStatus},
  payment::Payment,
  submission::{Submission, SubmissionStatus},
  task::Task,
  user::{Role, User},
  withdrawal::Withdrawal,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:    String,
  pub user_email: String,
  pub user_name:  Option<String>,
  pub role:       String,
  pub coin:       i64,
  pub photo_url:  Option<String>,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      user_email: self.user_email,
      user_name:  self.user_name,
      role:       Role::parse(&self.role)?,
      coin:       self.coin,
      photo_url:  self.photo_url,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `tasks` row.
pub struct RawTask {
  pub task_id:         String,
  pub task_title:      String,
  pub task_detail:     String,
  pub submission_info: String,
  pub task_count:      i64,
  pub payable_amount:  i64,
  pub creator_email:   String,
  pub created_at:      String,
}

impl RawTask {
  pub fn into_task(self) -> Result<Task> {
    Ok(Task {
      task_id:         decode_uuid(&self.task_id)?,
      task_title:      self.task_title,
      task_detail:     self.task_detail,
      submission_info: self.submission_info,
      task_count:      self.task_count,
      payable_amount:  self.payable_amount,
      creator_email:   self.creator_email,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id:  String,
  pub task_id:        String,
  pub task_title:     String,
  pub payable_amount: i64,
  pub worker_email:   String,
  pub worker_name:    String,
  pub creator_email:  String,
  pub status:         String,
  pub created_at:     String,
}

impl RawSubmission {
  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:  decode_uuid(&self.submission_id)?,
      task_id:        decode_uuid(&self.task_id)?,
      task_title:     self.task_title,
      payable_amount: self.payable_amount,
      worker_email:   self.worker_email,
      worker_name:    self.worker_name,
      creator_email:  self.creator_email,
      status:         SubmissionStatus::parse(&self.status)?,
      created_at:     decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `withdrawals` row.
pub struct RawWithdrawal {
  pub withdraw_id:   String,
  pub worker_email:  String,
  pub withdraw_coin: i64,
  pub created_at:    String,
}

impl RawWithdrawal {
  pub fn into_withdrawal(self) -> Result<Withdrawal> {
    Ok(Withdrawal {
      withdraw_id:   decode_uuid(&self.withdraw_id)?,
      worker_email:  self.worker_email,
      withdraw_coin: self.withdraw_coin,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `payments` row.
pub struct RawPayment {
  pub payment_id:    String,
  pub email:         String,
  pub coin_purchase: i64,
  pub intent_id:     Option<String>,
  pub created_at:    String,
}

impl RawPayment {
  pub fn into_payment(self) -> Result<Payment> {
    Ok(Payment {
      payment_id:    decode_uuid(&self.payment_id)?,
      email:         self.email,
      coin_purchase: self.coin_purchase,
      intent_id:     self.intent_id,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub to_email:        String,
  pub message:         String,
  pub status:          String,
  pub time:            String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      to_email:        self.to_email,
      message:         self.message,
      status:          NotificationStatus::parse(&self.status)?,
      time:            self.time,
    })
  }
}
