//! Notifications — the append-only, per-recipient event feed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Read state of a notification. `Read` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
  Unread,
  Read,
}

impl NotificationStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Unread => "unread",
      Self::Read => "read",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "unread" => Ok(Self::Unread),
      "read" => Ok(Self::Read),
      other => Err(Error::UnknownNotificationStatus(other.to_string())),
    }
  }
}

/// One feed entry.
///
/// `time` is a human-readable label for display, not a sortable timestamp.
/// Feed ordering comes from insertion order, never from parsing this field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub to_email:        String,
  pub message:         String,
  pub status:          NotificationStatus,
  pub time:            String,
}

/// Input to [`MarketStore::insert_notification`](crate::store::MarketStore::insert_notification).
/// Status always starts at `Unread`.
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub to_email: String,
  pub message:  String,
  pub time:     String,
}

impl NewNotification {
  /// Build an entry stamped with the current time in display form.
  pub fn new(to_email: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      to_email: to_email.into(),
      message:  message.into(),
      time:     Utc::now().format("%-d %b %Y, %-I:%M %p").to_string(),
    }
  }
}
