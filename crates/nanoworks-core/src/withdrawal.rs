//! Withdrawal requests — a worker asking to cash coins out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pending cash-out request. Filing one does not touch the ledger; the
/// worker is debited when an admin approves (and thereby removes) it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Withdrawal {
  pub withdraw_id:   Uuid,
  pub worker_email:  String,
  pub withdraw_coin: i64,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`MarketStore::insert_withdrawal`](crate::store::MarketStore::insert_withdrawal).
#[derive(Debug, Clone)]
pub struct NewWithdrawal {
  pub worker_email:  String,
  pub withdraw_coin: i64,
}
