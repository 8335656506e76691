//! Payment records — confirmed real-money purchases of coins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A confirmed coin purchase. Inserting one pairs with a ledger credit of
/// `coin_purchase` to `email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
  pub payment_id:    Uuid,
  pub email:         String,
  pub coin_purchase: i64,
  /// Provider-side reference for the charge, when the client relays one.
  pub intent_id:     Option<String>,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`MarketStore::insert_payment`](crate::store::MarketStore::insert_payment).
#[derive(Debug, Clone)]
pub struct NewPayment {
  pub email:         String,
  pub coin_purchase: i64,
  pub intent_id:     Option<String>,
}
