//! Handlers for payment intake.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/create-payment-intent` | Task-creator; body: [`IntentBody`]; returns `{"client_secret":…}` |
//! | `POST` | `/payment` | Task-creator; body: [`PaymentBody`]; credits then records |
//! | `GET`  | `/payments` | Admin; every record, newest first |
//! | `GET`  | `/payments/:email` | Task-creator; caller's own records |
//! | `POST` | `/payment/paypal/complete-order` | Open; creates a PayPal order for the fixed bundle |
//!
//! Coin purchases are gated to task-creators; workers receive coins through
//! approvals, never by buying them. The PayPal path only creates the order
//! and relays the provider response; it writes nothing.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use nanoworks_core::{
  payment::{NewPayment, Payment},
  store::MarketStore,
};
use serde::Deserialize;
use serde_json::json;

use super::{InsertResult, notify};
use crate::{
  AppState,
  auth::{Admin, TaskCreator},
  error::ApiError,
  gateway::PaymentGateway,
};

// ─── Card intent ─────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /create-payment-intent`.
#[derive(Debug, Deserialize)]
pub struct IntentBody {
  pub dollars: f64,
}

/// `POST /create-payment-intent` — ask the card provider for a payment
/// intent. Dollars convert to provider minor units by ×100, truncating.
pub async fn create_intent<S, P>(
  _creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Json(body): Json<IntentBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  if !(body.dollars > 0.0) {
    return Err(ApiError::Validation("dollars must be positive".into()));
  }
  let amount_cents = (body.dollars * 100.0) as i64;

  let intent = state
    .payments
    .create_card_intent(amount_cents)
    .await
    .map_err(|e| ApiError::PaymentProvider(Box::new(e)))?;
  Ok(Json(json!({ "client_secret": intent.client_secret })))
}

// ─── Confirmation ────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /payment`, sent after the client-side charge
/// succeeds. `intent_id` is the provider's reference when the client has one.
#[derive(Debug, Deserialize)]
pub struct PaymentBody {
  pub email:         String,
  pub coin_purchase: i64,
  pub intent_id:     Option<String>,
}

/// `POST /payment` — record a confirmed purchase: credit `coin_purchase` to
/// the payer, insert the payment record, notify the payer.
pub async fn confirm<S, P>(
  _creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Json(body): Json<PaymentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  if body.coin_purchase < 1 {
    return Err(ApiError::Validation(
      "coin_purchase must be at least 1".into(),
    ));
  }

  let matched = state
    .store
    .adjust_coins(&body.email, body.coin_purchase)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!("user {} not found", body.email)));
  }

  let payment = state
    .store
    .insert_payment(NewPayment {
      email:         body.email,
      coin_purchase: body.coin_purchase,
      intent_id:     body.intent_id,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  notify(
    state.store.as_ref(),
    &payment.email,
    format!("{} coins were added to your account", payment.coin_purchase),
  )
  .await;

  Ok((
    StatusCode::CREATED,
    Json(InsertResult::for_id(payment.payment_id)),
  ))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /payments` — every payment record, newest first.
pub async fn list<S, P>(
  _admin: Admin,
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<Payment>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let payments = state
    .store
    .list_payments()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(payments))
}

/// `GET /payments/:email` — the caller's own purchase history. Scoped to the
/// verified caller regardless of the path segment.
pub async fn list_mine<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Path(_email): Path<String>,
) -> Result<Json<Vec<Payment>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let payments = state
    .store
    .list_payments_by_email(&creator.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(payments))
}

// ─── PayPal ──────────────────────────────────────────────────────────────────

/// `POST /payment/paypal/complete-order` — create a PayPal order for the
/// fixed coin bundle and relay the provider's response.
pub async fn paypal_order<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let order = state
    .payments
    .create_paypal_order()
    .await
    .map_err(|e| ApiError::PaymentProvider(Box::new(e)))?;
  Ok(Json(json!({
    "access_token": order.access_token,
    "data": order.order,
  })))
}
