//! Handlers for the withdrawal workflow.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/withdraw` | Any authenticated caller; body: [`WithdrawBody`] |
//! | `GET`    | `/withdraw` | Admin; all pending requests, newest first |
//! | `DELETE` | `/withdraw` | Admin; body: [`ApproveBody`]; debits, notifies, removes |
//!
//! Filing a request does not touch the ledger. Approval debits the stored
//! amount from the stored worker, with no sufficiency check, and only then
//! removes the record, so a partial failure leaves the request listed.

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use nanoworks_core::{store::MarketStore, withdrawal::{NewWithdrawal, Withdrawal}};
use serde::Deserialize;
use uuid::Uuid;

use super::{DeleteResult, InsertResult, notify};
use crate::{
  AppState,
  auth::{Admin, AuthedUser},
  error::ApiError,
  gateway::PaymentGateway,
};

// ─── Request ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /withdraw`. The worker email is always the
/// verified caller's.
#[derive(Debug, Deserialize)]
pub struct WithdrawBody {
  pub withdraw_coin: i64,
}

/// `POST /withdraw` — ask to cash out. The balance is untouched until an
/// admin approves.
pub async fn request<S, P>(
  caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Json(body): Json<WithdrawBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  if body.withdraw_coin < 1 {
    return Err(ApiError::Validation(
      "withdraw_coin must be at least 1".into(),
    ));
  }

  let withdrawal = state
    .store
    .insert_withdrawal(NewWithdrawal {
      worker_email:  caller.email,
      withdraw_coin: body.withdraw_coin,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok((
    StatusCode::CREATED,
    Json(InsertResult::for_id(withdrawal.withdraw_id)),
  ))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /withdraw` — every pending request, newest first.
pub async fn list<S, P>(
  _admin: Admin,
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<Withdrawal>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let withdrawals = state
    .store
    .list_withdrawals()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(withdrawals))
}

// ─── Approve ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `DELETE /withdraw`. Older clients also send the
/// amount and worker email; both are ignored in favour of the stored record.
#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  pub withdraw_id: Uuid,
}

/// `DELETE /withdraw` — approve a request: debit the worker by the stored
/// amount, notify them, remove the record.
pub async fn approve<S, P>(
  _admin: Admin,
  State(state): State<AppState<S, P>>,
  Json(body): Json<ApproveBody>,
) -> Result<Json<DeleteResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let withdrawal = state
    .store
    .get_withdrawal(body.withdraw_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("withdrawal {} not found", body.withdraw_id))
    })?;

  let matched = state
    .store
    .adjust_coins(&withdrawal.worker_email, -withdrawal.withdraw_coin)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!(
      "user {} not found",
      withdrawal.worker_email
    )));
  }

  notify(
    state.store.as_ref(),
    &withdrawal.worker_email,
    format!(
      "your withdrawal of {} coins was approved",
      withdrawal.withdraw_coin
    ),
  )
  .await;

  let deleted = state
    .store
    .delete_withdrawal(body.withdraw_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!(
      "withdrawal {} not found",
      body.withdraw_id
    )));
  }
  Ok(Json(DeleteResult::single()))
}
