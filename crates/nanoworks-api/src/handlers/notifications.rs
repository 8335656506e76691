//! Handlers for the notification feed.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/notification/:email` | Caller's feed, newest first |
//! | `PATCH` | `/notification/mark-as-read/:email` | Bulk unread → read; idempotent |
//!
//! Entries are appended by the other workflows via
//! [`notify`](super::notify); nothing here creates or deletes them.

use axum::{
  Json,
  extract::{Path, State},
};
use nanoworks_core::{notification::Notification, store::MarketStore};

use super::UpdateResult;
use crate::{
  AppState, auth::AuthedUser, error::ApiError, gateway::PaymentGateway,
};

/// `GET /notification/:email` — the caller's feed. Scoped to the verified
/// caller regardless of the path segment.
pub async fn list_for<S, P>(
  caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Path(_email): Path<String>,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let feed = state
    .store
    .list_notifications_for(&caller.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(feed))
}

/// `PATCH /notification/mark-as-read/:email` — mark the caller's whole feed
/// read. Reports how many entries actually transitioned; zero is success.
pub async fn mark_read<S, P>(
  caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Path(_email): Path<String>,
) -> Result<Json<UpdateResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let transitioned = state
    .store
    .mark_notifications_read(&caller.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(UpdateResult::counted(transitioned)))
}
