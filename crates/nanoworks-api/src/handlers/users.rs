//! Handlers for account registration and administration.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/users` | Open; body: [`RegisterBody`]; duplicate email → `{"acknowledged":false}` |
//! | `GET`    | `/users` | Admin only |
//! | `GET`    | `/user/:email` | Any authenticated caller |
//! | `PATCH`  | `/user` | Admin only; body: [`SetRoleBody`] |
//! | `PATCH`  | `/user/photo_url` | Any authenticated caller; body: [`SetPhotoBody`]; own row only |
//! | `DELETE` | `/user/:id` | Admin only; no cascade to owned records |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use nanoworks_core::{
  store::MarketStore,
  user::{NewUser, Role, User},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::{DeleteResult, InsertResult, UpdateResult};
use crate::{
  AppState,
  auth::{Admin, AuthedUser},
  error::ApiError,
  gateway::PaymentGateway,
};

// ─── Register ────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /users`.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub user_email: String,
  pub user_name:  Option<String>,
  /// Defaults to `worker` when absent.
  pub role:       Option<Role>,
  pub photo_url:  Option<String>,
}

impl From<RegisterBody> for NewUser {
  fn from(b: RegisterBody) -> Self {
    NewUser {
      user_email: b.user_email,
      user_name:  b.user_name,
      role:       b.role.unwrap_or(Role::Worker),
      coin:       0,
      photo_url:  b.photo_url,
    }
  }
}

/// `POST /users` — open registration, called before the caller has a token.
///
/// An already-registered email is acknowledged with `{"acknowledged":false}`
/// rather than an error so the login flow can re-post the profile blindly.
pub async fn register<S, P>(
  State(state): State<AppState<S, P>>,
  Json(body): Json<RegisterBody>,
) -> Result<Response, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let existing = state
    .store
    .get_user(&body.user_email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if existing.is_some() {
    let body = json!({ "acknowledged": false, "message": "user already exists" });
    return Ok(Json(body).into_response());
  }

  let user = state
    .store
    .insert_user(NewUser::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(
    (StatusCode::CREATED, Json(InsertResult::for_id(user.user_id)))
      .into_response(),
  )
}

// ─── List / get ──────────────────────────────────────────────────────────────

/// `GET /users` — every account, newest first.
pub async fn list<S, P>(
  _admin: Admin,
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let users = state
    .store
    .list_users()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(users))
}

/// `GET /user/:email` — single account by email.
pub async fn get_one<S, P>(
  _caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Path(email): Path<String>,
) -> Result<Json<User>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let user = state
    .store
    .get_user(&email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("user {email} not found")))?;
  Ok(Json(user))
}

// ─── Mutations ───────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /user`.
#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
  pub id:   Uuid,
  pub role: Role,
}

/// `PATCH /user` — admin changes an account's role.
pub async fn set_role<S, P>(
  _admin: Admin,
  State(state): State<AppState<S, P>>,
  Json(body): Json<SetRoleBody>,
) -> Result<Json<UpdateResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let matched = state
    .store
    .set_user_role(body.id, body.role)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!("user {} not found", body.id)));
  }
  Ok(Json(UpdateResult::single()))
}

/// JSON body accepted by `PATCH /user/photo_url`. Older clients also send an
/// `email` member; it is ignored — the write always targets the verified
/// caller's own row.
#[derive(Debug, Deserialize)]
pub struct SetPhotoBody {
  pub photo_url: String,
}

/// `PATCH /user/photo_url` — set the caller's profile photo.
pub async fn set_photo<S, P>(
  caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Json(body): Json<SetPhotoBody>,
) -> Result<Json<UpdateResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let matched = state
    .store
    .set_user_photo(&caller.email, &body.photo_url)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!(
      "user {} not found",
      caller.email
    )));
  }
  Ok(Json(UpdateResult::single()))
}

/// `DELETE /user/:id` — remove an account. Tasks and submissions the account
/// owns are left in place.
pub async fn delete<S, P>(
  _admin: Admin,
  State(state): State<AppState<S, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DeleteResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let deleted = state
    .store
    .delete_user(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("user {id} not found")));
  }
  Ok(Json(DeleteResult::single()))
}
