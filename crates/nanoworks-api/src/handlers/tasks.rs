//! Handlers for the task lifecycle.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/tasks` | Open; all tasks, newest first |
//! | `GET`    | `/task/:id` | Any authenticated caller |
//! | `GET`    | `/myTasks/:email` | Task-creator; always scoped to the caller |
//! | `POST`   | `/task` | Task-creator; body: [`NewTaskBody`]; debits the poster |
//! | `PATCH`  | `/task/:id` | Task-creator and owner; body: [`TaskPatchBody`] |
//! | `DELETE` | `/task` | Task-creator and owner; refunds the stored cost |
//! | `DELETE` | `/task/:id` | Admin; no refund |
//!
//! Posting debits `task_count × payable_amount` from the creator with no
//! sufficiency check, so a balance can go negative. A product outside the
//! `i64` coin range is rejected before any write. The debit follows the
//! insert; the refund on creator delete precedes it.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use nanoworks_core::{
  store::MarketStore,
  task::{NewTask, Task, TaskPatch},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{DeleteResult, InsertResult, UpdateResult, notify};
use crate::{
  AppState,
  auth::{Admin, AuthedUser, TaskCreator},
  error::ApiError,
  gateway::PaymentGateway,
};

// ─── List / get ──────────────────────────────────────────────────────────────

/// `GET /tasks` — the public task board.
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
) -> Result<Json<Vec<Task>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let tasks = state
    .store
    .list_tasks()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(tasks))
}

/// `GET /task/:id`
pub async fn get_one<S, P>(
  _caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Task>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let task = state
    .store
    .get_task(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("task {id} not found")))?;
  Ok(Json(task))
}

/// `GET /myTasks/:email` — the caller's own postings. The path segment is
/// kept for client compatibility; results are always scoped to the verified
/// caller, whatever it says.
pub async fn list_mine<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Path(_email): Path<String>,
) -> Result<Json<Vec<Task>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let tasks = state
    .store
    .list_tasks_by_creator(&creator.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(tasks))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /task`. `creator_email` is never taken from
/// the body; it comes from the verified caller.
#[derive(Debug, Deserialize)]
pub struct NewTaskBody {
  pub task_title:      String,
  pub task_detail:     String,
  pub submission_info: String,
  pub task_count:      i64,
  pub payable_amount:  i64,
}

/// `POST /task` — post a task and reserve its total cost from the caller's
/// balance.
pub async fn create<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Json(body): Json<NewTaskBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  if body.task_count < 1 {
    return Err(ApiError::Validation("task_count must be at least 1".into()));
  }
  if body.payable_amount < 1 {
    return Err(ApiError::Validation(
      "payable_amount must be at least 1".into(),
    ));
  }
  let cost = body
    .task_count
    .checked_mul(body.payable_amount)
    .ok_or_else(|| {
      ApiError::Validation("task cost overflows the coin ledger".into())
    })?;

  let task = state
    .store
    .insert_task(NewTask {
      task_title:      body.task_title,
      task_detail:     body.task_detail,
      submission_info: body.submission_info,
      task_count:      body.task_count,
      payable_amount:  body.payable_amount,
      creator_email:   creator.email,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let matched = state
    .store
    .adjust_coins(&task.creator_email, -cost)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!(
      "user {} not found",
      task.creator_email
    )));
  }

  notify(
    state.store.as_ref(),
    &task.creator_email,
    format!(
      "your task \"{}\" is live, {cost} coins reserved",
      task.task_title
    ),
  )
  .await;

  Ok((
    StatusCode::CREATED,
    Json(InsertResult::for_id(task.task_id)),
  ))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /task/:id`. Absent fields are left as is;
/// counts, amounts, and ownership are not mutable here.
#[derive(Debug, Deserialize)]
pub struct TaskPatchBody {
  pub task_title:      Option<String>,
  pub task_detail:     Option<String>,
  pub submission_info: Option<String>,
}

impl From<TaskPatchBody> for TaskPatch {
  fn from(b: TaskPatchBody) -> Self {
    TaskPatch {
      task_title:      b.task_title,
      task_detail:     b.task_detail,
      submission_info: b.submission_info,
    }
  }
}

/// `PATCH /task/:id` — edit a posting. Only its creator may.
pub async fn update<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Path(id): Path<Uuid>,
  Json(body): Json<TaskPatchBody>,
) -> Result<Json<UpdateResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let task = state
    .store
    .get_task(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("task {id} not found")))?;
  if task.creator_email != creator.email {
    return Err(ApiError::Forbidden);
  }

  let matched = state
    .store
    .update_task(id, TaskPatch::from(body))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!("task {id} not found")));
  }
  Ok(Json(UpdateResult::single()))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `DELETE /task`. Older clients also send `coin` and
/// `email`; both are ignored — the refund is recomputed from the stored task
/// and credited to its stored creator.
#[derive(Debug, Deserialize)]
pub struct DeleteTaskBody {
  pub id: Uuid,
}

/// `DELETE /task` — take down a posting and refund its full cost.
pub async fn delete_refunded<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Json(body): Json<DeleteTaskBody>,
) -> Result<Json<DeleteResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let task = state
    .store
    .get_task(body.id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("task {} not found", body.id)))?;
  if task.creator_email != creator.email {
    return Err(ApiError::Forbidden);
  }

  let refund = task.total_cost().ok_or_else(|| {
    ApiError::Validation("task cost overflows the coin ledger".into())
  })?;
  let matched = state
    .store
    .adjust_coins(&task.creator_email, refund)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!(
      "user {} not found",
      task.creator_email
    )));
  }

  let deleted = state
    .store
    .delete_task(body.id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("task {} not found", body.id)));
  }
  Ok(Json(DeleteResult::single()))
}

/// `DELETE /task/:id` — admin takedown. No refund.
pub async fn delete_as_admin<S, P>(
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
    .delete_task(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("task {id} not found")));
  }
  Ok(Json(DeleteResult::single()))
}
