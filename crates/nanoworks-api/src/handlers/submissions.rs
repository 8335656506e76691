//! Handlers for the submission review workflow.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/submission` | Any authenticated caller; body: [`NewSubmissionBody`] |
//! | `GET`   | `/submission/:email` | Caller's own submissions, newest first |
//! | `GET`   | `/submission/review/:email` | Task-creator's incoming queue |
//! | `PATCH` | `/submission` | Task-creator and owner; body: [`ReviewBody`] |
//!
//! A submission copies `task_title`, `payable_amount`, and `creator_email`
//! from the task at submit time; review works entirely off those copies.
//! Review is one-shot: a submission that has left `pending` stays reviewed.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use nanoworks_core::{
  store::MarketStore,
  submission::{NewSubmission, Submission, SubmissionStatus},
};
use serde::Deserialize;
use uuid::Uuid;

use super::{InsertResult, UpdateResult, notify};
use crate::{
  AppState,
  auth::{AuthedUser, TaskCreator},
  error::ApiError,
  gateway::PaymentGateway,
};

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /submission`. Everything else on the record
/// is copied from the referenced task or the verified caller.
#[derive(Debug, Deserialize)]
pub struct NewSubmissionBody {
  pub task_id:     Uuid,
  pub worker_name: String,
}

/// `POST /submission` — file completed work for one slot of a task.
pub async fn create<S, P>(
  caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Json(body): Json<NewSubmissionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let task = state
    .store
    .get_task(body.task_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("task {} not found", body.task_id))
    })?;

  let submission = state
    .store
    .insert_submission(NewSubmission {
      task_id:        task.task_id,
      task_title:     task.task_title,
      payable_amount: task.payable_amount,
      worker_email:   caller.email,
      worker_name:    body.worker_name,
      creator_email:  task.creator_email,
    })
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  notify(
    state.store.as_ref(),
    &submission.creator_email,
    format!(
      "{} submitted work for \"{}\"",
      submission.worker_name, submission.task_title
    ),
  )
  .await;

  Ok((
    StatusCode::CREATED,
    Json(InsertResult::for_id(submission.submission_id)),
  ))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /submission/:email` — the caller's own submissions. As with
/// `/myTasks`, the path segment is decorative; results are scoped to the
/// verified caller.
pub async fn list_mine<S, P>(
  caller: AuthedUser,
  State(state): State<AppState<S, P>>,
  Path(_email): Path<String>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let submissions = state
    .store
    .list_submissions_by_worker(&caller.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(submissions))
}

/// `GET /submission/review/:email` — submissions filed against the caller's
/// tasks, newest first.
pub async fn list_for_review<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Path(_email): Path<String>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  let submissions = state
    .store
    .list_submissions_for_creator(&creator.email)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(submissions))
}

// ─── Review ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `PATCH /submission`.
#[derive(Debug, Deserialize)]
pub struct ReviewBody {
  pub id:     Uuid,
  pub status: SubmissionStatus,
}

/// `PATCH /submission` — approve or reject a pending submission.
///
/// Approval credits the worker by the submission's stored `payable_amount`;
/// nothing in the request body can change the figure. The credit lands
/// before the status flips, so a failure in between leaves the submission
/// pending and visibly unfinished rather than silently unpaid.
pub async fn review<S, P>(
  creator: TaskCreator,
  State(state): State<AppState<S, P>>,
  Json(body): Json<ReviewBody>,
) -> Result<Json<UpdateResult>, ApiError>
where
  S: MarketStore,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway,
{
  if body.status == SubmissionStatus::Pending {
    return Err(ApiError::Validation(
      "status must be approved or rejected".into(),
    ));
  }

  let submission = state
    .store
    .get_submission(body.id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("submission {} not found", body.id))
    })?;
  if submission.creator_email != creator.email {
    return Err(ApiError::Forbidden);
  }
  if submission.status.is_terminal() {
    return Err(ApiError::Conflict(format!(
      "submission {} was already reviewed",
      body.id
    )));
  }

  if body.status == SubmissionStatus::Approved {
    let matched = state
      .store
      .adjust_coins(&submission.worker_email, submission.payable_amount)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    if !matched {
      return Err(ApiError::NotFound(format!(
        "user {} not found",
        submission.worker_email
      )));
    }
  }

  let matched = state
    .store
    .set_submission_status(body.id, body.status)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !matched {
    return Err(ApiError::NotFound(format!(
      "submission {} not found",
      body.id
    )));
  }

  match body.status {
    SubmissionStatus::Approved => {
      notify(
        state.store.as_ref(),
        &submission.worker_email,
        format!(
          "you earned {} coins from \"{}\"",
          submission.payable_amount, submission.task_title
        ),
      )
      .await;
      notify(
        state.store.as_ref(),
        &submission.worker_email,
        format!("your submission for \"{}\" was approved", submission.task_title),
      )
      .await;
    }
    _ => {
      notify(
        state.store.as_ref(),
        &submission.worker_email,
        format!("your submission for \"{}\" was rejected", submission.task_title),
      )
      .await;
    }
  }

  Ok(Json(UpdateResult::single()))
}
