//! JSON REST API for the nanoworks micro-task marketplace.
//!
//! Exposes an axum [`Router`] backed by any [`MarketStore`] and
//! [`PaymentGateway`]. Token issuance, the role gates, the coin-moving
//! workflows, and payment intake all live here; transport concerns (CORS,
//! request tracing) are layered on by the binary.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod handlers;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use nanoworks_core::store::MarketStore;
use serde::Deserialize;

use auth::TokenKeys;
use gateway::PaymentGateway;
use handlers::{
  notifications, payments, submissions, tasks, users, withdrawals,
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub allowed_origins:      Vec<String>,
  pub token_secret:         String,
  pub card_api_base:        String,
  pub card_secret_key:      String,
  pub paypal_api_base:      String,
  pub paypal_client_id:     String,
  pub paypal_client_secret: String,
  pub paypal_return_base:   String,
  pub paypal_brand_name:    String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: MarketStore, P: PaymentGateway> {
  pub store:    Arc<S>,
  pub config:   Arc<ServerConfig>,
  pub keys:     Arc<TokenKeys>,
  pub payments: Arc<P>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the marketplace API.
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: MarketStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
  P: PaymentGateway + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/", get(health))
    .route("/jwt", post(auth::issue::<S, P>))
    // Tasks
    .route("/tasks", get(tasks::list::<S, P>))
    .route(
      "/task",
      post(tasks::create::<S, P>).delete(tasks::delete_refunded::<S, P>),
    )
    .route(
      "/task/{id}",
      get(tasks::get_one::<S, P>)
        .patch(tasks::update::<S, P>)
        .delete(tasks::delete_as_admin::<S, P>),
    )
    .route("/myTasks/{email}", get(tasks::list_mine::<S, P>))
    // Users
    .route(
      "/users",
      post(users::register::<S, P>).get(users::list::<S, P>),
    )
    .route("/user", patch(users::set_role::<S, P>))
    .route("/user/photo_url", patch(users::set_photo::<S, P>))
    .route(
      "/user/{id}",
      get(users::get_one::<S, P>).delete(users::delete::<S, P>),
    )
    // Submissions
    .route(
      "/submission",
      post(submissions::create::<S, P>).patch(submissions::review::<S, P>),
    )
    .route(
      "/submission/review/{email}",
      get(submissions::list_for_review::<S, P>),
    )
    .route("/submission/{email}", get(submissions::list_mine::<S, P>))
    // Withdrawals
    .route(
      "/withdraw",
      post(withdrawals::request::<S, P>)
        .get(withdrawals::list::<S, P>)
        .delete(withdrawals::approve::<S, P>),
    )
    // Notifications
    .route("/notification/{email}", get(notifications::list_for::<S, P>))
    .route(
      "/notification/mark-as-read/{email}",
      patch(notifications::mark_read::<S, P>),
    )
    // Payments
    .route("/payments", get(payments::list::<S, P>))
    .route("/payments/{email}", get(payments::list_mine::<S, P>))
    .route("/create-payment-intent", post(payments::create_intent::<S, P>))
    .route("/payment", post(payments::confirm::<S, P>))
    .route(
      "/payment/paypal/complete-order",
      post(payments::paypal_order::<S, P>),
    )
    .with_state(state)
}

/// `GET /` — liveness greeting.
async fn health() -> &'static str {
  "nanoworks api is up"
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Mutex;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use nanoworks_core::{
    notification::{NewNotification, Notification},
    submission::{NewSubmission, SubmissionStatus},
    task::NewTask,
    user::{NewUser, Role, User},
  };
  use nanoworks_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  use crate::{
    auth::Claims,
    gateway::{CardIntent, PaypalOrder},
  };

  // Gateway double that records the amounts it was asked to charge.
  #[derive(Clone, Default)]
  struct FakeGateway {
    amounts: Arc<Mutex<Vec<i64>>>,
  }

  impl PaymentGateway for FakeGateway {
    type Error = std::convert::Infallible;

    async fn create_card_intent(
      &self,
      amount_cents: i64,
    ) -> Result<CardIntent, Self::Error> {
      self.amounts.lock().unwrap().push(amount_cents);
      Ok(CardIntent {
        id:            format!("pi_test_{amount_cents}"),
        client_secret: format!("pi_test_secret_{amount_cents}"),
      })
    }

    async fn create_paypal_order(&self) -> Result<PaypalOrder, Self::Error> {
      Ok(PaypalOrder {
        access_token: "A21AA-test".to_string(),
        order:        json!({ "id": "5O190127TN364715T", "status": "CREATED" }),
      })
    }
  }

  fn test_config() -> ServerConfig {
    ServerConfig {
      host:                 "127.0.0.1".to_string(),
      port:                 5000,
      store_path:           PathBuf::from(":memory:"),
      allowed_origins:      vec!["http://localhost:5173".to_string()],
      token_secret:         "test-secret".to_string(),
      card_api_base:        "https://api.stripe.com".to_string(),
      card_secret_key:      "sk_test_x".to_string(),
      paypal_api_base:      "https://api-m.sandbox.paypal.com".to_string(),
      paypal_client_id:     "client".to_string(),
      paypal_client_secret: "secret".to_string(),
      paypal_return_base:   "http://localhost:5173".to_string(),
      paypal_brand_name:    "nanoworks".to_string(),
    }
  }

  async fn make_state() -> AppState<SqliteStore, FakeGateway> {
    let store = SqliteStore::open_in_memory().await.expect("in-memory store");
    AppState {
      store:    Arc::new(store),
      config:   Arc::new(test_config()),
      keys:     Arc::new(TokenKeys::new("test-secret")),
      payments: Arc::new(FakeGateway::default()),
    }
  }

  async fn seed_user(
    state: &AppState<SqliteStore, FakeGateway>,
    email: &str,
    role: Role,
    coin: i64,
  ) -> User {
    let mut input = NewUser::new(email, role);
    input.coin = coin;
    state.store.insert_user(input).await.unwrap()
  }

  fn token(state: &AppState<SqliteStore, FakeGateway>, email: &str) -> String {
    state.keys.sign(&Claims::new(email)).unwrap()
  }

  fn sample_task(creator: &str) -> NewTask {
    NewTask {
      task_title:      "Tag product photos".to_string(),
      task_detail:     "Label 20 catalogue shots".to_string(),
      submission_info: "Attach the sheet link".to_string(),
      task_count:      4,
      payable_amount:  5,
      creator_email:   creator.to_string(),
    }
  }

  async fn oneshot_raw(
    state: AppState<SqliteStore, FakeGateway>,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
      builder =
        builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };
    router(state).oneshot(req).await.unwrap()
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  async fn balance(
    state: &AppState<SqliteStore, FakeGateway>,
    email: &str,
  ) -> i64 {
    state.store.get_user(email).await.unwrap().unwrap().coin
  }

  async fn feed(
    state: &AppState<SqliteStore, FakeGateway>,
    email: &str,
  ) -> Vec<Notification> {
    state.store.list_notifications_for(email).await.unwrap()
  }

  // ── Liveness and token issuance ─────────────────────────────────────────────

  #[tokio::test]
  async fn health_line_is_open() {
    let state = make_state().await;
    let resp = oneshot_raw(state, "GET", "/", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
      .await
      .unwrap();
    assert_eq!(&bytes[..], b"nanoworks api is up");
  }

  #[tokio::test]
  async fn jwt_signs_the_posted_claims() {
    let state = make_state().await;
    let body = json!({ "email": "ada@example.com", "role": "worker" });
    let resp =
      oneshot_raw(state.clone(), "POST", "/jwt", None, Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    let claims = state.keys.verify(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.email, "ada@example.com");
    assert_eq!(claims.extra["role"], "worker");
  }

  #[tokio::test]
  async fn jwt_without_an_email_is_rejected() {
    let state = make_state().await;
    let resp = oneshot_raw(
      state,
      "POST",
      "/jwt",
      None,
      Some(json!({ "role": "worker" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  // ── Credential and role gates ───────────────────────────────────────────────

  #[tokio::test]
  async fn missing_credential_is_401_with_message_body() {
    let state = make_state().await;
    let resp = oneshot_raw(state, "GET", "/users", None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
      json_body(resp).await,
      json!({ "message": "unauthorized access" })
    );
  }

  #[tokio::test]
  async fn garbled_credential_is_400_with_message_body() {
    let state = make_state().await;
    let resp =
      oneshot_raw(state, "GET", "/users", Some("not-a-token"), None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(resp).await, json!({ "message": "bad request" }));
  }

  #[tokio::test]
  async fn wrong_role_is_403_with_message_body() {
    let state = make_state().await;
    seed_user(&state, "worker@example.com", Role::Worker, 0).await;
    let t = token(&state, "worker@example.com");
    let resp = oneshot_raw(state, "GET", "/users", Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(
      json_body(resp).await,
      json!({ "message": "forbidden access" })
    );
  }

  #[tokio::test]
  async fn valid_token_for_an_unregistered_email_is_403() {
    let state = make_state().await;
    let t = token(&state, "ghost@example.com");
    let resp = oneshot_raw(state, "GET", "/users", Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn task_board_is_open_but_task_detail_is_not() {
    let state = make_state().await;
    let resp = oneshot_raw(state.clone(), "GET", "/tasks", None, None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await, json!([]));

    let uri = format!("/task/{}", Uuid::new_v4());
    let resp = oneshot_raw(state, "GET", &uri, None, None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  // ── Registration ────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn registration_rejects_a_duplicate_email() {
    let state = make_state().await;
    let body = json!({ "user_email": "new@example.com", "role": "task-creator" });
    let resp =
      oneshot_raw(state.clone(), "POST", "/users", None, Some(body.clone()))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["acknowledged"], true);

    let resp = oneshot_raw(state, "POST", "/users", None, Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await,
      json!({ "acknowledged": false, "message": "user already exists" })
    );
  }

  #[tokio::test]
  async fn registration_defaults_to_an_empty_worker_account() {
    let state = make_state().await;
    let body = json!({ "user_email": "w@example.com" });
    let resp =
      oneshot_raw(state.clone(), "POST", "/users", None, Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let user = state.store.get_user("w@example.com").await.unwrap().unwrap();
    assert_eq!(user.role, Role::Worker);
    assert_eq!(user.coin, 0);
  }

  // ── Task lifecycle ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn posting_a_task_debits_its_full_cost() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 20).await;
    let t = token(&state, "cre@example.com");

    let body = json!({
      "task_title": "Tag product photos",
      "task_detail": "Label 20 catalogue shots",
      "submission_info": "Attach the sheet link",
      "task_count": 5,
      "payable_amount": 10,
    });
    let resp =
      oneshot_raw(state.clone(), "POST", "/task", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // 20 - 5×10: the ledger floors nowhere.
    assert_eq!(balance(&state, "cre@example.com").await, -30);
    let feed = feed(&state, "cre@example.com").await;
    assert_eq!(
      feed[0].message,
      "your task \"Tag product photos\" is live, 50 coins reserved"
    );
  }

  #[tokio::test]
  async fn task_count_below_one_is_rejected_before_any_write() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 20).await;
    let t = token(&state, "cre@example.com");

    let body = json!({
      "task_title": "Tag product photos",
      "task_detail": "Label 20 catalogue shots",
      "submission_info": "Attach the sheet link",
      "task_count": 0,
      "payable_amount": 10,
    });
    let resp =
      oneshot_raw(state.clone(), "POST", "/task", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(balance(&state, "cre@example.com").await, 20);
    assert!(state.store.list_tasks().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn task_cost_that_overflows_the_ledger_is_rejected() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 20).await;
    let t = token(&state, "cre@example.com");

    let body = json!({
      "task_title": "Tag product photos",
      "task_detail": "Label 20 catalogue shots",
      "submission_info": "Attach the sheet link",
      "task_count": 4_611_686_018_427_387_904_i64,
      "payable_amount": 3,
    });
    let resp =
      oneshot_raw(state.clone(), "POST", "/task", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    assert_eq!(balance(&state, "cre@example.com").await, 20);
    assert!(state.store.list_tasks().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn editing_someone_elses_task_is_forbidden() {
    let state = make_state().await;
    seed_user(&state, "a@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "b@example.com", Role::TaskCreator, 0).await;
    let task = state
      .store
      .insert_task(sample_task("a@example.com"))
      .await
      .unwrap();
    let uri = format!("/task/{}", task.task_id);
    let patch = json!({ "task_title": "Retag product photos" });

    let tb = token(&state, "b@example.com");
    let resp = oneshot_raw(
      state.clone(),
      "PATCH",
      &uri,
      Some(&tb),
      Some(patch.clone()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let ta = token(&state, "a@example.com");
    let resp =
      oneshot_raw(state.clone(), "PATCH", &uri, Some(&ta), Some(patch)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = state.store.get_task(task.task_id).await.unwrap().unwrap();
    assert_eq!(stored.task_title, "Retag product photos");
    assert_eq!(stored.task_detail, task.task_detail);
  }

  #[tokio::test]
  async fn creator_delete_refunds_the_stored_cost_not_the_claimed_one() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    let task = state
      .store
      .insert_task(sample_task("cre@example.com"))
      .await
      .unwrap();

    let t = token(&state, "cre@example.com");
    let body = json!({
      "id": task.task_id,
      "coin": 999_999,
      "email": "attacker@example.com",
    });
    let resp =
      oneshot_raw(state.clone(), "DELETE", "/task", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    // 4×5 from the stored task, to the stored creator.
    assert_eq!(balance(&state, "cre@example.com").await, 20);
    assert!(state.store.get_task(task.task_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn admin_delete_skips_the_refund() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", Role::Admin, 0).await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    let task = state
      .store
      .insert_task(sample_task("cre@example.com"))
      .await
      .unwrap();

    let t = token(&state, "admin@example.com");
    let uri = format!("/task/{}", task.task_id);
    let resp = oneshot_raw(state.clone(), "DELETE", &uri, Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(balance(&state, "cre@example.com").await, 0);
    assert!(state.store.get_task(task.task_id).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn my_tasks_are_scoped_to_the_caller_not_the_path() {
    let state = make_state().await;
    seed_user(&state, "a@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "b@example.com", Role::TaskCreator, 0).await;
    state
      .store
      .insert_task(sample_task("a@example.com"))
      .await
      .unwrap();
    state
      .store
      .insert_task(sample_task("b@example.com"))
      .await
      .unwrap();

    let ta = token(&state, "a@example.com");
    let resp = oneshot_raw(
      state,
      "GET",
      "/myTasks/b@example.com",
      Some(&ta),
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let tasks = json_body(resp).await;
    assert_eq!(tasks.as_array().unwrap().len(), 1);
    assert_eq!(tasks[0]["creator_email"], "a@example.com");
  }

  // ── Submission review ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn submission_copies_task_fields_and_notifies_the_creator() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    let task = state
      .store
      .insert_task(sample_task("cre@example.com"))
      .await
      .unwrap();

    let t = token(&state, "wrk@example.com");
    let body = json!({ "task_id": task.task_id, "worker_name": "Wren Ito" });
    let resp =
      oneshot_raw(state.clone(), "POST", "/submission", Some(&t), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let id: Uuid = json_body(resp).await["inserted_id"]
      .as_str()
      .unwrap()
      .parse()
      .unwrap();
    let sub = state.store.get_submission(id).await.unwrap().unwrap();
    assert_eq!(sub.worker_email, "wrk@example.com");
    assert_eq!(sub.creator_email, "cre@example.com");
    assert_eq!(sub.payable_amount, 5);
    assert_eq!(sub.status, SubmissionStatus::Pending);

    let feed = feed(&state, "cre@example.com").await;
    assert_eq!(
      feed[0].message,
      "Wren Ito submitted work for \"Tag product photos\""
    );
  }

  async fn seed_submission(
    state: &AppState<SqliteStore, FakeGateway>,
    creator: &str,
    worker: &str,
  ) -> Uuid {
    let task = state.store.insert_task(sample_task(creator)).await.unwrap();
    let sub = state
      .store
      .insert_submission(NewSubmission {
        task_id:        task.task_id,
        task_title:     task.task_title,
        payable_amount: task.payable_amount,
        worker_email:   worker.to_string(),
        worker_name:    "Wren Ito".to_string(),
        creator_email:  task.creator_email,
      })
      .await
      .unwrap();
    sub.submission_id
  }

  #[tokio::test]
  async fn approval_pays_the_stored_amount_exactly_once() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    let id = seed_submission(&state, "cre@example.com", "wrk@example.com").await;

    let t = token(&state, "cre@example.com");
    let body = json!({ "id": id, "status": "approved" });
    let resp = oneshot_raw(
      state.clone(),
      "PATCH",
      "/submission",
      Some(&t),
      Some(body.clone()),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(balance(&state, "wrk@example.com").await, 5);

    let sub = state.store.get_submission(id).await.unwrap().unwrap();
    assert_eq!(sub.status, SubmissionStatus::Approved);
    let feed = feed(&state, "wrk@example.com").await;
    assert_eq!(
      feed[0].message,
      "your submission for \"Tag product photos\" was approved"
    );
    assert_eq!(
      feed[1].message,
      "you earned 5 coins from \"Tag product photos\""
    );

    // A second review bounces and nothing is paid twice.
    let resp =
      oneshot_raw(state.clone(), "PATCH", "/submission", Some(&t), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    assert_eq!(balance(&state, "wrk@example.com").await, 5);
  }

  #[tokio::test]
  async fn rejection_pays_nothing() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    let id = seed_submission(&state, "cre@example.com", "wrk@example.com").await;

    let t = token(&state, "cre@example.com");
    let body = json!({ "id": id, "status": "rejected" });
    let resp =
      oneshot_raw(state.clone(), "PATCH", "/submission", Some(&t), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(balance(&state, "wrk@example.com").await, 0);
    let sub = state.store.get_submission(id).await.unwrap().unwrap();
    assert_eq!(sub.status, SubmissionStatus::Rejected);
    let feed = feed(&state, "wrk@example.com").await;
    assert_eq!(
      feed[0].message,
      "your submission for \"Tag product photos\" was rejected"
    );
  }

  #[tokio::test]
  async fn reviewing_anothers_submission_is_forbidden() {
    let state = make_state().await;
    seed_user(&state, "a@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "b@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    let id = seed_submission(&state, "a@example.com", "wrk@example.com").await;

    let tb = token(&state, "b@example.com");
    let body = json!({ "id": id, "status": "approved" });
    let resp =
      oneshot_raw(state.clone(), "PATCH", "/submission", Some(&tb), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let sub = state.store.get_submission(id).await.unwrap().unwrap();
    assert_eq!(sub.status, SubmissionStatus::Pending);
    assert_eq!(balance(&state, "wrk@example.com").await, 0);
  }

  #[tokio::test]
  async fn review_status_must_be_terminal() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    let id = seed_submission(&state, "cre@example.com", "wrk@example.com").await;

    let t = token(&state, "cre@example.com");
    let body = json!({ "id": id, "status": "pending" });
    let resp =
      oneshot_raw(state, "PATCH", "/submission", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
  }

  // ── Withdrawals ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn withdrawal_debits_on_approval_only() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", Role::Admin, 0).await;
    seed_user(&state, "wrk@example.com", Role::Worker, 50).await;

    let tw = token(&state, "wrk@example.com");
    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/withdraw",
      Some(&tw),
      Some(json!({ "withdraw_coin": 30 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id: Uuid = json_body(resp).await["inserted_id"]
      .as_str()
      .unwrap()
      .parse()
      .unwrap();
    assert_eq!(balance(&state, "wrk@example.com").await, 50);

    let ta = token(&state, "admin@example.com");
    let resp =
      oneshot_raw(state.clone(), "GET", "/withdraw", Some(&ta), None).await;
    assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);

    let body = json!({ "withdraw_id": id, "coin": 1, "email": "x@example.com" });
    let resp =
      oneshot_raw(state.clone(), "DELETE", "/withdraw", Some(&ta), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(balance(&state, "wrk@example.com").await, 20);
    assert!(state.store.list_withdrawals().await.unwrap().is_empty());
    let feed = feed(&state, "wrk@example.com").await;
    assert_eq!(feed[0].message, "your withdrawal of 30 coins was approved");
  }

  #[tokio::test]
  async fn approving_a_missing_withdrawal_is_404() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", Role::Admin, 0).await;
    let t = token(&state, "admin@example.com");
    let body = json!({ "withdraw_id": Uuid::new_v4() });
    let resp =
      oneshot_raw(state, "DELETE", "/withdraw", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Notifications ───────────────────────────────────────────────────────────

  #[tokio::test]
  async fn mark_as_read_reports_the_transitioned_count() {
    let state = make_state().await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    for msg in ["first", "second"] {
      state
        .store
        .insert_notification(NewNotification::new("wrk@example.com", msg))
        .await
        .unwrap();
    }

    let t = token(&state, "wrk@example.com");
    let uri = "/notification/mark-as-read/wrk@example.com";
    let resp = oneshot_raw(state.clone(), "PATCH", uri, Some(&t), None).await;
    assert_eq!(json_body(resp).await["modified_count"], 2);

    // Idempotent: nothing left to transition.
    let resp = oneshot_raw(state.clone(), "PATCH", uri, Some(&t), None).await;
    assert_eq!(json_body(resp).await["modified_count"], 0);
  }

  // ── Payments ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn intent_amount_truncates_to_cents() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    let t = token(&state, "cre@example.com");

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/create-payment-intent",
      Some(&t),
      Some(json!({ "dollars": 10.999 })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
      json_body(resp).await["client_secret"],
      "pi_test_secret_1099"
    );
    assert_eq!(*state.payments.amounts.lock().unwrap(), vec![1099]);
  }

  #[tokio::test]
  async fn confirmed_payment_credits_records_and_notifies() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    let t = token(&state, "cre@example.com");

    let body = json!({
      "email": "cre@example.com",
      "coin_purchase": 25,
      "intent_id": "pi_123",
    });
    let resp =
      oneshot_raw(state.clone(), "POST", "/payment", Some(&t), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    assert_eq!(balance(&state, "cre@example.com").await, 25);
    let resp = oneshot_raw(
      state.clone(),
      "GET",
      "/payments/cre@example.com",
      Some(&t),
      None,
    )
    .await;
    let payments = json_body(resp).await;
    assert_eq!(payments[0]["coin_purchase"], 25);
    assert_eq!(payments[0]["intent_id"], "pi_123");
    let feed = feed(&state, "cre@example.com").await;
    assert_eq!(feed[0].message, "25 coins were added to your account");
  }

  #[tokio::test]
  async fn payment_for_an_unknown_payer_is_404() {
    let state = make_state().await;
    seed_user(&state, "cre@example.com", Role::TaskCreator, 0).await;
    let t = token(&state, "cre@example.com");

    let body = json!({ "email": "ghost@example.com", "coin_purchase": 25 });
    let resp =
      oneshot_raw(state.clone(), "POST", "/payment", Some(&t), Some(body))
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(state.store.list_payments().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn paypal_order_relays_the_provider_response() {
    let state = make_state().await;
    let resp = oneshot_raw(
      state,
      "POST",
      "/payment/paypal/complete-order",
      None,
      None,
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = json_body(resp).await;
    assert_eq!(body["access_token"], "A21AA-test");
    assert_eq!(body["data"]["status"], "CREATED");
  }

  // ── User administration ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn admin_changes_a_role() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", Role::Admin, 0).await;
    let user = seed_user(&state, "wrk@example.com", Role::Worker, 0).await;

    let t = token(&state, "admin@example.com");
    let body = json!({ "id": user.user_id, "role": "task-creator" });
    let resp =
      oneshot_raw(state.clone(), "PATCH", "/user", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let stored = state.store.get_user("wrk@example.com").await.unwrap().unwrap();
    assert_eq!(stored.role, Role::TaskCreator);

    let body = json!({ "id": Uuid::new_v4(), "role": "admin" });
    let resp =
      oneshot_raw(state, "PATCH", "/user", Some(&t), Some(body)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn photo_update_shows_up_in_the_profile() {
    let state = make_state().await;
    seed_user(&state, "wrk@example.com", Role::Worker, 0).await;
    let t = token(&state, "wrk@example.com");

    let body = json!({
      "email": "wrk@example.com",
      "photo_url": "https://cdn.example.com/wrk.png",
    });
    let resp = oneshot_raw(
      state.clone(),
      "PATCH",
      "/user/photo_url",
      Some(&t),
      Some(body),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_raw(
      state.clone(),
      "GET",
      "/user/wrk@example.com",
      Some(&t),
      None,
    )
    .await;
    assert_eq!(
      json_body(resp).await["photo_url"],
      "https://cdn.example.com/wrk.png"
    );

    let resp =
      oneshot_raw(state, "GET", "/user/ghost@example.com", Some(&t), None)
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn photo_update_cannot_retarget_another_account() {
    let state = make_state().await;
    seed_user(&state, "a@example.com", Role::Worker, 0).await;
    seed_user(&state, "b@example.com", Role::Worker, 0).await;
    let ta = token(&state, "a@example.com");

    let body = json!({
      "email": "b@example.com",
      "photo_url": "https://cdn.example.com/new.png",
    });
    let resp = oneshot_raw(
      state.clone(),
      "PATCH",
      "/user/photo_url",
      Some(&ta),
      Some(body),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let a = state.store.get_user("a@example.com").await.unwrap().unwrap();
    assert_eq!(
      a.photo_url.as_deref(),
      Some("https://cdn.example.com/new.png")
    );
    let b = state.store.get_user("b@example.com").await.unwrap().unwrap();
    assert_eq!(b.photo_url, None);
  }

  #[tokio::test]
  async fn admin_deletes_an_account() {
    let state = make_state().await;
    seed_user(&state, "admin@example.com", Role::Admin, 0).await;
    let user = seed_user(&state, "wrk@example.com", Role::Worker, 0).await;

    let t = token(&state, "admin@example.com");
    let uri = format!("/user/{}", user.user_id);
    let resp =
      oneshot_raw(state.clone(), "DELETE", &uri, Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(state.store.get_user("wrk@example.com").await.unwrap().is_none());

    let resp = oneshot_raw(state, "DELETE", &uri, Some(&t), None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
