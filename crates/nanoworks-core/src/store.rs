//! The `MarketStore` trait — the storage seam of the marketplace.
//!
//! The trait is implemented by storage backends (e.g. `nanoworks-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  notification::{NewNotification, Notification},
  payment::{NewPayment, Payment},
  submission::{NewSubmission, Submission, SubmissionStatus},
  task::{NewTask, Task, TaskPatch},
  user::{NewUser, Role, User},
  withdrawal::{NewWithdrawal, Withdrawal},
};

/// Abstraction over the marketplace's backing store.
///
/// Every list method returns records newest first. Cross-entity flows (task
/// insert plus creator debit, approval credit plus status update, and so on)
/// are issued by callers as independent sequential calls; there is no
/// cross-entity transaction, and a failure between two calls leaves partial
/// state. [`adjust_coins`](MarketStore::adjust_coins) is the single balance
/// mutator in the system.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait MarketStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Persist a new user. Fails if the email is already registered; callers
  /// that want check-then-insert semantics pair this with
  /// [`get_user`](MarketStore::get_user).
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Look a user up by email. Returns `None` if not registered.
  fn get_user<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  fn list_users(
    &self,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Change a user's role, addressed by row id. Returns whether a row
  /// matched.
  fn set_user_role(
    &self,
    user_id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace a user's profile photo URL. Returns whether a row matched.
  fn set_user_photo<'a>(
    &'a self,
    email: &'a str,
    photo_url: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// Delete a user row. Does not cascade to tasks, submissions, or any
  /// other record the user owns.
  fn delete_user(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Coin ledger ───────────────────────────────────────────────────────

  /// Add `delta` (possibly negative) to the balance of the user with this
  /// email, as one atomic per-row increment. No floor is applied; balances
  /// go negative freely.
  ///
  /// Returns `true` if a user row matched. Callers treat `false` as fatal
  /// rather than reporting a successful adjustment against nobody.
  fn adjust_coins<'a>(
    &'a self,
    email: &'a str,
    delta: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Tasks ─────────────────────────────────────────────────────────────

  fn insert_task(
    &self,
    input: NewTask,
  ) -> impl Future<Output = Result<Task, Self::Error>> + Send + '_;

  fn get_task(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Task>, Self::Error>> + Send + '_;

  fn list_tasks(
    &self,
  ) -> impl Future<Output = Result<Vec<Task>, Self::Error>> + Send + '_;

  fn list_tasks_by_creator<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Task>, Self::Error>> + Send + 'a;

  /// Apply the mutable-field subset in `patch`. Returns whether a row
  /// matched.
  fn update_task(
    &self,
    id: Uuid,
    patch: TaskPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_task(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  fn insert_submission(
    &self,
    input: NewSubmission,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  fn get_submission(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Submission>, Self::Error>> + Send + '_;

  /// A worker's own submissions.
  fn list_submissions_by_worker<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + 'a;

  /// Submissions against tasks this creator posted, for review.
  fn list_submissions_for_creator<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + 'a;

  /// Overwrite the review status field. Returns whether a row matched; the
  /// pending-only transition rule is enforced by the caller, which reads
  /// the record first.
  fn set_submission_status(
    &self,
    id: Uuid,
    status: SubmissionStatus,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Withdrawals ───────────────────────────────────────────────────────

  fn insert_withdrawal(
    &self,
    input: NewWithdrawal,
  ) -> impl Future<Output = Result<Withdrawal, Self::Error>> + Send + '_;

  fn get_withdrawal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Withdrawal>, Self::Error>> + Send + '_;

  fn list_withdrawals(
    &self,
  ) -> impl Future<Output = Result<Vec<Withdrawal>, Self::Error>> + Send + '_;

  fn delete_withdrawal(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Payments ──────────────────────────────────────────────────────────

  fn insert_payment(
    &self,
    input: NewPayment,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  fn list_payments(
    &self,
  ) -> impl Future<Output = Result<Vec<Payment>, Self::Error>> + Send + '_;

  fn list_payments_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Payment>, Self::Error>> + Send + 'a;

  // ── Notifications ─────────────────────────────────────────────────────

  fn insert_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  fn list_notifications_for<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + 'a;

  /// Bulk-transition every unread notification for this recipient to read.
  /// Returns the number of rows transitioned; zero when nothing was unread,
  /// which is a success, not an error.
  fn mark_notifications_read<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;
}
