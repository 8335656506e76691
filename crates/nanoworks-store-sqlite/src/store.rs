//! [`SqliteStore`] — the SQLite implementation of [`MarketStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use nanoworks_core::{
  notification::{NewNotification, Notification, NotificationStatus},
  payment::{NewPayment, Payment},
  store::MarketStore,
  submission::{NewSubmission, Submission, SubmissionStatus},
  task::{NewTask, Task, TaskPatch},
  user::{NewUser, Role, User},
  withdrawal::{NewWithdrawal, Withdrawal},
};

use crate::{
  encode::{
    encode_dt, encode_uuid, RawNotification, RawPayment, RawSubmission,
    RawTask, RawUser, RawWithdrawal,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Row readers ─────────────────────────────────────────────────────────────

fn read_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    user_id:    row.get(0)?,
    user_email: row.get(1)?,
    user_name:  row.get(2)?,
    role:       row.get(3)?,
    coin:       row.get(4)?,
    photo_url:  row.get(5)?,
    created_at: row.get(6)?,
  })
}

fn read_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawTask> {
  Ok(RawTask {
    task_id:         row.get(0)?,
    task_title:      row.get(1)?,
    task_detail:     row.get(2)?,
    submission_info: row.get(3)?,
    task_count:      row.get(4)?,
    payable_amount:  row.get(5)?,
    creator_email:   row.get(6)?,
    created_at:      row.get(7)?,
  })
}

fn read_submission(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawSubmission> {
  Ok(RawSubmission {
    submission_id:  row.get(0)?,
    task_id:        row.get(1)?,
    task_title:     row.get(2)?,
    payable_amount: row.get(3)?,
    worker_email:   row.get(4)?,
    worker_name:    row.get(5)?,
    creator_email:  row.get(6)?,
    status:         row.get(7)?,
    created_at:     row.get(8)?,
  })
}

fn read_withdrawal(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawWithdrawal> {
  Ok(RawWithdrawal {
    withdraw_id:   row.get(0)?,
    worker_email:  row.get(1)?,
    withdraw_coin: row.get(2)?,
    created_at:    row.get(3)?,
  })
}

fn read_payment(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawPayment> {
  Ok(RawPayment {
    payment_id:    row.get(0)?,
    email:         row.get(1)?,
    coin_purchase: row.get(2)?,
    intent_id:     row.get(3)?,
    created_at:    row.get(4)?,
  })
}

fn read_notification(
  row: &rusqlite::Row<'_>,
) -> rusqlite::Result<RawNotification> {
  Ok(RawNotification {
    notification_id: row.get(0)?,
    to_email:        row.get(1)?,
    message:         row.get(2)?,
    status:          row.get(3)?,
    time:            row.get(4)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A marketplace store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. All access
/// is serialised on the connection's thread, which makes each statement
/// (including the `coin = coin + ?` ledger increment) atomic with respect to
/// concurrent callers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── MarketStore impl ────────────────────────────────────────────────────────

impl MarketStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, input: NewUser) -> Result<User> {
    let user = User {
      user_id:    Uuid::new_v4(),
      user_email: input.user_email,
      user_name:  input.user_name,
      role:       input.role,
      coin:       input.coin,
      photo_url:  input.photo_url,
      created_at: Utc::now(),
    };

    let id_str    = encode_uuid(user.user_id);
    let email     = user.user_email.clone();
    let name      = user.user_name.clone();
    let role_str  = user.role.as_str().to_owned();
    let coin      = user.coin;
    let photo_url = user.photo_url.clone();
    let at_str    = encode_dt(user.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, user_email, user_name, role, coin, photo_url, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![id_str, email, name, role_str, coin, photo_url, at_str],
        )?;
        Ok(())
      })
      .await;

    match inserted {
      Ok(()) => Ok(user),
      Err(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _)))
        if e.code == rusqlite::ErrorCode::ConstraintViolation =>
      {
        Err(Error::DuplicateUser(user.user_email))
      }
      Err(e) => Err(Error::Database(e)),
    }
  }

  async fn get_user(&self, email: &str) -> Result<Option<User>> {
    let email = email.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, user_email, user_name, role, coin, photo_url, created_at
             FROM users WHERE user_email = ?1",
            rusqlite::params![email],
            read_user,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, user_email, user_name, role, coin, photo_url, created_at
           FROM users ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map([], read_user)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn set_user_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
    let id_str   = encode_uuid(user_id);
    let role_str = role.as_str().to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET role = ?1 WHERE user_id = ?2",
          rusqlite::params![role_str, id_str],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  async fn set_user_photo(&self, email: &str, photo_url: &str) -> Result<bool> {
    let email     = email.to_owned();
    let photo_url = photo_url.to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET photo_url = ?1 WHERE user_email = ?2",
          rusqlite::params![photo_url, email],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(user_id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM users WHERE user_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  // ── Coin ledger ───────────────────────────────────────────────────────────

  async fn adjust_coins(&self, email: &str, delta: i64) -> Result<bool> {
    let email = email.to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET coin = coin + ?1 WHERE user_email = ?2",
          rusqlite::params![delta, email],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  // ── Tasks ─────────────────────────────────────────────────────────────────

  async fn insert_task(&self, input: NewTask) -> Result<Task> {
    let task = Task {
      task_id:         Uuid::new_v4(),
      task_title:      input.task_title,
      task_detail:     input.task_detail,
      submission_info: input.submission_info,
      task_count:      input.task_count,
      payable_amount:  input.payable_amount,
      creator_email:   input.creator_email,
      created_at:      Utc::now(),
    };

    let id_str    = encode_uuid(task.task_id);
    let title     = task.task_title.clone();
    let detail    = task.task_detail.clone();
    let info      = task.submission_info.clone();
    let count     = task.task_count;
    let amount    = task.payable_amount;
    let creator   = task.creator_email.clone();
    let at_str    = encode_dt(task.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tasks (task_id, task_title, task_detail, submission_info,
                              task_count, payable_amount, creator_email, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![id_str, title, detail, info, count, amount, creator, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(task)
  }

  async fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawTask> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT task_id, task_title, task_detail, submission_info,
                    task_count, payable_amount, creator_email, created_at
             FROM tasks WHERE task_id = ?1",
            rusqlite::params![id_str],
            read_task,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawTask::into_task).transpose()
  }

  async fn list_tasks(&self) -> Result<Vec<Task>> {
    let raws: Vec<RawTask> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT task_id, task_title, task_detail, submission_info,
                  task_count, payable_amount, creator_email, created_at
           FROM tasks ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map([], read_task)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTask::into_task).collect()
  }

  async fn list_tasks_by_creator(&self, email: &str) -> Result<Vec<Task>> {
    let email = email.to_owned();

    let raws: Vec<RawTask> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT task_id, task_title, task_detail, submission_info,
                  task_count, payable_amount, creator_email, created_at
           FROM tasks WHERE creator_email = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![email], read_task)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTask::into_task).collect()
  }

  async fn update_task(&self, id: Uuid, patch: TaskPatch) -> Result<bool> {
    let id_str = encode_uuid(id);
    let TaskPatch { task_title, task_detail, submission_info } = patch;

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE tasks SET
             task_title      = COALESCE(?1, task_title),
             task_detail     = COALESCE(?2, task_detail),
             submission_info = COALESCE(?3, submission_info)
           WHERE task_id = ?4",
          rusqlite::params![task_title, task_detail, submission_info, id_str],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  async fn delete_task(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM tasks WHERE task_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn insert_submission(&self, input: NewSubmission) -> Result<Submission> {
    let submission = Submission {
      submission_id:  Uuid::new_v4(),
      task_id:        input.task_id,
      task_title:     input.task_title,
      payable_amount: input.payable_amount,
      worker_email:   input.worker_email,
      worker_name:    input.worker_name,
      creator_email:  input.creator_email,
      status:         SubmissionStatus::Pending,
      created_at:     Utc::now(),
    };

    let id_str     = encode_uuid(submission.submission_id);
    let task_str   = encode_uuid(submission.task_id);
    let title      = submission.task_title.clone();
    let amount     = submission.payable_amount;
    let worker     = submission.worker_email.clone();
    let name       = submission.worker_name.clone();
    let creator    = submission.creator_email.clone();
    let status_str = submission.status.as_str().to_owned();
    let at_str     = encode_dt(submission.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO submissions (submission_id, task_id, task_title, payable_amount,
                                    worker_email, worker_name, creator_email, status, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, task_str, title, amount, worker, name, creator, status_str, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(submission)
  }

  async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSubmission> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT submission_id, task_id, task_title, payable_amount,
                    worker_email, worker_name, creator_email, status, created_at
             FROM submissions WHERE submission_id = ?1",
            rusqlite::params![id_str],
            read_submission,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubmission::into_submission).transpose()
  }

  async fn list_submissions_by_worker(&self, email: &str) -> Result<Vec<Submission>> {
    let email = email.to_owned();

    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT submission_id, task_id, task_title, payable_amount,
                  worker_email, worker_name, creator_email, status, created_at
           FROM submissions WHERE worker_email = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![email], read_submission)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn list_submissions_for_creator(&self, email: &str) -> Result<Vec<Submission>> {
    let email = email.to_owned();

    let raws: Vec<RawSubmission> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT submission_id, task_id, task_title, payable_amount,
                  worker_email, worker_name, creator_email, status, created_at
           FROM submissions WHERE creator_email = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![email], read_submission)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubmission::into_submission).collect()
  }

  async fn set_submission_status(
    &self,
    id: Uuid,
    status: SubmissionStatus,
  ) -> Result<bool> {
    let id_str     = encode_uuid(id);
    let status_str = status.as_str().to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE submissions SET status = ?1 WHERE submission_id = ?2",
          rusqlite::params![status_str, id_str],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  // ── Withdrawals ───────────────────────────────────────────────────────────

  async fn insert_withdrawal(&self, input: NewWithdrawal) -> Result<Withdrawal> {
    let withdrawal = Withdrawal {
      withdraw_id:   Uuid::new_v4(),
      worker_email:  input.worker_email,
      withdraw_coin: input.withdraw_coin,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(withdrawal.withdraw_id);
    let worker = withdrawal.worker_email.clone();
    let coin   = withdrawal.withdraw_coin;
    let at_str = encode_dt(withdrawal.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO withdrawals (withdraw_id, worker_email, withdraw_coin, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, worker, coin, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(withdrawal)
  }

  async fn get_withdrawal(&self, id: Uuid) -> Result<Option<Withdrawal>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawWithdrawal> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT withdraw_id, worker_email, withdraw_coin, created_at
             FROM withdrawals WHERE withdraw_id = ?1",
            rusqlite::params![id_str],
            read_withdrawal,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawWithdrawal::into_withdrawal).transpose()
  }

  async fn list_withdrawals(&self) -> Result<Vec<Withdrawal>> {
    let raws: Vec<RawWithdrawal> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT withdraw_id, worker_email, withdraw_coin, created_at
           FROM withdrawals ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map([], read_withdrawal)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWithdrawal::into_withdrawal).collect()
  }

  async fn delete_withdrawal(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM withdrawals WHERE withdraw_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(rows > 0)
  }

  // ── Payments ──────────────────────────────────────────────────────────────

  async fn insert_payment(&self, input: NewPayment) -> Result<Payment> {
    let payment = Payment {
      payment_id:    Uuid::new_v4(),
      email:         input.email,
      coin_purchase: input.coin_purchase,
      intent_id:     input.intent_id,
      created_at:    Utc::now(),
    };

    let id_str = encode_uuid(payment.payment_id);
    let email  = payment.email.clone();
    let coin   = payment.coin_purchase;
    let intent = payment.intent_id.clone();
    let at_str = encode_dt(payment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO payments (payment_id, email, coin_purchase, intent_id, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, email, coin, intent, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(payment)
  }

  async fn list_payments(&self) -> Result<Vec<Payment>> {
    let raws: Vec<RawPayment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT payment_id, email, coin_purchase, intent_id, created_at
           FROM payments ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map([], read_payment)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPayment::into_payment).collect()
  }

  async fn list_payments_by_email(&self, email: &str) -> Result<Vec<Payment>> {
    let email = email.to_owned();

    let raws: Vec<RawPayment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT payment_id, email, coin_purchase, intent_id, created_at
           FROM payments WHERE email = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![email], read_payment)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPayment::into_payment).collect()
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn insert_notification(
    &self,
    input: NewNotification,
  ) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      to_email:        input.to_email,
      message:         input.message,
      status:          NotificationStatus::Unread,
      time:            input.time,
    };

    let id_str     = encode_uuid(notification.notification_id);
    let to_email   = notification.to_email.clone();
    let message    = notification.message.clone();
    let status_str = notification.status.as_str().to_owned();
    let time       = notification.time.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (notification_id, to_email, message, status, time)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, to_email, message, status_str, time],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications_for(&self, email: &str) -> Result<Vec<Notification>> {
    let email = email.to_owned();

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT notification_id, to_email, message, status, time
           FROM notifications WHERE to_email = ?1 ORDER BY rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![email], read_notification)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn mark_notifications_read(&self, email: &str) -> Result<usize> {
    let email = email.to_owned();

    let rows = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET status = 'read'
           WHERE to_email = ?1 AND status = 'unread'",
          rusqlite::params![email],
        )?)
      })
      .await?;

    Ok(rows)
  }
}
