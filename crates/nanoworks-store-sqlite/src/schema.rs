//! SQL schema for the nanoworks SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.
//!
//! Entities reference users by email value, not by row id, so there are no
//! foreign-key constraints; deleting a user leaves their tasks, submissions,
//! and payments in place.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    user_email  TEXT NOT NULL UNIQUE,
    user_name   TEXT,
    role        TEXT NOT NULL,              -- 'admin' | 'task-creator' | 'worker'
    coin        INTEGER NOT NULL DEFAULT 0, -- no floor; may go negative
    photo_url   TEXT,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
    task_id         TEXT PRIMARY KEY,
    task_title      TEXT NOT NULL,
    task_detail     TEXT NOT NULL,
    submission_info TEXT NOT NULL,
    task_count      INTEGER NOT NULL,
    payable_amount  INTEGER NOT NULL,
    creator_email   TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

-- task_title and payable_amount are copied from the task at submit time;
-- review pays the copied amount.
CREATE TABLE IF NOT EXISTS submissions (
    submission_id  TEXT PRIMARY KEY,
    task_id        TEXT NOT NULL,
    task_title     TEXT NOT NULL,
    payable_amount INTEGER NOT NULL,
    worker_email   TEXT NOT NULL,
    worker_name    TEXT NOT NULL,
    creator_email  TEXT NOT NULL,
    status         TEXT NOT NULL DEFAULT 'pending',
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS withdrawals (
    withdraw_id    TEXT PRIMARY KEY,
    worker_email   TEXT NOT NULL,
    withdraw_coin  INTEGER NOT NULL,
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    payment_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL,
    coin_purchase INTEGER NOT NULL,
    intent_id     TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    to_email        TEXT NOT NULL,
    message         TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'unread',
    time            TEXT NOT NULL   -- display label, not sortable
);

CREATE INDEX IF NOT EXISTS tasks_creator_idx       ON tasks(creator_email);
CREATE INDEX IF NOT EXISTS submissions_worker_idx  ON submissions(worker_email);
CREATE INDEX IF NOT EXISTS submissions_creator_idx ON submissions(creator_email);
CREATE INDEX IF NOT EXISTS payments_email_idx      ON payments(email);
CREATE INDEX IF NOT EXISTS notifications_to_idx    ON notifications(to_email);

PRAGMA user_version = 1;
";
