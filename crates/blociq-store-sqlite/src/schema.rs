//! SQL schema for the BlocIQ SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS incoming_emails (
    email_id        TEXT PRIMARY KEY,
    outlook_id      TEXT UNIQUE,       -- Graph message id; NULL for manual inserts
    from_email      TEXT,
    from_name       TEXT,
    subject         TEXT,
    body_preview    TEXT,
    body            TEXT,
    received_at     TEXT NOT NULL,     -- RFC 3339 UTC
    building_id     TEXT,
    unit_id         TEXT,
    leaseholder_id  TEXT,
    handled         INTEGER NOT NULL DEFAULT 0,
    unread          INTEGER NOT NULL DEFAULT 1,
    tag             TEXT,
    flag_status     TEXT,
    folder          TEXT NOT NULL DEFAULT 'inbox'
);

-- Runs and actions are append-only.
CREATE TABLE IF NOT EXISTS ai_triage_runs (
    run_id      TEXT PRIMARY KEY,
    created_at  TEXT NOT NULL,
    email_count INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS ai_triage_actions (
    action_id   TEXT PRIMARY KEY,
    run_id      TEXT NOT NULL REFERENCES ai_triage_runs(run_id),
    email_id    TEXT NOT NULL REFERENCES incoming_emails(email_id),
    category    TEXT NOT NULL,     -- 'Leak/Water Ingress' | 'Lift' | ...
    reason      TEXT NOT NULL,
    urgency     TEXT NOT NULL DEFAULT 'normal',
    due_date    TEXT NOT NULL,     -- YYYY-MM-DD
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS compliance_reminders (
    reminder_id      TEXT PRIMARY KEY,
    building_name    TEXT NOT NULL,
    asset_name       TEXT NOT NULL,
    due_date         TEXT NOT NULL,
    reminder_date    TEXT NOT NULL,
    label            TEXT NOT NULL,    -- '90-Day' | '60-Day' | '30-Day'
    outlook_event_id TEXT,
    created_at       TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS emails_received_idx ON incoming_emails(received_at);
CREATE INDEX IF NOT EXISTS emails_handled_idx  ON incoming_emails(handled);
CREATE INDEX IF NOT EXISTS actions_run_idx     ON ai_triage_actions(run_id);

PRAGMA user_version = 1;
";
