//! [`SqliteStore`]: the SQLite implementation of [`InboxStore`].

use std::path::Path;

use blociq_core::{
  email::{Email, EmailStatus, INBOX, NewEmail, preview_of},
  reminder::{ComplianceReminder, NewComplianceReminder},
  store::{EmailQuery, InboxStore},
  triage::{NewTriageAction, TriageAction, TriageRun, TriageRunView},
};
use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    EMAIL_COLUMNS, RawAction, RawEmail, RawReminder, RawRun, decode_uuid, encode_date,
    encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An inbox store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
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

  /// Open an in-memory store for tests.
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

  /// All recorded compliance reminders, soonest first.
  pub async fn list_reminders(&self) -> Result<Vec<ComplianceReminder>> {
    let raws: Vec<RawReminder> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT reminder_id, building_name, asset_name, due_date, reminder_date,
                  label, outlook_event_id, created_at
           FROM compliance_reminders
           ORDER BY reminder_date, rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawReminder {
              reminder_id:      row.get(0)?,
              building_name:    row.get(1)?,
              asset_name:       row.get(2)?,
              due_date:         row.get(3)?,
              reminder_date:    row.get(4)?,
              label:            row.get(5)?,
              outlook_event_id: row.get(6)?,
              created_at:       row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReminder::into_reminder).collect()
  }
}

/// A fresh, unhandled inbox row for `input`.
fn new_email(input: NewEmail) -> Email {
  let body_preview = input
    .body_preview
    .or_else(|| input.body.as_deref().map(preview_of));

  Email {
    email_id: Uuid::new_v4(),
    outlook_id: input.outlook_id,
    from_email: input.from_email,
    from_name: input.from_name,
    subject: input.subject,
    body_preview,
    body: input.body,
    received_at: input.received_at.unwrap_or_else(Utc::now),
    building_id: input.building_id,
    unit_id: input.unit_id,
    leaseholder_id: input.leaseholder_id,
    handled: false,
    unread: input.unread,
    tag: None,
    flag_status: None,
    folder: INBOX.to_string(),
  }
}

// ─── InboxStore impl ─────────────────────────────────────────────────────────

impl InboxStore for SqliteStore {
  type Error = Error;

  // ── Emails ────────────────────────────────────────────────────────────────

  async fn insert_email(&self, input: NewEmail) -> Result<Email> {
    let email = new_email(input);

    let row = email.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO incoming_emails ({EMAIL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
          ),
          rusqlite::params![
            encode_uuid(row.email_id),
            row.outlook_id,
            row.from_email,
            row.from_name,
            row.subject,
            row.body_preview,
            row.body,
            encode_dt(row.received_at),
            row.building_id,
            row.unit_id,
            row.leaseholder_id,
            row.handled,
            row.unread,
            row.tag,
            row.flag_status,
            row.folder,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(email)
  }

  async fn upsert_outlook_email(&self, input: NewEmail) -> Result<(Email, bool)> {
    if input.outlook_id.is_none() {
      return Ok((self.insert_email(input).await?, true));
    }

    // Only explicit timestamps may overwrite a stored one.
    let received_at = input.received_at.map(encode_dt);
    let row = new_email(input);
    let new_id = row.email_id;

    // One statement on the connection thread: concurrent syncs of the same
    // message cannot both insert. Status columns belong to the user.
    let raw: RawEmail = self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT INTO incoming_emails ({EMAIL_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
             ON CONFLICT(outlook_id) DO UPDATE SET
               from_email   = COALESCE(excluded.from_email, from_email),
               from_name    = COALESCE(excluded.from_name, from_name),
               subject      = COALESCE(excluded.subject, subject),
               body_preview = COALESCE(excluded.body_preview, body_preview),
               body         = COALESCE(excluded.body, body),
               received_at  = COALESCE(?17, received_at)"
          ),
          rusqlite::params![
            encode_uuid(row.email_id),
            row.outlook_id,
            row.from_email,
            row.from_name,
            row.subject,
            row.body_preview,
            row.body,
            encode_dt(row.received_at),
            row.building_id,
            row.unit_id,
            row.leaseholder_id,
            row.handled,
            row.unread,
            row.tag,
            row.flag_status,
            row.folder,
            received_at,
          ],
        )?;
        Ok(conn.query_row(
          &format!("SELECT {EMAIL_COLUMNS} FROM incoming_emails WHERE outlook_id = ?1"),
          rusqlite::params![row.outlook_id],
          RawEmail::from_row,
        )?)
      })
      .await?;

    let email = raw.into_email()?;
    let created = email.email_id == new_id;
    Ok((email, created))
  }

  async fn get_email(&self, id: Uuid) -> Result<Option<Email>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawEmail> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {EMAIL_COLUMNS} FROM incoming_emails WHERE email_id = ?1"),
              rusqlite::params![id_str],
              RawEmail::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEmail::into_email).transpose()
  }

  async fn list_emails(&self, query: &EmailQuery) -> Result<Vec<Email>> {
    let handled   = query.handled;
    let unread    = query.unread;
    let folder    = query.folder.clone();
    let limit_val = query.limit.unwrap_or(100) as i64;

    let raws: Vec<RawEmail> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {EMAIL_COLUMNS} FROM incoming_emails
           WHERE (?1 IS NULL OR handled = ?1)
             AND (?2 IS NULL OR unread = ?2)
             AND (?3 IS NULL OR folder = ?3)
           ORDER BY received_at DESC, rowid DESC
           LIMIT ?4"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![handled, unread, folder, limit_val],
            RawEmail::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEmail::into_email).collect()
  }

  async fn update_email_status(&self, id: Uuid, status: EmailStatus) -> Result<Option<Email>> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE incoming_emails SET
             handled     = COALESCE(?2, handled),
             unread      = COALESCE(?3, unread),
             tag         = COALESCE(?4, tag),
             flag_status = COALESCE(?5, flag_status),
             folder      = COALESCE(?6, folder)
           WHERE email_id = ?1",
          rusqlite::params![
            id_str,
            status.handled,
            status.unread,
            status.tag,
            status.flag_status,
            status.folder,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_email(id).await
  }

  // ── Triage runs ───────────────────────────────────────────────────────────

  async fn record_triage_run(&self, actions: Vec<NewTriageAction>) -> Result<TriageRunView> {
    let run = TriageRun {
      run_id:      Uuid::new_v4(),
      created_at:  Utc::now(),
      email_count: actions.len() as u32,
    };
    let actions: Vec<TriageAction> = actions
      .into_iter()
      .map(|a| TriageAction {
        action_id:  Uuid::new_v4(),
        run_id:     run.run_id,
        email_id:   a.email_id,
        category:   a.category,
        reason:     a.reason,
        urgency:    a.urgency,
        due_date:   a.due_date,
        created_at: run.created_at,
      })
      .collect();

    let (run_row, action_rows) = (run.clone(), actions.clone());
    let missing: Option<String> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        for a in &action_rows {
          let email_id = encode_uuid(a.email_id);
          let exists = tx
            .query_row(
              "SELECT 1 FROM incoming_emails WHERE email_id = ?1",
              rusqlite::params![email_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
          if !exists {
            // Dropping `tx` rolls back.
            return Ok(Some(email_id));
          }
        }

        tx.execute(
          "INSERT INTO ai_triage_runs (run_id, created_at, email_count) VALUES (?1, ?2, ?3)",
          rusqlite::params![
            encode_uuid(run_row.run_id),
            encode_dt(run_row.created_at),
            run_row.email_count,
          ],
        )?;

        for a in &action_rows {
          tx.execute(
            "INSERT INTO ai_triage_actions (
               action_id, run_id, email_id, category, reason, urgency, due_date, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
              encode_uuid(a.action_id),
              encode_uuid(a.run_id),
              encode_uuid(a.email_id),
              a.category.as_str(),
              a.reason,
              a.urgency.as_str(),
              encode_date(a.due_date),
              encode_dt(a.created_at),
            ],
          )?;
        }

        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(id) = missing {
      return Err(Error::EmailNotFound(decode_uuid(&id)?));
    }
    Ok(TriageRunView { run, actions })
  }

  async fn get_triage_run(&self, run_id: Uuid) -> Result<Option<TriageRunView>> {
    let id_str = encode_uuid(run_id);
    let found: Option<(RawRun, Vec<RawAction>)> = self
      .conn
      .call(move |conn| {
        let run = conn
          .query_row(
            "SELECT run_id, created_at, email_count FROM ai_triage_runs WHERE run_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawRun {
                run_id:      row.get(0)?,
                created_at:  row.get(1)?,
                email_count: row.get(2)?,
              })
            },
          )
          .optional()?;
        let Some(run) = run else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT action_id, run_id, email_id, category, reason, urgency, due_date, created_at
           FROM ai_triage_actions
           WHERE run_id = ?1
           ORDER BY rowid",
        )?;
        let actions = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawAction {
              action_id:  row.get(0)?,
              run_id:     row.get(1)?,
              email_id:   row.get(2)?,
              category:   row.get(3)?,
              reason:     row.get(4)?,
              urgency:    row.get(5)?,
              due_date:   row.get(6)?,
              created_at: row.get(7)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some((run, actions)))
      })
      .await?;

    let Some((run, actions)) = found else {
      return Ok(None);
    };
    Ok(Some(TriageRunView {
      run:     run.into_run()?,
      actions: actions
        .into_iter()
        .map(RawAction::into_action)
        .collect::<Result<_>>()?,
    }))
  }

  // ── Compliance reminders ──────────────────────────────────────────────────

  async fn record_reminder(&self, input: NewComplianceReminder) -> Result<ComplianceReminder> {
    let reminder = ComplianceReminder {
      reminder_id:      Uuid::new_v4(),
      building_name:    input.building_name,
      asset_name:       input.asset_name,
      due_date:         input.due_date,
      reminder_date:    input.reminder_date,
      label:            input.label,
      outlook_event_id: input.outlook_event_id,
      created_at:       Utc::now(),
    };

    let row = reminder.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO compliance_reminders (
             reminder_id, building_name, asset_name, due_date, reminder_date,
             label, outlook_event_id, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            encode_uuid(row.reminder_id),
            row.building_name,
            row.asset_name,
            encode_date(row.due_date),
            encode_date(row.reminder_date),
            row.label,
            row.outlook_event_id,
            encode_dt(row.created_at),
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(reminder)
  }
}
