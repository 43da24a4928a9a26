//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, dates are `YYYY-MM-DD`, UUIDs are
//! hyphenated lowercase strings and booleans are `0`/`1` integers.

use std::str::FromStr as _;

use blociq_core::{
  email::Email,
  reminder::ComplianceReminder,
  triage::{Category, TriageAction, TriageRun, Urgency},
};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Labels ──────────────────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> {
  Category::from_str(s).map_err(|_| blociq_core::Error::UnknownCategory(s.to_owned()).into())
}

pub fn decode_urgency(s: &str) -> Result<Urgency> {
  Urgency::from_str(s).map_err(|_| blociq_core::Error::UnknownUrgency(s.to_owned()).into())
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawEmail::from_row`].
pub const EMAIL_COLUMNS: &str = "email_id, outlook_id, from_email, from_name, subject, \
   body_preview, body, received_at, building_id, unit_id, leaseholder_id, handled, unread, \
   tag, flag_status, folder";

/// Raw values read directly from an `incoming_emails` row.
pub struct RawEmail {
  pub email_id:       String,
  pub outlook_id:     Option<String>,
  pub from_email:     Option<String>,
  pub from_name:      Option<String>,
  pub subject:        Option<String>,
  pub body_preview:   Option<String>,
  pub body:           Option<String>,
  pub received_at:    String,
  pub building_id:    Option<String>,
  pub unit_id:        Option<String>,
  pub leaseholder_id: Option<String>,
  pub handled:        bool,
  pub unread:         bool,
  pub tag:            Option<String>,
  pub flag_status:    Option<String>,
  pub folder:         String,
}

impl RawEmail {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      email_id:       row.get(0)?,
      outlook_id:     row.get(1)?,
      from_email:     row.get(2)?,
      from_name:      row.get(3)?,
      subject:        row.get(4)?,
      body_preview:   row.get(5)?,
      body:           row.get(6)?,
      received_at:    row.get(7)?,
      building_id:    row.get(8)?,
      unit_id:        row.get(9)?,
      leaseholder_id: row.get(10)?,
      handled:        row.get(11)?,
      unread:         row.get(12)?,
      tag:            row.get(13)?,
      flag_status:    row.get(14)?,
      folder:         row.get(15)?,
    })
  }

  pub fn into_email(self) -> Result<Email> {
    Ok(Email {
      email_id:       decode_uuid(&self.email_id)?,
      outlook_id:     self.outlook_id,
      from_email:     self.from_email,
      from_name:      self.from_name,
      subject:        self.subject,
      body_preview:   self.body_preview,
      body:           self.body,
      received_at:    decode_dt(&self.received_at)?,
      building_id:    self.building_id,
      unit_id:        self.unit_id,
      leaseholder_id: self.leaseholder_id,
      handled:        self.handled,
      unread:         self.unread,
      tag:            self.tag,
      flag_status:    self.flag_status,
      folder:         self.folder,
    })
  }
}

/// Raw strings read from an `ai_triage_runs` row.
pub struct RawRun {
  pub run_id:      String,
  pub created_at:  String,
  pub email_count: u32,
}

impl RawRun {
  pub fn into_run(self) -> Result<TriageRun> {
    Ok(TriageRun {
      run_id:      decode_uuid(&self.run_id)?,
      created_at:  decode_dt(&self.created_at)?,
      email_count: self.email_count,
    })
  }
}

/// Raw strings read from an `ai_triage_actions` row.
pub struct RawAction {
  pub action_id:  String,
  pub run_id:     String,
  pub email_id:   String,
  pub category:   String,
  pub reason:     String,
  pub urgency:    String,
  pub due_date:   String,
  pub created_at: String,
}

impl RawAction {
  pub fn into_action(self) -> Result<TriageAction> {
    Ok(TriageAction {
      action_id:  decode_uuid(&self.action_id)?,
      run_id:     decode_uuid(&self.run_id)?,
      email_id:   decode_uuid(&self.email_id)?,
      category:   decode_category(&self.category)?,
      reason:     self.reason,
      urgency:    decode_urgency(&self.urgency)?,
      due_date:   decode_date(&self.due_date)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read from a `compliance_reminders` row.
pub struct RawReminder {
  pub reminder_id:      String,
  pub building_name:    String,
  pub asset_name:       String,
  pub due_date:         String,
  pub reminder_date:    String,
  pub label:            String,
  pub outlook_event_id: Option<String>,
  pub created_at:       String,
}

impl RawReminder {
  pub fn into_reminder(self) -> Result<ComplianceReminder> {
    Ok(ComplianceReminder {
      reminder_id:      decode_uuid(&self.reminder_id)?,
      building_name:    self.building_name,
      asset_name:       self.asset_name,
      due_date:         decode_date(&self.due_date)?,
      reminder_date:    decode_date(&self.reminder_date)?,
      label:            self.label,
      outlook_event_id: self.outlook_event_id,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}
