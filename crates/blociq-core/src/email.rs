//! Email rows, the unit the triage pipeline works on.
//!
//! Emails are inserted by the Outlook sync and mutated afterwards only through
//! [`EmailStatus`] patches. There is no versioning: the last write wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Folder name for emails still waiting in the inbox.
pub const INBOX: &str = "inbox";
/// Folder name used by the archive operation.
pub const ARCHIVE: &str = "archive";

// ─── Email ───────────────────────────────────────────────────────────────────

/// A stored inbound email (the `incoming_emails` table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
  pub email_id:       Uuid,
  /// Microsoft Graph message id; `None` for emails not synced from Outlook.
  pub outlook_id:     Option<String>,
  pub from_email:     Option<String>,
  pub from_name:      Option<String>,
  pub subject:        Option<String>,
  pub body_preview:   Option<String>,
  pub body:           Option<String>,
  pub received_at:    DateTime<Utc>,
  pub building_id:    Option<String>,
  pub unit_id:        Option<String>,
  pub leaseholder_id: Option<String>,
  pub handled:        bool,
  pub unread:         bool,
  pub tag:            Option<String>,
  pub flag_status:    Option<String>,
  pub folder:         String,
}

impl Email {
  /// Subject, or the empty string.
  pub fn subject_str(&self) -> &str { self.subject.as_deref().unwrap_or("") }

  /// The best available text for extraction: subject followed by the full
  /// body, or the preview when no body was synced.
  pub fn full_text(&self) -> String {
    let body = self
      .body
      .as_deref()
      .or(self.body_preview.as_deref())
      .unwrap_or("");
    format!("{}\n{}", self.subject_str(), body).trim().to_string()
  }
}

// ─── NewEmail ────────────────────────────────────────────────────────────────

/// Input to [`crate::store::InboxStore::insert_email`] and
/// [`crate::store::InboxStore::upsert_outlook_email`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewEmail {
  #[serde(default)]
  pub outlook_id:     Option<String>,
  #[serde(default)]
  pub from_email:     Option<String>,
  #[serde(default)]
  pub from_name:      Option<String>,
  #[serde(default)]
  pub subject:        Option<String>,
  #[serde(default)]
  pub body_preview:   Option<String>,
  #[serde(default)]
  pub body:           Option<String>,
  /// Defaults to the time of insertion.
  #[serde(default)]
  pub received_at:    Option<DateTime<Utc>>,
  #[serde(default)]
  pub building_id:    Option<String>,
  #[serde(default)]
  pub unit_id:        Option<String>,
  #[serde(default)]
  pub leaseholder_id: Option<String>,
  #[serde(default = "default_unread")]
  pub unread:         bool,
}

fn default_unread() -> bool { true }

impl NewEmail {
  /// Convenience constructor for a plain subject/body pair.
  pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
    let body = body.into();
    Self {
      subject: Some(subject.into()),
      body_preview: Some(preview_of(&body)),
      body: Some(body),
      unread: true,
      ..Self::default()
    }
  }
}

/// First 255 characters of `body`, the length Outlook uses for `bodyPreview`.
pub fn preview_of(body: &str) -> String { body.chars().take(255).collect() }

// ─── EmailStatus ─────────────────────────────────────────────────────────────

/// A partial update of an email's status fields. `None` leaves the column
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailStatus {
  #[serde(default)]
  pub handled:     Option<bool>,
  #[serde(default)]
  pub unread:      Option<bool>,
  #[serde(default)]
  pub tag:         Option<String>,
  #[serde(default)]
  pub flag_status: Option<String>,
  #[serde(default)]
  pub folder:      Option<String>,
}

impl EmailStatus {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// The patch applied by the archive operation.
  pub fn archived() -> Self {
    Self {
      handled: Some(true),
      unread: Some(false),
      folder: Some(ARCHIVE.to_string()),
      ..Self::default()
    }
  }

  /// Apply this patch to `email` in place.
  pub fn apply(&self, email: &mut Email) {
    if let Some(h) = self.handled {
      email.handled = h;
    }
    if let Some(u) = self.unread {
      email.unread = u;
    }
    if let Some(t) = &self.tag {
      email.tag = Some(t.clone());
    }
    if let Some(f) = &self.flag_status {
      email.flag_status = Some(f.clone());
    }
    if let Some(f) = &self.folder {
      email.folder = f.clone();
    }
  }
}
