//! Graph v1.0 request and response bodies, trimmed to the fields BlocIQ uses.

use blociq_core::{
  LONDON,
  email::{NewEmail, preview_of},
};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Time zone name sent with every event.
pub const EVENT_TIME_ZONE: &str = "Europe/London";

// ─── Shared pieces ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemBody {
  /// `Text` or `HTML`.
  pub content_type: String,
  pub content:      String,
}

impl ItemBody {
  pub fn text(content: impl Into<String>) -> Self {
    Self {
      content_type: "Text".into(),
      content:      content.into(),
    }
  }

  fn is_html(&self) -> bool { self.content_type.eq_ignore_ascii_case("html") }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAddress {
  #[serde(default)]
  pub name:    Option<String>,
  #[serde(default)]
  pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
  pub email_address: EmailAddress,
}

impl Recipient {
  pub fn address(address: impl Into<String>) -> Self {
    Self {
      email_address: EmailAddress {
        name:    None,
        address: Some(address.into()),
      },
    }
  }
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// A message as returned by `GET /me/mailFolders/inbox/messages`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMessage {
  pub id:                 String,
  #[serde(default)]
  pub subject:            Option<String>,
  #[serde(default)]
  pub from:               Option<Recipient>,
  #[serde(default)]
  pub received_date_time: Option<DateTime<Utc>>,
  #[serde(default)]
  pub body_preview:       Option<String>,
  #[serde(default)]
  pub body:               Option<ItemBody>,
  #[serde(default)]
  pub is_read:            Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagePage {
  pub value: Vec<GraphMessage>,
}

impl GraphMessage {
  /// Map to the store's insert type. HTML bodies are reduced to text.
  pub fn to_new_email(&self) -> NewEmail {
    let body = self.body.as_ref().map(|b| {
      if b.is_html() {
        html_to_text(&b.content)
      } else {
        b.content.trim().to_string()
      }
    });
    let from = self.from.as_ref().map(|r| &r.email_address);

    NewEmail {
      outlook_id: Some(self.id.clone()),
      from_email: from.and_then(|a| a.address.clone()),
      from_name: from.and_then(|a| a.name.clone()),
      subject: self.subject.clone(),
      body_preview: self
        .body_preview
        .clone()
        .or_else(|| body.as_deref().map(preview_of)),
      body,
      received_at: self.received_date_time,
      unread: !self.is_read.unwrap_or(false),
      ..NewEmail::default()
    }
  }
}

/// Strip tags and collapse whitespace. Good enough for keyword matching.
fn html_to_text(html: &str) -> String {
  let mut out = String::with_capacity(html.len());
  let mut in_tag = false;
  for c in html.chars() {
    match c {
      '<' => {
        in_tag = true;
        out.push(' ');
      }
      '>' => in_tag = false,
      _ if !in_tag => out.push(c),
      _ => {}
    }
  }
  out
    .replace("&nbsp;", " ")
    .replace("&amp;", "&")
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// A message to be created in the Drafts folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDraft {
  pub subject: String,
  pub body:    String,
  #[serde(default)]
  pub to:      Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DraftPayload {
  pub subject:       String,
  pub body:          ItemBody,
  pub to_recipients: Vec<Recipient>,
}

impl From<NewDraft> for DraftPayload {
  fn from(d: NewDraft) -> Self {
    Self {
      subject:       d.subject,
      body:          ItemBody::text(d.body),
      to_recipients: d.to.into_iter().map(Recipient::address).collect(),
    }
  }
}

/// Identity of a created or moved message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRef {
  pub id:       String,
  #[serde(default)]
  pub web_link: Option<String>,
}

/// A file attached to a draft. Sent inline as base64.
#[derive(Debug, Clone)]
pub struct Attachment {
  pub name:         String,
  pub content_type: String,
  pub bytes:        Vec<u8>,
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// Graph's `dateTimeTimeZone`: a wall-clock time plus the zone it is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeZone {
  pub date_time: String,
  pub time_zone: String,
}

impl DateTimeZone {
  pub fn london(dt: &DateTime<FixedOffset>) -> Self {
    Self {
      date_time: dt
        .with_timezone(&LONDON)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string(),
      time_zone: EVENT_TIME_ZONE.to_string(),
    }
  }

  fn midnight(date: NaiveDate) -> Self {
    Self {
      date_time: format!("{}T00:00:00", date.format("%Y-%m-%d")),
      time_zone: EVENT_TIME_ZONE.to_string(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
  pub display_name: String,
}

/// Request body for `POST /me/events`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEvent {
  pub subject:    String,
  pub body:       ItemBody,
  pub start:      DateTimeZone,
  pub end:        DateTimeZone,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub location:   Option<Location>,
  pub is_all_day: bool,
  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub categories: Vec<String>,
}

impl GraphEvent {
  pub fn timed(
    subject: impl Into<String>,
    start: &DateTime<FixedOffset>,
    end: &DateTime<FixedOffset>,
    location: Option<String>,
    notes: Option<String>,
  ) -> Self {
    Self {
      subject:    subject.into(),
      body:       ItemBody::text(notes.unwrap_or_default()),
      start:      DateTimeZone::london(start),
      end:        DateTimeZone::london(end),
      location:   location.map(|display_name| Location { display_name }),
      is_all_day: false,
      categories: Vec::new(),
    }
  }

  /// An all-day event on `date`. Graph wants the end at the following
  /// midnight.
  pub fn all_day(subject: impl Into<String>, date: NaiveDate, body: impl Into<String>) -> Self {
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
    Self {
      subject:    subject.into(),
      body:       ItemBody::text(body),
      start:      DateTimeZone::midnight(date),
      end:        DateTimeZone::midnight(next),
      location:   None,
      is_all_day: true,
      categories: Vec::new(),
    }
  }

  pub fn with_categories(mut self, categories: Vec<String>) -> Self {
    self.categories = categories;
    self
  }
}

/// Identity of a created event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRef {
  pub id:       String,
  #[serde(default)]
  pub web_link: Option<String>,
}
