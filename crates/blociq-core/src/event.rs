//! Calendar event extraction from free text.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone as _, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{LONDON, contains_any, when, works::find_address};

/// Default event length when the text gives no end time.
pub const DEFAULT_DURATION_MINUTES: i64 = 60;
/// Default length of AGM-like events.
pub const AGM_DURATION_MINUTES: i64 = 120;
/// Longest event length a caller may ask for (one week).
pub const MAX_DURATION_MINUTES: i64 = 7 * 24 * 60;

const AGM_WORDS: &[&str] = &["agm", "egm", "annual general meeting", "general meeting"];
const INSPECTION_WORDS: &[&str] = &[
  "inspection",
  "survey",
  "fire risk assessment",
  "site visit",
  "walkround",
];
const CONTRACTOR_WORDS: &[&str] = &[
  "contractor",
  "engineer",
  "technician",
  "attend",
  "repair",
  "works",
];
const MEETING_WORDS: &[&str] = &["meeting", "meet", "call", "appointment"];

/// What sort of event the text describes.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
  Agm,
  Inspection,
  ContractorVisit,
  Meeting,
  Event,
}

impl EventKind {
  fn detect(text_lower: &str) -> Self {
    if contains_any(text_lower, AGM_WORDS) {
      Self::Agm
    } else if contains_any(text_lower, INSPECTION_WORDS) {
      Self::Inspection
    } else if contains_any(text_lower, CONTRACTOR_WORDS) {
      Self::ContractorVisit
    } else if contains_any(text_lower, MEETING_WORDS) {
      Self::Meeting
    } else {
      Self::Event
    }
  }

  fn default_title(self) -> &'static str {
    match self {
      Self::Agm => "AGM",
      Self::Inspection => "Inspection",
      Self::ContractorVisit => "Contractor visit",
      Self::Meeting => "Meeting",
      Self::Event => "Event",
    }
  }
}

/// Hints supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventContext {
  /// Used as the event location when present.
  #[serde(default)]
  pub address:          Option<String>,
  /// Overrides the default event length. Values outside
  /// `1..=MAX_DURATION_MINUTES` are ignored.
  #[serde(default)]
  pub duration_minutes: Option<i64>,
  /// Used as the title when present, usually the email subject.
  #[serde(default)]
  pub title:            Option<String>,
  /// Wall-clock instant (Europe/London) relative expressions are resolved
  /// against. Defaults to now.
  #[serde(default)]
  pub reference:        Option<NaiveDateTime>,
}

/// A calendar event lifted out of text. `start_iso` is `None` when the text
/// contained no date, in which case callers skip event creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventExtract {
  pub kind:      EventKind,
  pub title:     String,
  #[serde(rename = "startISO")]
  pub start_iso: Option<DateTime<FixedOffset>>,
  #[serde(rename = "endISO")]
  pub end_iso:   Option<DateTime<FixedOffset>>,
  pub location:  Option<String>,
  pub notes:     Option<String>,
}

impl EventExtract {
  pub fn has_date(&self) -> bool { self.start_iso.is_some() }
}

/// Longest note carried into the event body.
const MAX_NOTES: usize = 500;

/// Current wall-clock time in Europe/London.
pub fn london_now() -> NaiveDateTime { Utc::now().with_timezone(&LONDON).naive_local() }

/// Interpret a London wall-clock time. Times inside the spring-forward gap are
/// pushed one hour later.
pub fn in_london(local: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
  LONDON
    .from_local_datetime(&local)
    .earliest()
    .or_else(|| {
      LONDON
        .from_local_datetime(&(local + Duration::hours(1)))
        .earliest()
    })
    .map(|dt| dt.fixed_offset())
}

/// Extract a calendar event from `text`.
pub fn extract_event(text: &str, ctx: &EventContext) -> EventExtract {
  let lower = text.to_lowercase();
  let kind = EventKind::detect(&lower);

  let reference = ctx.reference.unwrap_or_else(london_now);
  let (start, end) = match when::parse_first(text, reference) {
    Some(w) => {
      let minutes = ctx
        .duration_minutes
        .filter(|m| (1..=MAX_DURATION_MINUTES).contains(m))
        .unwrap_or(match kind {
          EventKind::Agm => AGM_DURATION_MINUTES,
          _ => DEFAULT_DURATION_MINUTES,
        });
      let end = w
        .end
        .or_else(|| Duration::try_minutes(minutes).and_then(|d| w.start.checked_add_signed(d)))
        .unwrap_or(w.start);
      (in_london(w.start), in_london(end))
    }
    None => (None, None),
  };

  let title = ctx
    .title
    .as_deref()
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(String::from)
    .unwrap_or_else(|| kind.default_title().to_string());

  let location = ctx
    .address
    .clone()
    .filter(|a| !a.trim().is_empty())
    .or_else(|| find_address(text));

  let notes = Some(text.trim())
    .filter(|t| !t.is_empty())
    .map(|t| t.chars().take(MAX_NOTES).collect());

  EventExtract {
    kind,
    title,
    start_iso: start,
    end_iso: end.filter(|_| start.is_some()),
    location,
    notes,
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn ctx() -> EventContext {
    EventContext {
      reference: NaiveDate::from_ymd_opt(2025, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0),
      ..EventContext::default()
    }
  }

  #[test]
  fn agm_gets_two_hours_in_london_time() {
    let e = extract_event("AGM on 12 March 2025 3pm", &ctx());
    assert_eq!(e.kind, EventKind::Agm);
    let start = e.start_iso.unwrap();
    let end = e.end_iso.unwrap();
    assert_eq!(start.to_rfc3339(), "2025-03-12T15:00:00+00:00");
    assert_eq!(end - start, Duration::minutes(120));
  }

  #[test]
  fn summer_dates_carry_bst_offset() {
    let e = extract_event("Fire door inspection 3 June 2025 at 10am", &ctx());
    assert_eq!(e.kind, EventKind::Inspection);
    assert_eq!(
      e.start_iso.unwrap().to_rfc3339(),
      "2025-06-03T10:00:00+01:00"
    );
    assert_eq!(e.end_iso.unwrap() - e.start_iso.unwrap(), Duration::minutes(60));
  }

  #[test]
  fn no_date_yields_null_times() {
    let e = extract_event("random text with no date", &ctx());
    assert!(e.start_iso.is_none());
    assert!(e.end_iso.is_none());
    assert!(!e.has_date());

    let json = serde_json::to_value(&e).unwrap();
    assert!(json["startISO"].is_null());
    assert!(json["endISO"].is_null());
  }

  #[test]
  fn explicit_range_and_duration_override() {
    let e = extract_event("Meeting 14 April 2025 from 2pm to 4pm", &ctx());
    assert_eq!(e.end_iso.unwrap() - e.start_iso.unwrap(), Duration::hours(2));

    let e = extract_event("Meeting 14 April 2025 2pm", &EventContext {
      duration_minutes: Some(30),
      ..ctx()
    });
    assert_eq!(e.end_iso.unwrap() - e.start_iso.unwrap(), Duration::minutes(30));
  }

  #[test]
  fn out_of_range_duration_falls_back_to_default() {
    for minutes in [i64::MAX, i64::MIN, -30, 0, MAX_DURATION_MINUTES + 1] {
      let e = extract_event("Meeting 14 April 2025 2pm", &EventContext {
        duration_minutes: Some(minutes),
        ..ctx()
      });
      let (start, end) = (e.start_iso.unwrap(), e.end_iso.unwrap());
      assert_eq!(end - start, Duration::minutes(DEFAULT_DURATION_MINUTES), "{minutes}");
    }

    let e = extract_event("Meeting 14 April 2025 2pm", &EventContext {
      duration_minutes: Some(MAX_DURATION_MINUTES),
      ..ctx()
    });
    assert_eq!(e.end_iso.unwrap() - e.start_iso.unwrap(), Duration::days(7));
  }

  #[test]
  fn location_prefers_context_then_text() {
    let text = "Engineer will attend 21 Ashwood Road, London on 5 March 2025 9am";
    let e = extract_event(text, &ctx());
    assert_eq!(e.kind, EventKind::ContractorVisit);
    assert_eq!(e.location.as_deref(), Some("21 Ashwood Road, London"));

    let e = extract_event(text, &EventContext {
      address: Some("Block B".into()),
      ..ctx()
    });
    assert_eq!(e.location.as_deref(), Some("Block B"));
  }
}
