//! iCalendar (RFC 5545) writer for BlocIQ.
//!
//! Produces a `VCALENDAR` that Outlook, Google Calendar and Apple Calendar
//! import as-is. Used whenever an event cannot be created through Microsoft
//! Graph. Pure synchronous; no parsing.
//!
//! # Quick start
//!
//! ```no_run
//! use blociq_ics::{IcsEvent, IcsTime, calendar};
//! use chrono::{TimeZone, Utc};
//!
//! let start = Utc.with_ymd_and_hms(2025, 3, 12, 15, 0, 0).unwrap();
//! let event = IcsEvent::new("AGM", IcsTime::At(start), IcsTime::At(start));
//! let ics = calendar(&[event]).unwrap();
//! assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
//! ```

pub mod error;
mod serialize;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
pub use error::{Error, Result};

/// Product identifier written into every calendar.
pub const PRODID: &str = "-//BlocIQ//Inbox Triage//EN";

/// A point in time, or a whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcsTime {
  At(DateTime<Utc>),
  /// All-day; written with `VALUE=DATE`.
  Day(NaiveDate),
}

impl IcsTime {
  /// Convert a zone-aware instant to UTC.
  pub fn at<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self { Self::At(dt.with_timezone(&Utc)) }
}

/// One `VEVENT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsEvent {
  pub summary:     String,
  pub start:       IcsTime,
  pub end:         IcsTime,
  pub location:    Option<String>,
  pub description: Option<String>,
}

impl IcsEvent {
  pub fn new(summary: impl Into<String>, start: IcsTime, end: IcsTime) -> Self {
    Self {
      summary: summary.into(),
      start,
      end,
      location: None,
      description: None,
    }
  }

  pub fn with_location(mut self, location: Option<String>) -> Self {
    self.location = location;
    self
  }

  pub fn with_description(mut self, description: Option<String>) -> Self {
    self.description = description;
    self
  }

  /// A single all-day event on `day`.
  pub fn all_day(summary: impl Into<String>, day: NaiveDate) -> Self {
    let next = day.succ_opt().unwrap_or(day);
    Self::new(summary, IcsTime::Day(day), IcsTime::Day(next))
  }
}

/// Build a `VCALENDAR` containing `events`, stamped with the current time.
pub fn calendar(events: &[IcsEvent]) -> Result<String> {
  serialize::calendar_at(events, Utc::now())
}

/// Like [`calendar`] with an explicit `DTSTAMP`.
pub fn calendar_at(events: &[IcsEvent], stamp: DateTime<Utc>) -> Result<String> {
  serialize::calendar_at(events, stamp)
}

/// The stable `UID` of an event: hex SHA-256 over its summary and start.
pub fn event_uid(event: &IcsEvent) -> String { serialize::uid(event) }
