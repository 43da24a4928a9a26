//! VCALENDAR serializer.
//!
//! Produces CRLF line endings and folds at 75 octets per RFC 5545 §3.1.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::{
  IcsEvent, IcsTime, PRODID,
  error::{Error, Result},
};

// ─── RFC 5545 line folding ───────────────────────────────────────────────────

/// Emit `s` as one logical line, folding at 75 octets with CRLF + SP continuation.
pub(crate) fn fold_line(s: &str) -> String {
  let mut out = String::with_capacity(s.len() + s.len() / 74 * 3 + 2);
  let mut rest = s;
  let mut limit = 75;

  while rest.len() > limit {
    let mut cut = limit;
    while !rest.is_char_boundary(cut) {
      cut -= 1;
    }
    out.push_str(&rest[..cut]);
    out.push_str("\r\n ");
    rest = &rest[cut..];
    // continuation lines lose one octet to the leading space
    limit = 74;
  }
  out.push_str(rest);
  out.push_str("\r\n");
  out
}

// ─── Value escaping ──────────────────────────────────────────────────────────

/// Escape a TEXT value: `\`, `;`, `,`, newlines.
fn escape_text(s: &str) -> String {
  s.replace('\\', "\\\\")
    .replace(';', "\\;")
    .replace(',', "\\,")
    .replace("\r\n", "\\n")
    .replace('\n', "\\n")
}

fn format_utc(dt: DateTime<Utc>) -> String { dt.format("%Y%m%dT%H%M%SZ").to_string() }

fn time_property(name: &str, t: IcsTime) -> String {
  match t {
    IcsTime::At(dt) => format!("{name}:{}", format_utc(dt)),
    IcsTime::Day(d) => format!("{name};VALUE=DATE:{}", d.format("%Y%m%d")),
  }
}

// ─── UID ─────────────────────────────────────────────────────────────────────

pub(crate) fn uid(event: &IcsEvent) -> String {
  let start = match event.start {
    IcsTime::At(dt) => format_utc(dt),
    IcsTime::Day(d) => d.format("%Y%m%d").to_string(),
  };
  let mut hasher = Sha256::new();
  hasher.update(event.summary.as_bytes());
  hasher.update(b"|");
  hasher.update(start.as_bytes());
  format!("{}@blociq", hex::encode(hasher.finalize()))
}

// ─── Validation ──────────────────────────────────────────────────────────────

fn validate(event: &IcsEvent) -> Result<()> {
  if event.summary.trim().is_empty() {
    return Err(Error::EmptySummary);
  }
  let ordered = match (event.start, event.end) {
    (IcsTime::At(s), IcsTime::At(e)) => s <= e,
    (IcsTime::Day(s), IcsTime::Day(e)) => s <= e,
    _ => {
      return Err(Error::MixedTimes {
        summary: event.summary.clone(),
      });
    }
  };
  if !ordered {
    return Err(Error::EndBeforeStart {
      summary: event.summary.clone(),
    });
  }
  Ok(())
}

// ─── Calendar ────────────────────────────────────────────────────────────────

pub(crate) fn calendar_at(events: &[IcsEvent], stamp: DateTime<Utc>) -> Result<String> {
  let mut out = String::new();
  out.push_str(&fold_line("BEGIN:VCALENDAR"));
  out.push_str(&fold_line("VERSION:2.0"));
  out.push_str(&fold_line(&format!("PRODID:{PRODID}")));
  out.push_str(&fold_line("CALSCALE:GREGORIAN"));
  out.push_str(&fold_line("METHOD:PUBLISH"));

  for event in events {
    validate(event)?;
    out.push_str(&fold_line("BEGIN:VEVENT"));
    out.push_str(&fold_line(&format!("UID:{}", uid(event))));
    out.push_str(&fold_line(&format!("DTSTAMP:{}", format_utc(stamp))));
    out.push_str(&fold_line(&time_property("DTSTART", event.start)));
    out.push_str(&fold_line(&time_property("DTEND", event.end)));
    out.push_str(&fold_line(&format!("SUMMARY:{}", escape_text(&event.summary))));
    if let Some(loc) = event.location.as_deref().filter(|l| !l.is_empty()) {
      out.push_str(&fold_line(&format!("LOCATION:{}", escape_text(loc))));
    }
    if let Some(desc) = event.description.as_deref().filter(|d| !d.is_empty()) {
      out.push_str(&fold_line(&format!("DESCRIPTION:{}", escape_text(desc))));
    }
    out.push_str(&fold_line("END:VEVENT"));
  }

  out.push_str(&fold_line("END:VCALENDAR"));
  Ok(out)
}

#[cfg(test)]
mod tests {
  use chrono::{FixedOffset, NaiveDate, TimeZone};

  use super::*;

  fn stamp() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap() }

  #[test]
  fn bst_times_are_written_in_utc() {
    let bst = FixedOffset::east_opt(3600).unwrap();
    let start = bst.with_ymd_and_hms(2025, 6, 3, 10, 0, 0).unwrap();
    let end = bst.with_ymd_and_hms(2025, 6, 3, 11, 0, 0).unwrap();
    let ev = IcsEvent::new("Inspection", IcsTime::at(&start), IcsTime::at(&end));

    let ics = calendar_at(&[ev], stamp()).unwrap();
    assert!(ics.contains("\r\nDTSTART:20250603T090000Z\r\n"));
    assert!(ics.contains("\r\nDTEND:20250603T100000Z\r\n"));
    assert!(ics.contains("\r\nDTSTAMP:20250301T080000Z\r\n"));
    assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(ics.ends_with("END:VEVENT\r\nEND:VCALENDAR\r\n"));
  }

  #[test]
  fn all_day_uses_value_date() {
    let day = NaiveDate::from_ymd_opt(2025, 9, 2).unwrap();
    let ics = calendar_at(&[IcsEvent::all_day("90-Day reminder", day)], stamp()).unwrap();
    assert!(ics.contains("DTSTART;VALUE=DATE:20250902\r\n"));
    assert!(ics.contains("DTEND;VALUE=DATE:20250903\r\n"));
  }

  #[test]
  fn text_is_escaped() {
    let at = IcsTime::At(stamp());
    let ev = IcsEvent::new("AGM; Ashwood, Court", at, at)
      .with_description(Some("line one\nline two \\ end".into()));
    let ics = calendar_at(&[ev], stamp()).unwrap();
    assert!(ics.contains("SUMMARY:AGM\\; Ashwood\\, Court\r\n"));
    assert!(ics.contains("DESCRIPTION:line one\\nline two \\\\ end\r\n"));
  }

  #[test]
  fn long_lines_fold_at_75_octets() {
    let long = "é".repeat(100);
    let folded = fold_line(&format!("DESCRIPTION:{long}"));
    for line in folded.split("\r\n").filter(|l| !l.is_empty()) {
      assert!(line.len() <= 75, "{} octets", line.len());
    }
    let unfolded = folded.replace("\r\n ", "");
    assert_eq!(unfolded, format!("DESCRIPTION:{long}\r\n"));
  }

  #[test]
  fn uid_depends_on_summary_and_start() {
    let a = IcsTime::At(stamp());
    let b = IcsTime::At(stamp() + chrono::Duration::hours(1));
    let uid1 = uid(&IcsEvent::new("AGM", a, a));
    assert_eq!(uid1, uid(&IcsEvent::new("AGM", a, b)));
    assert_ne!(uid1, uid(&IcsEvent::new("AGM", b, b)));
    assert_ne!(uid1, uid(&IcsEvent::new("EGM", a, a)));
    assert!(uid1.ends_with("@blociq"));
  }

  #[test]
  fn invalid_events_are_rejected() {
    let a = IcsTime::At(stamp());
    let earlier = IcsTime::At(stamp() - chrono::Duration::hours(1));
    assert!(matches!(
      calendar_at(&[IcsEvent::new("x", a, earlier)], stamp()),
      Err(Error::EndBeforeStart { .. })
    ));
    assert!(matches!(
      calendar_at(&[IcsEvent::new("  ", a, a)], stamp()),
      Err(Error::EmptySummary)
    ));
  }
}
