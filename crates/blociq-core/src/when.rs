//! Natural-language date/time finding for UK correspondence.
//!
//! [`parse_first`] locates the earliest date mention in a piece of text, pairs
//! it with the nearest time (or time range), and resolves relative forms such
//! as `tomorrow` or `next Tuesday` against a reference instant. Times with no
//! date attach to the reference date; dates with no time land at noon.
//!
//! Date phrases are resolved by [`chrono_english`] in its UK dialect (day
//! before month). The patterns here locate those phrases in running text and
//! cover what it does not read: ordinal and `of` forms (`12th of Mar`),
//! year-less dates that roll forward, two-digit years, `tonight`, and time
//! ranges.
//!
//! Recognised dates: `12 March 2025`, `12th of Mar`, `March 12, 2025`,
//! `12/03/2025` (day first), `2025-03-12`, `2025-03-12T15:00`, `today`,
//! `tonight`, `tomorrow`, weekday names with optional `next` / `this` / `on`.
//!
//! Recognised times: `3pm`, `3:30pm`, `10.30am`, `15:00`, `noon`, `midday`,
//! and ranges joined by `-`, `–`, `to`, `until`, `till` or `and`
//! (`2-4pm` shares the meridiem).

use std::sync::OnceLock;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone as _, Utc, Weekday};
use chrono_english::Dialect;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// The hour assigned to a date mentioned without a time.
pub const IMPLIED_HOUR: u32 = 12;

/// Maximum gap (in bytes) between a date and the time that qualifies it.
const MAX_GAP: usize = 25;

/// A date/time span found in text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedWhen {
  pub start:    NaiveDateTime,
  /// Present only when the text gave an explicit end time.
  pub end:      Option<NaiveDateTime>,
  /// `false` when the time was implied.
  pub has_time: bool,
  /// The slice of input the date came from (or the time, for time-only hits).
  pub matched:  String,
}

// ─── Patterns ────────────────────────────────────────────────────────────────

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

fn re_iso() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})(?:\b|T)").unwrap())
}

/// The time half of an ISO date-time; group 1 is the hour.
fn re_iso_time() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"\d{4}-\d{1,2}-\d{1,2}T([01]?\d|2[0-3]):([0-5]\d)(?::[0-5]\d)?\b").unwrap()
  })
}

fn re_numeric() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{4}|\d{2})\b").unwrap()
  })
}

fn re_day_month() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(&format!(
      r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?(?:\s+of)?\s+{MONTH}\b\.?,?(?:\s+(\d{{4}}))?"
    ))
    .unwrap()
  })
}

fn re_month_day() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(&format!(
      r"(?i)\b{MONTH}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+(\d{{4}}))?"
    ))
    .unwrap()
  })
}

fn re_relative() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?i)\b(today|tonight|tomorrow)\b").unwrap())
}

fn re_weekday() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"(?i)\b(?:(next|this|on)\s+)?(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .unwrap()
  })
}

fn re_shared_range() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"(?i)\b(\d{1,2})(?:[:.](\d{2}))?\s*(?:-|–|to)\s*(\d{1,2})(?:[:.](\d{2}))?\s*(am|pm)\b",
    )
    .unwrap()
  })
}

fn re_meridiem() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?i)\b(\d{1,2})(?:[:.](\d{2}))?\s*(am|pm)\b").unwrap()
  })
}

fn re_clock() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"\b([01]?\d|2[0-3]):([0-5]\d)\b").unwrap())
}

fn re_noon() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"(?i)\b(noon|midday)\b").unwrap())
}

fn re_range_joiner() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?i)^\s*(?:-|–|to|until|till|and)\s*$").unwrap()
  })
}

// ─── Hits ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Hit<T> {
  start: usize,
  end:   usize,
  value: T,
}

fn month_number(name: &str) -> Option<u32> {
  let m = match name.get(..3)?.to_ascii_lowercase().as_str() {
    "jan" => 1,
    "feb" => 2,
    "mar" => 3,
    "apr" => 4,
    "may" => 5,
    "jun" => 6,
    "jul" => 7,
    "aug" => 8,
    "sep" => 9,
    "oct" => 10,
    "nov" => 11,
    "dec" => 12,
    _ => return None,
  };
  Some(m)
}

fn weekday_of(name: &str) -> Option<Weekday> {
  name.to_ascii_lowercase().parse().ok()
}

fn num(caps: &Captures<'_>, i: usize) -> Option<u32> {
  caps.get(i).and_then(|m| m.as_str().parse().ok())
}

/// Resolve a date phrase with `chrono_english`, reading numeric dates day
/// first.
fn english_date(phrase: &str, today: NaiveDate) -> Option<NaiveDate> {
  let base = Utc.from_utc_datetime(&today.and_hms_opt(0, 0, 0)?);
  chrono_english::parse_date_string(phrase, base, Dialect::Uk)
    .ok()
    .map(|dt| dt.date_naive())
}

/// Resolve a day/month with no year to the next occurrence on or after
/// `today`.
fn upcoming(day: u32, month: u32, today: NaiveDate) -> Option<NaiveDate> {
  let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
  match this_year {
    Some(d) if d >= today => Some(d),
    _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
  }
}

/// The upcoming `target` day: within the coming week, or the week after for
/// `next` when today is already `target`.
fn weekday_date(name: &str, target: Weekday, is_next: bool, today: NaiveDate) -> Option<NaiveDate> {
  let ahead = |date: NaiveDate| (date - today).num_days();
  let window = if is_next { 1..=13 } else { 0..=6 };

  let name = name.to_ascii_lowercase();
  let phrase = if is_next { format!("next {name}") } else { name };
  let english = english_date(&phrase, today)
    .map(|d| if ahead(d) < 0 { d + Days::new(7) } else { d })
    .filter(|d| d.weekday() == target && window.contains(&ahead(*d)));
  if english.is_some() {
    return english;
  }

  let mut days = (7 + target.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
  if days == 0 && is_next {
    days = 7;
  }
  today.checked_add_days(Days::new(u64::from(days)))
}

fn expand_year(y: u32) -> i32 {
  if y < 100 { 2000 + y as i32 } else { y as i32 }
}

fn date_hits(text: &str, today: NaiveDate) -> Vec<Hit<NaiveDate>> {
  let mut hits = Vec::new();

  for caps in re_iso().captures_iter(text) {
    // The span stops at the day so a trailing `T15:00` stays a time hit.
    let (Some(first), Some(day)) = (caps.get(1), caps.get(3)) else {
      continue;
    };
    let phrase = &text[first.start()..day.end()];
    let date = english_date(phrase, today).or_else(|| {
      NaiveDate::from_ymd_opt(num(&caps, 1)? as i32, num(&caps, 2)?, num(&caps, 3)?)
    });
    if let Some(date) = date {
      hits.push(Hit { start: first.start(), end: day.end(), value: date });
    }
  }

  for caps in re_numeric().captures_iter(text) {
    let Some(whole) = caps.get(0) else { continue };
    let (Some(d), Some(m), Some(y)) = (num(&caps, 1), num(&caps, 2), num(&caps, 3)) else {
      continue;
    };
    // Two-digit years are left to `expand_year`.
    let english = (y >= 1000)
      .then(|| english_date(&format!("{d}/{m}/{y}"), today))
      .flatten()
      .filter(|date| date.day() == d && date.month() == m);
    if let Some(date) = english.or_else(|| NaiveDate::from_ymd_opt(expand_year(y), m, d)) {
      hits.push(Hit { start: whole.start(), end: whole.end(), value: date });
    }
  }

  for caps in re_day_month().captures_iter(text) {
    let whole = caps.get(0).map(|m| (m.start(), m.end()));
    let month = caps.get(2).and_then(|m| month_number(m.as_str()));
    if let (Some((start, end)), Some(d), Some(m)) = (whole, num(&caps, 1), month) {
      let date = match num(&caps, 3) {
        Some(y) => NaiveDate::from_ymd_opt(y as i32, m, d),
        None => upcoming(d, m, today),
      };
      if let Some(date) = date {
        hits.push(Hit { start, end, value: date });
      }
    }
  }

  for caps in re_month_day().captures_iter(text) {
    let whole = caps.get(0).map(|m| (m.start(), m.end()));
    let month = caps.get(1).and_then(|m| month_number(m.as_str()));
    if let (Some((start, end)), Some(m), Some(d)) = (whole, month, num(&caps, 2)) {
      let date = match num(&caps, 3) {
        Some(y) => NaiveDate::from_ymd_opt(y as i32, m, d),
        None => upcoming(d, m, today),
      };
      if let Some(date) = date {
        hits.push(Hit { start, end, value: date });
      }
    }
  }

  for caps in re_relative().captures_iter(text) {
    let Some(m) = caps.get(1) else { continue };
    let word = m.as_str().to_ascii_lowercase();
    let (phrase, offset) = match word.as_str() {
      "tomorrow" => ("tomorrow", 1),
      _ => ("today", 0),
    };
    let date = english_date(phrase, today).or_else(|| today.checked_add_days(Days::new(offset)));
    if let Some(date) = date {
      hits.push(Hit { start: m.start(), end: m.end(), value: date });
    }
  }

  for caps in re_weekday().captures_iter(text) {
    let (Some(whole), Some(name)) = (caps.get(0), caps.get(2)) else {
      continue;
    };
    let Some(target) = weekday_of(name.as_str()) else { continue };
    let is_next = caps
      .get(1)
      .is_some_and(|m| m.as_str().eq_ignore_ascii_case("next"));
    if let Some(date) = weekday_date(name.as_str(), target, is_next, today) {
      hits.push(Hit { start: whole.start(), end: whole.end(), value: date });
    }
  }

  // Earliest mention wins; on a tie prefer the longest (most specific) match.
  hits.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
  hits
}

fn to_24h(hour: u32, minute: u32, meridiem: Option<&str>) -> Option<NaiveTime> {
  let hour = match meridiem.map(str::to_ascii_lowercase).as_deref() {
    Some("am") if hour == 12 => 0,
    Some("am") => hour,
    Some("pm") if hour == 12 => 12,
    Some("pm") => hour + 12,
    _ => hour,
  };
  if hour > 23 || minute > 59 {
    return None;
  }
  NaiveTime::from_hms_opt(hour, minute, 0)
}

fn time_hits(text: &str) -> Vec<Hit<NaiveTime>> {
  let mut hits: Vec<Hit<NaiveTime>> = Vec::new();

  let overlaps = |hits: &[Hit<NaiveTime>], start: usize, end: usize| {
    hits.iter().any(|h| start < h.end && h.start < end)
  };

  for caps in re_shared_range().captures_iter(text) {
    let meridiem = caps.get(5).map(|m| m.as_str());
    let (Some(first), Some(second)) = (caps.get(1), caps.get(3)) else {
      continue;
    };
    let Some(whole) = caps.get(0) else { continue };
    let (Some(h1), Some(h2)) = (num(&caps, 1), num(&caps, 3)) else {
      continue;
    };
    let m1 = num(&caps, 2).unwrap_or(0);
    let m2 = num(&caps, 4).unwrap_or(0);
    let end_time = to_24h(h2, m2, meridiem);
    // `11-1pm` means 11am to 1pm: only share the meridiem when the start
    // would still precede the end.
    let start_time = to_24h(h1, m1, meridiem)
      .filter(|s| end_time.is_some_and(|e| *s <= e))
      .or_else(|| to_24h(h1, m1, None));
    if let (Some(s), Some(e)) = (start_time, end_time) {
      hits.push(Hit { start: first.start(), end: first.end(), value: s });
      hits.push(Hit { start: second.start(), end: whole.end(), value: e });
    }
  }

  for caps in re_iso_time().captures_iter(text) {
    let (Some(whole), Some(hour)) = (caps.get(0), caps.get(1)) else {
      continue;
    };
    if let (Some(h), Some(m)) = (num(&caps, 1), num(&caps, 2))
      && let Some(t) = NaiveTime::from_hms_opt(h, m, 0)
    {
      hits.push(Hit { start: hour.start(), end: whole.end(), value: t });
    }
  }

  for caps in re_meridiem().captures_iter(text) {
    let Some(whole) = caps.get(0) else { continue };
    if overlaps(&hits, whole.start(), whole.end()) {
      continue;
    }
    let meridiem = caps.get(3).map(|m| m.as_str());
    if let Some(h) = num(&caps, 1)
      && let Some(t) = to_24h(h, num(&caps, 2).unwrap_or(0), meridiem)
    {
      hits.push(Hit { start: whole.start(), end: whole.end(), value: t });
    }
  }

  for caps in re_clock().captures_iter(text) {
    let Some(whole) = caps.get(0) else { continue };
    if overlaps(&hits, whole.start(), whole.end()) {
      continue;
    }
    if let (Some(h), Some(m)) = (num(&caps, 1), num(&caps, 2))
      && let Some(t) = NaiveTime::from_hms_opt(h, m, 0)
    {
      hits.push(Hit { start: whole.start(), end: whole.end(), value: t });
    }
  }

  for m in re_noon().find_iter(text) {
    if !overlaps(&hits, m.start(), m.end())
      && let Some(t) = NaiveTime::from_hms_opt(12, 0, 0)
    {
      hits.push(Hit { start: m.start(), end: m.end(), value: t });
    }
  }

  hits.sort_by_key(|h| h.start);
  hits
}

/// Pick the time that qualifies the date at `date_span`, plus an end time if
/// the next time is joined to it as a range.
fn time_near(
  text: &str,
  times: &[Hit<NaiveTime>],
  date_span: Option<(usize, usize)>,
) -> Option<(NaiveTime, Option<NaiveTime>)> {
  let idx = match date_span {
    None => Some(0).filter(|_| !times.is_empty()),
    Some((d_start, d_end)) => times
      .iter()
      .position(|t| t.start >= d_end && t.start - d_end <= MAX_GAP)
      .or_else(|| {
        times
          .iter()
          .rposition(|t| t.end <= d_start && d_start - t.end <= MAX_GAP)
      }),
  }?;

  let start = times[idx];
  let end = times.get(idx + 1).and_then(|next| {
    text
      .get(start.end..next.start)
      .filter(|between| re_range_joiner().is_match(between))
      .map(|_| next.value)
  });
  Some((start.value, end))
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Find the first date/time span in `text`, resolving relative expressions
/// against `reference`.
pub fn parse_first(text: &str, reference: NaiveDateTime) -> Option<ParsedWhen> {
  let today = reference.date();
  let dates = date_hits(text, today);
  let times = time_hits(text);

  let (date, span, matched) = match dates.first() {
    Some(d) => (d.value, Some((d.start, d.end)), text.get(d.start..d.end)?),
    None => {
      let t = times.first()?;
      (today, None, text.get(t.start..t.end)?)
    }
  };

  let (start, end, has_time) = match time_near(text, &times, span) {
    Some((s, e)) => {
      let start = date.and_time(s);
      let end = e.map(|e| {
        let end = date.and_time(e);
        if end <= start { end + chrono::Duration::days(1) } else { end }
      });
      (start, end, true)
    }
    None => {
      let noon = NaiveTime::from_hms_opt(IMPLIED_HOUR, 0, 0)?;
      (date.and_time(noon), None, false)
    }
  };

  Some(ParsedWhen {
    start,
    end,
    has_time,
    matched: matched.to_string(),
  })
}
