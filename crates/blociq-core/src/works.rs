//! Works-order and tender extraction: pick a trade, find the property address
//! and summarise the job, then render the email sent to a contractor.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

use crate::{draft::Draft, event::london_now, when};

// ─── Trade ───────────────────────────────────────────────────────────────────

/// Contractor trades. Declaration order breaks scoring ties.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trade {
  Lift,
  Plumber,
  Electrician,
  GasEngineer,
  Roofer,
  Locksmith,
  FireSafety,
  Drainage,
  PestControl,
  Cleaner,
}

impl Trade {
  const ALL: [Trade; 10] = [
    Self::Lift,
    Self::Plumber,
    Self::Electrician,
    Self::GasEngineer,
    Self::Roofer,
    Self::Locksmith,
    Self::FireSafety,
    Self::Drainage,
    Self::PestControl,
    Self::Cleaner,
  ];

  pub fn as_str(self) -> &'static str { self.into() }

  /// Word prefixes that vote for this trade.
  fn keywords(self) -> &'static [&'static str] {
    match self {
      Self::Lift => &["lift", "elevator", "stuck", "trapped"],
      Self::Plumber => &["plumb", "leak", "pipe", "tap", "toilet", "cistern", "water"],
      Self::Electrician => &["electric", "wiring", "socket", "fuse", "light", "power"],
      Self::GasEngineer => &["gas", "boiler", "heating", "radiator"],
      Self::Roofer => &["roof", "gutter", "slate", "tiles", "flashing"],
      Self::Locksmith => &["locksmith", "lock", "locked out", "door entry", "fob"],
      Self::FireSafety => &["fire", "smoke", "sprinkler", "extinguisher", "aov"],
      Self::Drainage => &["drain", "sewage", "sewer", "blocked", "gully", "manhole"],
      Self::PestControl => &["pest", "rats", "mice", "mouse", "cockroach", "wasp", "pigeon"],
      Self::Cleaner => &["clean", "rubbish", "litter", "bins", "graffiti"],
    }
  }

  /// Human-readable name used in outgoing emails.
  pub fn label(self) -> &'static str {
    match self {
      Self::Lift => "Lift engineer",
      Self::Plumber => "Plumber",
      Self::Electrician => "Electrician",
      Self::GasEngineer => "Gas engineer",
      Self::Roofer => "Roofer",
      Self::Locksmith => "Locksmith",
      Self::FireSafety => "Fire safety contractor",
      Self::Drainage => "Drainage contractor",
      Self::PestControl => "Pest control",
      Self::Cleaner => "Cleaner",
    }
  }

  /// The best-scoring trade for `text`, or `None` if no keyword appears.
  pub fn detect(text: &str) -> Option<Self> {
    let lower = text.to_lowercase();
    let mut best: Option<(Self, usize)> = None;
    for trade in Self::ALL {
      let score = trade
        .keywords()
        .iter()
        .filter(|kw| mentions(&lower, kw))
        .count();
      if score > 0 && best.is_none_or(|(_, s)| score > s) {
        best = Some((trade, score));
      }
    }
    best.map(|(t, _)| t)
  }
}

/// `true` if `needle` occurs in `haystack` at the start of a word.
fn mentions(haystack: &str, needle: &str) -> bool {
  haystack.match_indices(needle).any(|(i, _)| {
    haystack[..i]
      .chars()
      .next_back()
      .is_none_or(|c| !c.is_alphanumeric())
  })
}

// ─── Text helpers ────────────────────────────────────────────────────────────

fn re_address() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(
      r"\b(?:(?i:flat|apartment|unit)\s+\d+[A-Za-z]?,?\s+)?\d+[A-Za-z]?,?\s+(?:[A-Za-z'-]+\s+){1,3}(?i:road|rd|street|st|avenue|ave|lane|close|court|drive|gardens|place|square|terrace|way|crescent|grove|mews|row|hill|walk|parade)\b(?:,?\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)?(?:,?\s+[A-Z]{1,2}\d[A-Z\d]?\s*\d[A-Z]{2})?",
    )
    .unwrap()
  })
}

fn re_sentence_break() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| Regex::new(r"[.!?]+(?:\s+|$)|\n+").unwrap())
}

fn re_deadline() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?i)\b(?:return(?:ed)?|submit(?:ted)?|deadline|due|close[sd]?)\b[^\n]*").unwrap()
  })
}

/// The first UK-style street address in `text`. Not validated.
pub fn find_address(text: &str) -> Option<String> {
  re_address()
    .find(text)
    .map(|m| m.as_str().trim().trim_end_matches(',').to_string())
}

fn sentences(text: &str) -> impl Iterator<Item = &str> {
  re_sentence_break()
    .split(text)
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

fn capped(s: &str, max: usize) -> String {
  if s.chars().count() <= max {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
  }
}

const ACCESS_WORDS: &[&str] = &["access", "key", "concierge", "contact", "porter", "fob"];

/// Longest summary kept for a works order.
pub const SUMMARY_MAX: usize = 200;
/// Longest scope kept for a tender.
pub const SCOPE_MAX: usize = 600;

// ─── Works order ─────────────────────────────────────────────────────────────

/// Heuristic extraction of a works order from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksOrderExtract {
  pub trade_hint:       Option<Trade>,
  pub property_address: Option<String>,
  pub access_details:   Option<String>,
  pub summary:          Option<String>,
}

pub fn extract_works_order(text: &str) -> WorksOrderExtract {
  let access_details = sentences(text)
    .find(|s| {
      let lower = s.to_lowercase();
      ACCESS_WORDS.iter().any(|w| mentions(&lower, w))
    })
    .map(String::from);

  WorksOrderExtract {
    trade_hint: Trade::detect(text),
    property_address: find_address(text),
    access_details,
    summary: sentences(text).next().map(|s| capped(s, SUMMARY_MAX)),
  }
}

// ─── Tender ──────────────────────────────────────────────────────────────────

/// Heuristic extraction of a tender invitation from free text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderExtract {
  pub trade_hint:       Option<Trade>,
  pub property_address: Option<String>,
  pub scope:            Option<String>,
  pub return_by:        Option<NaiveDate>,
}

/// Extract a tender, resolving relative deadlines against the current London
/// time.
pub fn extract_tender(text: &str) -> TenderExtract { extract_tender_at(text, london_now()) }

pub fn extract_tender_at(text: &str, reference: NaiveDateTime) -> TenderExtract {
  let scope = sentences(text).take(3).collect::<Vec<_>>().join(". ");
  let return_by = re_deadline()
    .find_iter(text)
    .find_map(|m| when::parse_first(m.as_str(), reference))
    .map(|w| w.start.date());

  TenderExtract {
    trade_hint: Trade::detect(text),
    property_address: find_address(text),
    scope: Some(scope)
      .filter(|s| !s.is_empty())
      .map(|s| capped(&s, SCOPE_MAX)),
    return_by,
  }
}

// ─── Email builders ──────────────────────────────────────────────────────────

fn salutation(contractor: Option<&str>) -> String {
  match contractor.map(str::trim).filter(|c| !c.is_empty()) {
    Some(name) => format!("Dear {name},"),
    None => "Dear Sir/Madam,".to_string(),
  }
}

/// Render the works-order email for `contractor`.
pub fn works_order_email(extract: &WorksOrderExtract, contractor: Option<&str>) -> Draft {
  let trade = extract.trade_hint.map_or("General works", Trade::label);
  let address = extract
    .property_address
    .as_deref()
    .unwrap_or("To be confirmed");

  let subject = match &extract.property_address {
    Some(a) => format!("Works order: {trade} - {a}"),
    None => format!("Works order: {trade}"),
  };

  let body = format!(
    "{}\n\nPlease attend to carry out the following works.\n\nTrade: {trade}\nAddress: \
     {address}\nDetails: {}\nAccess: {}\n\nPlease confirm your attendance date and let us \
     know before starting if the cost is likely to exceed your usual call-out \
     rate.\n\nKind regards",
    salutation(contractor),
    extract.summary.as_deref().unwrap_or("See attached correspondence."),
    extract
      .access_details
      .as_deref()
      .unwrap_or("Please contact the managing agent to arrange access."),
  );

  Draft { subject, body }
}

/// Render the invitation-to-tender email for `contractor`.
pub fn tender_email(extract: &TenderExtract, contractor: Option<&str>) -> Draft {
  let trade = extract.trade_hint.map_or("General works", Trade::label);
  let subject = match &extract.property_address {
    Some(a) => format!("Invitation to tender: {trade} - {a}"),
    None => format!("Invitation to tender: {trade}"),
  };

  let mut body = format!(
    "{}\n\nWe would like to invite you to tender for the following works.\n\nTrade: \
     {trade}\nAddress: {}\nScope: {}",
    salutation(contractor),
    extract
      .property_address
      .as_deref()
      .unwrap_or("To be confirmed"),
    extract.scope.as_deref().unwrap_or("To be confirmed"),
  );
  if let Some(date) = extract.return_by {
    body.push_str(&format!(
      "\n\nPlease return your quotation by {}.",
      date.format("%-d %B %Y")
    ));
  }
  body.push_str(
    "\n\nPlease include a breakdown of costs, your proposed programme and \
     current insurance certificates.\n\nKind regards",
  );

  Draft { subject, body }
}
