//! Subject-line triage: a closed set of operational categories chosen by
//! keyword match in a fixed priority order.
//!
//! There is no model behind this. The subject is checked against every
//! category first; the preview is only consulted when the subject alone
//! would fall through to [`Category::General`].

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::contains_any;

// ─── Category ────────────────────────────────────────────────────────────────

/// Operational category of an inbound email. Declaration order is match
/// priority.
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
pub enum Category {
  #[serde(rename = "Leak/Water Ingress")]
  #[strum(serialize = "Leak/Water Ingress")]
  LeakWaterIngress,
  #[serde(rename = "Lift")]
  #[strum(serialize = "Lift")]
  Lift,
  #[serde(rename = "Insurance")]
  #[strum(serialize = "Insurance")]
  Insurance,
  #[serde(rename = "Section 20")]
  #[strum(serialize = "Section 20")]
  Section20,
  #[serde(rename = "General")]
  #[strum(serialize = "General")]
  General,
}

impl Category {
  /// Label stored in the `category` column.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Lowercase keywords that select this category. Empty for `General`.
  pub fn keywords(self) -> &'static [&'static str] {
    match self {
      Self::LeakWaterIngress => &[
        "leak",
        "water ingress",
        "escape of water",
        "flooding",
        "flooded",
        "burst pipe",
        "dripping",
      ],
      Self::Lift => &["lift", "elevator"],
      Self::Insurance => &["insurance", "insurer", "insured", "claim"],
      Self::Section20 => &["section 20", "section20", "s20", "s.20", "major works"],
      Self::General => &[],
    }
  }

  /// Working days allowed before the action is due, at normal urgency.
  pub fn due_in_days(self) -> u64 {
    match self {
      Self::LeakWaterIngress | Self::Lift => 1,
      Self::Insurance => 3,
      Self::Section20 => 14,
      Self::General => 7,
    }
  }

  const PRIORITY: [Category; 4] = [
    Self::LeakWaterIngress,
    Self::Lift,
    Self::Insurance,
    Self::Section20,
  ];
}

// ─── Urgency ─────────────────────────────────────────────────────────────────

/// How quickly the sender expects a response.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
  High,
  Medium,
  #[default]
  Normal,
}

impl Urgency {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Detect urgency from lowercased free text.
  pub fn detect(text_lower: &str) -> Self {
    const HIGH: &[&str] = &[
      "emergency",
      "urgent",
      "flooding",
      "burst",
      "immediately",
      "asap",
      "critical",
      "serious",
    ];
    const MEDIUM: &[&str] = &["soon", "quickly", "prompt"];

    if contains_any(text_lower, HIGH) {
      Self::High
    } else if contains_any(text_lower, MEDIUM) {
      Self::Medium
    } else {
      Self::Normal
    }
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Hardcoded confidence reported for a keyword hit.
pub const MATCH_CONFIDENCE: f32 = 0.7;
/// Hardcoded confidence reported when nothing matched.
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// The outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
  pub category:    Category,
  /// Human-readable explanation, e.g. `subject mentions "leak"`.
  pub reason:      String,
  pub confidence:  f32,
  pub urgency:     Urgency,
  pub due_in_days: u64,
}

impl Classification {
  /// The calendar date the action falls due, counted from `today`.
  pub fn due_date(&self, today: NaiveDate) -> NaiveDate {
    today
      .checked_add_days(Days::new(self.due_in_days))
      .unwrap_or(today)
  }
}

/// Classify an email by its subject, falling back to the preview.
pub fn classify(subject: &str, preview: Option<&str>) -> Classification {
  let subject_lower = subject.to_lowercase();
  let preview_lower = preview.map(str::to_lowercase).unwrap_or_default();

  let hit = first_match(&subject_lower)
    .map(|(c, kw)| (c, format!("subject mentions \"{kw}\"")))
    .or_else(|| {
      first_match(&preview_lower)
        .map(|(c, kw)| (c, format!("preview mentions \"{kw}\"")))
    });

  let urgency = Urgency::detect(&format!("{subject_lower} {preview_lower}"));

  let (category, reason, confidence) = match hit {
    Some((c, reason)) => (c, reason, MATCH_CONFIDENCE),
    None => (
      Category::General,
      "no category keywords matched".to_string(),
      FALLBACK_CONFIDENCE,
    ),
  };

  let due_in_days = match urgency {
    Urgency::High => 1,
    Urgency::Medium => category.due_in_days().min(3),
    Urgency::Normal => category.due_in_days(),
  };

  Classification {
    category,
    reason,
    confidence,
    urgency,
    due_in_days,
  }
}

fn first_match(text_lower: &str) -> Option<(Category, &'static str)> {
  Category::PRIORITY.iter().find_map(|&c| {
    c.keywords()
      .iter()
      .find(|kw| text_lower.contains(*kw))
      .map(|kw| (c, *kw))
  })
}

// ─── Persisted records ───────────────────────────────────────────────────────

/// Batch header for one triage pass (the `ai_triage_runs` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRun {
  pub run_id:      Uuid,
  pub created_at:  DateTime<Utc>,
  pub email_count: u32,
}

/// Per-email triage result (the `ai_triage_actions` table). Never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageAction {
  pub action_id:  Uuid,
  pub run_id:     Uuid,
  pub email_id:   Uuid,
  pub category:   Category,
  pub reason:     String,
  pub urgency:    Urgency,
  pub due_date:   NaiveDate,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::InboxStore::record_triage_run`].
#[derive(Debug, Clone)]
pub struct NewTriageAction {
  pub email_id: Uuid,
  pub category: Category,
  pub reason:   String,
  pub urgency:  Urgency,
  pub due_date: NaiveDate,
}

impl NewTriageAction {
  pub fn new(email_id: Uuid, c: &Classification, today: NaiveDate) -> Self {
    Self {
      email_id,
      category: c.category,
      reason: c.reason.clone(),
      urgency: c.urgency,
      due_date: c.due_date(today),
    }
  }
}

/// A run together with its actions, as returned by
/// [`crate::store::InboxStore::get_triage_run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageRunView {
  pub run:     TriageRun,
  pub actions: Vec<TriageAction>,
}

#[cfg(test)]
mod tests {
  use std::str::FromStr as _;

  use super::*;

  #[test]
  fn leak_in_any_case_is_leak() {
    for subject in ["Leak in bathroom", "LEAK!!", "ceiling leaking again", "Re: lEaK"] {
      assert_eq!(
        classify(subject, None).category,
        Category::LeakWaterIngress,
        "{subject}"
      );
    }
  }

  #[test]
  fn section_20_in_any_case_is_section_20() {
    for subject in ["Section 20 notice", "SECTION 20 consultation", "re: section 20"] {
      assert_eq!(classify(subject, None).category, Category::Section20, "{subject}");
    }
  }

  #[test]
  fn priority_order_is_respected() {
    assert_eq!(
      classify("Lift shaft leak", None).category,
      Category::LeakWaterIngress
    );
    assert_eq!(
      classify("Insurance claim for lift", None).category,
      Category::Lift
    );
    assert_eq!(
      classify("Section 20 insurance renewal", None).category,
      Category::Insurance
    );
  }

  #[test]
  fn preview_only_consulted_when_subject_is_general() {
    let c = classify("Quick question", Some("there is a leak under the sink"));
    assert_eq!(c.category, Category::LeakWaterIngress);
    assert!(c.reason.starts_with("preview"));

    let c = classify("Lift out of order", Some("water leak too"));
    assert_eq!(c.category, Category::Lift);
  }

  #[test]
  fn nothing_matches_defaults_to_general() {
    let c = classify("Parking permit", None);
    assert_eq!(c.category, Category::General);
    assert_eq!(c.confidence, FALLBACK_CONFIDENCE);
    assert_eq!(c.due_in_days, 7);
  }

  #[test]
  fn urgency_shortens_due_date() {
    let c = classify("URGENT: section 20 query", None);
    assert_eq!(c.urgency, Urgency::High);
    assert_eq!(c.due_in_days, 1);

    let c = classify("Section 20 - please reply soon", None);
    assert_eq!(c.urgency, Urgency::Medium);
    assert_eq!(c.due_in_days, 3);
  }

  #[test]
  fn due_date_counts_from_today() {
    let c = classify("Insurance certificate", None);
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    assert_eq!(c.due_date(today), NaiveDate::from_ymd_opt(2025, 3, 13).unwrap());
  }

  #[test]
  fn labels_round_trip_through_strum_and_serde() {
    assert_eq!(Category::LeakWaterIngress.to_string(), "Leak/Water Ingress");
    assert_eq!(Category::from_str("Section 20").unwrap(), Category::Section20);
    assert_eq!(
      serde_json::to_string(&Category::Section20).unwrap(),
      "\"Section 20\""
    );
    assert_eq!(Urgency::from_str("high").unwrap(), Urgency::High);
  }
}
