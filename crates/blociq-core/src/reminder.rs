//! Compliance reminders: three all-day calendar entries ahead of an asset's
//! next due date. Outlook allows one alarm per event, so each lead time is a
//! separate entry.

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lead times in days, with the label each reminder carries.
pub const LEAD_TIMES: [(u64, &str); 3] = [(90, "90-Day"), (60, "60-Day"), (30, "30-Day")];

/// One reminder date computed for a compliance asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReminder {
  pub label:         String,
  pub reminder_date: NaiveDate,
  pub title:         String,
  pub body:          String,
}

/// The reminders for an asset due on `due_date`. Dates not after `today`
/// are dropped; the result may be empty.
pub fn schedule(
  building_name: &str,
  asset_name: &str,
  due_date: NaiveDate,
  today: NaiveDate,
) -> Vec<ScheduledReminder> {
  LEAD_TIMES
    .iter()
    .filter_map(|&(days, label)| {
      let date = due_date.checked_sub_days(Days::new(days))?;
      (date > today).then(|| ScheduledReminder {
        label:         label.to_string(),
        reminder_date: date,
        title:         format!(
          "[Compliance Reminder] {label} - {asset_name} due at {building_name}"
        ),
        body:          format!(
          "Asset: {asset_name}\nBuilding: {building_name}\nDue date: {}\nReminder \
           type: {label} reminder\n\nPlease ensure this compliance requirement is \
           addressed before the due date.",
          due_date.format("%-d %B %Y"),
        ),
      })
    })
    .collect()
}

/// A persisted reminder (the `compliance_reminders` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReminder {
  pub reminder_id:      Uuid,
  pub building_name:    String,
  pub asset_name:       String,
  pub due_date:         NaiveDate,
  pub reminder_date:    NaiveDate,
  pub label:            String,
  /// Set when the event was created in Outlook.
  pub outlook_event_id: Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// Input to [`crate::store::InboxStore::record_reminder`].
#[derive(Debug, Clone)]
pub struct NewComplianceReminder {
  pub building_name:    String,
  pub asset_name:       String,
  pub due_date:         NaiveDate,
  pub reminder_date:    NaiveDate,
  pub label:            String,
  pub outlook_event_id: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, day).unwrap() }

  #[test]
  fn three_reminders_when_far_ahead() {
    let r = schedule("Ashwood Court", "Fire risk assessment", d(2025, 12, 1), d(2025, 1, 1));
    let labels: Vec<_> = r.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["90-Day", "60-Day", "30-Day"]);
    assert_eq!(r[0].reminder_date, d(2025, 9, 2));
    assert_eq!(r[2].reminder_date, d(2025, 11, 1));
    assert_eq!(
      r[0].title,
      "[Compliance Reminder] 90-Day - Fire risk assessment due at Ashwood Court"
    );
  }

  #[test]
  fn past_dates_are_dropped() {
    let r = schedule("B", "EICR", d(2025, 3, 1), d(2025, 1, 15));
    let labels: Vec<_> = r.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["30-Day"]);

    assert!(schedule("B", "EICR", d(2025, 1, 20), d(2025, 1, 15)).is_empty());
  }
}
