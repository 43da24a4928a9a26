//! Subcommands that run locally, without a server.

use anyhow::{Context, Result};
use blociq_core::{
  draft::{DraftContext, compose_draft},
  event::{EventContext, EventExtract, extract_event},
  triage::classify,
  works::{extract_tender, extract_works_order, tender_email, works_order_email},
};
use blociq_ics::{IcsEvent, IcsTime};

/// Classification and the reply it would get.
pub fn classify_report(subject: &str, preview: Option<&str>, sender: Option<String>) -> String {
  let c = classify(subject, preview);
  let draft = compose_draft(
    &c,
    &DraftContext {
      sender_name: sender,
      subject: Some(subject.to_string()),
      ..DraftContext::default()
    },
  );
  format!(
    "Category:   {}\nUrgency:    {}\nDue in:     {} day(s)\nReason:     {}\n\nSubject: \
     {}\n\n{}\n",
    c.category, c.urgency, c.due_in_days, c.reason, draft.subject, draft.body,
  )
}

/// The extracted event as pretty JSON.
pub fn event_json(text: &str, ctx: &EventContext) -> Result<String> {
  serde_json::to_string_pretty(&extract_event(text, ctx)).context("serialising event")
}

/// The extracted event as an iCalendar file. `None` when the text has no
/// date.
pub fn event_ics(text: &str, ctx: &EventContext) -> Result<Option<String>> {
  let EventExtract {
    title,
    start_iso: Some(start),
    end_iso: Some(end),
    location,
    notes,
    ..
  } = extract_event(text, ctx)
  else {
    return Ok(None);
  };
  let event = IcsEvent::new(title, IcsTime::at(&start), IcsTime::at(&end))
    .with_location(location)
    .with_description(notes);
  Ok(Some(blociq_ics::calendar(&[event])?))
}

pub fn works_order_report(text: &str, contractor: Option<&str>) -> Result<String> {
  let extract = extract_works_order(text);
  let draft = works_order_email(&extract, contractor);
  let json = serde_json::to_string_pretty(&extract).context("serialising extract")?;
  Ok(format!("{json}\n\nSubject: {}\n\n{}\n", draft.subject, draft.body))
}

pub fn tender_report(text: &str, contractor: Option<&str>) -> Result<String> {
  let extract = extract_tender(text);
  let draft = tender_email(&extract, contractor);
  let json = serde_json::to_string_pretty(&extract).context("serialising extract")?;
  Ok(format!("{json}\n\nSubject: {}\n\n{}\n", draft.subject, draft.body))
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::*;

  fn reference() -> EventContext {
    EventContext {
      reference: NaiveDate::from_ymd_opt(2025, 3, 10)
        .unwrap()
        .and_hms_opt(9, 0, 0),
      ..EventContext::default()
    }
  }

  #[test]
  fn classify_report_names_category_and_greets_sender() {
    let out = classify_report("Section 20 notice", None, Some("Priya".into()));
    assert!(out.contains("Category:   Section 20"));
    assert!(out.contains("Dear Priya,"));
  }

  #[test]
  fn event_ics_for_dated_text() {
    let ics = event_ics("AGM on 12 March 2025 3pm", &reference())
      .unwrap()
      .unwrap();
    assert!(ics.contains("DTSTART:20250312T150000Z"));
    assert!(ics.contains("DTEND:20250312T170000Z"));
  }

  #[test]
  fn event_ics_is_none_without_date() {
    assert!(event_ics("random text with no date", &reference())
      .unwrap()
      .is_none());
  }

  #[test]
  fn works_order_report_shows_trade() {
    let out = works_order_report("Lift stuck between floors", None).unwrap();
    assert!(out.contains("\"trade_hint\": \"lift\""));
    assert!(out.contains("Dear Sir/Madam,"));
  }
}
