//! Canned reply drafts, one paragraph per triage category.

use serde::{Deserialize, Serialize};

use crate::triage::{Category, Classification, Urgency};

/// Substitutions available to the reply templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftContext {
  pub sender_name:   Option<String>,
  pub building_name: Option<String>,
  /// The subject of the email being answered.
  pub subject:       Option<String>,
  /// Appended after the sign-off when present.
  pub signature:     Option<String>,
}

/// A composed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
  pub subject: String,
  pub body:    String,
}

/// Strip any number of leading `Re:` / `Fwd:` / `Fw:` prefixes.
pub fn clean_subject(subject: &str) -> &str {
  let mut s = subject.trim();
  loop {
    let lower = s.to_ascii_lowercase();
    let stripped = ["re:", "fwd:", "fw:"]
      .iter()
      .find(|p| lower.starts_with(*p))
      .map(|p| s[p.len()..].trim_start());
    match stripped {
      Some(rest) => s = rest,
      None => return s,
    }
  }
}

/// Compose the reply for `classification`.
pub fn compose_draft(classification: &Classification, ctx: &DraftContext) -> Draft {
  let name = ctx
    .sender_name
    .as_deref()
    .map(str::trim)
    .filter(|n| !n.is_empty())
    .unwrap_or("Resident");
  let building = ctx
    .building_name
    .as_deref()
    .map(|b| format!(" at {b}"))
    .unwrap_or_default();
  let topic = ctx
    .subject
    .as_deref()
    .map(clean_subject)
    .filter(|s| !s.is_empty())
    .unwrap_or("your email");

  let paragraph = match classification.category {
    Category::LeakWaterIngress => format!(
      "Thank you for reporting the leak{building}. If water is still coming \
       through, please contact the flat above first and ask them to check \
       their stop tap, appliances and any visible pipework. We have logged \
       the report and will arrange for a contractor to investigate the source. \
       If the leak affects electrics or is spreading, please call the \
       out-of-hours emergency line straight away."
    ),
    Category::Lift => format!(
      "Thank you for letting us know about the lift{building}. We have \
       reported the fault to the lift maintenance contractor and asked for an \
       engineer to attend. If anyone is trapped, please call the emergency \
       number displayed inside the lift car."
    ),
    Category::Insurance => format!(
      "Thank you for your insurance enquiry{building}. We will check the \
       building policy and come back to you with the relevant cover details. \
       If you are making a claim, please send photographs of the damage, an \
       estimate for repairs and the date the damage occurred."
    ),
    Category::Section20 => format!(
      "Thank you for your query about the Section 20 consultation{building}. \
       We will respond to your observations within the consultation period \
       and confirm the current stage of the process, including the estimates \
       received and the timetable for the proposed works."
    ),
    Category::General => format!(
      "Thank you for your email regarding {topic}{building}. We have logged \
       your message and a member of the team will respond shortly."
    ),
  };

  let urgency_line = match classification.urgency {
    Urgency::High => "\n\nWe are treating this as urgent.",
    Urgency::Medium | Urgency::Normal => "",
  };

  let mut body = format!("Dear {name},\n\n{paragraph}{urgency_line}\n\nKind regards");
  if let Some(sig) = ctx.signature.as_deref().filter(|s| !s.is_empty()) {
    body.push('\n');
    body.push_str(sig);
  }

  let subject = match ctx.subject.as_deref().map(clean_subject) {
    Some(s) if !s.is_empty() => format!("Re: {s}"),
    _ => format!("Re: {}", classification.category),
  };

  Draft { subject, body }
}
