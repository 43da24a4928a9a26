//! Handlers for triage endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/addin/triage` | Classify and draft one message; nothing is stored |
//! | `POST` | `/triage/run` | Batch over unhandled inbox emails; records a run |
//! | `GET`  | `/triage/runs/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use blociq_core::{
  draft::{Draft, DraftContext, compose_draft},
  email::INBOX,
  store::{EmailQuery, InboxStore},
  triage::{Classification, NewTriageAction, TriageRunView, classify},
};
use blociq_outlook::{MessageRef, OutlookGateway};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError, today};

/// Emails considered by one `/triage/run` unless the caller says otherwise.
pub const RUN_DEFAULT_LIMIT: usize = 50;

// ─── Add-in ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AddinTriageBody {
  pub subject:       String,
  #[serde(default)]
  pub body_preview:  Option<String>,
  #[serde(default)]
  pub from_name:     Option<String>,
  #[serde(default)]
  pub building_name: Option<String>,
  #[serde(default)]
  pub signature:     Option<String>,
  /// Graph id of the open message. With `create_draft` the reply is saved
  /// to Outlook's Drafts folder.
  #[serde(default)]
  pub message_id:    Option<String>,
  #[serde(default)]
  pub create_draft:  bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddinTriageResponse {
  pub classification: Classification,
  pub draft:          Draft,
  pub outlook:        Option<MessageRef>,
  pub warning:        Option<String>,
}

/// `POST /addin/triage`
pub async fn addin_triage<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<AddinTriageBody>,
) -> Result<Json<AddinTriageResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let classification = classify(&body.subject, body.body_preview.as_deref());
  tracing::debug!(
    category = classification.category.as_str(),
    urgency = classification.urgency.as_str(),
    "classified add-in message"
  );
  let draft = compose_draft(
    &classification,
    &DraftContext {
      sender_name:   body.from_name,
      building_name: body.building_name,
      subject:       Some(body.subject),
      signature:     body.signature,
    },
  );

  let (outlook, warning) = match body.message_id.as_deref() {
    Some(message_id) if body.create_draft => {
      match state.outlook.create_reply_draft(message_id, &draft.body).await {
        Ok(created) => (Some(created), None),
        Err(e) => {
          tracing::warn!(error = %e, "could not save reply draft to Outlook");
          (None, Some(e.to_string()))
        }
      }
    }
    _ => (None, None),
  };

  Ok(Json(AddinTriageResponse {
    classification,
    draft,
    outlook,
    warning,
  }))
}

// ─── Batch run ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RunBody {
  #[serde(default)]
  pub limit: Option<usize>,
}

/// A reply drafted for one email of a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailDraft {
  pub email_id: Uuid,
  pub draft:    Draft,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RunResponse {
  #[serde(flatten)]
  pub view:   TriageRunView,
  pub drafts: Vec<EmailDraft>,
}

/// `POST /triage/run`
///
/// Classifies every unhandled email in the inbox folder, newest first, and
/// records the run with one action per email. Emails are not marked handled.
pub async fn run_triage<S, G>(
  State(state): State<ApiState<S, G>>,
  body: Option<Json<RunBody>>,
) -> Result<Json<RunResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let limit = body
    .and_then(|Json(b)| b.limit)
    .unwrap_or(RUN_DEFAULT_LIMIT);
  let query = EmailQuery {
    handled: Some(false),
    folder: Some(INBOX.to_string()),
    limit: Some(limit),
    ..EmailQuery::default()
  };
  let emails = state
    .store
    .list_emails(&query)
    .await
    .map_err(ApiError::store)?;

  let today = today();
  let mut actions = Vec::with_capacity(emails.len());
  let mut drafts = Vec::with_capacity(emails.len());
  for email in emails {
    let classification = classify(email.subject_str(), email.body_preview.as_deref());
    actions.push(NewTriageAction::new(email.email_id, &classification, today));
    drafts.push(EmailDraft {
      email_id: email.email_id,
      draft:    compose_draft(
        &classification,
        &DraftContext {
          sender_name: email.from_name,
          subject: email.subject,
          ..DraftContext::default()
        },
      ),
    });
  }

  let view = state
    .store
    .record_triage_run(actions)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(run_id = %view.run.run_id, emails = view.run.email_count, "recorded triage run");

  Ok(Json(RunResponse { view, drafts }))
}

/// `GET /triage/runs/{id}`
pub async fn get_run<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<TriageRunView>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let view = state
    .store
    .get_triage_run(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("triage run {id} not found")))?;
  Ok(Json(view))
}
