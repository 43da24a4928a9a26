//! Works-order and tender endpoints.
//!
//! Both extract from free text or a stored email, render an email to the
//! contractor and try to save it to Outlook's Drafts folder. When Graph fails
//! the rendered email is returned as text with a `warning`.

use axum::{Json, extract::State};
use blociq_core::{
  draft::Draft,
  store::InboxStore,
  works::{
    TenderExtract, WorksOrderExtract, extract_tender, extract_works_order, tender_email,
    works_order_email,
  },
};
use blociq_outlook::{MessageRef, NewDraft, OutlookGateway};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ApiState, Mode,
  error::ApiError,
  source::{Source, resolve},
};

fn default_true() -> bool { true }

/// Request body shared by both endpoints.
#[derive(Debug, Deserialize)]
pub struct PrepareBody {
  #[serde(default)]
  pub source:           Source,
  #[serde(default)]
  pub email_id:         Option<Uuid>,
  #[serde(default)]
  pub text:             Option<String>,
  #[serde(default)]
  pub contractor_name:  Option<String>,
  #[serde(default)]
  pub contractor_email: Option<String>,
  #[serde(default = "default_true")]
  pub create_draft:     bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrepareResponse<X> {
  pub mode:    Mode,
  pub extract: X,
  pub draft:   Draft,
  pub outlook: Option<MessageRef>,
  pub warning: Option<String>,
}

/// `POST /works-order/prepare`
pub async fn prepare_works_order<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<PrepareBody>,
) -> Result<Json<PrepareResponse<WorksOrderExtract>>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let resolved = resolve(&*state.store, body.source, body.email_id, body.text).await?;
  let extract = extract_works_order(&resolved.text);
  let draft = works_order_email(&extract, body.contractor_name.as_deref());
  let (mode, outlook, warning) = save_draft(
    &*state.outlook,
    &draft,
    body.contractor_email,
    body.create_draft,
  )
  .await;
  Ok(Json(PrepareResponse {
    mode,
    extract,
    draft,
    outlook,
    warning,
  }))
}

/// `POST /tender/prepare`
pub async fn prepare_tender<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<PrepareBody>,
) -> Result<Json<PrepareResponse<TenderExtract>>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let resolved = resolve(&*state.store, body.source, body.email_id, body.text).await?;
  let extract = extract_tender(&resolved.text);
  let draft = tender_email(&extract, body.contractor_name.as_deref());
  let (mode, outlook, warning) = save_draft(
    &*state.outlook,
    &draft,
    body.contractor_email,
    body.create_draft,
  )
  .await;
  Ok(Json(PrepareResponse {
    mode,
    extract,
    draft,
    outlook,
    warning,
  }))
}

async fn save_draft<G: OutlookGateway>(
  outlook: &G,
  draft: &Draft,
  to: Option<String>,
  create: bool,
) -> (Mode, Option<MessageRef>, Option<String>) {
  if !create {
    return (Mode::Text, None, None);
  }
  let new_draft = NewDraft {
    subject: draft.subject.clone(),
    body:    draft.body.clone(),
    to:      to.into_iter().filter(|a| !a.trim().is_empty()).collect(),
  };
  match outlook.create_draft(new_draft).await {
    Ok(created) => {
      tracing::info!(message_id = %created.id, "saved contractor draft to Outlook");
      (Mode::Outlook, Some(created), None)
    }
    Err(e) => {
      tracing::warn!(error = %e, "Outlook draft creation failed; returning text");
      (Mode::Text, None, Some(e.to_string()))
    }
  }
}
