//! `POST /docs/reply-with-doc`: reply to a synced email with a document
//! attached.

use axum::{Json, extract::State};
use base64::Engine as _;
use blociq_core::{
  draft::{Draft, DraftContext, clean_subject, compose_draft},
  email::Email,
  store::InboxStore,
  triage::classify,
};
use blociq_outlook::{Attachment, MessageRef, OutlookGateway};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, Mode, error::ApiError, inbox::load};

fn default_content_type() -> String { "application/octet-stream".into() }

#[derive(Debug, Deserialize)]
pub struct AttachmentBody {
  pub name:           String,
  #[serde(default = "default_content_type")]
  pub content_type:   String,
  pub content_base64: String,
}

#[derive(Debug, Deserialize)]
pub struct ReplyWithDocBody {
  pub email_id:   Uuid,
  /// Text placed above the quoted original. Defaults to the canned reply
  /// for the email's category.
  #[serde(default)]
  pub comment:    Option<String>,
  pub attachment: AttachmentBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyWithDocResponse {
  pub mode:    Mode,
  pub draft:   Draft,
  /// The reply draft, when one was created. It may lack the attachment if
  /// `warning` is set.
  pub outlook: Option<MessageRef>,
  pub warning: Option<String>,
}

/// `POST /docs/reply-with-doc`
pub async fn reply_with_doc<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<ReplyWithDocBody>,
) -> Result<Json<ReplyWithDocResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let email = load(&*state.store, body.email_id).await?;
  let bytes = base64::engine::general_purpose::STANDARD
    .decode(body.attachment.content_base64.trim())
    .map_err(|e| ApiError::BadRequest(format!("attachment is not valid base64: {e}")))?;
  let attachment = Attachment {
    name: body.attachment.name,
    content_type: body.attachment.content_type,
    bytes,
  };

  let draft = reply_for(&email, body.comment);

  let Some(outlook_id) = email.outlook_id.as_deref() else {
    return Ok(Json(ReplyWithDocResponse {
      mode: Mode::Text,
      draft,
      outlook: None,
      warning: Some("email was not synced from Outlook".into()),
    }));
  };

  let reply = match state.outlook.create_reply_draft(outlook_id, &draft.body).await {
    Ok(reply) => reply,
    Err(e) => {
      tracing::warn!(email_id = %email.email_id, error = %e, "reply draft failed; returning text");
      return Ok(Json(ReplyWithDocResponse {
        mode: Mode::Text,
        draft,
        outlook: None,
        warning: Some(e.to_string()),
      }));
    }
  };

  let (mode, warning) = match state.outlook.add_attachment(&reply.id, attachment).await {
    Ok(()) => (Mode::Outlook, None),
    Err(e) => {
      tracing::warn!(message_id = %reply.id, error = %e, "attachment upload failed");
      (Mode::Text, Some(e.to_string()))
    }
  };

  Ok(Json(ReplyWithDocResponse {
    mode,
    draft,
    outlook: Some(reply),
    warning,
  }))
}

fn reply_for(email: &Email, comment: Option<String>) -> Draft {
  let subject = email.subject_str();
  match comment.filter(|c| !c.trim().is_empty()) {
    Some(body) => Draft {
      subject: format!("Re: {}", clean_subject(subject)),
      body,
    },
    None => compose_draft(
      &classify(subject, email.body_preview.as_deref()),
      &DraftContext {
        sender_name: email.from_name.clone(),
        subject: email.subject.clone(),
        ..DraftContext::default()
      },
    ),
  }
}
