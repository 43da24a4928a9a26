//! Resolving the text a prepare endpoint works on.

use blociq_core::{email::Email, store::InboxStore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Where a prepare request takes its text from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  /// A stored email, named by `email_id`.
  Inbox,
  /// The request's own `text` field.
  #[default]
  Text,
}

/// Text resolved from a request, plus the email it came from.
pub(crate) struct Resolved {
  pub text:  String,
  pub email: Option<Email>,
}

pub(crate) async fn resolve<S: InboxStore>(
  store: &S,
  source: Source,
  email_id: Option<Uuid>,
  text: Option<String>,
) -> Result<Resolved, ApiError> {
  match source {
    Source::Inbox => {
      let id = email_id
        .ok_or_else(|| ApiError::BadRequest("email_id is required for source inbox".into()))?;
      let email = store
        .get_email(id)
        .await
        .map_err(ApiError::store)?
        .ok_or_else(|| ApiError::NotFound(format!("email {id} not found")))?;
      Ok(Resolved {
        text:  email.full_text(),
        email: Some(email),
      })
    }
    Source::Text => {
      let text = text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("text is required for source text".into()))?;
      Ok(Resolved { text, email: None })
    }
  }
}
