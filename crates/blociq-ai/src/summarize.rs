//! Email summarisation prompt.

use blociq_core::email::Email;
use serde::{Deserialize, Serialize};

use crate::{
  client::{ChatClient, ChatMessage},
  error::{Error, Result},
  json::safe_json,
};

const SYSTEM_PROMPT: &str = "You are BlocIQ, an assistant for UK leasehold block \
  management. Summarise the email for a property manager. Reply with JSON only: \
  {\"summary\": string, \"suggested_actions\": [string]}. Use British English and \
  keep the summary under 60 words.";

/// Longest body sent to the model, in characters.
const MAX_BODY_CHARS: usize = 6000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSummary {
  pub summary:           String,
  #[serde(default)]
  pub suggested_actions: Vec<String>,
}

/// Ask the model for a short summary and next steps for `email`.
pub async fn summarize_email(client: &ChatClient, email: &Email) -> Result<EmailSummary> {
  let body: String = email
    .body
    .as_deref()
    .or(email.body_preview.as_deref())
    .unwrap_or("")
    .chars()
    .take(MAX_BODY_CHARS)
    .collect();
  let prompt = format!(
    "From: {} <{}>\nSubject: {}\n\n{body}",
    email.from_name.as_deref().unwrap_or(""),
    email.from_email.as_deref().unwrap_or(""),
    email.subject_str(),
  );

  let raw = client
    .complete(&[ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)])
    .await?;
  tracing::debug!(model = client.model(), chars = raw.len(), "summary received");

  let value = safe_json(&raw)?;
  serde_json::from_value(value).map_err(|e| Error::InvalidJson(e.to_string()))
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, http::StatusCode, routing::post};
  use blociq_core::email::INBOX;
  use chrono::Utc;
  use uuid::Uuid;

  use super::*;

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn email() -> Email {
    Email {
      email_id:       Uuid::nil(),
      outlook_id:     None,
      from_email:     Some("jane@example.com".into()),
      from_name:      Some("Jane".into()),
      subject:        Some("Leak from flat above".into()),
      body_preview:   None,
      body:           Some("Water is dripping through my kitchen ceiling.".into()),
      received_at:    Utc::now(),
      building_id:    None,
      unit_id:        None,
      leaseholder_id: None,
      handled:        false,
      unread:         true,
      tag:            None,
      flag_status:    None,
      folder:         INBOX.into(),
    }
  }

  #[tokio::test]
  async fn fenced_answer_is_parsed() {
    let app = Router::new().route(
      "/chat/completions",
      post(|Json(req): Json<serde_json::Value>| async move {
        assert_eq!(req["messages"][0]["role"], "system");
        assert!(
          req["messages"][1]["content"]
            .as_str()
            .unwrap()
            .contains("Subject: Leak from flat above")
        );
        let content = "```json\n{\"summary\":\"Leak into kitchen\",\"suggested_actions\":[\"Contact flat above\"]}\n```";
        Json(serde_json::json!({
          "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
      }),
    );
    let client = ChatClient::new("sk-test").with_base_url(serve(app).await);

    let s = summarize_email(&client, &email()).await.unwrap();
    assert_eq!(s.summary, "Leak into kitchen");
    assert_eq!(s.suggested_actions, ["Contact flat above"]);
  }

  #[tokio::test]
  async fn api_failure_is_reported() {
    let app = Router::new().route(
      "/chat/completions",
      post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let client = ChatClient::new("sk-test").with_base_url(serve(app).await);
    assert!(matches!(
      summarize_email(&client, &email()).await,
      Err(Error::Api { status: 429, .. })
    ));
  }

  #[tokio::test]
  async fn empty_choices_are_an_error() {
    let app = Router::new().route(
      "/chat/completions",
      post(|| async { Json(serde_json::json!({ "choices": [] })) }),
    );
    let client = ChatClient::new("sk-test").with_base_url(serve(app).await);
    assert!(matches!(
      summarize_email(&client, &email()).await,
      Err(Error::EmptyResponse)
    ));
  }
}
