//! [`GraphClient`]: the reqwest implementation of [`OutlookGateway`].

use base64::Engine as _;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::{
  error::{GraphError, Result},
  gateway::OutlookGateway,
  token::{AnyToken, TokenSource},
  types::{
    Attachment, DraftPayload, EventRef, GraphEvent, GraphMessage, MessagePage, MessageRef,
    NewDraft,
  },
};

/// Production Graph endpoint.
pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Largest attachment Graph accepts in a single request (3.5 MiB).
pub const MAX_ATTACHMENT_BYTES: usize = 3_670_016;

const INBOX_SELECT: &str = "id,subject,from,receivedDateTime,bodyPreview,body,isRead";

/// A Microsoft Graph client for the signed-in mailbox.
#[derive(Debug)]
pub struct GraphClient<T = AnyToken> {
  http:     reqwest::Client,
  base_url: String,
  tokens:   T,
}

impl<T: TokenSource> GraphClient<T> {
  pub fn new(tokens: T) -> Self { Self::with_base_url(GRAPH_BASE_URL, tokens) }

  /// Point the client at another Graph-compatible endpoint.
  pub fn with_base_url(base_url: impl Into<String>, tokens: T) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
      tokens,
    }
  }

  fn url(&self, path: &str) -> String { format!("{}{path}", self.base_url) }

  fn message_url(&self, message_id: &str, action: &str) -> String {
    self.url(&format!("/me/messages/{}{action}", encode_segment(message_id)))
  }

  /// Authorise and send `req`, mapping failures to [`GraphError`].
  async fn send<R: DeserializeOwned>(&self, req: RequestBuilder) -> Result<R> {
    let token = self.tokens.access_token().await?;
    let resp = req.bearer_auth(token).send().await?;

    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED {
      return Err(GraphError::AuthExpired);
    }
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(GraphError::Api {
        status:  status.as_u16(),
        message: graph_error_message(&body),
      });
    }
    Ok(resp.json().await?)
  }
}

impl<T: TokenSource> OutlookGateway for GraphClient<T> {
  async fn list_inbox(&self, top: u32) -> Result<Vec<GraphMessage>> {
    let req = self
      .http
      .get(self.url("/me/mailFolders/inbox/messages"))
      .query(&[
        ("$top", top.to_string().as_str()),
        ("$select", INBOX_SELECT),
        ("$orderby", "receivedDateTime desc"),
      ]);
    let page: MessagePage = self.send(req).await?;
    Ok(page.value)
  }

  async fn create_reply_draft(&self, message_id: &str, comment: &str) -> Result<MessageRef> {
    let req = self
      .http
      .post(self.message_url(message_id, "/createReply"))
      .json(&serde_json::json!({ "comment": comment }));
    self.send(req).await
  }

  async fn create_draft(&self, draft: NewDraft) -> Result<MessageRef> {
    let req = self
      .http
      .post(self.url("/me/messages"))
      .json(&DraftPayload::from(draft));
    self.send(req).await
  }

  async fn add_attachment(&self, message_id: &str, attachment: Attachment) -> Result<()> {
    if attachment.bytes.len() > MAX_ATTACHMENT_BYTES {
      return Err(GraphError::AttachmentTooLarge {
        name:  attachment.name,
        size:  attachment.bytes.len(),
        limit: MAX_ATTACHMENT_BYTES,
      });
    }

    let req = self
      .http
      .post(self.message_url(message_id, "/attachments"))
      .json(&serde_json::json!({
        "@odata.type": "#microsoft.graph.fileAttachment",
        "name": attachment.name,
        "contentType": attachment.content_type,
        "contentBytes": base64::engine::general_purpose::STANDARD.encode(&attachment.bytes),
      }));
    let _: serde_json::Value = self.send(req).await?;
    Ok(())
  }

  async fn move_message(&self, message_id: &str, destination: &str) -> Result<MessageRef> {
    let req = self
      .http
      .post(self.message_url(message_id, "/move"))
      .json(&serde_json::json!({ "destinationId": destination }));
    self.send(req).await
  }

  async fn create_event(&self, event: GraphEvent) -> Result<EventRef> {
    let req = self
      .http
      .post(self.url("/me/events"))
      .header("client-request-id", Uuid::new_v4().to_string())
      .json(&event);
    let created: EventRef = self.send(req).await?;
    tracing::info!(event_id = %created.id, subject = %event.subject, "created Outlook event");
    Ok(created)
  }
}

/// Percent-encode a message id for use as one path segment. Graph ids are
/// base64 and may contain `/` and `+`.
fn encode_segment(id: &str) -> String {
  let mut out = String::with_capacity(id.len());
  for b in id.bytes() {
    match b {
      b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'=' => {
        out.push(b as char)
      }
      _ => out.push_str(&format!("%{b:02X}")),
    }
  }
  out
}

/// Pull `error.message` out of a Graph error body, or return the body as-is.
fn graph_error_message(body: &str) -> String {
  serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| v["error"]["message"].as_str().map(String::from))
    .unwrap_or_else(|| body.to_string())
}
