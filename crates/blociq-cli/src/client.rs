//! Async HTTP client for the BlocIQ JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use blociq_core::{email::Email, triage::TriageAction};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};
use uuid::Uuid;

/// Connection settings for the BlocIQ server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Response of `POST /api/triage/run`, trimmed to what the CLI prints.
#[derive(Debug, Deserialize)]
pub struct TriageRunSummary {
  pub run:     RunHeader,
  pub actions: Vec<TriageAction>,
}

#[derive(Debug, Deserialize)]
pub struct RunHeader {
  pub run_id:      Uuid,
  pub email_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct SyncSummary {
  pub fetched: usize,
  pub created: usize,
  pub updated: usize,
}

#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{path}", self.config.base_url.trim_end_matches('/'))
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  async fn send<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    tracing::debug!("{what}");
    let resp = self
      .auth(req)
      .send()
      .await
      .with_context(|| format!("{what} failed"))?;
    let resp = check(what, resp).await?;
    resp
      .json()
      .await
      .with_context(|| format!("deserialising {what} response"))
  }

  /// `GET /api/inbox/emails`
  pub async fn list_emails(&self, handled: Option<bool>, limit: usize) -> Result<Vec<Email>> {
    let mut query = vec![("limit", limit.to_string())];
    if let Some(h) = handled {
      query.push(("handled", h.to_string()));
    }
    let req = self.client.get(self.url("/inbox/emails")).query(&query);
    self.send("GET /inbox/emails", req).await
  }

  /// `POST /api/inbox/sync`
  pub async fn sync(&self, top: u32) -> Result<SyncSummary> {
    let req = self
      .client
      .post(self.url("/inbox/sync"))
      .json(&serde_json::json!({ "top": top }));
    self.send("POST /inbox/sync", req).await
  }

  /// `POST /api/triage/run`
  pub async fn run_triage(&self, limit: usize) -> Result<TriageRunSummary> {
    let req = self
      .client
      .post(self.url("/triage/run"))
      .json(&serde_json::json!({ "limit": limit }));
    self.send("POST /triage/run", req).await
  }
}

/// Turn a non-2xx response into an error carrying the server's message.
async fn check(what: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  let message = serde_json::from_str::<serde_json::Value>(&body)
    .ok()
    .and_then(|v| v["error"].as_str().map(String::from))
    .unwrap_or(body);
  Err(anyhow!("{what} → {status}: {message}"))
}

#[cfg(test)]
mod tests {
  use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
  };
  use serde_json::json;

  use super::*;

  async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  fn client(base_url: String) -> ApiClient {
    ApiClient::new(ApiConfig {
      base_url,
      username: "agent".into(),
      password: "secret".into(),
    })
    .unwrap()
  }

  #[tokio::test]
  async fn triage_run_posts_limit_with_basic_auth() {
    let app = Router::new().route(
      "/api/triage/run",
      post(|headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
        assert!(headers.get("authorization").is_some());
        assert_eq!(body["limit"], 5);
        Json(json!({
          "run": {
            "run_id": "00000000-0000-0000-0000-000000000001",
            "created_at": "2025-03-10T09:00:00Z",
            "email_count": 0
          },
          "actions": [],
          "drafts": []
        }))
      }),
    );
    let summary = client(serve(app).await).run_triage(5).await.unwrap();
    assert_eq!(summary.run.email_count, 0);
    assert!(summary.actions.is_empty());
  }

  #[tokio::test]
  async fn server_errors_carry_message() {
    let app = Router::new().route(
      "/api/inbox/emails",
      get(|| async {
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "store error: disk full" })),
        )
      }),
    );
    let err = client(serve(app).await)
      .list_emails(Some(false), 10)
      .await
      .unwrap_err();
    assert!(err.to_string().contains("disk full"), "{err}");
  }
}
