//! HTTP server wiring for BlocIQ.
//!
//! Mounts the JSON API under `/api` behind Basic auth, adds an open
//! `/health` probe, and turns [`ServerConfig`] into the concrete Graph and
//! OpenAI clients.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use auth::{AuthConfig, require_auth};
use axum::{Json, Router, middleware, routing::get};
use blociq_ai::ChatClient;
use blociq_api::{ApiState, api_router};
use blociq_core::store::InboxStore;
use blociq_outlook::{AnyToken, GraphClient, OutlookGateway, RefreshingToken, StaticToken};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered
/// with `BLOCIQ_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
  #[serde(default)]
  pub graph:              GraphSettings,
  #[serde(default)]
  pub openai:             OpenAiSettings,
}

/// Microsoft Graph credentials. With none of them set every Outlook call
/// fails and the prepare endpoints fall back to ICS or text.
#[derive(Deserialize, Clone, Default)]
pub struct GraphSettings {
  /// A fixed delegated token. Takes precedence over the refresh settings.
  pub access_token:  Option<String>,
  pub tenant:        Option<String>,
  pub client_id:     Option<String>,
  pub client_secret: Option<String>,
  pub refresh_token: Option<String>,
  /// Overrides the Graph endpoint.
  pub base_url:      Option<String>,
}

impl GraphSettings {
  pub fn token_source(&self) -> AnyToken {
    if let Some(token) = self.access_token.clone().filter(|t| !t.is_empty()) {
      return AnyToken::Static(StaticToken(token));
    }
    if let (Some(client_id), Some(refresh_token)) = (&self.client_id, &self.refresh_token) {
      let tenant = self.tenant.as_deref().unwrap_or("common");
      return AnyToken::Refreshing(RefreshingToken::new(
        RefreshingToken::token_url_for(tenant),
        client_id.clone(),
        self.client_secret.clone(),
        refresh_token.clone(),
      ));
    }
    AnyToken::Unconfigured
  }

  pub fn client(&self) -> GraphClient {
    match &self.base_url {
      Some(base) => GraphClient::with_base_url(base.clone(), self.token_source()),
      None => GraphClient::new(self.token_source()),
    }
  }
}

#[derive(Deserialize, Clone, Default)]
pub struct OpenAiSettings {
  pub api_key:     Option<String>,
  pub model:       Option<String>,
  pub temperature: Option<f32>,
  pub base_url:    Option<String>,
}

impl OpenAiSettings {
  /// `None` without an API key; `/api/ai/*` then answers 503.
  pub fn client(&self) -> Option<ChatClient> {
    let key = self.api_key.as_deref().filter(|k| !k.is_empty())?;
    let mut client = ChatClient::new(key);
    if let Some(model) = &self.model {
      client = client.with_model(model.clone());
    }
    if let Some(t) = self.temperature {
      client = client.with_temperature(t);
    }
    if let Some(base) = &self.base_url {
      client = client.with_base_url(base.clone());
    }
    Some(client)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, G>(api: ApiState<S, G>, auth: Arc<AuthConfig>) -> Router
where
  S: InboxStore + 'static,
  G: OutlookGateway + 'static,
{
  let protected = api_router(api).layer(middleware::from_fn_with_state(auth, require_auth));
  Router::new()
    .route("/health", get(health))
    .nest("/api", protected)
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
