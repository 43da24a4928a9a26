//! Sources of delegated Graph access tokens.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{GraphError, Result};

/// Tokens expiring within this window are refreshed before use.
pub const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Anything that can hand out a bearer token for Graph.
pub trait TokenSource: Send + Sync {
  fn access_token(&self) -> impl Future<Output = Result<String>> + Send + '_;
}

/// No Outlook account connected. Every call fails with
/// [`GraphError::NotConnected`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfigured;

impl TokenSource for Unconfigured {
  async fn access_token(&self) -> Result<String> { Err(GraphError::NotConnected) }
}

/// A fixed access token, e.g. one passed in by the Outlook add-in.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenSource for StaticToken {
  async fn access_token(&self) -> Result<String> { Ok(self.0.clone()) }
}

// ─── Refreshing ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct CachedToken {
  access_token:  String,
  refresh_token: String,
  expires_at:    DateTime<Utc>,
}

impl CachedToken {
  fn is_stale(&self, now: DateTime<Utc>) -> bool {
    self.expires_at <= now + Duration::minutes(REFRESH_MARGIN_MINUTES)
  }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
  access_token:  String,
  #[serde(default)]
  refresh_token: Option<String>,
  #[serde(default)]
  expires_in:    Option<i64>,
}

/// An access token kept fresh with the OAuth refresh-token grant against the
/// Microsoft identity platform.
#[derive(Debug)]
pub struct RefreshingToken {
  http:          reqwest::Client,
  token_url:     String,
  client_id:     String,
  client_secret: Option<String>,
  scope:         String,
  cached:        Mutex<CachedToken>,
}

impl RefreshingToken {
  /// Token endpoint for `tenant` (`common` for multi-tenant apps).
  pub fn token_url_for(tenant: &str) -> String {
    format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token")
  }

  pub fn new(
    token_url: impl Into<String>,
    client_id: impl Into<String>,
    client_secret: Option<String>,
    refresh_token: impl Into<String>,
  ) -> Self {
    Self {
      http:          reqwest::Client::new(),
      token_url:     token_url.into(),
      client_id:     client_id.into(),
      client_secret,
      scope:         "offline_access Mail.ReadWrite Calendars.ReadWrite".into(),
      cached:        Mutex::new(CachedToken {
        access_token:  String::new(),
        refresh_token: refresh_token.into(),
        expires_at:    DateTime::<Utc>::MIN_UTC,
      }),
    }
  }

  /// Seed the cache with a known access token.
  pub fn with_access_token(
    mut self,
    access_token: impl Into<String>,
    expires_at: DateTime<Utc>,
  ) -> Self {
    let cached = self.cached.get_mut();
    cached.access_token = access_token.into();
    cached.expires_at = expires_at;
    self
  }

  async fn refresh(&self, cached: &mut CachedToken) -> Result<()> {
    let mut form = vec![
      ("client_id", self.client_id.as_str()),
      ("grant_type", "refresh_token"),
      ("refresh_token", cached.refresh_token.as_str()),
      ("scope", self.scope.as_str()),
    ];
    if let Some(secret) = self.client_secret.as_deref() {
      form.push(("client_secret", secret));
    }

    let resp = self.http.post(&self.token_url).form(&form).send().await?;
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    if !status.is_success() {
      if body.contains("invalid_grant") {
        return Err(GraphError::AuthExpired);
      }
      return Err(GraphError::RefreshFailed(format!("HTTP {}: {body}", status.as_u16())));
    }

    let token: TokenResponse = serde_json::from_str(&body)?;
    cached.access_token = token.access_token;
    if let Some(rt) = token.refresh_token {
      cached.refresh_token = rt;
    }
    cached.expires_at = Utc::now() + Duration::seconds(token.expires_in.unwrap_or(3600));
    tracing::debug!(expires_at = %cached.expires_at, "refreshed Outlook access token");
    Ok(())
  }
}

impl TokenSource for RefreshingToken {
  async fn access_token(&self) -> Result<String> {
    let mut cached = self.cached.lock().await;
    if cached.is_stale(Utc::now()) {
      self.refresh(&mut cached).await?;
    }
    Ok(cached.access_token.clone())
  }
}

// ─── AnyToken ────────────────────────────────────────────────────────────────

/// A runtime choice of token source, selected from configuration.
#[derive(Debug, Default)]
pub enum AnyToken {
  #[default]
  Unconfigured,
  Static(StaticToken),
  Refreshing(RefreshingToken),
}

impl TokenSource for AnyToken {
  async fn access_token(&self) -> Result<String> {
    match self {
      Self::Unconfigured => Unconfigured.access_token().await,
      Self::Static(t) => t.access_token().await,
      Self::Refreshing(t) => t.access_token().await,
    }
  }
}
