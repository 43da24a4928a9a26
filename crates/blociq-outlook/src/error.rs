//! Error type for `blociq-outlook`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
  /// No Outlook account is connected.
  #[error("Outlook is not connected")]
  NotConnected,

  #[error("Outlook token expired or revoked")]
  AuthExpired,

  #[error("token refresh failed: {0}")]
  RefreshFailed(String),

  #[error("attachment {name:?} is {size} bytes; the limit is {limit}")]
  AttachmentTooLarge {
    name:  String,
    size:  usize,
    limit: usize,
  },

  #[error("Graph API error {status}: {message}")]
  Api { status: u16, message: String },

  #[error("HTTP: {0}")]
  Http(#[from] reqwest::Error),

  #[error("JSON: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = GraphError> = std::result::Result<T, E>;
