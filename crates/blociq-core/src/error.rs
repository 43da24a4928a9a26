//! Error types for `blociq-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("email not found: {0}")]
  EmailNotFound(Uuid),

  #[error("triage run not found: {0}")]
  RunNotFound(Uuid),

  #[error("unknown triage category: {0:?}")]
  UnknownCategory(String),

  #[error("unknown urgency: {0:?}")]
  UnknownUrgency(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
