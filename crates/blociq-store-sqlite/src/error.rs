//! Error type for `blociq-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] blociq_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A triage action references an email that is not in the store.
  #[error("email not found: {0}")]
  EmailNotFound(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
