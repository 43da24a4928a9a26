//! Error type for `blociq-ai`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("HTTP: {0}")]
  Http(#[from] reqwest::Error),

  #[error("OpenAI API error {status}: {message}")]
  Api { status: u16, message: String },

  #[error("model returned no content")]
  EmptyResponse,

  #[error("model did not return usable JSON: {0}")]
  InvalidJson(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
