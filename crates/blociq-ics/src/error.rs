//! Error types for the blociq-ics writer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("event has an empty summary")]
  EmptySummary,

  #[error("event {summary:?} ends before it starts")]
  EndBeforeStart { summary: String },

  #[error("event {summary:?} mixes an all-day start with a timed end")]
  MixedTimes { summary: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
