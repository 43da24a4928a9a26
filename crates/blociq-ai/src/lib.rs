//! OpenAI Chat Completions client and the prompts BlocIQ sends through it.
//!
//! Models are asked for JSON and rarely return exactly that, so every answer
//! goes through [`safe_json`] before it is deserialised.

mod client;
mod json;
mod summarize;

pub mod error;

pub use client::{ChatClient, ChatMessage, DEFAULT_MODEL, OPENAI_BASE_URL};
pub use error::{Error, Result};
pub use json::safe_json;
pub use summarize::{EmailSummary, summarize_email};
