//! Core types and pure logic for the BlocIQ inbox triage pipeline.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! classifier, draft composer and text extractors are synchronous functions
//! over strings; persistence is expressed through the [`store::InboxStore`]
//! trait and implemented elsewhere.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod draft;
pub mod email;
pub mod error;
pub mod event;
pub mod reminder;
pub mod store;
pub mod triage;
pub mod when;
pub mod works;

pub use error::{Error, Result};

/// The zone every user-facing date and time is interpreted in.
pub const LONDON: chrono_tz::Tz = chrono_tz::Europe::London;

/// Case-insensitive "does `haystack` contain any of `needles`".
///
/// `haystack` must already be lowercased; needles are lowercase literals.
pub(crate) fn contains_any(haystack: &str, needles: &[&str]) -> bool {
  needles.iter().any(|needle| haystack.contains(needle))
}
