//! Microsoft Graph (Outlook) dispatcher for BlocIQ.
//!
//! [`GraphClient`] talks to Graph v1.0 on behalf of the signed-in mailbox
//! using a delegated bearer token from a [`TokenSource`]. Higher layers depend
//! on the [`OutlookGateway`] trait so they can fall back to ICS or plain text
//! when Graph is unavailable. Calls are made once; nothing is retried.

mod client;
mod gateway;
mod token;
mod types;

pub mod error;

pub use client::{GRAPH_BASE_URL, GraphClient, MAX_ATTACHMENT_BYTES};
pub use error::{GraphError, Result};
pub use gateway::OutlookGateway;
pub use token::{AnyToken, RefreshingToken, StaticToken, TokenSource, Unconfigured};
pub use types::{
  Attachment, DateTimeZone, EmailAddress, EventRef, GraphEvent, GraphMessage, ItemBody,
  Location, MessageRef, NewDraft, Recipient,
};
