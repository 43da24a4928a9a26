//! The `OutlookGateway` trait.
//!
//! The HTTP layer depends on this abstraction, not on [`crate::GraphClient`],
//! so tests can substitute a gateway that fails or records calls.

use std::future::Future;

use crate::{
  error::Result,
  types::{Attachment, EventRef, GraphEvent, GraphMessage, MessageRef, NewDraft},
};

/// Mailbox and calendar operations performed on the user's behalf.
///
/// Every method is a single remote call. Failures are reported, never
/// retried.
pub trait OutlookGateway: Send + Sync {
  /// The newest `top` messages in the inbox.
  fn list_inbox(&self, top: u32) -> impl Future<Output = Result<Vec<GraphMessage>>> + Send + '_;

  /// Create a reply draft to `message_id` with `comment` above the quoted
  /// original.
  fn create_reply_draft<'a>(
    &'a self,
    message_id: &'a str,
    comment: &'a str,
  ) -> impl Future<Output = Result<MessageRef>> + Send + 'a;

  /// Create a new message in the Drafts folder.
  fn create_draft(&self, draft: NewDraft) -> impl Future<Output = Result<MessageRef>> + Send + '_;

  /// Attach a file to an existing draft. Oversized files are rejected before
  /// any request is made.
  fn add_attachment<'a>(
    &'a self,
    message_id: &'a str,
    attachment: Attachment,
  ) -> impl Future<Output = Result<()>> + Send + 'a;

  /// Move a message to `destination`, a folder id or well-known name such as
  /// `archive`.
  fn move_message<'a>(
    &'a self,
    message_id: &'a str,
    destination: &'a str,
  ) -> impl Future<Output = Result<MessageRef>> + Send + 'a;

  fn create_event(&self, event: GraphEvent) -> impl Future<Output = Result<EventRef>> + Send + '_;
}
