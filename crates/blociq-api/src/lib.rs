//! JSON API for the BlocIQ inbox triage pipeline.
//!
//! The router is generic over the store and the Outlook gateway so tests can
//! mount it on an in-memory store and a stub mailbox.
//!
//! | Method | Path                          | Handler                        |
//! |--------|-------------------------------|--------------------------------|
//! | GET    | `/inbox/emails`               | [`inbox::list_emails`]         |
//! | POST   | `/inbox/emails`               | [`inbox::create_email`]        |
//! | GET    | `/inbox/emails/{id}`          | [`inbox::get_email`]           |
//! | POST   | `/inbox/emails/{id}/status`   | [`inbox::update_status`]       |
//! | POST   | `/inbox/emails/{id}/move`     | [`inbox::move_email`]          |
//! | POST   | `/inbox/emails/{id}/archive`  | [`inbox::archive_email`]       |
//! | POST   | `/inbox/sync`                 | [`inbox::sync_inbox`]          |
//! | POST   | `/addin/triage`               | [`triage::addin_triage`]       |
//! | POST   | `/triage/run`                 | [`triage::run_triage`]         |
//! | GET    | `/triage/runs/{id}`           | [`triage::get_run`]            |
//! | POST   | `/calendar/prepare`           | [`calendar::prepare_event`]    |
//! | POST   | `/works-order/prepare`        | [`works::prepare_works_order`] |
//! | POST   | `/tender/prepare`             | [`works::prepare_tender`]      |
//! | POST   | `/docs/reply-with-doc`        | [`docs::reply_with_doc`]       |
//! | POST   | `/compliance/reminders`       | [`compliance::create_reminders`] |
//! | POST   | `/ai/summarize`               | [`ai::summarize`]              |

pub mod ai;
pub mod calendar;
pub mod compliance;
pub mod docs;
pub mod error;
pub mod inbox;
mod source;
pub mod triage;
pub mod works;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use blociq_ai::ChatClient;
use blociq_core::store::InboxStore;
use blociq_outlook::OutlookGateway;
pub use error::ApiError;
use serde::{Deserialize, Serialize};
pub use source::Source;

/// Shared handler state.
pub struct ApiState<S, G> {
  pub store:   Arc<S>,
  pub outlook: Arc<G>,
  /// `None` when no OpenAI key is configured.
  pub ai:      Option<Arc<ChatClient>>,
}

impl<S, G> ApiState<S, G> {
  pub fn new(store: Arc<S>, outlook: Arc<G>) -> Self {
    Self {
      store,
      outlook,
      ai: None,
    }
  }

  pub fn with_ai(mut self, client: ChatClient) -> Self {
    self.ai = Some(Arc::new(client));
    self
  }
}

impl<S, G> Clone for ApiState<S, G> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      outlook: self.outlook.clone(),
      ai:      self.ai.clone(),
    }
  }
}

/// How a prepare endpoint delivered its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
  /// Created in Outlook through Graph.
  Outlook,
  /// Returned as an iCalendar file.
  Ics,
  /// Returned as plain text for the user to send by hand.
  Text,
  /// Nothing to do.
  None,
}

/// Build the API router. Mount it under `/api`.
pub fn api_router<S, G>(state: ApiState<S, G>) -> Router<()>
where
  S: InboxStore + 'static,
  G: OutlookGateway + 'static,
{
  Router::new()
    .route(
      "/inbox/emails",
      get(inbox::list_emails::<S, G>).post(inbox::create_email::<S, G>),
    )
    .route("/inbox/emails/{id}", get(inbox::get_email::<S, G>))
    .route("/inbox/emails/{id}/status", post(inbox::update_status::<S, G>))
    .route("/inbox/emails/{id}/move", post(inbox::move_email::<S, G>))
    .route("/inbox/emails/{id}/archive", post(inbox::archive_email::<S, G>))
    .route("/inbox/sync", post(inbox::sync_inbox::<S, G>))
    .route("/addin/triage", post(triage::addin_triage::<S, G>))
    .route("/triage/run", post(triage::run_triage::<S, G>))
    .route("/triage/runs/{id}", get(triage::get_run::<S, G>))
    .route("/calendar/prepare", post(calendar::prepare_event::<S, G>))
    .route("/works-order/prepare", post(works::prepare_works_order::<S, G>))
    .route("/tender/prepare", post(works::prepare_tender::<S, G>))
    .route("/docs/reply-with-doc", post(docs::reply_with_doc::<S, G>))
    .route("/compliance/reminders", post(compliance::create_reminders::<S, G>))
    .route("/ai/summarize", post(ai::summarize::<S, G>))
    .with_state(state)
}

/// Today's date in Europe/London.
pub(crate) fn today() -> chrono::NaiveDate { blociq_core::event::london_now().date() }

