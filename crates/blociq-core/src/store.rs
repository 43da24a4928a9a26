//! The `InboxStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `blociq-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  email::{Email, EmailStatus, NewEmail},
  reminder::{ComplianceReminder, NewComplianceReminder},
  triage::{NewTriageAction, TriageRunView},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`InboxStore::list_emails`]. Results are newest first.
#[derive(Debug, Clone, Default)]
pub struct EmailQuery {
  pub handled: Option<bool>,
  pub unread:  Option<bool>,
  pub folder:  Option<String>,
  pub limit:   Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the inbox store backend.
///
/// Email rows are mutable through status patches (last write wins). Triage
/// runs and their actions are append-only.
///
/// All methods return `Send` futures so the trait can be used behind `axum`.
pub trait InboxStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Emails ────────────────────────────────────────────────────────────

  /// Persist a new email. `email_id` is generated by the store.
  fn insert_email(
    &self,
    input: NewEmail,
  ) -> impl Future<Output = Result<Email, Self::Error>> + Send + '_;

  /// Insert or refresh an email keyed by its `outlook_id`. Status columns of
  /// an existing row are left alone. Returns the row and whether it was new.
  fn upsert_outlook_email(
    &self,
    input: NewEmail,
  ) -> impl Future<Output = Result<(Email, bool), Self::Error>> + Send + '_;

  /// Retrieve an email by id. Returns `None` if not found.
  fn get_email(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Email>, Self::Error>> + Send + '_;

  fn list_emails<'a>(
    &'a self,
    query: &'a EmailQuery,
  ) -> impl Future<Output = Result<Vec<Email>, Self::Error>> + Send + 'a;

  /// Apply a partial status update. Returns `None` if the email does not
  /// exist.
  fn update_email_status(
    &self,
    id: Uuid,
    status: EmailStatus,
  ) -> impl Future<Output = Result<Option<Email>, Self::Error>> + Send + '_;

  // ── Triage runs ───────────────────────────────────────────────────────

  /// Record a triage run and all of its actions in one transaction.
  fn record_triage_run(
    &self,
    actions: Vec<NewTriageAction>,
  ) -> impl Future<Output = Result<TriageRunView, Self::Error>> + Send + '_;

  fn get_triage_run(
    &self,
    run_id: Uuid,
  ) -> impl Future<Output = Result<Option<TriageRunView>, Self::Error>> + Send + '_;

  // ── Compliance reminders ──────────────────────────────────────────────

  fn record_reminder(
    &self,
    input: NewComplianceReminder,
  ) -> impl Future<Output = Result<ComplianceReminder, Self::Error>> + Send + '_;
}
