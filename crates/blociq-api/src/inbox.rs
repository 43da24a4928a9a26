//! Handlers for `/inbox` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/inbox/emails` | `?handled=&unread=&folder=&limit=` |
//! | `POST` | `/inbox/emails` | Body: a `NewEmail` |
//! | `GET`  | `/inbox/emails/{id}` | 404 if not found |
//! | `POST` | `/inbox/emails/{id}/status` | Partial update; empty body is 400 |
//! | `POST` | `/inbox/emails/{id}/move` | Body: `{"folder":"..."}` |
//! | `POST` | `/inbox/emails/{id}/archive` | Moves to `archive`, marks handled |
//! | `POST` | `/inbox/sync` | Body: `{"top":50}` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use blociq_core::{
  email::{ARCHIVE, Email, EmailStatus, NewEmail},
  store::{EmailQuery, InboxStore},
};
use blociq_outlook::{MessageRef, OutlookGateway};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// Default and maximum page size for `/inbox/sync`.
pub const SYNC_DEFAULT_TOP: u32 = 50;
pub const SYNC_MAX_TOP: u32 = 250;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub handled: Option<bool>,
  pub unread:  Option<bool>,
  pub folder:  Option<String>,
  pub limit:   Option<usize>,
}

/// `GET /inbox/emails`
pub async fn list_emails<S, G>(
  State(state): State<ApiState<S, G>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Email>>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let query = EmailQuery {
    handled: params.handled,
    unread:  params.unread,
    folder:  params.folder,
    limit:   params.limit,
  };
  let emails = state
    .store
    .list_emails(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(emails))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /inbox/emails`
pub async fn create_email<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<NewEmail>,
) -> Result<impl IntoResponse, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let email = state
    .store
    .insert_email(body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(email)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /inbox/emails/{id}`
pub async fn get_email<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Email>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  Ok(Json(load(&*state.store, id).await?))
}

pub(crate) async fn load<S: InboxStore>(store: &S, id: Uuid) -> Result<Email, ApiError> {
  store
    .get_email(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("email {id} not found")))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `POST /inbox/emails/{id}/status`
pub async fn update_status<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<Uuid>,
  Json(patch): Json<EmailStatus>,
) -> Result<Json<Email>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  if patch.is_empty() {
    return Err(ApiError::BadRequest("no status fields given".into()));
  }
  let email = patch_status(&*state.store, id, patch).await?;
  Ok(Json(email))
}

async fn patch_status<S: InboxStore>(
  store: &S,
  id: Uuid,
  patch: EmailStatus,
) -> Result<Email, ApiError> {
  store
    .update_email_status(id, patch)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("email {id} not found")))
}

// ─── Move / archive ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoveBody {
  pub folder: String,
}

/// Result of a move or archive. The local folder is always updated; the
/// Outlook move is attempted only for synced emails.
#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
  pub email:   Email,
  pub outlook: Option<MessageRef>,
  pub warning: Option<String>,
}

/// `POST /inbox/emails/{id}/move`
pub async fn move_email<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MoveBody>,
) -> Result<Json<MoveResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let folder = body.folder.trim();
  if folder.is_empty() {
    return Err(ApiError::BadRequest("folder must not be empty".into()));
  }
  let patch = EmailStatus {
    folder: Some(folder.to_string()),
    ..EmailStatus::default()
  };
  relocate(&state, id, folder, patch).await.map(Json)
}

/// `POST /inbox/emails/{id}/archive`
pub async fn archive_email<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<Uuid>,
) -> Result<Json<MoveResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  relocate(&state, id, ARCHIVE, EmailStatus::archived())
    .await
    .map(Json)
}

async fn relocate<S, G>(
  state: &ApiState<S, G>,
  id: Uuid,
  folder: &str,
  patch: EmailStatus,
) -> Result<MoveResponse, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let email = load(&*state.store, id).await?;

  let (outlook, warning) = match email.outlook_id.as_deref() {
    Some(outlook_id) => match state.outlook.move_message(outlook_id, folder).await {
      Ok(moved) => (Some(moved), None),
      Err(e) => {
        tracing::warn!(email_id = %id, error = %e, "Outlook move failed; updating folder locally");
        (None, Some(e.to_string()))
      }
    },
    None => (None, None),
  };

  let email = patch_status(&*state.store, id, patch).await?;
  Ok(MoveResponse {
    email,
    outlook,
    warning,
  })
}

// ─── Sync ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SyncBody {
  #[serde(default)]
  pub top: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
  pub fetched: usize,
  pub created: usize,
  pub updated: usize,
}

/// `POST /inbox/sync`
///
/// Pulls the newest inbox messages and upserts them by Outlook id. Status
/// columns of emails already stored are left alone.
pub async fn sync_inbox<S, G>(
  State(state): State<ApiState<S, G>>,
  body: Option<Json<SyncBody>>,
) -> Result<Json<SyncResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let top = body
    .and_then(|Json(b)| b.top)
    .unwrap_or(SYNC_DEFAULT_TOP)
    .clamp(1, SYNC_MAX_TOP);

  let messages = state.outlook.list_inbox(top).await?;
  let mut created = 0;
  for message in &messages {
    let (_, is_new) = state
      .store
      .upsert_outlook_email(message.to_new_email())
      .await
      .map_err(ApiError::store)?;
    if is_new {
      created += 1;
    }
  }

  tracing::info!(fetched = messages.len(), created, "synced Outlook inbox");
  Ok(Json(SyncResponse {
    fetched: messages.len(),
    created,
    updated: messages.len() - created,
  }))
}
