//! `POST /ai/summarize`: OpenAI summary of a stored email. 503 when no API
//! key is configured.

use axum::{Json, extract::State};
use blociq_ai::{EmailSummary, summarize_email};
use blociq_core::store::InboxStore;
use blociq_outlook::OutlookGateway;
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError, inbox::load};

#[derive(Debug, Deserialize)]
pub struct SummarizeBody {
  pub email_id: Uuid,
}

/// `POST /ai/summarize`
pub async fn summarize<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<SummarizeBody>,
) -> Result<Json<EmailSummary>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let client = state.ai.clone().ok_or(ApiError::AiNotConfigured)?;
  let email = load(&*state.store, body.email_id).await?;
  let summary = summarize_email(&client, &email).await?;
  Ok(Json(summary))
}
