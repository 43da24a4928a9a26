//! `POST /calendar/prepare`: pull an event out of text and put it in the
//! user's calendar.
//!
//! The outcome is reported in `mode`:
//!
//! - `outlook`: the event was created through Graph.
//! - `ics`: an iCalendar file is returned instead, either because Outlook
//!   creation was not requested or because Graph failed (`warning` says why).
//! - `none`: the text contained no date.

use axum::{Json, extract::State};
use blociq_core::{
  event::{EventContext, EventExtract, MAX_DURATION_MINUTES, extract_event},
  store::InboxStore,
};
use blociq_ics::{IcsEvent, IcsTime};
use blociq_outlook::{EventRef, GraphEvent, OutlookGateway};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  ApiState, Mode,
  error::ApiError,
  source::{Source, resolve},
};

fn default_true() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct PrepareEventBody {
  #[serde(default)]
  pub source:            Source,
  #[serde(default)]
  pub email_id:          Option<Uuid>,
  #[serde(default)]
  pub text:              Option<String>,
  #[serde(default)]
  pub address:           Option<String>,
  #[serde(default)]
  pub duration_minutes:  Option<i64>,
  #[serde(default)]
  pub title:             Option<String>,
  /// Try Graph first. When `false` the ICS file is returned directly.
  #[serde(default = "default_true")]
  pub create_in_outlook: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PrepareEventResponse {
  pub mode:    Mode,
  pub source:  Source,
  pub event:   EventExtract,
  pub outlook: Option<EventRef>,
  pub ics:     Option<String>,
  pub warning: Option<String>,
}

/// `POST /calendar/prepare`
pub async fn prepare_event<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<PrepareEventBody>,
) -> Result<Json<PrepareEventResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  if let Some(minutes) = body.duration_minutes
    && !(1..=MAX_DURATION_MINUTES).contains(&minutes)
  {
    return Err(ApiError::BadRequest(format!(
      "duration_minutes must be between 1 and {MAX_DURATION_MINUTES}"
    )));
  }

  let resolved = resolve(&*state.store, body.source, body.email_id, body.text).await?;
  let title = body
    .title
    .or_else(|| resolved.email.as_ref().and_then(|e| e.subject.clone()));
  let event = extract_event(
    &resolved.text,
    &EventContext {
      address: body.address,
      duration_minutes: body.duration_minutes,
      title,
      reference: None,
    },
  );

  let mut response = PrepareEventResponse {
    mode: Mode::None,
    source: body.source,
    event,
    outlook: None,
    ics: None,
    warning: None,
  };
  let (Some(start), Some(end)) = (response.event.start_iso, response.event.end_iso) else {
    return Ok(Json(response));
  };

  if body.create_in_outlook {
    let graph_event = GraphEvent::timed(
      response.event.title.clone(),
      &start,
      &end,
      response.event.location.clone(),
      response.event.notes.clone(),
    );
    match state.outlook.create_event(graph_event).await {
      Ok(created) => {
        response.mode = Mode::Outlook;
        response.outlook = Some(created);
        return Ok(Json(response));
      }
      Err(e) => {
        tracing::warn!(error = %e, "Outlook event creation failed; returning ICS");
        response.warning = Some(e.to_string());
      }
    }
  }

  let ics_event = IcsEvent::new(
    response.event.title.clone(),
    IcsTime::at(&start),
    IcsTime::at(&end),
  )
  .with_location(response.event.location.clone())
  .with_description(response.event.notes.clone());
  let ics = blociq_ics::calendar(&[ics_event]).map_err(|e| ApiError::Internal(e.to_string()))?;

  response.mode = Mode::Ics;
  response.ics = Some(ics);
  Ok(Json(response))
}
