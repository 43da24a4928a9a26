//! `POST /compliance/reminders`: 90/60/30-day calendar reminders ahead of a
//! compliance asset's due date.
//!
//! Each reminder is an all-day Outlook event. Reminders that Graph refuses
//! are returned as one ICS file instead. Every reminder is recorded,
//! with its Outlook event id when one was created.

use axum::{Json, extract::State};
use blociq_core::{
  reminder::{ComplianceReminder, NewComplianceReminder, schedule},
  store::InboxStore,
};
use blociq_ics::IcsEvent;
use blociq_outlook::{GraphEvent, OutlookGateway};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{ApiState, Mode, error::ApiError, today};

fn default_true() -> bool { true }

#[derive(Debug, Deserialize)]
pub struct RemindersBody {
  pub building_name:     String,
  pub asset_name:        String,
  pub due_date:          NaiveDate,
  #[serde(default = "default_true")]
  pub create_in_outlook: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemindersResponse {
  pub mode:      Mode,
  pub reminders: Vec<ComplianceReminder>,
  pub ics:       Option<String>,
  pub warning:   Option<String>,
}

/// `POST /compliance/reminders`
pub async fn create_reminders<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<RemindersBody>,
) -> Result<Json<RemindersResponse>, ApiError>
where
  S: InboxStore,
  G: OutlookGateway,
{
  let building = body.building_name.trim();
  let asset = body.asset_name.trim();
  if building.is_empty() || asset.is_empty() {
    return Err(ApiError::BadRequest(
      "building_name and asset_name are required".into(),
    ));
  }

  let scheduled = schedule(building, asset, body.due_date, today());
  if scheduled.is_empty() {
    return Ok(Json(RemindersResponse {
      mode:      Mode::None,
      reminders: Vec::new(),
      ics:       None,
      warning:   Some("all reminder dates are in the past".into()),
    }));
  }

  let mut reminders = Vec::with_capacity(scheduled.len());
  let mut fallback = Vec::new();
  let mut errors = Vec::new();

  for item in scheduled {
    let mut outlook_event_id = None;
    if body.create_in_outlook {
      let event = GraphEvent::all_day(item.title.clone(), item.reminder_date, item.body.clone())
        .with_categories(vec![
          "Compliance".into(),
          "BlocIQ".into(),
          item.label.clone(),
        ]);
      match state.outlook.create_event(event).await {
        Ok(created) => outlook_event_id = Some(created.id),
        Err(e) => {
          tracing::warn!(label = %item.label, error = %e, "compliance reminder not created in Outlook");
          errors.push(format!("{}: {e}", item.label));
        }
      }
    }
    if outlook_event_id.is_none() {
      fallback.push(
        IcsEvent::all_day(item.title.clone(), item.reminder_date)
          .with_description(Some(item.body.clone())),
      );
    }

    let reminder = state
      .store
      .record_reminder(NewComplianceReminder {
        building_name: building.to_string(),
        asset_name: asset.to_string(),
        due_date: body.due_date,
        reminder_date: item.reminder_date,
        label: item.label,
        outlook_event_id,
      })
      .await
      .map_err(ApiError::store)?;
    reminders.push(reminder);
  }

  if fallback.is_empty() {
    return Ok(Json(RemindersResponse {
      mode: Mode::Outlook,
      reminders,
      ics: None,
      warning: None,
    }));
  }

  let ics = blociq_ics::calendar(&fallback).map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(Json(RemindersResponse {
    mode: Mode::Ics,
    reminders,
    ics: Some(ics),
    warning: (!errors.is_empty()).then(|| errors.join("; ")),
  }))
}
