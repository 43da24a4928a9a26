use std::sync::{Arc, Mutex};

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
  routing::post,
};
use blociq_core::{email::NewEmail, store::InboxStore};
use blociq_outlook::{
  Attachment, EventRef, GraphClient, GraphError, GraphEvent, GraphMessage, MessageRef, NewDraft,
  OutlookGateway, StaticToken,
};
use blociq_store_sqlite::SqliteStore;
use chrono::Days;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use super::*;

// ─── Stub mailbox ─────────────────────────────────────────────────────────────

/// Records every call. With `fail` set, every call is rejected as if the
/// token had expired.
#[derive(Default)]
struct StubOutlook {
  fail:  bool,
  calls: Mutex<Vec<String>>,
}

impl StubOutlook {
  fn failing() -> Self {
    Self {
      fail:  true,
      calls: Mutex::default(),
    }
  }

  fn record(&self, call: String) -> blociq_outlook::Result<()> {
    self.calls.lock().unwrap().push(call);
    if self.fail {
      Err(GraphError::AuthExpired)
    } else {
      Ok(())
    }
  }

  fn calls(&self) -> Vec<String> { self.calls.lock().unwrap().clone() }
}

impl OutlookGateway for StubOutlook {
  async fn list_inbox(&self, top: u32) -> blociq_outlook::Result<Vec<GraphMessage>> {
    self.record(format!("list_inbox {top}"))?;
    let messages = serde_json::from_value(json!([
      { "id": "m1", "subject": "Leak in flat 2", "bodyPreview": "water", "isRead": false },
      { "id": "m2", "subject": "Lift broken", "isRead": true }
    ]))?;
    Ok(messages)
  }

  async fn create_reply_draft(
    &self,
    message_id: &str,
    _comment: &str,
  ) -> blociq_outlook::Result<MessageRef> {
    self.record(format!("create_reply_draft {message_id}"))?;
    Ok(MessageRef {
      id:       format!("reply-{message_id}"),
      web_link: None,
    })
  }

  async fn create_draft(&self, draft: NewDraft) -> blociq_outlook::Result<MessageRef> {
    self.record(format!("create_draft {}", draft.to.join(",")))?;
    Ok(MessageRef {
      id:       "draft-1".into(),
      web_link: Some("https://outlook/draft-1".into()),
    })
  }

  async fn add_attachment(
    &self,
    message_id: &str,
    attachment: Attachment,
  ) -> blociq_outlook::Result<()> {
    self.record(format!("add_attachment {message_id} {}", attachment.name))
  }

  async fn move_message(
    &self,
    message_id: &str,
    destination: &str,
  ) -> blociq_outlook::Result<MessageRef> {
    self.record(format!("move_message {message_id} {destination}"))?;
    Ok(MessageRef {
      id:       format!("{message_id}-moved"),
      web_link: None,
    })
  }

  async fn create_event(&self, event: GraphEvent) -> blociq_outlook::Result<EventRef> {
    self.record(format!("create_event {}", event.subject))?;
    Ok(EventRef {
      id:       "evt-1".into(),
      web_link: None,
    })
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

async fn make_state<G>(outlook: G) -> ApiState<SqliteStore, G> {
  let store = SqliteStore::open_in_memory().await.unwrap();
  ApiState::new(Arc::new(store), Arc::new(outlook))
}

async fn call<G>(
  state: ApiState<SqliteStore, G>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value)
where
  G: OutlookGateway + 'static,
{
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(state)
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
  (status, value)
}

async fn seed<G>(state: &ApiState<SqliteStore, G>, email: NewEmail) -> Uuid {
  state.store.insert_email(email).await.unwrap().email_id
}

fn synced(subject: &str, body: &str) -> NewEmail {
  NewEmail {
    outlook_id: Some("AAMk-1".into()),
    from_name: Some("Jane Smith".into()),
    ..NewEmail::new(subject, body)
  }
}

// ─── Inbox ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_fetch_email() {
  let state = make_state(StubOutlook::default()).await;
  let (status, created) = call(
    state.clone(),
    "POST",
    "/inbox/emails",
    Some(json!({ "subject": "Leak", "body": "Water through ceiling" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(created["folder"], "inbox");
  assert_eq!(created["unread"], true);

  let id = created["email_id"].as_str().unwrap();
  let (status, fetched) = call(state, "GET", &format!("/inbox/emails/{id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["subject"], "Leak");
}

#[tokio::test]
async fn unknown_email_is_404_with_error_body() {
  let state = make_state(StubOutlook::default()).await;
  let (status, body) = call(
    state,
    "GET",
    &format!("/inbox/emails/{}", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn list_filters_by_handled() {
  let state = make_state(StubOutlook::default()).await;
  let a = seed(&state, NewEmail::new("a", "")).await;
  seed(&state, NewEmail::new("b", "")).await;

  let (status, _) = call(
    state.clone(),
    "POST",
    &format!("/inbox/emails/{a}/status"),
    Some(json!({ "handled": true })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (_, open) = call(state.clone(), "GET", "/inbox/emails?handled=false", None).await;
  let open = open.as_array().unwrap();
  assert_eq!(open.len(), 1);
  assert_eq!(open[0]["subject"], "b");

  let (_, all) = call(state, "GET", "/inbox/emails", None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn empty_status_patch_is_rejected() {
  let state = make_state(StubOutlook::default()).await;
  let id = seed(&state, NewEmail::new("a", "")).await;
  let (status, _) = call(
    state,
    "POST",
    &format!("/inbox/emails/{id}/status"),
    Some(json!({})),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn archive_moves_synced_email_in_outlook() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store, outlook.clone());
  let id = seed(&state, synced("Lift", "stuck")).await;

  let (status, body) = call(
    state,
    "POST",
    &format!("/inbox/emails/{id}/archive"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"]["folder"], "archive");
  assert_eq!(body["email"]["handled"], true);
  assert_eq!(body["outlook"]["id"], "AAMk-1-moved");
  assert_eq!(outlook.calls(), vec!["move_message AAMk-1 archive"]);
}

#[tokio::test]
async fn move_updates_folder_even_when_outlook_fails() {
  let state = make_state(StubOutlook::failing()).await;
  let id = seed(&state, synced("Lift", "stuck")).await;

  let (status, body) = call(
    state,
    "POST",
    &format!("/inbox/emails/{id}/move"),
    Some(json!({ "folder": "contractors" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["email"]["folder"], "contractors");
  assert!(body["outlook"].is_null());
  assert!(body["warning"].is_string());
}

#[tokio::test]
async fn sync_upserts_by_outlook_id() {
  let state = make_state(StubOutlook::default()).await;

  let (status, first) = call(state.clone(), "POST", "/inbox/sync", Some(json!({ "top": 10 }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(first["fetched"], 2);
  assert_eq!(first["created"], 2);

  let (_, second) = call(state.clone(), "POST", "/inbox/sync", None).await;
  assert_eq!(second["created"], 0);
  assert_eq!(second["updated"], 2);

  let (_, all) = call(state, "GET", "/inbox/emails", None).await;
  assert_eq!(all.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn sync_surfaces_outlook_failure() {
  let state = make_state(StubOutlook::failing()).await;
  let (status, body) = call(state, "POST", "/inbox/sync", None).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert!(body["error"].is_string());
}

// ─── Triage ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn addin_triage_classifies_and_drafts() {
  let state = make_state(StubOutlook::default()).await;
  let (status, body) = call(
    state,
    "POST",
    "/addin/triage",
    Some(json!({ "subject": "Re: LEAK from above", "from_name": "Sam" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["classification"]["category"], "Leak/Water Ingress");
  assert_eq!(body["draft"]["subject"], "Re: LEAK from above");
  assert!(body["draft"]["body"].as_str().unwrap().starts_with("Dear Sam,"));
  assert!(body["outlook"].is_null());
}

#[tokio::test]
async fn addin_triage_can_save_reply_draft() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store, outlook.clone());
  let (_, body) = call(
    state,
    "POST",
    "/addin/triage",
    Some(json!({ "subject": "Section 20", "message_id": "m9", "create_draft": true })),
  )
  .await;
  assert_eq!(body["outlook"]["id"], "reply-m9");
  assert_eq!(outlook.calls(), vec!["create_reply_draft m9"]);
}

#[tokio::test]
async fn triage_run_records_actions_for_unhandled_inbox() {
  let state = make_state(StubOutlook::default()).await;
  seed(&state, NewEmail::new("Burst pipe leak", "urgent")).await;
  seed(&state, NewEmail::new("Section 20 notice", "")).await;
  let done = seed(&state, NewEmail::new("Lift", "")).await;
  state
    .store
    .update_email_status(done, blociq_core::email::EmailStatus::archived())
    .await
    .unwrap();

  let (status, run) = call(state.clone(), "POST", "/triage/run", Some(json!({}))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(run["run"]["email_count"], 2);
  assert_eq!(run["actions"].as_array().unwrap().len(), 2);
  assert_eq!(run["drafts"].as_array().unwrap().len(), 2);

  let categories: Vec<&str> = run["actions"]
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["category"].as_str().unwrap())
    .collect();
  assert!(categories.contains(&"Leak/Water Ingress"));
  assert!(categories.contains(&"Section 20"));

  let run_id = run["run"]["run_id"].as_str().unwrap();
  let (status, fetched) = call(state, "GET", &format!("/triage/runs/{run_id}"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(fetched["actions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_run_is_404() {
  let state = make_state(StubOutlook::default()).await;
  let (status, _) = call(
    state,
    "GET",
    &format!("/triage/runs/{}", Uuid::new_v4()),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Calendar ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn calendar_from_text_creates_outlook_event() {
  let state = make_state(StubOutlook::default()).await;
  let (status, body) = call(
    state,
    "POST",
    "/calendar/prepare",
    Some(json!({ "source": "text", "text": "AGM on 12 March 2025 3pm" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "outlook");
  assert_eq!(body["outlook"]["id"], "evt-1");
  assert_eq!(body["event"]["kind"], "agm");
  assert_eq!(body["event"]["startISO"], "2025-03-12T15:00:00+00:00");
  assert_eq!(body["event"]["endISO"], "2025-03-12T17:00:00+00:00");
  assert!(body["ics"].is_null());
}

#[tokio::test]
async fn calendar_without_date_is_mode_none() {
  let state = make_state(StubOutlook::default()).await;
  let (status, body) = call(
    state,
    "POST",
    "/calendar/prepare",
    Some(json!({ "text": "random text with no date" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "none");
  assert!(body["event"]["startISO"].is_null());
  assert!(body["event"]["endISO"].is_null());
}

#[tokio::test]
async fn calendar_can_skip_outlook() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store, outlook.clone());
  let (_, body) = call(
    state,
    "POST",
    "/calendar/prepare",
    Some(json!({
      "text": "Inspection on 3 June 2025 at 10am",
      "create_in_outlook": false
    })),
  )
  .await;
  assert_eq!(body["mode"], "ics");
  assert!(body["warning"].is_null());
  assert!(body["ics"].as_str().unwrap().contains("DTSTART:20250603T090000Z"));
  assert!(outlook.calls().is_empty());
}

#[tokio::test]
async fn calendar_inbox_source_falls_back_to_ics_on_graph_401() {
  let graph = Router::new().route(
    "/me/events",
    post(|| async { (StatusCode::UNAUTHORIZED, "InvalidAuthenticationToken") }),
  );
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move { axum::serve(listener, graph).await.unwrap() });

  let client = GraphClient::with_base_url(format!("http://{addr}"), StaticToken("tok".into()));
  let state = make_state(client).await;
  let id = seed(
    &state,
    NewEmail::new("AGM notice", "The AGM will be held on 12 March 2025 at 3pm."),
  )
  .await;

  let (status, body) = call(
    state,
    "POST",
    "/calendar/prepare",
    Some(json!({ "source": "inbox", "email_id": id })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "ics");
  assert_eq!(body["source"], "inbox");
  assert_eq!(body["event"]["title"], "AGM notice");
  assert!(body["warning"].is_string());
  let ics = body["ics"].as_str().unwrap();
  assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
  assert!(ics.contains("DTSTART:20250312T150000Z"));
  assert!(ics.contains("SUMMARY:AGM notice"));
}

#[tokio::test]
async fn calendar_rejects_out_of_range_duration() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store, outlook.clone());

  for minutes in [json!(-30), json!(0), json!(10_081), json!(i64::MAX)] {
    let (status, body) = call(
      state.clone(),
      "POST",
      "/calendar/prepare",
      Some(json!({ "text": "Meeting 14 April 2025 2pm", "duration_minutes": minutes })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{minutes}");
    assert!(body["error"].as_str().unwrap().contains("duration_minutes"));
  }
  assert!(outlook.calls().is_empty());
}

#[tokio::test]
async fn calendar_honours_duration_override() {
  let state = make_state(StubOutlook::default()).await;
  let (status, body) = call(
    state,
    "POST",
    "/calendar/prepare",
    Some(json!({
      "text": "Meeting 14 April 2025 2pm",
      "duration_minutes": 45,
      "create_in_outlook": false
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "ics");
  assert_eq!(body["event"]["startISO"], "2025-04-14T14:00:00+01:00");
  assert_eq!(body["event"]["endISO"], "2025-04-14T14:45:00+01:00");
}

#[tokio::test]
async fn calendar_inbox_source_needs_email_id() {
  let state = make_state(StubOutlook::default()).await;
  let (status, _) = call(
    state,
    "POST",
    "/calendar/prepare",
    Some(json!({ "source": "inbox" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Works order / tender ─────────────────────────────────────────────────────

#[tokio::test]
async fn works_order_saves_draft_to_contractor() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store, outlook.clone());
  let (status, body) = call(
    state,
    "POST",
    "/works-order/prepare",
    Some(json!({
      "text": "The lift is stuck on the 3rd floor at 14 Ashwood Road. Keys are with the concierge.",
      "contractor_name": "Apex Lifts",
      "contractor_email": "jobs@apexlifts.co.uk"
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "outlook");
  assert_eq!(body["extract"]["trade_hint"], "lift");
  assert!(body["draft"]["body"].as_str().unwrap().starts_with("Dear Apex Lifts,"));
  assert_eq!(outlook.calls(), vec!["create_draft jobs@apexlifts.co.uk"]);
}

#[tokio::test]
async fn tender_falls_back_to_text() {
  let state = make_state(StubOutlook::failing()).await;
  let (status, body) = call(
    state,
    "POST",
    "/tender/prepare",
    Some(json!({ "text": "Roof repairs needed. Slipped tiles and a leaking gutter." })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "text");
  assert_eq!(body["extract"]["trade_hint"], "roofer");
  assert!(body["draft"]["subject"]
    .as_str()
    .unwrap()
    .starts_with("Invitation to tender:"));
  assert!(body["warning"].is_string());
}

#[tokio::test]
async fn works_order_text_source_needs_text() {
  let state = make_state(StubOutlook::default()).await;
  let (status, _) = call(
    state,
    "POST",
    "/works-order/prepare",
    Some(json!({ "text": "   " })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Reply with document ──────────────────────────────────────────────────────

#[tokio::test]
async fn reply_with_doc_attaches_to_reply_draft() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store, outlook.clone());
  let id = seed(&state, synced("Insurance certificate", "Please send it")).await;

  let (status, body) = call(
    state,
    "POST",
    "/docs/reply-with-doc",
    Some(json!({
      "email_id": id,
      "attachment": { "name": "policy.pdf", "content_type": "application/pdf", "content_base64": "aGVsbG8=" }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "outlook");
  assert_eq!(body["outlook"]["id"], "reply-AAMk-1");
  assert_eq!(
    outlook.calls(),
    vec!["create_reply_draft AAMk-1", "add_attachment reply-AAMk-1 policy.pdf"]
  );
}

#[tokio::test]
async fn reply_with_doc_for_local_email_is_text() {
  let state = make_state(StubOutlook::default()).await;
  let id = seed(&state, NewEmail::new("Insurance", "")).await;
  let (_, body) = call(
    state,
    "POST",
    "/docs/reply-with-doc",
    Some(json!({
      "email_id": id,
      "comment": "Certificate attached.",
      "attachment": { "name": "a.txt", "content_base64": "aGVsbG8=" }
    })),
  )
  .await;
  assert_eq!(body["mode"], "text");
  assert_eq!(body["draft"]["body"], "Certificate attached.");
  assert_eq!(body["draft"]["subject"], "Re: Insurance");
}

#[tokio::test]
async fn reply_with_doc_rejects_bad_base64() {
  let state = make_state(StubOutlook::default()).await;
  let id = seed(&state, synced("Insurance", "")).await;
  let (status, _) = call(
    state,
    "POST",
    "/docs/reply-with-doc",
    Some(json!({
      "email_id": id,
      "attachment": { "name": "a.txt", "content_base64": "not base64!" }
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ─── Compliance ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn compliance_reminders_create_three_events() {
  let outlook = Arc::new(StubOutlook::default());
  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let state = ApiState::new(store.clone(), outlook.clone());
  let due = today().checked_add_days(Days::new(200)).unwrap();

  let (status, body) = call(
    state,
    "POST",
    "/compliance/reminders",
    Some(json!({ "building_name": "Ashwood Court", "asset_name": "Fire alarm", "due_date": due })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "outlook");
  assert_eq!(body["reminders"].as_array().unwrap().len(), 3);
  assert_eq!(outlook.calls().len(), 3);

  let stored = store.list_reminders().await.unwrap();
  assert_eq!(stored.len(), 3);
  assert!(stored.iter().all(|r| r.outlook_event_id.as_deref() == Some("evt-1")));
}

#[tokio::test]
async fn compliance_reminders_fall_back_to_ics() {
  let state = make_state(StubOutlook::failing()).await;
  let due = today().checked_add_days(Days::new(45)).unwrap();

  let (status, body) = call(
    state,
    "POST",
    "/compliance/reminders",
    Some(json!({ "building_name": "Ashwood Court", "asset_name": "Lift LOLER", "due_date": due })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "ics");
  let reminders = body["reminders"].as_array().unwrap();
  assert_eq!(reminders.len(), 1);
  assert_eq!(reminders[0]["label"], "30-Day");
  assert!(body["ics"].as_str().unwrap().contains("DTSTART;VALUE=DATE:"));
  assert!(body["warning"].as_str().unwrap().starts_with("30-Day:"));
}

#[tokio::test]
async fn compliance_reminders_in_the_past_are_dropped() {
  let state = make_state(StubOutlook::default()).await;
  let (status, body) = call(
    state,
    "POST",
    "/compliance/reminders",
    Some(json!({ "building_name": "A", "asset_name": "B", "due_date": today() })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["mode"], "none");
  assert!(body["reminders"].as_array().unwrap().is_empty());
}

// ─── AI ───────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn summarize_without_key_is_503() {
  let state = make_state(StubOutlook::default()).await;
  let id = seed(&state, NewEmail::new("Leak", "water")).await;
  let (status, body) = call(
    state,
    "POST",
    "/ai/summarize",
    Some(json!({ "email_id": id })),
  )
  .await;
  assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
  assert_eq!(body["error"], "AI is not configured");
}
