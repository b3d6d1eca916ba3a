use std::sync::Arc;

use serde_json::{json, Value};

use crate::bbb::options::CreateOptions;
use crate::state::AppState;

use super::events::Event;
use super::router::{DispatchError, EventRouter, HandlerResult};
use super::session::Session;

/// Build the hub's dispatch table. Handler errors are logged by the session
/// reader and never surface to the client as an event.
pub fn router() -> EventRouter {
    EventRouter::new()
        .on("connect", connect)
        .on("create", create)
        .on("joinURL", join_url)
        .on("end", end)
        .on("running", running)
        .on("meetings", meetings)
        .on("recordings", recordings)
}

fn require<'a>(
    event: &'a Event,
    name: &'static str,
    field: &'static str,
) -> Result<&'a str, DispatchError> {
    event
        .str_field(field)
        .ok_or(DispatchError::MissingField { event: name, field })
}

async fn connect(state: AppState, session: Arc<Session>, _event: Event) -> HandlerResult {
    let version = state.bbb.server_version().await;
    session.send(Event::with(
        "connected",
        json!({ "session": session.id, "version": version }),
    ));
    Ok(())
}

async fn create(state: AppState, _session: Arc<Session>, event: Event) -> HandlerResult {
    let meeting_id = require(&event, "create", "meetingID")?.to_string();
    let options = match serde_json::from_value::<CreateOptions>(Value::Object(event.data.clone()))
    {
        Ok(options) => options,
        Err(e) => {
            tracing::warn!("create: ignoring unusable options: {e}");
            CreateOptions::default()
        }
    };

    let meeting = state.bbb.create(&meeting_id, &options).await?;
    let payload = serde_json::to_value(&meeting).unwrap_or_default();
    state
        .registry
        .broadcast(&Event::with("meeting.created", payload));
    Ok(())
}

async fn join_url(state: AppState, session: Arc<Session>, event: Event) -> HandlerResult {
    let full_name = require(&event, "joinURL", "fullName")?;
    let meeting_id = require(&event, "joinURL", "meetingID")?;
    let password = require(&event, "joinURL", "password")?;

    // Remaining string fields ride along as join options.
    let extra: Vec<(String, String)> = event
        .data
        .iter()
        .filter(|(key, _)| !matches!(key.as_str(), "fullName" | "meetingID" | "password"))
        .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
        .collect();

    let url = state.bbb.join_url(full_name, meeting_id, password, &extra)?;
    session.send(Event::with(
        "joinURL",
        json!({ "meetingID": meeting_id, "url": url }),
    ));
    Ok(())
}

async fn end(state: AppState, _session: Arc<Session>, event: Event) -> HandlerResult {
    let meeting_id = require(&event, "end", "meetingID")?.to_string();
    let password = require(&event, "end", "password")?.to_string();

    let ended = state.bbb.end(&meeting_id, &password).await;
    state.registry.broadcast(&Event::with(
        "meeting.ended",
        json!({ "meetingID": meeting_id, "ended": ended }),
    ));
    Ok(())
}

async fn running(state: AppState, session: Arc<Session>, event: Event) -> HandlerResult {
    let meeting_id = require(&event, "running", "meetingID")?;
    let running = state.bbb.is_meeting_running(meeting_id).await;
    session.send(Event::with(
        "running",
        json!({ "meetingID": meeting_id, "running": running }),
    ));
    Ok(())
}

async fn meetings(state: AppState, session: Arc<Session>, _event: Event) -> HandlerResult {
    let meetings = state.bbb.meetings().await;
    session.send(Event::with("meetings", json!({ "meetings": meetings })));
    Ok(())
}

async fn recordings(state: AppState, session: Arc<Session>, event: Event) -> HandlerResult {
    let meeting_ids: Vec<String> = event
        .data
        .get("meetingIDs")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(|id| id.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();

    let recordings = state.bbb.recordings(&meeting_ids).await;
    session.send(Event::with(
        "recordings",
        json!({ "recordings": recordings }),
    ));
    Ok(())
}
