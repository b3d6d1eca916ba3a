#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{RawQuery, State};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

use conclave::bbb::checksum::{canonical_query, checksum};
use conclave::bbb::Bbb;
use conclave::hub::handlers;
use conclave::hub::outbox::OverflowPolicy;
use conclave::hub::registry::Registry;
use conclave::state::AppState;

pub const SECRET: &str = "s3cr3t";

/// How the stub's `getMeetingInfo` behaves across successive calls.
#[derive(Clone, Copy)]
pub enum InfoMode {
    /// The meeting exists on every poll.
    Found,
    /// The meeting is gone from the first poll.
    Gone,
    /// The meeting exists until the Nth poll (1-based), which fails.
    GoneOnAttempt(u32),
}

/// In-process BigBlueButton stub. Verifies the checksum of every signed
/// request and serves canned XML.
#[derive(Clone)]
pub struct StubBbb {
    secret: String,
    info_mode: InfoMode,
    garbage_info: bool,
    info_calls: Arc<AtomicU32>,
    create_bodies: Arc<Mutex<Vec<String>>>,
}

impl StubBbb {
    pub fn new(info_mode: InfoMode) -> Self {
        Self {
            secret: SECRET.to_string(),
            info_mode,
            garbage_info: false,
            info_calls: Arc::new(AtomicU32::new(0)),
            create_bodies: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make `getMeetingInfo` return a body that is not XML at all.
    pub fn with_garbage_info(mut self) -> Self {
        self.garbage_info = true;
        self
    }

    pub fn info_calls(&self) -> u32 {
        self.info_calls.load(Ordering::SeqCst)
    }

    pub fn create_bodies(&self) -> Vec<String> {
        self.create_bodies.lock().unwrap().clone()
    }

    /// Checksum-check a request; on success return its parameters with the
    /// checksum removed.
    fn signed_params(&self, action: &str, query: &Option<String>) -> Option<Vec<(String, String)>> {
        let query = query.as_deref()?;
        let mut pairs: Vec<(String, String)> =
            url::form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        let pos = pairs.iter().position(|(key, _)| key == "checksum")?;
        let provided = pairs.remove(pos).1;
        if checksum(action, &canonical_query(&pairs), &self.secret) == provided {
            Some(pairs)
        } else {
            None
        }
    }
}

fn field(params: &[(String, String)], key: &str) -> String {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .unwrap_or_default()
}

fn failed(message_key: &str) -> String {
    format!(
        "<response><returncode>FAILED</returncode>\
         <messageKey>{message_key}</messageKey>\
         <message>stub rejected the request</message></response>"
    )
}

async fn create_handler(
    State(stub): State<StubBbb>,
    RawQuery(query): RawQuery,
    body: String,
) -> String {
    let Some(params) = stub.signed_params("create", &query) else {
        return failed("checksumError");
    };
    if !body.is_empty() {
        stub.create_bodies.lock().unwrap().push(body);
    }
    format!(
        "<response><returncode>SUCCESS</returncode>\
         <meetingID>{}</meetingID>\
         <attendeePW>ap</attendeePW><moderatorPW>mp</moderatorPW>\
         <createTime>1700000000000</createTime>\
         <voiceBridge>70001</voiceBridge></response>",
        field(&params, "meetingID")
    )
}

async fn end_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    if stub.signed_params("end", &query).is_none() {
        return failed("checksumError");
    }
    "<response><returncode>SUCCESS</returncode>\
     <messageKey>sentEndMeetingRequest</messageKey></response>"
        .to_string()
}

async fn info_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    let Some(params) = stub.signed_params("getMeetingInfo", &query) else {
        return failed("checksumError");
    };
    if stub.garbage_info {
        return "<<< definitely not xml".to_string();
    }
    let attempt = stub.info_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let gone = match stub.info_mode {
        InfoMode::Found => false,
        InfoMode::Gone => true,
        InfoMode::GoneOnAttempt(n) => attempt == n,
    };
    if gone {
        failed("notFound")
    } else {
        format!(
            "<response><returncode>SUCCESS</returncode>\
             <meetingID>{}</meetingID><running>true</running>\
             <participantCount>3</participantCount></response>",
            field(&params, "meetingID")
        )
    }
}

async fn meetings_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    if stub.signed_params("getMeetings", &query).is_none() {
        return failed("checksumError");
    }
    "<response><returncode>SUCCESS</returncode><meetings>\
     <meeting><meetingID>weekly</meetingID><running>true</running></meeting>\
     <meeting><meetingID>standup</meetingID></meeting>\
     </meetings></response>"
        .to_string()
}

async fn recordings_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    if stub.signed_params("getRecordings", &query).is_none() {
        return failed("checksumError");
    }
    "<response><returncode>SUCCESS</returncode><recordings>\
     <recording><recordID>rec-1</recordID><meetingID>weekly</meetingID>\
     <name>Weekly Sync</name><published>true</published>\
     <startTime>100</startTime><endTime>200</endTime></recording>\
     </recordings></response>"
        .to_string()
}

async fn running_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    if stub.signed_params("isMeetingRunning", &query).is_none() {
        return failed("checksumError");
    }
    "<response><returncode>SUCCESS</returncode><running>true</running></response>".to_string()
}

async fn publish_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    if stub.signed_params("publishRecordings", &query).is_none() {
        return failed("checksumError");
    }
    "<response><returncode>SUCCESS</returncode><published>true</published></response>".to_string()
}

async fn delete_handler(State(stub): State<StubBbb>, RawQuery(query): RawQuery) -> String {
    if stub.signed_params("deleteRecordings", &query).is_none() {
        return failed("checksumError");
    }
    "<response><returncode>SUCCESS</returncode><deleted>true</deleted></response>".to_string()
}

async fn version_handler() -> String {
    "<response><returncode>SUCCESS</returncode><version>2.0</version></response>".to_string()
}

/// Bind the stub on port 0 and return the API base URL.
pub async fn spawn_stub(stub: StubBbb) -> String {
    let app = Router::new()
        .route("/api/", get(version_handler))
        .route("/api/create", get(create_handler).post(create_handler))
        .route("/api/end", get(end_handler))
        .route("/api/getMeetingInfo", get(info_handler))
        .route("/api/getMeetings", get(meetings_handler))
        .route("/api/getRecordings", get(recordings_handler))
        .route("/api/isMeetingRunning", get(running_handler))
        .route("/api/publishRecordings", get(publish_handler))
        .route("/api/deleteRecordings", get(delete_handler))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}/api/", addr.port())
}

/// A conclave instance wired to a stub gateway. Each instance is isolated --
/// safe for parallel tests.
pub struct TestServer {
    pub state: AppState,
}

impl TestServer {
    pub fn new(bbb_base: &str) -> Self {
        let bbb = Bbb::new(bbb_base, SECRET)
            .expect("stub base URL must parse")
            .with_poll_interval(Duration::from_millis(5));

        let state = AppState {
            bbb: Arc::new(bbb),
            registry: Arc::new(Registry::new()),
            router: Arc::new(handlers::router()),
            outbox_capacity: 64,
            overflow: OverflowPolicy::DropNew,
        };
        Self { state }
    }

    /// Bind on port 0, spawn the server, and return the websocket base URL.
    pub async fn spawn(&self) -> String {
        let app = conclave::routes::router(self.state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
            )
            .await
            .unwrap();
        });
        format!("ws://127.0.0.1:{}", addr.port())
    }
}
