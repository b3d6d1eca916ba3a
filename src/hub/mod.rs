pub mod events;
pub mod handlers;
pub mod outbox;
pub mod registry;
pub mod router;
pub mod session;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::oneshot;

use crate::state::AppState;
use events::Event;
use session::Session;

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, addr, state))
}

/// Drive one client connection: register the session, run the writer as its
/// own task and the reader in place, joined by a single-fire termination
/// signal, then unregister on the way out.
async fn handle_socket(socket: WebSocket, addr: SocketAddr, state: AppState) {
    let (ws_sink, ws_stream) = socket.split();

    let session = Arc::new(Session::new(addr, state.outbox_capacity, state.overflow));
    tracing::info!(%addr, session = %session.id, "connection opened");

    state.registry.add(Arc::clone(&session));

    let (done_tx, done_rx) = oneshot::channel();
    let writer = tokio::spawn(writer_loop(ws_sink, Arc::clone(&session), done_rx));

    reader_loop(ws_stream, Arc::clone(&session), &state, done_tx).await;

    state.registry.remove(&session.id);
    let _ = writer.await;
    tracing::info!(%addr, session = %session.id, "connection closed");
}

/// Decode one inbound event at a time and dispatch it. A malformed message is
/// logged and absorbed; only end-of-stream (or a transport error) ends the
/// session, firing the termination signal exactly once.
async fn reader_loop(
    mut stream: SplitStream<WebSocket>,
    session: Arc<Session>,
    state: &AppState,
    done: oneshot::Sender<()>,
) {
    loop {
        match stream.next().await {
            Some(Ok(Message::Text(text))) => match serde_json::from_str::<Event>(&text) {
                Ok(event) => {
                    let name = event.event.clone();
                    if let Err(e) = state
                        .router
                        .dispatch(state.clone(), Arc::clone(&session), event)
                        .await
                    {
                        tracing::warn!(session = %session.id, event = %name, "dispatch failed: {e}");
                    }
                }
                Err(e) => {
                    tracing::warn!(session = %session.id, "malformed event: {e}");
                }
            },
            Some(Ok(Message::Close(_))) | None => break,
            Some(Ok(_)) => {} // ping/pong/binary frames carry no events
            Some(Err(e)) => {
                tracing::warn!(session = %session.id, "read error: {e}");
                break;
            }
        }
    }
    // The writer may already be gone if the sink failed first.
    let _ = done.send(());
}

/// Wait on either the next outbound event or the termination signal. Send
/// failures are logged, not fatal; the loop only exits on the signal (or on
/// the reader vanishing, which resolves the receiver as well).
async fn writer_loop(
    mut sink: SplitSink<WebSocket, Message>,
    session: Arc<Session>,
    mut done: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = session.outbox.pop() => {
                match serde_json::to_string(&event) {
                    Ok(text) => {
                        if let Err(e) = sink.send(Message::Text(text.into())).await {
                            tracing::warn!(session = %session.id, event = %event.event, "send failed: {e}");
                        }
                    }
                    Err(e) => {
                        tracing::error!(session = %session.id, event = %event.event, "serialize failed: {e}");
                    }
                }
            }
            _ = &mut done => {
                tracing::debug!(session = %session.id, "writer exiting");
                break;
            }
        }
    }
}
