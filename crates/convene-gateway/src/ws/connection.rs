//! One observer connection end-to-end: admission, keepalive, closure.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use convene_core::config::{PING_INTERVAL_SECS, SUBSCRIBER_BUFFER};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::AppState;

/// Connection states, linear progression with no backwards transitions.
///
/// There is no reconnecting state: a returning client is admitted as a
/// brand new subscriber. Closed is terminal and is the single trigger for
/// deregistration, reached from peer close, read error, write failure and
/// dispatcher-side removal alike.
enum ConnState {
    Connecting,
    Open,
    Closed,
}

/// Axum handler: upgrades HTTP to WebSocket at GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection event loop, lives for the entire session.
///
/// The connection holds its socket open purely to forward broadcasts and
/// detect closure; inbound frames are keepalive traffic, never domain
/// operations.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let mut conn_state = ConnState::Connecting;

    // Admission: the upgrade handshake has completed, registering the
    // handle opens the connection for dispatch. The registry keeps the
    // only sender clone, so dispatcher-side removal closes our queue.
    let (tx, mut queue) = mpsc::channel::<String>(SUBSCRIBER_BUFFER);
    let id = state.subscribers.register(tx);
    if matches!(conn_state, ConnState::Connecting) {
        conn_state = ConnState::Open;
        info!(subscriber = %id, "observer connected");
    }

    let (mut sink, mut stream) = socket.split();

    let mut ping = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    while matches!(conn_state, ConnState::Open) {
        tokio::select! {
            payload = queue.recv() => {
                match payload {
                    Some(payload) => {
                        if sink.send(Message::Text(payload.into())).await.is_err() {
                            debug!(subscriber = %id, "write failed");
                            conn_state = ConnState::Closed;
                        }
                    }
                    // The dispatcher dropped us after a delivery failure.
                    None => conn_state = ConnState::Closed,
                }
            }

            msg = stream.next() => {
                match msg {
                    // Inbound text is keepalive traffic only.
                    Some(Ok(Message::Text(_))) => {}
                    Some(Ok(Message::Ping(data))) => {
                        if sink.send(Message::Pong(data)).await.is_err() {
                            conn_state = ConnState::Closed;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(subscriber = %id, "peer closed");
                        conn_state = ConnState::Closed;
                    }
                    Some(Err(e)) => {
                        warn!(subscriber = %id, error = %e, "read failed");
                        conn_state = ConnState::Closed;
                    }
                    _ => {}
                }
            }

            _ = ping.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    conn_state = ConnState::Closed;
                }
            }
        }
    }

    state.subscribers.unregister(&id);
    info!(subscriber = %id, "observer disconnected");
}
