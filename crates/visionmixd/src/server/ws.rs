//! WebSocket connection handling for the control channel.
//!
//! Each accepted socket gets a client id and an outbound queue in the
//! broadcast hub. A writer task drains that queue into the socket while
//! this task reads inbound messages. Malformed messages are answered
//! with an `error` message and logged; the connection stays open. Only
//! a close frame, a transport error, or the hub dropping the queue ends
//! the session.

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use visionmix_core::ClientId;
use visionmix_protocol::{
    ClientMessage, CommandRequest, ServerMessage, ServerPayload, SystemSnapshot,
};

use crate::hub::Outbound;
use crate::lifecycle;

use super::{build_stats_report, AppState};

/// Upgrades `GET /ws` to the control channel.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client_id = ClientId::generate();
    info!(client_id = %client_id, "WebSocket client connected");

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Outbound>();
    state.hub.register(client_id.clone(), out_tx).await;

    let (mut sink, mut stream) = socket.split();

    // Writer task: drains the hub queue into the socket. Ends on a
    // close instruction, a send failure, or the queue being dropped.
    let writer = tokio::spawn(async move {
        while let Some(out) = out_rx.recv().await {
            let msg = match out {
                Outbound::Text(text) => Message::Text(Utf8Bytes::from(text)),
                Outbound::Ping => Message::Ping(Bytes::new()),
                Outbound::Close => {
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
            };
            if sink.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Welcome goes only to this client; the connected notice fans out
    // to everyone (including this client, absent a subscription filter).
    let snapshot = system_snapshot(&state).await;
    state
        .hub
        .send_to_one(&client_id, &ServerMessage::welcome(client_id.clone(), snapshot))
        .await;
    state.registry.publish(ServerPayload::ClientConnected {
        client_id: client_id.clone(),
    });

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text(&state, &client_id, text.as_str()).await;
            }
            Ok(Message::Pong(_)) => {
                // Liveness acknowledgement for the hub's protocol ping.
                state.hub.mark_alive(&client_id).await;
            }
            Ok(Message::Close(_)) => {
                debug!(client_id = %client_id, "Client sent close frame");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(client_id = %client_id, error = %e, "WebSocket read error");
                break;
            }
        }
    }

    state.hub.remove(&client_id).await;
    state.registry.publish(ServerPayload::ClientDisconnected {
        client_id: client_id.clone(),
    });
    writer.abort();

    info!(client_id = %client_id, "WebSocket client disconnected");
}

/// Parses and dispatches one inbound text message.
async fn handle_text(state: &AppState, client_id: &ClientId, text: &str) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            warn!(client_id = %client_id, error = %e, "Malformed channel message");
            state
                .hub
                .send_to_one(client_id, &ServerMessage::error("Invalid message format"))
                .await;
            return;
        }
    };

    match msg {
        ClientMessage::Ping => {
            state.hub.send_to_one(client_id, &ServerMessage::pong()).await;
        }

        ClientMessage::GetStatus => {
            let report = build_stats_report(state).await;
            state
                .hub
                .send_to_one(client_id, &ServerMessage::system_status(report))
                .await;
        }

        ClientMessage::Command { command, params } => {
            let response = dispatch_command(state, &command, params).await;
            state.hub.send_to_one(client_id, &response).await;
        }

        ClientMessage::Subscribe { events } => {
            let active = state.hub.subscribe(client_id, events).await;
            debug!(client_id = %client_id, subscriptions = ?active, "Client subscribed");
            state
                .hub
                .send_to_one(client_id, &ServerMessage::subscription_confirmed(active))
                .await;
        }

        ClientMessage::Unsubscribe { events } => {
            let removed = state.hub.unsubscribe(client_id, events).await;
            debug!(client_id = %client_id, removed = ?removed, "Client unsubscribed");
            state
                .hub
                .send_to_one(client_id, &ServerMessage::unsubscription_confirmed(removed))
                .await;
        }
    }
}

/// Validates and executes a `command` message, producing the correlated
/// `command_response`.
async fn dispatch_command(
    state: &AppState,
    command: &str,
    params: serde_json::Value,
) -> ServerMessage {
    let request = match CommandRequest::parse(command, params) {
        Ok(request) => request,
        Err(e) => {
            debug!(command, error = %e, "Rejected channel command");
            return ServerMessage::command_failure(command, e.to_string());
        }
    };

    let name = request.name();
    match request {
        CommandRequest::StartStream(config) => {
            match lifecycle::start_stream(&state.registry, config).await {
                Ok(stream) => ServerMessage::command_success_with_stream(name, stream.id),
                Err(e) => ServerMessage::command_failure(name, e.to_string()),
            }
        }

        CommandRequest::StopStream { stream_id } => {
            match lifecycle::stop_stream(&state.registry, stream_id).await {
                Ok(()) => ServerMessage::command_success(name),
                Err(e) => ServerMessage::command_failure(name, e.to_string()),
            }
        }

        CommandRequest::StartRecording(config) => {
            match lifecycle::start_recording(&state.registry, config).await {
                Ok(recording) => {
                    ServerMessage::command_success_with_recording(name, recording.id)
                }
                Err(e) => ServerMessage::command_failure(name, e.to_string()),
            }
        }

        CommandRequest::StopRecording { record_id } => {
            match lifecycle::stop_recording(&state.registry, record_id).await {
                Ok(_) => ServerMessage::command_success(name),
                Err(e) => ServerMessage::command_failure(name, e.to_string()),
            }
        }

        CommandRequest::Transition(request) => {
            match lifecycle::perform_transition(&state.registry, request).await {
                Ok(_) => ServerMessage::command_success(name),
                Err(e) => ServerMessage::command_failure(name, e.to_string()),
            }
        }
    }
}

async fn system_snapshot(state: &AppState) -> SystemSnapshot {
    let counts = state.registry.counts().await;
    SystemSnapshot {
        version: env!("CARGO_PKG_VERSION").to_string(),
        streams: counts.streams,
        recordings: counts.recordings,
        scenes: counts.scenes,
        sources: counts.sources,
    }
}
