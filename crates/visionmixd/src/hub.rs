//! Broadcast hub - fan-out of server messages to connected clients.
//!
//! The hub owns the client map. Each connected WebSocket registers an
//! outbound channel here; events published by the registry flow through
//! the forwarder task into [`BroadcastHub::broadcast`], which applies
//! per-client subscription filtering and prunes clients whose channel
//! has closed.
//!
//! Liveness uses WebSocket protocol pings (not the JSON `ping` message):
//! a periodic sweep disconnects every client that failed to answer the
//! previous probe, then probes the rest.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use visionmix_core::ClientId;
use visionmix_protocol::ServerMessage;

/// Interval between liveness sweeps.
pub const LIVENESS_INTERVAL: Duration = Duration::from_secs(30);

/// Subscription wildcard matching every event kind.
pub const SUBSCRIBE_ALL: &str = "all";

/// Outbound instructions for a client's writer task.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// A serialized server message, delivered as a text frame.
    Text(String),
    /// WebSocket protocol ping (liveness probe).
    Ping,
    /// Close the connection and end the writer task.
    Close,
}

struct ClientEntry {
    sender: mpsc::UnboundedSender<Outbound>,

    /// Event kinds this client wants. Empty set = everything.
    subscriptions: HashSet<String>,

    /// Cleared by each sweep, set again by the client's protocol pong.
    alive: bool,
}

impl ClientEntry {
    fn wants(&self, kind: &str) -> bool {
        self.subscriptions.is_empty()
            || self.subscriptions.contains(kind)
            || self.subscriptions.contains(SUBSCRIBE_ALL)
    }
}

/// Fan-out of events to connected control clients.
///
/// Clone freely; all clones share the same client map.
#[derive(Clone, Default)]
pub struct BroadcastHub {
    clients: Arc<RwLock<HashMap<ClientId, ClientEntry>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly connected client.
    pub async fn register(&self, client_id: ClientId, sender: mpsc::UnboundedSender<Outbound>) {
        let mut clients = self.clients.write().await;
        clients.insert(
            client_id.clone(),
            ClientEntry {
                sender,
                subscriptions: HashSet::new(),
                alive: true,
            },
        );
        debug!(client_id = %client_id, total = clients.len(), "Client registered");
    }

    /// Removes a client. Returns whether it was still registered.
    pub async fn remove(&self, client_id: &ClientId) -> bool {
        let mut clients = self.clients.write().await;
        let removed = clients.remove(client_id).is_some();
        if removed {
            debug!(client_id = %client_id, total = clients.len(), "Client removed");
        }
        removed
    }

    /// Adds event kinds to a client's subscription set and returns the
    /// full active set, sorted for a stable confirmation payload.
    pub async fn subscribe(&self, client_id: &ClientId, events: Vec<String>) -> Vec<String> {
        let mut clients = self.clients.write().await;
        let Some(entry) = clients.get_mut(client_id) else {
            return Vec::new();
        };

        entry.subscriptions.extend(events);
        let mut all: Vec<String> = entry.subscriptions.iter().cloned().collect();
        all.sort();
        all
    }

    /// Removes event kinds from a client's subscription set and echoes
    /// the removed kinds back.
    pub async fn unsubscribe(&self, client_id: &ClientId, events: Vec<String>) -> Vec<String> {
        let mut clients = self.clients.write().await;
        if let Some(entry) = clients.get_mut(client_id) {
            for event in &events {
                entry.subscriptions.remove(event);
            }
        }
        events
    }

    /// Marks a client alive after a protocol pong.
    pub async fn mark_alive(&self, client_id: &ClientId) {
        let mut clients = self.clients.write().await;
        if let Some(entry) = clients.get_mut(client_id) {
            entry.alive = true;
        }
    }

    /// Number of currently registered clients.
    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Delivers a message to every open client whose subscription set
    /// accepts its kind. Closed channels are silently pruned.
    pub async fn broadcast(&self, msg: &ServerMessage) {
        let text = match serde_json::to_string(msg) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, kind = msg.kind(), "Failed to serialize event");
                return;
            }
        };
        let kind = msg.kind();

        let mut stale = Vec::new();
        {
            let clients = self.clients.read().await;
            for (client_id, entry) in clients.iter() {
                if !entry.wants(kind) {
                    continue;
                }
                if entry.sender.send(Outbound::Text(text.clone())).is_err() {
                    stale.push(client_id.clone());
                }
            }
        }

        if !stale.is_empty() {
            let mut clients = self.clients.write().await;
            for client_id in stale {
                clients.remove(&client_id);
                debug!(client_id = %client_id, "Pruned client with closed channel");
            }
        }
    }

    /// Delivers a message to exactly one client, bypassing subscription
    /// filtering. Sending to a gone client is a no-op.
    pub async fn send_to_one(&self, client_id: &ClientId, msg: &ServerMessage) {
        let text = match serde_json::to_string(msg) {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, kind = msg.kind(), "Failed to serialize message");
                return;
            }
        };

        let clients = self.clients.read().await;
        if let Some(entry) = clients.get(client_id) {
            let _ = entry.sender.send(Outbound::Text(text));
        }
    }

    /// Asks every client's writer task to close the connection and
    /// clears the map. Queued messages are flushed first (FIFO channel).
    pub async fn close_all(&self) {
        let mut clients = self.clients.write().await;
        for (client_id, entry) in clients.drain() {
            let _ = entry.sender.send(Outbound::Close);
            debug!(client_id = %client_id, "Client connection closing");
        }
    }

    /// One liveness pass: disconnect clients that missed the previous
    /// probe, then probe the survivors.
    async fn sweep(&self) {
        let mut clients = self.clients.write().await;
        clients.retain(|client_id, entry| {
            if !entry.alive {
                warn!(client_id = %client_id, "Terminating unresponsive client");
                let _ = entry.sender.send(Outbound::Close);
                return false;
            }

            entry.alive = false;
            entry.sender.send(Outbound::Ping).is_ok()
        });
    }

    #[cfg(test)]
    async fn sweep_once_for_test(&self) {
        self.sweep().await;
    }
}

/// Spawns the task forwarding registry events into the hub.
pub fn spawn_event_forwarder(
    hub: BroadcastHub,
    mut events: broadcast::Receiver<ServerMessage>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Event forwarder shutting down");
                    break;
                }

                result = events.recv() => {
                    match result {
                        Ok(msg) => hub.broadcast(&msg).await,
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!(skipped = n, "Event forwarder lagged, skipped events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Event channel closed");
                            break;
                        }
                    }
                }
            }
        }
    })
}

/// Spawns the periodic liveness sweep.
pub fn spawn_liveness_sweep(
    hub: BroadcastHub,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(LIVENESS_INTERVAL);
        // The immediate first tick would probe clients that just
        // connected; skip it.
        tick.tick().await;

        info!(interval_secs = LIVENESS_INTERVAL.as_secs(), "Liveness sweep started");

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    debug!("Liveness sweep shutting down");
                    break;
                }

                _ = tick.tick() => {
                    hub.sweep().await;
                }
            }
        }
    })
}
