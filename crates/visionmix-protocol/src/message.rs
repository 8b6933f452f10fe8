//! Wire messages for the control channel.
//!
//! Messages travel as JSON text over a long-lived WebSocket. Type tags
//! are snake_case; payload keys are camelCase. Every server message
//! carries a top-level `timestamp` next to the flattened payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use visionmix_core::{
    ClientId, Device, FileInfo, Recording, RecordingId, RecordingStats, Scene, SceneId, Settings,
    Source, Stream, StreamId, StreamStats,
};

/// Messages sent by clients to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Application-level ping (distinct from the WebSocket protocol ping
    /// used for liveness probing).
    Ping,

    /// Request a full system status snapshot.
    GetStatus,

    /// Invoke a control command.
    ///
    /// `params` stays untyped here; the command name selects the schema
    /// and [`crate::CommandRequest::parse`] validates it before dispatch.
    Command {
        command: String,
        #[serde(default)]
        params: Value,
    },

    /// Add event kinds to the subscription set ("all" is a wildcard).
    Subscribe { events: Vec<String> },

    /// Remove event kinds from the subscription set.
    Unsubscribe { events: Vec<String> },
}

/// A scene transition in flight, carried by both the started and
/// completed events so clients can correlate the pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    #[serde(rename = "type")]
    pub kind: String,
    pub from_scene: SceneId,
    pub to_scene: SceneId,
    /// Transition length in milliseconds.
    pub duration: u64,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Registry population counts, included in status payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCounts {
    pub streams: usize,
    pub recordings: usize,
    pub scenes: usize,
    pub sources: usize,
    pub devices: usize,
    /// Connected control clients; filled in by the broadcast hub, always
    /// zero when the counts come straight from the registry.
    #[serde(default)]
    pub clients: usize,
}

/// Compact state summary sent in the welcome message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSnapshot {
    pub version: String,
    pub streams: usize,
    pub recordings: usize,
    pub scenes: usize,
    pub sources: usize,
}

/// Full system status payload for `get_status` and the stats endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatsReport {
    pub system: HostInfo,
    pub memory: MemoryUsage,
    pub resources: ResourceCounts,
    pub performance: PerformanceInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    pub rss_bytes: u64,
    pub rss_mb: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInfo {
    pub cpu_percent: f32,
    pub timestamp: DateTime<Utc>,
}

/// Messages sent by the daemon to clients: a typed payload plus the
/// emission timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: ServerPayload,
}

impl ServerMessage {
    /// Wraps a payload with the current timestamp.
    pub fn new(payload: ServerPayload) -> Self {
        Self {
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The event-kind name used for subscription filtering; identical to
    /// the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        self.payload.kind()
    }

    /// Creates a welcome message for a freshly connected client.
    pub fn welcome(client_id: ClientId, system: SystemSnapshot) -> Self {
        Self::new(ServerPayload::Welcome { client_id, system })
    }

    /// Creates a pong reply to an application-level ping.
    pub fn pong() -> Self {
        Self::new(ServerPayload::Pong)
    }

    /// Creates a system status reply.
    pub fn system_status(data: SystemStatsReport) -> Self {
        Self::new(ServerPayload::SystemStatus { data })
    }

    /// Creates a generic error reply (malformed inbound message).
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ServerPayload::Error {
            error: message.into(),
        })
    }

    /// Creates a successful command response with no resource id.
    pub fn command_success(command: impl Into<String>) -> Self {
        Self::new(ServerPayload::CommandResponse {
            command: command.into(),
            success: true,
            stream_id: None,
            record_id: None,
            error: None,
        })
    }

    /// Creates a successful command response carrying a stream id.
    pub fn command_success_with_stream(command: impl Into<String>, stream_id: StreamId) -> Self {
        Self::new(ServerPayload::CommandResponse {
            command: command.into(),
            success: true,
            stream_id: Some(stream_id),
            record_id: None,
            error: None,
        })
    }

    /// Creates a successful command response carrying a recording id.
    pub fn command_success_with_recording(
        command: impl Into<String>,
        record_id: RecordingId,
    ) -> Self {
        Self::new(ServerPayload::CommandResponse {
            command: command.into(),
            success: true,
            stream_id: None,
            record_id: Some(record_id),
            error: None,
        })
    }

    /// Creates a failed command response.
    pub fn command_failure(command: impl Into<String>, error: impl Into<String>) -> Self {
        Self::new(ServerPayload::CommandResponse {
            command: command.into(),
            success: false,
            stream_id: None,
            record_id: None,
            error: Some(error.into()),
        })
    }

    /// Creates a subscription confirmation echoing the full active set.
    pub fn subscription_confirmed(events: Vec<String>) -> Self {
        Self::new(ServerPayload::SubscriptionConfirmed { events })
    }

    /// Creates an unsubscription confirmation echoing the removed kinds.
    pub fn unsubscription_confirmed(events: Vec<String>) -> Self {
        Self::new(ServerPayload::UnsubscriptionConfirmed { events })
    }
}

/// Server → client payload variants: direct replies plus one broadcast
/// event per registry mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerPayload {
    // ---- direct replies -------------------------------------------------
    #[serde(rename_all = "camelCase")]
    Welcome {
        client_id: ClientId,
        system: SystemSnapshot,
    },
    Pong,
    SystemStatus {
        data: SystemStatsReport,
    },
    #[serde(rename_all = "camelCase")]
    CommandResponse {
        command: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stream_id: Option<StreamId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        record_id: Option<RecordingId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    SubscriptionConfirmed {
        events: Vec<String>,
    },
    UnsubscriptionConfirmed {
        events: Vec<String>,
    },
    Error {
        error: String,
    },

    // ---- broadcast events -----------------------------------------------
    StreamStarted {
        stream: Stream,
    },
    #[serde(rename_all = "camelCase")]
    StreamStats {
        stream_id: StreamId,
        stats: StreamStats,
    },
    #[serde(rename_all = "camelCase")]
    StreamStopped {
        stream_id: StreamId,
        /// Elapsed seconds between start and stop.
        duration: f64,
    },
    RecordingStarted {
        recording: Recording,
    },
    #[serde(rename_all = "camelCase")]
    RecordingStats {
        record_id: RecordingId,
        stats: RecordingStats,
        file_info: FileInfo,
    },
    #[serde(rename_all = "camelCase")]
    RecordingStopped {
        record_id: RecordingId,
        recording: Recording,
    },
    SceneSaved {
        scene: Scene,
    },
    #[serde(rename_all = "camelCase")]
    SceneUpdated {
        scene_id: SceneId,
        scene: Scene,
    },
    #[serde(rename_all = "camelCase")]
    SceneDeleted {
        scene_id: SceneId,
    },
    SourceAdded {
        source: Source,
    },
    HardwareUpdated {
        devices: Vec<Device>,
    },
    HardwareScanned {
        devices: Vec<Device>,
    },
    ConfigUpdated {
        config: Settings,
    },
    TransitionStarted {
        transition: Transition,
    },
    TransitionCompleted {
        transition: Transition,
    },
    #[serde(rename_all = "camelCase")]
    ClientConnected {
        client_id: ClientId,
    },
    #[serde(rename_all = "camelCase")]
    ClientDisconnected {
        client_id: ClientId,
    },
    SystemRestarting {
        message: String,
    },
    ServerShutdown {
        message: String,
    },
}

impl ServerPayload {
    /// The serialized `type` tag for this payload.
    ///
    /// Kept in lockstep with the serde rename; the round-trip test below
    /// guards the pairing.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Welcome { .. } => "welcome",
            Self::Pong => "pong",
            Self::SystemStatus { .. } => "system_status",
            Self::CommandResponse { .. } => "command_response",
            Self::SubscriptionConfirmed { .. } => "subscription_confirmed",
            Self::UnsubscriptionConfirmed { .. } => "unsubscription_confirmed",
            Self::Error { .. } => "error",
            Self::StreamStarted { .. } => "stream_started",
            Self::StreamStats { .. } => "stream_stats",
            Self::StreamStopped { .. } => "stream_stopped",
            Self::RecordingStarted { .. } => "recording_started",
            Self::RecordingStats { .. } => "recording_stats",
            Self::RecordingStopped { .. } => "recording_stopped",
            Self::SceneSaved { .. } => "scene_saved",
            Self::SceneUpdated { .. } => "scene_updated",
            Self::SceneDeleted { .. } => "scene_deleted",
            Self::SourceAdded { .. } => "source_added",
            Self::HardwareUpdated { .. } => "hardware_updated",
            Self::HardwareScanned { .. } => "hardware_scanned",
            Self::ConfigUpdated { .. } => "config_updated",
            Self::TransitionStarted { .. } => "transition_started",
            Self::TransitionCompleted { .. } => "transition_completed",
            Self::ClientConnected { .. } => "client_connected",
            Self::ClientDisconnected { .. } => "client_disconnected",
            Self::SystemRestarting { .. } => "system_restarting",
            Self::ServerShutdown { .. } => "server_shutdown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visionmix_core::{RecordingConfig, StreamConfig};

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","events":["scene_saved","all"]}"#).unwrap();
        match msg {
            ClientMessage::Subscribe { events } => {
                assert_eq!(events, vec!["scene_saved", "all"]);
            }
            other => panic!("expected Subscribe, got {other:?}"),
        }
    }

    #[test]
    fn test_command_params_default_to_null() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"command","command":"stop_stream"}"#).unwrap();
        match msg {
            ClientMessage::Command { command, params } => {
                assert_eq!(command, "stop_stream");
                assert!(params.is_null());
            }
            other => panic!("expected Command, got {other:?}"),
        }
    }

    #[test]
    fn test_server_message_envelope() {
        let msg = ServerMessage::pong();
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["type"], "pong");
        assert!(value.get("timestamp").is_some());
    }

    #[test]
    fn test_kind_matches_serialized_tag() {
        let samples = vec![
            ServerPayload::Pong,
            ServerPayload::StreamStarted {
                stream: Stream::new(StreamConfig::default()),
            },
            ServerPayload::StreamStopped {
                stream_id: StreamId::new("stream_1"),
                duration: 12.0,
            },
            ServerPayload::RecordingStarted {
                recording: Recording::new(RecordingConfig::default()),
            },
            ServerPayload::SceneDeleted {
                scene_id: SceneId::new("scene_1"),
            },
            ServerPayload::HardwareScanned { devices: vec![] },
            ServerPayload::ClientConnected {
                client_id: ClientId::new("client_1"),
            },
            ServerPayload::ServerShutdown {
                message: "bye".to_string(),
            },
        ];

        for payload in samples {
            let kind = payload.kind();
            let value = serde_json::to_value(ServerMessage::new(payload)).unwrap();
            assert_eq!(value["type"], kind);
        }
    }

    #[test]
    fn test_command_response_omits_absent_fields() {
        let msg = ServerMessage::command_success("stop_stream");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["success"], true);
        assert!(value.get("streamId").is_none());
        assert!(value.get("error").is_none());

        let msg = ServerMessage::command_success_with_stream(
            "start_stream",
            StreamId::new("stream_abc"),
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["streamId"], "stream_abc");
    }

    #[test]
    fn test_welcome_uses_camel_case_keys() {
        let msg = ServerMessage::welcome(
            ClientId::new("client_1"),
            SystemSnapshot {
                version: "0.1.0".to_string(),
                streams: 0,
                recordings: 0,
                scenes: 2,
                sources: 3,
            },
        );
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["clientId"], "client_1");
        assert_eq!(value["system"]["scenes"], 2);
    }

    #[test]
    fn test_transition_correlation_round_trip() {
        let transition = Transition {
            kind: "fade".to_string(),
            from_scene: SceneId::new("scene_default_1"),
            to_scene: SceneId::new("scene_default_2"),
            duration: 500,
            started_at: Utc::now(),
            completed_at: None,
        };

        let value = serde_json::to_value(&transition).unwrap();
        assert_eq!(value["type"], "fade");
        assert_eq!(value["fromScene"], "scene_default_1");
        assert!(value.get("completedAt").is_none());

        let parsed: Transition = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, transition);
    }
}
