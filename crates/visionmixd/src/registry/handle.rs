//! Client interface for interacting with the `RegistryActor`.
//!
//! The `RegistryHandle` is a cheap-to-clone wrapper around the actor's
//! command channel and event publisher. Every method sends a command and
//! awaits the oneshot response; channel closure maps to
//! `RegistryError::ChannelClosed` for fallible operations and to a
//! harmless default for the rest.

use tokio::sync::{broadcast, mpsc, oneshot};

use visionmix_core::{
    Device, Recording, RecordingConfig, RecordingId, RecordingSample, Scene, SceneDraft, SceneId,
    ScenePatch, Source, SourceDraft, Stream, StreamConfig, StreamId, StreamStats,
};
use visionmix_protocol::{
    ResourceCounts, ServerMessage, ServerPayload, Transition, TransitionRequest,
};

use super::commands::{DeviceAnnouncement, RegistryCommand, RegistryError};

/// Handle for interacting with the registry actor.
///
/// Clone freely; all clones talk to the same actor task.
#[derive(Clone)]
pub struct RegistryHandle {
    /// Command sender to the actor
    sender: mpsc::Sender<RegistryCommand>,

    /// Event broadcaster shared with the actor
    event_sender: broadcast::Sender<ServerMessage>,
}

impl RegistryHandle {
    /// Creates a new registry handle.
    pub fn new(
        sender: mpsc::Sender<RegistryCommand>,
        event_sender: broadcast::Sender<ServerMessage>,
    ) -> Self {
        Self {
            sender,
            event_sender,
        }
    }

    /// Subscribes to the event stream the actor publishes.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.event_sender.subscribe()
    }

    /// Clones the event publisher so other components (config store,
    /// server) can emit events through the same fan-out.
    pub fn event_sender(&self) -> broadcast::Sender<ServerMessage> {
        self.event_sender.clone()
    }

    /// Publishes an event without going through the actor.
    pub fn publish(&self, payload: ServerPayload) {
        let _ = self.event_sender.send(ServerMessage::new(payload));
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| RegistryError::ChannelClosed)?;
        rx.await.map_err(|_| RegistryError::ChannelClosed)
    }

    /// Fire-and-forget send for internal lifecycle commands.
    async fn submit(&self, cmd: RegistryCommand) {
        let _ = self.sender.send(cmd).await;
    }

    // ---- streams -----------------------------------------------------------

    /// Stores a new stream in `starting` state and returns it.
    pub async fn create_stream(&self, config: StreamConfig) -> Result<Stream, RegistryError> {
        self.request(|tx| RegistryCommand::CreateStream {
            config,
            respond_to: tx,
        })
        .await
    }

    /// Transitions `starting → running`. Returns `true` when the
    /// transition happened (the caller arms the stats simulator then).
    pub async fn mark_stream_running(&self, id: StreamId) -> bool {
        self.request(|tx| RegistryCommand::MarkStreamRunning { id, respond_to: tx })
            .await
            .unwrap_or(false)
    }

    /// Begins the stop sequence. `Ok(true)` means the caller should
    /// schedule the delayed finish and removal.
    pub async fn begin_stop_stream(&self, id: StreamId) -> Result<bool, RegistryError> {
        self.request(|tx| RegistryCommand::BeginStopStream { id, respond_to: tx })
            .await?
    }

    /// Completes the stop sequence (`stopping → stopped`).
    pub async fn finish_stop_stream(&self, id: StreamId) {
        self.submit(RegistryCommand::FinishStopStream { id }).await;
    }

    /// Removes a stopped stream after its grace period.
    pub async fn remove_stream(&self, id: StreamId) {
        self.submit(RegistryCommand::RemoveStream { id }).await;
    }

    /// Applies one simulator tick. Returns `false` when the stream no
    /// longer accepts stats and the simulator should cancel itself.
    pub async fn apply_stream_stats(&self, id: StreamId, stats: StreamStats) -> bool {
        self.request(|tx| RegistryCommand::ApplyStreamStats {
            id,
            stats,
            respond_to: tx,
        })
        .await
        .unwrap_or(false)
    }

    pub async fn list_streams(&self) -> Vec<Stream> {
        self.request(|tx| RegistryCommand::ListStreams { respond_to: tx })
            .await
            .unwrap_or_default()
    }

    // ---- recordings --------------------------------------------------------

    /// Stores a new recording, already in `recording` state.
    pub async fn start_recording(
        &self,
        config: RecordingConfig,
    ) -> Result<Recording, RegistryError> {
        self.request(|tx| RegistryCommand::StartRecording {
            config,
            respond_to: tx,
        })
        .await
    }

    /// Stops a recording, freezing its file info.
    pub async fn stop_recording(&self, id: RecordingId) -> Result<Recording, RegistryError> {
        self.request(|tx| RegistryCommand::StopRecording { id, respond_to: tx })
            .await?
    }

    /// Removes a stopped recording after its retention window.
    pub async fn remove_recording(&self, id: RecordingId) {
        self.submit(RegistryCommand::RemoveRecording { id }).await;
    }

    /// Applies one simulator tick. Returns `false` when the recording no
    /// longer accepts stats.
    pub async fn apply_recording_stats(&self, id: RecordingId, sample: RecordingSample) -> bool {
        self.request(|tx| RegistryCommand::ApplyRecordingStats {
            id,
            sample,
            respond_to: tx,
        })
        .await
        .unwrap_or(false)
    }

    pub async fn list_recordings(&self) -> Vec<Recording> {
        self.request(|tx| RegistryCommand::ListRecordings { respond_to: tx })
            .await
            .unwrap_or_default()
    }

    // ---- scenes & sources --------------------------------------------------

    /// Creates or replaces a scene.
    pub async fn save_scene(&self, draft: SceneDraft) -> Result<Scene, RegistryError> {
        self.request(|tx| RegistryCommand::SaveScene {
            draft,
            respond_to: tx,
        })
        .await
    }

    /// Merges a partial update into an existing scene.
    pub async fn update_scene(
        &self,
        id: SceneId,
        patch: ScenePatch,
    ) -> Result<Scene, RegistryError> {
        self.request(|tx| RegistryCommand::UpdateScene {
            id,
            patch,
            respond_to: tx,
        })
        .await?
    }

    pub async fn delete_scene(&self, id: SceneId) -> Result<(), RegistryError> {
        self.request(|tx| RegistryCommand::DeleteScene { id, respond_to: tx })
            .await?
    }

    pub async fn get_scene(&self, id: SceneId) -> Option<Scene> {
        self.request(|tx| RegistryCommand::GetScene { id, respond_to: tx })
            .await
            .ok()
            .flatten()
    }

    pub async fn list_scenes(&self) -> Vec<Scene> {
        self.request(|tx| RegistryCommand::ListScenes { respond_to: tx })
            .await
            .unwrap_or_default()
    }

    pub async fn add_source(&self, draft: SourceDraft) -> Result<Source, RegistryError> {
        self.request(|tx| RegistryCommand::AddSource {
            draft,
            respond_to: tx,
        })
        .await
    }

    pub async fn list_sources(&self) -> Vec<Source> {
        self.request(|tx| RegistryCommand::ListSources { respond_to: tx })
            .await
            .unwrap_or_default()
    }

    // ---- devices -----------------------------------------------------------

    /// Appends devices (idempotent on id) and returns the full list.
    pub async fn register_devices(
        &self,
        devices: Vec<Device>,
        announcement: DeviceAnnouncement,
    ) -> Result<Vec<Device>, RegistryError> {
        self.request(|tx| RegistryCommand::RegisterDevices {
            devices,
            announcement,
            respond_to: tx,
        })
        .await
    }

    pub async fn list_devices(&self) -> Vec<Device> {
        self.request(|tx| RegistryCommand::ListDevices { respond_to: tx })
            .await
            .unwrap_or_default()
    }

    // ---- transitions -------------------------------------------------------

    /// Validates and starts a transition, broadcasting the started event.
    pub async fn begin_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<Transition, RegistryError> {
        self.request(|tx| RegistryCommand::BeginTransition {
            request,
            respond_to: tx,
        })
        .await?
    }

    /// Broadcasts the completion event for a started transition.
    pub async fn complete_transition(&self, transition: Transition) {
        self.submit(RegistryCommand::CompleteTransition { transition })
            .await;
    }

    // ---- misc --------------------------------------------------------------

    /// Store population counts (`clients` is always 0 here; the hub
    /// fills it in).
    pub async fn counts(&self) -> ResourceCounts {
        self.request(|tx| RegistryCommand::Counts { respond_to: tx })
            .await
            .unwrap_or_default()
    }

    /// Drops all streams and recordings (system restart).
    pub async fn reset(&self) {
        self.submit(RegistryCommand::Reset).await;
    }

    /// Whether the actor is still accepting commands.
    pub fn is_connected(&self) -> bool {
        !self.sender.is_closed()
    }
}
