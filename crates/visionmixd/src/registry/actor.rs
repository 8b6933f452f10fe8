//! Registry actor - owns all switcher state and processes commands.
//!
//! The `RegistryActor` is the single owner of every entity store
//! (devices, scenes, sources, streams, recordings). It receives commands
//! via an mpsc channel, mutates state sequentially, and publishes wire
//! events via a broadcast channel that the hub fans out to clients.
//!
//! Because one task owns all state, every command is atomic with respect
//! to every other; there are no locks and no partial updates.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use visionmix_core::{
    Device, DeviceId, Recording, RecordingConfig, RecordingId, RecordingSample, RecordingStatus,
    Scene, SceneDraft, SceneId, ScenePatch, Source, SourceDraft, SourceId, Stream, StreamConfig,
    StreamId, StreamStats, StreamStatus,
};
use visionmix_protocol::{
    ResourceCounts, ServerMessage, ServerPayload, Transition, TransitionRequest,
};

use super::commands::{DeviceAnnouncement, RegistryCommand, RegistryError};

/// The registry actor - owns all entity stores.
///
/// Runs in a single task and processes commands sequentially; all state
/// mutations happen within this task.
pub struct RegistryActor {
    /// Command receiver
    receiver: mpsc::Receiver<RegistryCommand>,

    devices: HashMap<DeviceId, Device>,
    scenes: HashMap<SceneId, Scene>,
    sources: HashMap<SourceId, Source>,
    streams: HashMap<StreamId, Stream>,
    recordings: HashMap<RecordingId, Recording>,

    /// Event publisher feeding the broadcast hub
    event_publisher: broadcast::Sender<ServerMessage>,
}

impl RegistryActor {
    /// Creates a new registry actor.
    pub fn new(
        receiver: mpsc::Receiver<RegistryCommand>,
        event_publisher: broadcast::Sender<ServerMessage>,
    ) -> Self {
        Self {
            receiver,
            devices: HashMap::new(),
            scenes: HashMap::new(),
            sources: HashMap::new(),
            streams: HashMap::new(),
            recordings: HashMap::new(),
            event_publisher,
        }
    }

    /// Runs the actor event loop.
    ///
    /// Processes commands until the channel closes (all handles dropped).
    pub async fn run(mut self) {
        info!("Registry actor starting");

        while let Some(cmd) = self.receiver.recv().await {
            self.handle_command(cmd);
        }

        info!(
            streams = self.streams.len(),
            recordings = self.recordings.len(),
            "Registry actor stopped"
        );
    }

    /// Dispatches a command to the appropriate handler.
    ///
    /// Responder send failures are ignored: the caller may have dropped
    /// the receiver, which is its prerogative.
    fn handle_command(&mut self, cmd: RegistryCommand) {
        match cmd {
            RegistryCommand::CreateStream { config, respond_to } => {
                let _ = respond_to.send(self.handle_create_stream(config));
            }
            RegistryCommand::MarkStreamRunning { id, respond_to } => {
                let _ = respond_to.send(self.handle_mark_stream_running(id));
            }
            RegistryCommand::BeginStopStream { id, respond_to } => {
                let _ = respond_to.send(self.handle_begin_stop_stream(id));
            }
            RegistryCommand::FinishStopStream { id } => {
                self.handle_finish_stop_stream(id);
            }
            RegistryCommand::RemoveStream { id } => {
                self.handle_remove_stream(id);
            }
            RegistryCommand::ApplyStreamStats {
                id,
                stats,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_apply_stream_stats(id, stats));
            }
            RegistryCommand::ListStreams { respond_to } => {
                let _ = respond_to.send(self.streams.values().cloned().collect());
            }
            RegistryCommand::StartRecording { config, respond_to } => {
                let _ = respond_to.send(self.handle_start_recording(config));
            }
            RegistryCommand::StopRecording { id, respond_to } => {
                let _ = respond_to.send(self.handle_stop_recording(id));
            }
            RegistryCommand::RemoveRecording { id } => {
                self.handle_remove_recording(id);
            }
            RegistryCommand::ApplyRecordingStats {
                id,
                sample,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_apply_recording_stats(id, sample));
            }
            RegistryCommand::ListRecordings { respond_to } => {
                let _ = respond_to.send(self.recordings.values().cloned().collect());
            }
            RegistryCommand::SaveScene { draft, respond_to } => {
                let _ = respond_to.send(self.handle_save_scene(draft));
            }
            RegistryCommand::UpdateScene {
                id,
                patch,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_update_scene(id, patch));
            }
            RegistryCommand::DeleteScene { id, respond_to } => {
                let _ = respond_to.send(self.handle_delete_scene(id));
            }
            RegistryCommand::GetScene { id, respond_to } => {
                let _ = respond_to.send(self.scenes.get(&id).cloned());
            }
            RegistryCommand::ListScenes { respond_to } => {
                let _ = respond_to.send(self.scenes.values().cloned().collect());
            }
            RegistryCommand::AddSource { draft, respond_to } => {
                let _ = respond_to.send(self.handle_add_source(draft));
            }
            RegistryCommand::ListSources { respond_to } => {
                let _ = respond_to.send(self.sources.values().cloned().collect());
            }
            RegistryCommand::RegisterDevices {
                devices,
                announcement,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_register_devices(devices, announcement));
            }
            RegistryCommand::ListDevices { respond_to } => {
                let _ = respond_to.send(self.devices.values().cloned().collect());
            }
            RegistryCommand::BeginTransition {
                request,
                respond_to,
            } => {
                let _ = respond_to.send(self.handle_begin_transition(request));
            }
            RegistryCommand::CompleteTransition { transition } => {
                self.handle_complete_transition(transition);
            }
            RegistryCommand::Counts { respond_to } => {
                let _ = respond_to.send(self.handle_counts());
            }
            RegistryCommand::Reset => {
                self.handle_reset();
            }
        }
    }

    /// Publishes an event for the hub. Ignores the no-subscriber case.
    fn publish(&self, payload: ServerPayload) {
        let _ = self.event_publisher.send(ServerMessage::new(payload));
    }

    // ========================================================================
    // Streams
    // ========================================================================

    fn handle_create_stream(&mut self, config: StreamConfig) -> Stream {
        let stream = Stream::new(config);
        info!(stream_id = %stream.id, "Stream created (starting)");

        self.streams.insert(stream.id.clone(), stream.clone());
        // No event yet: stream_started goes out once the startup delay
        // elapses and the status reaches running.
        stream
    }

    fn handle_mark_stream_running(&mut self, id: StreamId) -> bool {
        match self.streams.get_mut(&id) {
            Some(stream) if stream.status == StreamStatus::Starting => {
                stream.status = StreamStatus::Running;
                stream.started_at = Some(Utc::now());

                info!(stream_id = %id, "Stream running");
                let stream = stream.clone();
                self.publish(ServerPayload::StreamStarted { stream });
                true
            }
            Some(stream) => {
                // Stopped (or stopping) before the startup delay elapsed;
                // the running transition would move the status backwards.
                debug!(stream_id = %id, status = %stream.status, "Skipping running transition");
                false
            }
            None => {
                debug!(stream_id = %id, "Stream gone before running transition");
                false
            }
        }
    }

    fn handle_begin_stop_stream(&mut self, id: StreamId) -> Result<bool, RegistryError> {
        let stream = self
            .streams
            .get_mut(&id)
            .ok_or_else(|| RegistryError::StreamNotFound(id.clone()))?;

        if !stream.status.can_advance_to(StreamStatus::Stopping) {
            debug!(stream_id = %id, status = %stream.status, "Stop already in progress");
            return Ok(false);
        }

        stream.status = StreamStatus::Stopping;
        info!(stream_id = %id, "Stream stopping");
        Ok(true)
    }

    fn handle_finish_stop_stream(&mut self, id: StreamId) {
        if let Some(stream) = self.streams.get_mut(&id) {
            if stream.status != StreamStatus::Stopping {
                return;
            }

            stream.status = StreamStatus::Stopped;
            stream.ended_at = Some(Utc::now());
            let duration = stream.duration_secs();

            info!(stream_id = %id, duration_secs = duration, "Stream stopped");
            self.publish(ServerPayload::StreamStopped {
                stream_id: id,
                duration,
            });
        }
    }

    fn handle_remove_stream(&mut self, id: StreamId) {
        // Grace-period cleanup only applies to streams that completed the
        // stop sequence; anything else keeps its entry.
        if matches!(
            self.streams.get(&id).map(|s| s.status),
            Some(StreamStatus::Stopped)
        ) {
            self.streams.remove(&id);
            debug!(stream_id = %id, "Stream entry removed after grace period");
        }
    }

    fn handle_apply_stream_stats(&mut self, id: StreamId, stats: StreamStats) -> bool {
        match self.streams.get_mut(&id) {
            Some(stream) if stream.status.is_active() => {
                stream.stats = stats;
                self.publish(ServerPayload::StreamStats {
                    stream_id: id,
                    stats,
                });
                true
            }
            _ => false,
        }
    }

    // ========================================================================
    // Recordings
    // ========================================================================

    fn handle_start_recording(&mut self, config: RecordingConfig) -> Recording {
        let recording = Recording::new(config);
        info!(
            record_id = %recording.id,
            filename = %recording.file_info.filename,
            "Recording started"
        );

        self.recordings
            .insert(recording.id.clone(), recording.clone());
        self.publish(ServerPayload::RecordingStarted {
            recording: recording.clone(),
        });
        recording
    }

    fn handle_stop_recording(&mut self, id: RecordingId) -> Result<Recording, RegistryError> {
        let recording = self
            .recordings
            .get_mut(&id)
            .ok_or_else(|| RegistryError::RecordingNotFound(id.clone()))?;

        if recording.status == RecordingStatus::Recording {
            recording.status = RecordingStatus::Stopped;
            recording.ended_at = Some(Utc::now());
            // file_info keeps its last simulated values: the size and
            // duration are frozen, not recomputed.

            info!(
                record_id = %id,
                size_bytes = recording.file_info.size,
                duration_secs = recording.file_info.duration,
                "Recording stopped"
            );

            let recording = recording.clone();
            self.publish(ServerPayload::RecordingStopped {
                record_id: id,
                recording: recording.clone(),
            });
            return Ok(recording);
        }

        Ok(recording.clone())
    }

    fn handle_remove_recording(&mut self, id: RecordingId) {
        if matches!(
            self.recordings.get(&id).map(|r| r.status),
            Some(RecordingStatus::Stopped)
        ) {
            self.recordings.remove(&id);
            debug!(record_id = %id, "Recording entry removed after retention window");
        }
    }

    fn handle_apply_recording_stats(&mut self, id: RecordingId, sample: RecordingSample) -> bool {
        let file_info = match self.recordings.get_mut(&id) {
            Some(recording) if recording.status.is_active() => {
                recording.file_info.duration = sample.duration;
                recording.file_info.size = sample.size;
                recording.stats = sample.stats;

                recording.file_info.clone()
            }
            _ => return false,
        };

        self.publish(ServerPayload::RecordingStats {
            record_id: id,
            stats: sample.stats,
            file_info,
        });
        true
    }

    // ========================================================================
    // Scenes & sources
    // ========================================================================

    fn handle_save_scene(&mut self, draft: SceneDraft) -> Scene {
        let mut scene = Scene::from_draft(draft);

        // Upsert: replacing an existing scene keeps its creation time.
        if let Some(existing) = self.scenes.get(&scene.id) {
            scene.created_at = existing.created_at;
        }

        info!(scene_id = %scene.id, name = %scene.name, "Scene saved");
        self.scenes.insert(scene.id.clone(), scene.clone());
        self.publish(ServerPayload::SceneSaved {
            scene: scene.clone(),
        });
        scene
    }

    fn handle_update_scene(
        &mut self,
        id: SceneId,
        patch: ScenePatch,
    ) -> Result<Scene, RegistryError> {
        let scene = self
            .scenes
            .get_mut(&id)
            .ok_or_else(|| RegistryError::SceneNotFound(id.clone()))?;

        scene.apply(patch);
        let scene = scene.clone();

        info!(scene_id = %id, "Scene updated");
        self.publish(ServerPayload::SceneUpdated {
            scene_id: id,
            scene: scene.clone(),
        });
        Ok(scene)
    }

    fn handle_delete_scene(&mut self, id: SceneId) -> Result<(), RegistryError> {
        if self.scenes.remove(&id).is_none() {
            return Err(RegistryError::SceneNotFound(id));
        }

        info!(scene_id = %id, "Scene deleted");
        self.publish(ServerPayload::SceneDeleted { scene_id: id });
        Ok(())
    }

    fn handle_add_source(&mut self, draft: SourceDraft) -> Source {
        let source = Source::from_draft(draft);
        info!(source_id = %source.id, name = %source.name, "Source added");

        self.sources.insert(source.id.clone(), source.clone());
        self.publish(ServerPayload::SourceAdded {
            source: source.clone(),
        });
        source
    }

    // ========================================================================
    // Devices
    // ========================================================================

    fn handle_register_devices(
        &mut self,
        devices: Vec<Device>,
        announcement: DeviceAnnouncement,
    ) -> Vec<Device> {
        let mut added = 0usize;
        for device in devices {
            if !self.devices.contains_key(&device.id) {
                self.devices.insert(device.id.clone(), device);
                added += 1;
            }
        }

        let all: Vec<Device> = self.devices.values().cloned().collect();
        info!(added, total = all.len(), "Devices registered");

        match announcement {
            DeviceAnnouncement::Detected => self.publish(ServerPayload::HardwareUpdated {
                devices: all.clone(),
            }),
            DeviceAnnouncement::Scanned => self.publish(ServerPayload::HardwareScanned {
                devices: all.clone(),
            }),
        }

        all
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn handle_begin_transition(
        &mut self,
        request: TransitionRequest,
    ) -> Result<Transition, RegistryError> {
        // Both endpoints must exist before any event goes out.
        if !self.scenes.contains_key(&request.from_scene) {
            return Err(RegistryError::SceneNotFound(request.from_scene));
        }
        if !self.scenes.contains_key(&request.to_scene) {
            return Err(RegistryError::SceneNotFound(request.to_scene));
        }

        let transition = Transition {
            kind: request.kind,
            from_scene: request.from_scene,
            to_scene: request.to_scene,
            duration: request.duration,
            started_at: Utc::now(),
            completed_at: None,
        };

        info!(
            kind = %transition.kind,
            from = %transition.from_scene,
            to = %transition.to_scene,
            duration_ms = transition.duration,
            "Transition started"
        );

        self.publish(ServerPayload::TransitionStarted {
            transition: transition.clone(),
        });
        Ok(transition)
    }

    fn handle_complete_transition(&mut self, mut transition: Transition) {
        transition.completed_at = Some(Utc::now());
        info!(kind = %transition.kind, to = %transition.to_scene, "Transition completed");
        self.publish(ServerPayload::TransitionCompleted { transition });
    }

    // ========================================================================
    // Misc
    // ========================================================================

    fn handle_counts(&self) -> ResourceCounts {
        ResourceCounts {
            streams: self.streams.len(),
            recordings: self.recordings.len(),
            scenes: self.scenes.len(),
            sources: self.sources.len(),
            devices: self.devices.len(),
            clients: 0,
        }
    }

    fn handle_reset(&mut self) {
        warn!(
            streams = self.streams.len(),
            recordings = self.recordings.len(),
            "Resetting registry: dropping all streams and recordings"
        );
        // Simulators notice the entries are gone on their next tick and
        // cancel themselves.
        self.streams.clear();
        self.recordings.clear();
    }

    /// Number of streams currently stored.
    #[cfg(test)]
    fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;
    use visionmix_core::{RecordingStats, SceneItem, SourceId};

    fn create_actor() -> (RegistryActor, broadcast::Receiver<ServerMessage>) {
        let (_cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = broadcast::channel(64);
        (RegistryActor::new(cmd_rx, event_tx), event_rx)
    }

    fn scene_draft(id: Option<&str>, name: &str) -> SceneDraft {
        SceneDraft {
            id: id.map(SceneId::new),
            name: name.to_string(),
            description: String::new(),
            layout: "fullscreen".to_string(),
            sources: vec![SceneItem::video(SourceId::new("source_cam_1"), 0, 0, 1920, 1080)],
            transitions: vec!["cut".to_string()],
        }
    }

    fn drain(rx: &mut broadcast::Receiver<ServerMessage>) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            kinds.push(msg.kind());
        }
        kinds
    }

    #[tokio::test]
    async fn test_create_stream_is_stored_starting_without_event() {
        let (mut actor, mut rx) = create_actor();

        let stream = actor.handle_create_stream(StreamConfig::default());
        assert_eq!(stream.status, StreamStatus::Starting);
        assert_eq!(actor.stream_count(), 1);
        assert!(rx.try_recv().is_err(), "no event until running");
    }

    #[tokio::test]
    async fn test_mark_running_publishes_started_once() {
        let (mut actor, mut rx) = create_actor();
        let stream = actor.handle_create_stream(StreamConfig::default());

        assert!(actor.handle_mark_stream_running(stream.id.clone()));
        assert_eq!(drain(&mut rx), vec!["stream_started"]);

        // Second transition attempt is refused and publishes nothing.
        assert!(!actor.handle_mark_stream_running(stream.id.clone()));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_stop_unknown_stream_fails_without_broadcast() {
        let (mut actor, mut rx) = create_actor();

        let result = actor.handle_begin_stop_stream(StreamId::new("stream_missing"));
        assert!(matches!(result, Err(RegistryError::StreamNotFound(_))));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_stop_skips_running_for_starting_stream() {
        let (mut actor, _rx) = create_actor();
        let stream = actor.handle_create_stream(StreamConfig::default());

        // Stop before the startup delay: starting → stopping is forward.
        let initiated = actor.handle_begin_stop_stream(stream.id.clone());
        assert!(matches!(initiated, Ok(true)));
        // The delayed running transition must now refuse to go backwards.
        assert!(!actor.handle_mark_stream_running(stream.id.clone()));
    }

    #[tokio::test]
    async fn test_finish_stop_publishes_duration() {
        let (mut actor, mut rx) = create_actor();
        let stream = actor.handle_create_stream(StreamConfig::default());
        actor.handle_mark_stream_running(stream.id.clone());
        actor.handle_begin_stop_stream(stream.id.clone()).unwrap();
        drain(&mut rx);

        actor.handle_finish_stop_stream(stream.id.clone());

        let msg = rx.try_recv().unwrap();
        match msg.payload {
            ServerPayload::StreamStopped { stream_id, duration } => {
                assert_eq!(stream_id, stream.id);
                assert!(duration >= 0.0);
            }
            other => panic!("expected StreamStopped, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stats_refused_when_not_running() {
        let (mut actor, mut rx) = create_actor();
        let stream = actor.handle_create_stream(StreamConfig::default());

        // Still starting: tick refused.
        assert!(!actor.handle_apply_stream_stats(stream.id.clone(), StreamStats::default()));

        actor.handle_mark_stream_running(stream.id.clone());
        drain(&mut rx);
        assert!(actor.handle_apply_stream_stats(stream.id.clone(), StreamStats::default()));
        assert_eq!(drain(&mut rx), vec!["stream_stats"]);

        actor.handle_begin_stop_stream(stream.id.clone()).unwrap();
        drain(&mut rx);
        assert!(!actor.handle_apply_stream_stats(stream.id.clone(), StreamStats::default()));
        assert!(drain(&mut rx).is_empty(), "no stat events after stopping");
    }

    #[tokio::test]
    async fn test_remove_stream_only_when_stopped() {
        let (mut actor, _rx) = create_actor();
        let stream = actor.handle_create_stream(StreamConfig::default());
        actor.handle_mark_stream_running(stream.id.clone());

        actor.handle_remove_stream(stream.id.clone());
        assert_eq!(actor.stream_count(), 1, "running stream must survive");

        actor.handle_begin_stop_stream(stream.id.clone()).unwrap();
        actor.handle_finish_stop_stream(stream.id.clone());
        actor.handle_remove_stream(stream.id.clone());
        assert_eq!(actor.stream_count(), 0);
    }

    #[tokio::test]
    async fn test_recording_lifecycle_freezes_file_info() {
        let (mut actor, mut rx) = create_actor();

        let recording = actor.handle_start_recording(RecordingConfig::default());
        assert_eq!(recording.status, RecordingStatus::Recording);
        assert_eq!(drain(&mut rx), vec!["recording_started"]);

        // Three ticks at 10 MB each.
        for tick in 1..=3u64 {
            let applied = actor.handle_apply_recording_stats(
                recording.id.clone(),
                RecordingSample {
                    duration: tick as f64,
                    size: tick * 10_000_000,
                    stats: RecordingStats::default(),
                },
            );
            assert!(applied);
        }
        drain(&mut rx);

        let stopped = actor.handle_stop_recording(recording.id.clone()).unwrap();
        assert_eq!(stopped.status, RecordingStatus::Stopped);
        assert_eq!(stopped.file_info.size, 30_000_000);
        assert_eq!(stopped.file_info.duration, 3.0);
        assert_eq!(drain(&mut rx), vec!["recording_stopped"]);

        // Ticks after the stop are refused and change nothing.
        let applied = actor.handle_apply_recording_stats(
            recording.id.clone(),
            RecordingSample {
                duration: 4.0,
                size: 40_000_000,
                stats: RecordingStats::default(),
            },
        );
        assert!(!applied);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_stop_unknown_recording_fails() {
        let (mut actor, _rx) = create_actor();
        let result = actor.handle_stop_recording(RecordingId::new("record_missing"));
        assert!(matches!(result, Err(RegistryError::RecordingNotFound(_))));
    }

    #[tokio::test]
    async fn test_scene_update_merges_and_advances_timestamp() {
        let (mut actor, mut rx) = create_actor();
        let scene = actor.handle_save_scene(scene_draft(None, "Main Studio"));
        drain(&mut rx);

        let updated = actor
            .handle_update_scene(
                scene.id.clone(),
                ScenePatch {
                    layout: Some("split_horizontal".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.name, "Main Studio");
        assert_eq!(updated.layout, "split_horizontal");
        assert_eq!(updated.sources, scene.sources);
        assert!(updated.updated_at > scene.updated_at);
        assert_eq!(drain(&mut rx), vec!["scene_updated"]);
    }

    #[tokio::test]
    async fn test_save_scene_upsert_keeps_created_at() {
        let (mut actor, _rx) = create_actor();
        let first = actor.handle_save_scene(scene_draft(Some("scene_default_1"), "Main"));
        let second = actor.handle_save_scene(scene_draft(Some("scene_default_1"), "Renamed"));

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.name, "Renamed");
    }

    #[tokio::test]
    async fn test_delete_scene_missing_fails() {
        let (mut actor, mut rx) = create_actor();
        let result = actor.handle_delete_scene(SceneId::new("scene_missing"));
        assert!(matches!(result, Err(RegistryError::SceneNotFound(_))));
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_register_devices_is_idempotent_on_id() {
        let (mut actor, mut rx) = create_actor();
        let devices = crate::discovery::detect_devices();
        let count = devices.len();

        let all = actor.handle_register_devices(devices.clone(), DeviceAnnouncement::Detected);
        assert_eq!(all.len(), count);
        assert_eq!(drain(&mut rx), vec!["hardware_updated"]);

        // Re-registering the same ids adds nothing.
        let all = actor.handle_register_devices(devices, DeviceAnnouncement::Scanned);
        assert_eq!(all.len(), count);
        assert_eq!(drain(&mut rx), vec!["hardware_scanned"]);
    }

    #[tokio::test]
    async fn test_transition_requires_both_scenes() {
        let (mut actor, mut rx) = create_actor();
        actor.handle_save_scene(scene_draft(Some("scene_default_1"), "Main"));
        drain(&mut rx);

        let request = TransitionRequest {
            kind: "fade".to_string(),
            from_scene: SceneId::new("scene_default_1"),
            to_scene: SceneId::new("scene_missing"),
            duration: 500,
        };

        let result = actor.handle_begin_transition(request);
        assert!(matches!(result, Err(RegistryError::SceneNotFound(id)) if id.as_str() == "scene_missing"));
        assert!(drain(&mut rx).is_empty(), "no events for rejected transition");
    }

    #[tokio::test]
    async fn test_transition_events_correlate() {
        let (mut actor, mut rx) = create_actor();
        actor.handle_save_scene(scene_draft(Some("scene_default_1"), "Main"));
        actor.handle_save_scene(scene_draft(Some("scene_default_2"), "Dual"));
        drain(&mut rx);

        let request = TransitionRequest {
            kind: "fade".to_string(),
            from_scene: SceneId::new("scene_default_1"),
            to_scene: SceneId::new("scene_default_2"),
            duration: 500,
        };

        let transition = actor.handle_begin_transition(request).unwrap();
        actor.handle_complete_transition(transition.clone());

        let started = rx.try_recv().unwrap();
        let completed = rx.try_recv().unwrap();
        match (started.payload, completed.payload) {
            (
                ServerPayload::TransitionStarted { transition: a },
                ServerPayload::TransitionCompleted { transition: b },
            ) => {
                assert_eq!(a.started_at, b.started_at);
                assert_eq!(a.kind, b.kind);
                assert!(a.completed_at.is_none());
                assert!(b.completed_at.is_some());
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_counts_and_reset() {
        let (mut actor, _rx) = create_actor();
        actor.handle_create_stream(StreamConfig::default());
        actor.handle_start_recording(RecordingConfig::default());
        actor.handle_save_scene(scene_draft(None, "Main"));

        let counts = actor.handle_counts();
        assert_eq!(counts.streams, 1);
        assert_eq!(counts.recordings, 1);
        assert_eq!(counts.scenes, 1);
        assert_eq!(counts.clients, 0);

        actor.handle_reset();
        let counts = actor.handle_counts();
        assert_eq!(counts.streams, 0);
        assert_eq!(counts.recordings, 0);
        // Scenes survive a restart reset.
        assert_eq!(counts.scenes, 1);
    }

    #[tokio::test]
    async fn test_command_dispatch_responds() {
        let (mut actor, _rx) = create_actor();

        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::CreateStream {
            config: StreamConfig::default(),
            respond_to: tx,
        });
        let stream = rx.await.unwrap();
        assert_eq!(stream.status, StreamStatus::Starting);

        let (tx, rx) = oneshot::channel();
        actor.handle_command(RegistryCommand::ListStreams { respond_to: tx });
        assert_eq!(rx.await.unwrap().len(), 1);
    }
}
