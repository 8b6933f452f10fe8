//! Registry actor commands and errors.
//!
//! This module defines the message types for communicating with the
//! `RegistryActor`: one command variant per operation, each carrying a
//! `oneshot` responder, plus the error taxonomy for id lookups.
//!
//! Internal lifecycle commands (delayed status transitions, stat ticks,
//! grace-period removals) answer with a plain `bool` meaning "the
//! entity still existed in the expected state": an entity disappearing
//! between a timer being armed and firing is normal, not an error.

use thiserror::Error;
use tokio::sync::oneshot;

use visionmix_core::{
    Device, Recording, RecordingConfig, RecordingId, RecordingSample, Scene, SceneDraft, SceneId,
    ScenePatch, Source, SourceDraft, Stream, StreamConfig, StreamId, StreamStats,
};
use visionmix_protocol::{ResourceCounts, Transition, TransitionRequest};

/// How a batch of registered devices is announced to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceAnnouncement {
    /// Startup detection: broadcast `hardware_updated`.
    Detected,
    /// On-demand scan: broadcast `hardware_scanned`.
    Scanned,
}

/// Commands sent to the registry actor.
#[derive(Debug)]
pub enum RegistryCommand {
    // ---- streams ---------------------------------------------------------
    /// Store a new stream in `starting` state and return it.
    ///
    /// The returned id is valid and addressable before the stream ever
    /// reaches `running`.
    CreateStream {
        config: StreamConfig,
        respond_to: oneshot::Sender<Stream>,
    },

    /// Delayed startup transition: `starting → running`.
    ///
    /// Responds `true` only if the stream existed and was still in
    /// `starting`; the caller arms the stats simulator on `true`.
    MarkStreamRunning {
        id: StreamId,
        respond_to: oneshot::Sender<bool>,
    },

    /// Begin the stop sequence: status becomes `stopping`.
    ///
    /// Responds `Ok(true)` when the stop sequence was newly initiated
    /// (the caller schedules the delayed finish), `Ok(false)` when the
    /// stream was already stopping or stopped.
    BeginStopStream {
        id: StreamId,
        respond_to: oneshot::Sender<Result<bool, RegistryError>>,
    },

    /// Delayed stop transition: `stopping → stopped`, broadcasting the
    /// stopped event with the computed duration.
    FinishStopStream { id: StreamId },

    /// Grace-period removal of a stopped stream. Silent no-op if the id
    /// is gone or not yet stopped.
    RemoveStream { id: StreamId },

    /// Simulator tick: replace the stream's stats and broadcast them.
    ///
    /// Responds `false` when the stream is gone or no longer `running`,
    /// which tells the simulator to cancel itself.
    ApplyStreamStats {
        id: StreamId,
        stats: StreamStats,
        respond_to: oneshot::Sender<bool>,
    },

    ListStreams {
        respond_to: oneshot::Sender<Vec<Stream>>,
    },

    // ---- recordings ------------------------------------------------------
    /// Store a new recording, already in `recording` state.
    StartRecording {
        config: RecordingConfig,
        respond_to: oneshot::Sender<Recording>,
    },

    /// Stop a recording: freeze its file info and broadcast the stopped
    /// event. Responds with the frozen entity.
    StopRecording {
        id: RecordingId,
        respond_to: oneshot::Sender<Result<Recording, RegistryError>>,
    },

    /// Retention-window removal of a stopped recording.
    RemoveRecording { id: RecordingId },

    /// Simulator tick: advance file growth and stats, broadcast them.
    ///
    /// Responds `false` when the recording is gone or no longer
    /// `recording`.
    ApplyRecordingStats {
        id: RecordingId,
        sample: RecordingSample,
        respond_to: oneshot::Sender<bool>,
    },

    ListRecordings {
        respond_to: oneshot::Sender<Vec<Recording>>,
    },

    // ---- scenes ----------------------------------------------------------
    /// Create or replace a scene (upsert keyed by the draft's id, if
    /// any). A replaced scene keeps its original creation timestamp.
    SaveScene {
        draft: SceneDraft,
        respond_to: oneshot::Sender<Scene>,
    },

    /// Merge a partial update into an existing scene.
    UpdateScene {
        id: SceneId,
        patch: ScenePatch,
        respond_to: oneshot::Sender<Result<Scene, RegistryError>>,
    },

    DeleteScene {
        id: SceneId,
        respond_to: oneshot::Sender<Result<(), RegistryError>>,
    },

    GetScene {
        id: SceneId,
        respond_to: oneshot::Sender<Option<Scene>>,
    },

    ListScenes {
        respond_to: oneshot::Sender<Vec<Scene>>,
    },

    // ---- sources ---------------------------------------------------------
    AddSource {
        draft: SourceDraft,
        respond_to: oneshot::Sender<Source>,
    },

    ListSources {
        respond_to: oneshot::Sender<Vec<Source>>,
    },

    // ---- devices ---------------------------------------------------------
    /// Append devices to the store, idempotent on device id, and respond
    /// with the full device list.
    RegisterDevices {
        devices: Vec<Device>,
        announcement: DeviceAnnouncement,
        respond_to: oneshot::Sender<Vec<Device>>,
    },

    ListDevices {
        respond_to: oneshot::Sender<Vec<Device>>,
    },

    // ---- transitions -----------------------------------------------------
    /// Validate both scene ids, then broadcast `transition_started`.
    ///
    /// Responds with the transition payload the caller re-submits via
    /// [`RegistryCommand::CompleteTransition`] after the duration.
    BeginTransition {
        request: TransitionRequest,
        respond_to: oneshot::Sender<Result<Transition, RegistryError>>,
    },

    /// Broadcast `transition_completed` for a previously started
    /// transition.
    CompleteTransition { transition: Transition },

    // ---- misc ------------------------------------------------------------
    /// Snapshot of store populations (clients are counted by the hub).
    Counts {
        respond_to: oneshot::Sender<ResourceCounts>,
    },

    /// Drop all streams and recordings (system restart). Their
    /// simulators observe the disappearance and cancel themselves.
    Reset,
}

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// The referenced stream is not in the registry.
    #[error("stream not found: {0}")]
    StreamNotFound(StreamId),

    /// The referenced recording is not in the registry.
    #[error("recording not found: {0}")]
    RecordingNotFound(RecordingId),

    /// The referenced scene is not in the registry.
    #[error("scene not found: {0}")]
    SceneNotFound(SceneId),

    /// The actor has shut down and can no longer answer.
    #[error("registry channel closed")]
    ChannelClosed,
}
