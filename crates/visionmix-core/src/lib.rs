//! VisionMix Core - Shared domain types for the production switcher.
//!
//! This crate provides the entity types shared between the daemon
//! (visionmixd) and the wire protocol (visionmix-protocol): typed ids,
//! devices, scenes, sources, streams, recordings, and the persisted
//! settings document.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, or `todo!()` outside tests.

pub mod device;
pub mod id;
pub mod recording;
pub mod scene;
pub mod settings;
pub mod stream;

// Re-exports for convenience
pub use device::{Device, DeviceKind, DeviceStatus};
pub use id::{ClientId, DeviceId, RecordingId, SceneId, SourceId, StreamId};
pub use recording::{
    FileInfo, Recording, RecordingConfig, RecordingSample, RecordingStats, RecordingStatus,
    DEFAULT_RECORDING_FORMAT, DEFAULT_RECORDING_PATH, RECORDING_BYTES_PER_SEC,
};
pub use scene::{
    CaptureSettings, MediaKind, Scene, SceneDraft, SceneItem, ScenePatch, Source, SourceDraft,
    SourceStatus,
};
pub use settings::{
    AudioSettings, HardwareSettings, RecordingSettings, Settings, StreamingSettings,
    SystemSettings, UiSettings, VideoSettings,
};
pub use stream::{Stream, StreamConfig, StreamDestination, StreamStats, StreamStatus};
