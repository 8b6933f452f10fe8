//! Default scenes and sources loaded at process start.
//!
//! The registry has no persistence; every start rebuilds the same two
//! scenes and three sources so a fresh daemon is immediately usable
//! from the front-end.

use tracing::{info, warn};

use visionmix_core::{
    CaptureSettings, DeviceId, MediaKind, SceneDraft, SceneId, SceneItem, SourceDraft, SourceId,
    SourceStatus,
};

use crate::registry::RegistryHandle;

/// Populates the registry with the default scenes and sources.
pub async fn load_initial_data(registry: &RegistryHandle) {
    let mut scenes = 0usize;
    for draft in default_scenes() {
        match registry.save_scene(draft).await {
            Ok(_) => scenes += 1,
            Err(e) => warn!(error = %e, "Failed to seed scene"),
        }
    }

    let mut sources = 0usize;
    for draft in default_sources() {
        match registry.add_source(draft).await {
            Ok(_) => sources += 1,
            Err(e) => warn!(error = %e, "Failed to seed source"),
        }
    }

    info!(scenes, sources, "Initial data loaded");
}

fn default_scenes() -> Vec<SceneDraft> {
    vec![
        SceneDraft {
            id: Some(SceneId::new("scene_default_1")),
            name: "Main Studio".to_string(),
            description: "Primary studio scene".to_string(),
            layout: "fullscreen".to_string(),
            sources: vec![
                SceneItem::video(SourceId::new("source_cam_1"), 0, 0, 1920, 1080),
                SceneItem::audio(SourceId::new("source_mic_1"), 0.8, false),
            ],
            transitions: vec!["cut".to_string(), "fade".to_string()],
        },
        SceneDraft {
            id: Some(SceneId::new("scene_default_2")),
            name: "Dual Camera".to_string(),
            description: "Two cameras in a horizontal split".to_string(),
            layout: "split_horizontal".to_string(),
            sources: vec![
                SceneItem::video(SourceId::new("source_cam_1"), 0, 0, 960, 1080),
                SceneItem::video(SourceId::new("source_cam_2"), 960, 0, 960, 1080),
                SceneItem::audio(SourceId::new("source_mic_1"), 0.8, false),
            ],
            transitions: vec!["cut".to_string(), "slide".to_string()],
        },
    ]
}

fn default_sources() -> Vec<SourceDraft> {
    let camera_settings = CaptureSettings {
        resolution: Some("1920x1080".to_string()),
        fps: Some(50),
        sample_rate: None,
        channels: None,
    };

    vec![
        SourceDraft {
            id: Some(SourceId::new("source_cam_1")),
            name: "Studio Camera A".to_string(),
            kind: MediaKind::Video,
            device_id: DeviceId::new("device_capture_1"),
            device_port: Some("SDI 1".to_string()),
            settings: camera_settings.clone(),
            status: SourceStatus::Active,
        },
        SourceDraft {
            id: Some(SourceId::new("source_cam_2")),
            name: "Studio Camera B".to_string(),
            kind: MediaKind::Video,
            device_id: DeviceId::new("device_capture_1"),
            device_port: Some("SDI 2".to_string()),
            settings: camera_settings,
            status: SourceStatus::Active,
        },
        SourceDraft {
            id: Some(SourceId::new("source_mic_1")),
            name: "Main Microphone".to_string(),
            kind: MediaKind::Audio,
            device_id: DeviceId::new("device_system_audio"),
            device_port: None,
            settings: CaptureSettings {
                resolution: None,
                fps: None,
                sample_rate: Some(48_000),
                channels: Some(2),
            },
            status: SourceStatus::Active,
        },
    ]
}
