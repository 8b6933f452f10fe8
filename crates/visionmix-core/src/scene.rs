//! Scene and source domain entities.
//!
//! A scene is a named arrangement of source references with per-reference
//! placement (video) or gain/mute (audio). Scenes reference sources
//! weakly: deleting a scene never deletes the sources it arranged.

use crate::{DeviceId, SceneId, SourceId};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Media kind of a source feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Audio,
}

/// One source reference inside a scene.
///
/// Video items carry a placement rect; audio items carry volume/mute.
/// Both sets are optional on the wire so a partial front-end payload
/// still parses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneItem {
    /// The referenced source (weak reference, not ownership).
    pub id: SourceId,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,
}

impl SceneItem {
    /// Video item with a placement rect.
    pub fn video(id: SourceId, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            id,
            kind: MediaKind::Video,
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            volume: None,
            muted: None,
        }
    }

    /// Audio item with gain and mute state.
    pub fn audio(id: SourceId, volume: f64, muted: bool) -> Self {
        Self {
            id,
            kind: MediaKind::Audio,
            x: None,
            y: None,
            width: None,
            height: None,
            volume: Some(volume),
            muted: Some(muted),
        }
    }
}

/// A switchable arrangement of sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Layout tag understood by the front-end (e.g. "fullscreen").
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub sources: Vec<SceneItem>,
    /// Transition names this scene supports.
    #[serde(default)]
    pub transitions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Scene {
    /// Builds a scene from an inbound draft, assigning an id if the draft
    /// carries none and stamping both timestamps.
    pub fn from_draft(draft: SceneDraft) -> Self {
        let now = Utc::now();
        Self {
            id: draft.id.unwrap_or_else(SceneId::generate),
            name: draft.name,
            description: draft.description,
            layout: draft.layout,
            sources: draft.sources,
            transitions: draft.transitions,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a partial update into this scene.
    ///
    /// Fields absent from the patch are preserved. `updated_at` strictly
    /// advances even when two updates land on the same clock tick.
    pub fn apply(&mut self, patch: ScenePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(layout) = patch.layout {
            self.layout = layout;
        }
        if let Some(sources) = patch.sources {
            self.sources = sources;
        }
        if let Some(transitions) = patch.transitions {
            self.transitions = transitions;
        }

        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::nanoseconds(1)
        };
    }
}

/// Inbound scene payload. Id and timestamps are assigned by the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SceneId>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub layout: String,
    #[serde(default)]
    pub sources: Vec<SceneItem>,
    #[serde(default)]
    pub transitions: Vec<String>,
}

/// Partial scene update. Absent fields leave the scene untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SceneItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Vec<String>>,
}

/// Activity state of a source feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Active,
    Inactive,
}

impl Default for SourceStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// Capture parameters for a source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channels: Option<u16>,
}

/// A named reference to a device's capture feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: SourceId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_port: Option<String>,
    #[serde(default)]
    pub settings: CaptureSettings,
    #[serde(default)]
    pub status: SourceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// Builds a source from an inbound draft.
    pub fn from_draft(draft: SourceDraft) -> Self {
        let now = Utc::now();
        Self {
            id: draft.id.unwrap_or_else(SourceId::generate),
            name: draft.name,
            kind: draft.kind,
            device_id: draft.device_id,
            device_port: draft.device_port,
            settings: draft.settings,
            status: draft.status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Inbound source payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SourceId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub device_id: DeviceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_port: Option<String>,
    #[serde(default)]
    pub settings: CaptureSettings,
    #[serde(default)]
    pub status: SourceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str) -> SceneDraft {
        SceneDraft {
            id: None,
            name: name.to_string(),
            description: "test scene".to_string(),
            layout: "fullscreen".to_string(),
            sources: vec![SceneItem::video(SourceId::new("source_cam_1"), 0, 0, 1920, 1080)],
            transitions: vec!["cut".to_string(), "fade".to_string()],
        }
    }

    #[test]
    fn test_from_draft_assigns_id_and_timestamps() {
        let scene = Scene::from_draft(draft("Main"));
        assert!(scene.id.as_str().starts_with("scene_"));
        assert_eq!(scene.created_at, scene.updated_at);
    }

    #[test]
    fn test_from_draft_keeps_provided_id() {
        let mut d = draft("Main");
        d.id = Some(SceneId::new("scene_default_1"));
        let scene = Scene::from_draft(d);
        assert_eq!(scene.id.as_str(), "scene_default_1");
    }

    #[test]
    fn test_apply_preserves_unpatched_fields() {
        let mut scene = Scene::from_draft(draft("Main"));
        let original_sources = scene.sources.clone();

        scene.apply(ScenePatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        });

        assert_eq!(scene.name, "Renamed");
        assert_eq!(scene.description, "test scene");
        assert_eq!(scene.layout, "fullscreen");
        assert_eq!(scene.sources, original_sources);
        assert_eq!(scene.transitions, vec!["cut", "fade"]);
    }

    #[test]
    fn test_apply_strictly_advances_updated_at() {
        let mut scene = Scene::from_draft(draft("Main"));

        let mut previous = scene.updated_at;
        for _ in 0..5 {
            scene.apply(ScenePatch::default());
            assert!(scene.updated_at > previous);
            previous = scene.updated_at;
        }
    }

    #[test]
    fn test_scene_item_wire_shape() {
        let item = SceneItem::audio(SourceId::new("source_mic_1"), 0.8, false);
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["type"], "audio");
        assert_eq!(value["volume"], 0.8);
        assert_eq!(value["muted"], false);
        assert!(value.get("x").is_none());
    }

    #[test]
    fn test_scene_patch_parses_partial_payload() {
        let patch: ScenePatch = serde_json::from_str(r#"{"layout":"split_horizontal"}"#).unwrap();
        assert_eq!(patch.layout.as_deref(), Some("split_horizontal"));
        assert!(patch.name.is_none());
        assert!(patch.sources.is_none());
    }

    #[test]
    fn test_source_camel_case_wire_names() {
        let source = Source::from_draft(SourceDraft {
            id: None,
            name: "Studio Camera A".to_string(),
            kind: MediaKind::Video,
            device_id: DeviceId::new("device_capture_1"),
            device_port: Some("SDI 1".to_string()),
            settings: CaptureSettings {
                resolution: Some("1920x1080".to_string()),
                fps: Some(50),
                ..Default::default()
            },
            status: SourceStatus::Active,
        });

        let value = serde_json::to_value(&source).unwrap();
        assert_eq!(value["deviceId"], "device_capture_1");
        assert_eq!(value["devicePort"], "SDI 1");
        assert_eq!(value["settings"]["resolution"], "1920x1080");
        assert!(value.get("createdAt").is_some());
    }
}
