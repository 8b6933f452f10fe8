//! Recording session entities.

use crate::{RecordingId, SceneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Simulated write throughput for recordings, in bytes per second.
///
/// File size always equals `duration_secs * RECORDING_BYTES_PER_SEC`,
/// both while the simulator is ticking and in the frozen final state.
pub const RECORDING_BYTES_PER_SEC: u64 = 10_000_000;

/// Default container format when the config does not name one.
pub const DEFAULT_RECORDING_FORMAT: &str = "mp4";

/// Default output directory when the config does not name one.
pub const DEFAULT_RECORDING_PATH: &str = "./recordings";

/// Lifecycle of a recording. There is no startup phase: a recording is
/// `recording` from the moment it is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Recording,
    Stopped,
}

impl RecordingStatus {
    /// Whether the stats simulator should keep ticking for this status.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Recording)
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recording => write!(f, "recording"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Recording configuration as submitted by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<SceneId>,
}

impl RecordingConfig {
    pub fn format_or_default(&self) -> &str {
        self.format.as_deref().unwrap_or(DEFAULT_RECORDING_FORMAT)
    }

    pub fn path_or_default(&self) -> &str {
        self.path.as_deref().unwrap_or(DEFAULT_RECORDING_PATH)
    }
}

/// Simulated output file metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: String,
    pub filename: String,
    /// Bytes written so far (simulated).
    pub size: u64,
    /// Seconds recorded so far (simulated).
    pub duration: f64,
    pub format: String,
}

/// Running statistics for a recording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingStats {
    pub video_bitrate: f64,
    pub audio_bitrate: f64,
    pub fps: f64,
    pub frame_count: u64,
}

/// One simulator tick's worth of recording progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordingSample {
    /// Seconds recorded as of this tick.
    pub duration: f64,
    /// Bytes written as of this tick.
    pub size: u64,
    pub stats: RecordingStats,
}

/// A local capture-to-file session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: RecordingId,
    pub config: RecordingConfig,
    pub status: RecordingStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub file_info: FileInfo,
    pub stats: RecordingStats,
}

impl Recording {
    /// Creates a recording already in `recording` state with a fresh id
    /// and an empty simulated output file.
    pub fn new(config: RecordingConfig) -> Self {
        let id = RecordingId::generate();
        let format = config.format_or_default().to_string();
        let path = config.path_or_default().to_string();
        // recording_<uuid>.<fmt>, reusing the id's unique suffix
        let filename = format!(
            "recording_{}.{}",
            id.as_str().trim_start_matches("record_"),
            format
        );

        Self {
            id,
            config,
            status: RecordingStatus::Recording,
            started_at: Utc::now(),
            ended_at: None,
            file_info: FileInfo {
                path,
                filename,
                size: 0,
                duration: 0.0,
                format,
            },
            stats: RecordingStats::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recording_is_recording_immediately() {
        let recording = Recording::new(RecordingConfig::default());
        assert_eq!(recording.status, RecordingStatus::Recording);
        assert!(recording.ended_at.is_none());
        assert_eq!(recording.file_info.size, 0);
        assert_eq!(recording.file_info.duration, 0.0);
    }

    #[test]
    fn test_config_defaults_applied_to_file_info() {
        let recording = Recording::new(RecordingConfig::default());
        assert_eq!(recording.file_info.format, "mp4");
        assert_eq!(recording.file_info.path, "./recordings");
        assert!(recording.file_info.filename.starts_with("recording_"));
        assert!(recording.file_info.filename.ends_with(".mp4"));
    }

    #[test]
    fn test_explicit_format_and_path() {
        let recording = Recording::new(RecordingConfig {
            format: Some("mkv".to_string()),
            path: Some("/media/captures".to_string()),
            ..Default::default()
        });
        assert_eq!(recording.file_info.format, "mkv");
        assert_eq!(recording.file_info.path, "/media/captures");
        assert!(recording.file_info.filename.ends_with(".mkv"));
    }

    #[test]
    fn test_file_info_wire_names() {
        let recording = Recording::new(RecordingConfig::default());
        let value = serde_json::to_value(&recording).unwrap();
        assert_eq!(value["status"], "recording");
        assert!(value["fileInfo"]["filename"].is_string());
        assert!(value.get("startedAt").is_some());
        assert!(value.get("endedAt").is_none());
    }
}
