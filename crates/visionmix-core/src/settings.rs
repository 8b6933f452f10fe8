//! The persisted settings document.
//!
//! One nested JSON document, replaced wholesale on save. Every section
//! has hard-coded defaults so a missing or unreadable file still yields a
//! working configuration.

use serde::{Deserialize, Serialize};

/// Top-level settings document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub system: SystemSettings,
    pub video: VideoSettings,
    pub audio: AudioSettings,
    pub streaming: StreamingSettings,
    pub recording: RecordingSettings,
    pub hardware: HardwareSettings,
    pub ui: UiSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemSettings {
    pub name: String,
    pub version: String,
    pub auto_start: bool,
    pub log_level: String,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            name: "VisionMix".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            auto_start: false,
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VideoSettings {
    pub default_resolution: String,
    pub default_fps: u32,
    pub default_bitrate: u64,
    pub default_codec: String,
    pub buffer_size: u64,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            default_resolution: "1920x1080".to_string(),
            default_fps: 50,
            default_bitrate: 8_000_000,
            default_codec: "h264".to_string(),
            buffer_size: 10_000_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudioSettings {
    pub channels: u16,
    pub sample_rate: u32,
    pub bitrate: u64,
    pub codec: String,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            channels: 2,
            sample_rate: 48_000,
            bitrate: 192_000,
            codec: "aac".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamingSettings {
    pub default_protocol: String,
    pub adaptive_bitrate: bool,
    pub redundancy: bool,
    pub max_retries: u32,
}

impl Default for StreamingSettings {
    fn default() -> Self {
        Self {
            default_protocol: "rtmp".to_string(),
            adaptive_bitrate: true,
            redundancy: false,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordingSettings {
    pub default_format: String,
    pub default_codec: String,
    pub default_path: String,
    pub auto_segment: bool,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            default_format: "mp4".to_string(),
            default_codec: "h264".to_string(),
            default_path: "./recordings".to_string(),
            auto_segment: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareSettings {
    pub capture_cards: bool,
    pub network_sources: bool,
    pub usb: bool,
    pub ip_cameras: bool,
}

impl Default for HardwareSettings {
    fn default() -> Self {
        Self {
            capture_cards: true,
            network_sources: true,
            usb: true,
            ip_cameras: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiSettings {
    pub theme: String,
    pub multiviewer_layout: String,
    pub show_audio_meters: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            multiviewer_layout: "2x2".to_string(),
            show_audio_meters: true,
        }
    }
}
