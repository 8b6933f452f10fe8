//! Live stream session entities.

use crate::{SceneId, StreamId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an outbound stream.
///
/// Transitions only ever move forward: `starting → running → stopping →
/// stopped`. A stop request on a stream still in `starting` skips the
/// `running` phase, which is still a forward move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl StreamStatus {
    /// Whether the stats simulator should keep ticking for this status.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Running)
    }

    fn rank(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Running => 1,
            Self::Stopping => 2,
            Self::Stopped => 3,
        }
    }

    /// Whether moving to `next` goes forward in the lifecycle.
    pub fn can_advance_to(self, next: Self) -> bool {
        next.rank() > self.rank()
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        write!(f, "{label}")
    }
}

/// One publish target for a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamDestination {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_key: Option<String>,
}

/// Stream configuration as submitted by the caller.
///
/// Every field is optional so minimal front-end payloads parse; defaults
/// come from the settings document at the boundary that needs them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StreamConfig {
    pub destinations: Vec<StreamDestination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<SceneId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitrate: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codec: Option<String>,
}

/// Running statistics for a stream.
///
/// `dropped_frames` and `viewers` are cumulative totals; everything else
/// is an instantaneous sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStats {
    pub bitrate: f64,
    pub bitrate_video: f64,
    pub bitrate_audio: f64,
    pub fps: f64,
    pub dropped_frames: u64,
    pub viewers: u64,
    pub latency: f64,
}

/// A live outbound transmission session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: StreamId,
    pub config: StreamConfig,
    pub status: StreamStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub stats: StreamStats,
}

impl Stream {
    /// Creates a stream in `starting` state with a fresh id.
    ///
    /// The stream is valid and addressable immediately; `started_at` is
    /// only stamped once the startup delay elapses and the status reaches
    /// `running`.
    pub fn new(config: StreamConfig) -> Self {
        Self {
            id: StreamId::generate(),
            config,
            status: StreamStatus::Starting,
            started_at: None,
            ended_at: None,
            stats: StreamStats::default(),
        }
    }

    /// Elapsed seconds between start and end, 0.0 if either is missing.
    pub fn duration_secs(&self) -> f64 {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => {
                (end - start).num_milliseconds() as f64 / 1000.0
            }
            _ => 0.0,
        }
    }
}
