//! Typed parsing of inbound control commands.
//!
//! The channel carries commands as a name plus a free-form `params`
//! value. [`CommandRequest::parse`] checks the name against the closed
//! command set and validates the params into the matching typed request,
//! so malformed payloads are rejected at the boundary instead of turning
//! into missing fields deep in handler logic.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use visionmix_core::{RecordingConfig, RecordingId, SceneId, StreamConfig, StreamId};

/// Default transition length in milliseconds.
pub const DEFAULT_TRANSITION_DURATION_MS: u64 = 1000;

/// A validated control command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandRequest {
    StartStream(StreamConfig),
    StopStream { stream_id: StreamId },
    StartRecording(RecordingConfig),
    StopRecording { record_id: RecordingId },
    Transition(TransitionRequest),
}

/// Parameters for a scene transition, shared by the HTTP body and the
/// channel command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub from_scene: SceneId,
    pub to_scene: SceneId,
    /// Transition length in milliseconds.
    #[serde(default = "default_duration")]
    pub duration: u64,
}

fn default_duration() -> u64 {
    DEFAULT_TRANSITION_DURATION_MS
}

/// Why an inbound command was rejected at the boundary.
#[derive(Debug, Clone, Error)]
pub enum CommandParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid params for {command}: {reason}")]
    InvalidParams { command: String, reason: String },
}

impl CommandRequest {
    /// Validates a raw (name, params) pair into a typed request.
    pub fn parse(command: &str, params: Value) -> Result<Self, CommandParseError> {
        match command {
            "start_stream" => Ok(Self::StartStream(from_params(command, params)?)),
            "stop_stream" => {
                #[derive(Deserialize)]
                #[serde(rename_all = "camelCase")]
                struct Params {
                    stream_id: StreamId,
                }
                let Params { stream_id } = from_params(command, params)?;
                Ok(Self::StopStream { stream_id })
            }
            "start_recording" => Ok(Self::StartRecording(from_params(command, params)?)),
            "stop_recording" => {
                #[derive(Deserialize)]
                #[serde(rename_all = "camelCase")]
                struct Params {
                    record_id: RecordingId,
                }
                let Params { record_id } = from_params(command, params)?;
                Ok(Self::StopRecording { record_id })
            }
            "transition" => Ok(Self::Transition(from_params(command, params)?)),
            other => Err(CommandParseError::UnknownCommand(other.to_string())),
        }
    }

    /// The wire name of this command, echoed in command responses.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartStream(_) => "start_stream",
            Self::StopStream { .. } => "stop_stream",
            Self::StartRecording(_) => "start_recording",
            Self::StopRecording { .. } => "stop_recording",
            Self::Transition(_) => "transition",
        }
    }
}

fn from_params<T: serde::de::DeserializeOwned>(
    command: &str,
    params: Value,
) -> Result<T, CommandParseError> {
    serde_json::from_value(params).map_err(|e| CommandParseError::InvalidParams {
        command: command.to_string(),
        reason: e.to_string(),
    })
}
