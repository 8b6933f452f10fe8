//! Wire protocol for the VisionMix control channel.
//!
//! Defines the JSON messages exchanged between the daemon and connected
//! front-ends over the WebSocket, plus boundary validation of control
//! commands.

pub mod command;
pub mod message;

pub use command::{
    CommandParseError, CommandRequest, TransitionRequest, DEFAULT_TRANSITION_DURATION_MS,
};
pub use message::{
    ClientMessage, HostInfo, MemoryUsage, PerformanceInfo, ResourceCounts, ServerMessage,
    ServerPayload, SystemSnapshot, SystemStatsReport, Transition,
};
