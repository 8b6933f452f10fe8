//! VisionMix Daemon - production switcher registry and broadcast server
//!
//! This crate provides the daemon's building blocks:
//! - `registry` - actor owning all switcher state (devices, scenes,
//!   sources, streams, recordings)
//! - `hub` - fan-out of events to connected WebSocket clients with
//!   per-client subscriptions and liveness probing
//! - `lifecycle` - delayed status transitions, grace-period removals,
//!   and simulator arming for streams/recordings/transitions
//! - `simulator` - periodic stat generators behind swappable traits
//! - `server` - axum HTTP API plus the `/ws` control channel
//! - `config` - settings document load/save
//! - `discovery` - simulated hardware detection
//! - `seed` - default scenes and sources loaded at startup
//! - `stats` - process resource monitoring
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         visionmixd                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────┐  commands   ┌─────────────────────────┐    │
//! │  │ HTTP + WS    │────────────▶│     RegistryActor       │    │
//! │  │ (axum)       │             │  (switcher state owner) │    │
//! │  └──────┬───────┘             └───────────┬─────────────┘    │
//! │         │ connections                     │ events           │
//! │         ▼                                 ▼                  │
//! │  ┌──────────────┐   fan-out   ┌─────────────────────────┐    │
//! │  │ BroadcastHub │◀────────────│   broadcast::Sender     │    │
//! │  │ (per client) │             │   (ServerMessage)       │    │
//! │  └──────────────┘             └─────────────────────────┘    │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! All production code follows the panic-free policy: no `.unwrap()`,
//! `.expect()`, `panic!()`, `unreachable!()`, or `todo!()`; channel
//! closures are handled gracefully.

pub mod config;
pub mod discovery;
pub mod hub;
pub mod lifecycle;
pub mod registry;
pub mod seed;
pub mod server;
pub mod simulator;
pub mod stats;
