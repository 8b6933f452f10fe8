//! Switcher state registry using the actor pattern.
//!
//! The registry is the single owner of all entity stores: devices,
//! scenes, sources, streams, and recordings. It receives commands over a
//! tokio mpsc channel and publishes one wire event per mutation on a
//! broadcast channel.
//!
//! ```text
//! ┌──────────────┐      ┌────────────────┐      ┌──────────────────┐
//! │ HTTP / WS    │─────▶│ RegistryActor  │─────▶│ broadcast channel │
//! │ boundaries   │      │ (state owner)  │      │ (ServerMessage)   │
//! └──────────────┘      └────────────────┘      └──────────────────┘
//!        │  RegistryCommand      │                      │
//!        │  (mpsc + oneshot)     │  entity stores       ▼
//!        ▼                       ▼                BroadcastHub
//!   lifecycle timers        HashMap<Id, _>       (per-client fan-out)
//! ```

use tokio::sync::{broadcast, mpsc};

mod actor;
mod commands;
mod handle;

pub use actor::RegistryActor;
pub use commands::{DeviceAnnouncement, RegistryCommand, RegistryError};
pub use handle::RegistryHandle;

/// Channel buffer sizes
const COMMAND_BUFFER: usize = 100;
const EVENT_BUFFER: usize = 256;

/// Spawns the registry actor and returns a handle for interaction.
///
/// Creates the command and event channels, spawns the actor task, and
/// hands back the cheap-to-clone [`RegistryHandle`].
pub fn spawn_registry() -> RegistryHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let actor = RegistryActor::new(cmd_rx, event_tx.clone());
    tokio::spawn(actor.run());

    RegistryHandle::new(cmd_tx, event_tx)
}
