//! Stream, recording, and transition lifecycle orchestration.
//!
//! Maps validated requests onto registry mutations plus their timed
//! follow-ups: the delayed starting/stopping transitions, the
//! grace-period removals, and the simulator arming. Both the HTTP
//! handlers and the WebSocket command dispatch call through here so the
//! two boundaries cannot drift apart.
//!
//! Every follow-up re-checks entity state by sending a fresh registry
//! command when its timer fires; nothing holds registry state across an
//! await.

use std::time::Duration;

use tokio::time::sleep;

use visionmix_core::{Recording, RecordingConfig, RecordingId, Stream, StreamConfig, StreamId};
use visionmix_protocol::{Transition, TransitionRequest};

use crate::registry::{RegistryError, RegistryHandle};
use crate::simulator::{
    spawn_recording_simulator, spawn_stream_simulator, SimulatedRecordingMetrics,
    SimulatedStreamMetrics,
};

/// Delay between stream creation and the `running` transition.
pub const STREAM_START_DELAY: Duration = Duration::from_secs(1);

/// Delay between a stop request and the `stopped` transition.
pub const STREAM_STOP_DELAY: Duration = Duration::from_secs(1);

/// How long a stopped stream stays listed before removal.
pub const STREAM_REMOVE_GRACE: Duration = Duration::from_secs(5);

/// How long a stopped recording stays listed before removal.
pub const RECORDING_RETENTION: Duration = Duration::from_secs(30);

/// Starts a stream.
///
/// The stream is stored in `starting` state and returned immediately;
/// its id is valid before the resource is actually running. After
/// [`STREAM_START_DELAY`] the status advances to `running`,
/// `stream_started` goes out, and the stats simulator is armed. If the
/// stream was stopped in the meantime the delayed transition is a no-op
/// and no simulator starts.
pub async fn start_stream(
    registry: &RegistryHandle,
    config: StreamConfig,
) -> Result<Stream, RegistryError> {
    let stream = registry.create_stream(config).await?;

    let registry = registry.clone();
    let id = stream.id.clone();
    tokio::spawn(async move {
        sleep(STREAM_START_DELAY).await;
        if registry.mark_stream_running(id.clone()).await {
            spawn_stream_simulator(registry, id, SimulatedStreamMetrics::new());
        }
    });

    Ok(stream)
}

/// Stops a stream.
///
/// Fails with [`RegistryError::StreamNotFound`] for unknown ids. The
/// status moves to `stopping` immediately; after [`STREAM_STOP_DELAY`]
/// it reaches `stopped` and `stream_stopped` goes out with the computed
/// duration; after a further [`STREAM_REMOVE_GRACE`] the entry is
/// removed. Repeated stops of the same stream do not re-arm the timers.
pub async fn stop_stream(registry: &RegistryHandle, id: StreamId) -> Result<(), RegistryError> {
    let initiated = registry.begin_stop_stream(id.clone()).await?;
    if !initiated {
        return Ok(());
    }

    let registry = registry.clone();
    tokio::spawn(async move {
        sleep(STREAM_STOP_DELAY).await;
        registry.finish_stop_stream(id.clone()).await;

        sleep(STREAM_REMOVE_GRACE).await;
        registry.remove_stream(id).await;
    });

    Ok(())
}

/// Starts a recording.
///
/// Unlike streams there is no startup phase: the recording is stored in
/// `recording` state, `recording_started` goes out synchronously, and
/// the file-growth simulator is armed immediately.
pub async fn start_recording(
    registry: &RegistryHandle,
    config: RecordingConfig,
) -> Result<Recording, RegistryError> {
    let recording = registry.start_recording(config).await?;

    spawn_recording_simulator(
        registry.clone(),
        recording.id.clone(),
        SimulatedRecordingMetrics::new(),
    );

    Ok(recording)
}

/// Stops a recording, freezing its simulated file info, and schedules
/// removal of the entry after [`RECORDING_RETENTION`].
pub async fn stop_recording(
    registry: &RegistryHandle,
    id: RecordingId,
) -> Result<Recording, RegistryError> {
    let recording = registry.stop_recording(id.clone()).await?;

    let registry = registry.clone();
    tokio::spawn(async move {
        sleep(RECORDING_RETENTION).await;
        registry.remove_recording(id).await;
    });

    Ok(recording)
}

/// Performs a scene transition.
///
/// Both scene ids are validated before any event goes out; unknown ids
/// fail with [`RegistryError::SceneNotFound`]. `transition_started` is
/// broadcast immediately and `transition_completed` after the requested
/// duration, both carrying the same correlation payload.
pub async fn perform_transition(
    registry: &RegistryHandle,
    request: TransitionRequest,
) -> Result<Transition, RegistryError> {
    let transition = registry.begin_transition(request).await?;

    let registry = registry.clone();
    let pending = transition.clone();
    tokio::spawn(async move {
        sleep(Duration::from_millis(pending.duration)).await;
        registry.complete_transition(pending).await;
    });

    Ok(transition)
}
