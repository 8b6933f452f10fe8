//! Timed lifecycle tests: delayed stream transitions, simulator ticks,
//! grace-period removals, and transition event timing.
//!
//! All tests run on a paused clock (`start_paused = true`), so the
//! one-second delays and multi-second retention windows elapse
//! instantly and deterministically.

use std::time::Duration;

use tokio::sync::broadcast::Receiver;
use tokio::time::sleep;

use visionmix_core::{
    RecordingConfig, RecordingStatus, SceneId, StreamConfig, StreamStatus,
    RECORDING_BYTES_PER_SEC,
};
use visionmix_protocol::{ServerMessage, ServerPayload, TransitionRequest};
use visionmixd::lifecycle;
use visionmixd::registry::{spawn_registry, RegistryError, RegistryHandle};
use visionmixd::seed;

fn drain(events: &mut Receiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = events.try_recv() {
        out.push(msg);
    }
    out
}

fn kinds(messages: &[ServerMessage]) -> Vec<&'static str> {
    messages.iter().map(|m| m.kind()).collect()
}

async fn stream_status(registry: &RegistryHandle, id: &visionmix_core::StreamId) -> Option<StreamStatus> {
    registry
        .list_streams()
        .await
        .into_iter()
        .find(|s| &s.id == id)
        .map(|s| s.status)
}

#[tokio::test(start_paused = true)]
async fn test_stream_start_returns_id_before_running() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let stream = lifecycle::start_stream(&registry, StreamConfig::default())
        .await
        .expect("start should succeed");

    // The id is valid and stored immediately, still starting.
    assert_eq!(
        stream_status(&registry, &stream.id).await,
        Some(StreamStatus::Starting)
    );
    assert!(kinds(&drain(&mut events)).is_empty());

    // After the fixed startup delay: running, started exactly once.
    sleep(lifecycle::STREAM_START_DELAY + Duration::from_millis(100)).await;
    assert_eq!(
        stream_status(&registry, &stream.id).await,
        Some(StreamStatus::Running)
    );
    let started: Vec<_> = kinds(&drain(&mut events))
        .into_iter()
        .filter(|k| *k == "stream_started")
        .collect();
    assert_eq!(started.len(), 1, "stream_started must broadcast exactly once");
}

#[tokio::test(start_paused = true)]
async fn test_stream_stats_tick_while_running() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let stream = lifecycle::start_stream(&registry, StreamConfig::default())
        .await
        .unwrap();

    // Startup delay plus two stat intervals.
    sleep(Duration::from_millis(5200)).await;

    let messages = drain(&mut events);
    let stats: Vec<_> = messages
        .iter()
        .filter_map(|m| match &m.payload {
            ServerPayload::StreamStats { stream_id, stats } => Some((stream_id, stats)),
            _ => None,
        })
        .collect();
    assert!(stats.len() >= 2, "expected at least two stat ticks, got {}", stats.len());
    for (stream_id, stats) in stats {
        assert_eq!(*stream_id, stream.id);
        assert!(stats.bitrate >= 5_000_000.0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_stream_stop_sequence_and_grace_removal() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let stream = lifecycle::start_stream(&registry, StreamConfig::default())
        .await
        .unwrap();
    sleep(Duration::from_millis(1100)).await;
    drain(&mut events);

    lifecycle::stop_stream(&registry, stream.id.clone())
        .await
        .expect("stop should succeed");
    assert_eq!(
        stream_status(&registry, &stream.id).await,
        Some(StreamStatus::Stopping)
    );

    // After the stop delay: stopped, with a duration on the event.
    sleep(lifecycle::STREAM_STOP_DELAY + Duration::from_millis(100)).await;
    assert_eq!(
        stream_status(&registry, &stream.id).await,
        Some(StreamStatus::Stopped)
    );
    let messages = drain(&mut events);
    let stopped: Vec<_> = messages
        .iter()
        .filter_map(|m| match &m.payload {
            ServerPayload::StreamStopped { stream_id, duration } => {
                Some((stream_id.clone(), *duration))
            }
            _ => None,
        })
        .collect();
    assert_eq!(stopped.len(), 1);
    assert_eq!(stopped[0].0, stream.id);
    assert!(stopped[0].1 >= 0.0);

    // After the grace window the entry is gone.
    sleep(lifecycle::STREAM_REMOVE_GRACE + Duration::from_millis(100)).await;
    assert_eq!(stream_status(&registry, &stream.id).await, None);

    // And nothing referencing the dead id is broadcast afterwards.
    sleep(Duration::from_secs(10)).await;
    let trailing = kinds(&drain(&mut events));
    assert!(
        !trailing.contains(&"stream_stats"),
        "no stat events after removal: {trailing:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_simulator_stops_after_stream_leaves_running() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let stream = lifecycle::start_stream(&registry, StreamConfig::default())
        .await
        .unwrap();
    sleep(Duration::from_millis(3200)).await; // running + one tick
    lifecycle::stop_stream(&registry, stream.id.clone())
        .await
        .unwrap();
    drain(&mut events);

    // Long after the stop, no further stream_stats may appear.
    sleep(Duration::from_secs(20)).await;
    let trailing = kinds(&drain(&mut events));
    assert!(
        !trailing.contains(&"stream_stats"),
        "simulator must cancel after stop: {trailing:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_running_skips_started_event() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let stream = lifecycle::start_stream(&registry, StreamConfig::default())
        .await
        .unwrap();

    // Stop while still starting.
    lifecycle::stop_stream(&registry, stream.id.clone())
        .await
        .unwrap();

    sleep(Duration::from_secs(8)).await;
    let observed = kinds(&drain(&mut events));
    assert!(!observed.contains(&"stream_started"), "got {observed:?}");
    assert!(observed.contains(&"stream_stopped"));
    assert_eq!(stream_status(&registry, &stream.id).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_stop_unknown_stream_fails_without_events() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let result =
        lifecycle::stop_stream(&registry, visionmix_core::StreamId::new("stream_missing")).await;
    assert!(matches!(result, Err(RegistryError::StreamNotFound(_))));
    assert!(drain(&mut events).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_recording_grows_by_throughput_per_tick() {
    let registry = spawn_registry();
    let mut events = registry.subscribe();

    let recording = lifecycle::start_recording(
        &registry,
        RecordingConfig {
            format: Some("mp4".to_string()),
            path: Some("./recordings".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("start should succeed");

    // Recording starts synchronously.
    assert_eq!(recording.status, RecordingStatus::Recording);
    assert_eq!(kinds(&drain(&mut events)), vec!["recording_started"]);

    // Three ticks of simulated growth.
    sleep(Duration::from_millis(3100)).await;

    let messages = drain(&mut events);
    let sizes: Vec<u64> = messages
        .iter()
        .filter_map(|m| match &m.payload {
            ServerPayload::RecordingStats { file_info, .. } => Some(file_info.size),
            _ => None,
        })
        .collect();
    assert_eq!(sizes.len(), 3);
    let per_tick = RECORDING_BYTES_PER_SEC; // one-second ticks
    assert_eq!(sizes, vec![per_tick, 2 * per_tick, 3 * per_tick]);

    // Stop freezes the file info.
    let stopped = lifecycle::stop_recording(&registry, recording.id.clone())
        .await
        .unwrap();
    assert_eq!(stopped.status, RecordingStatus::Stopped);
    assert_eq!(stopped.file_info.size, 3 * per_tick);
    assert_eq!(stopped.file_info.duration, 3.0);

    // No further growth after the stop.
    sleep(Duration::from_secs(5)).await;
    let trailing = kinds(&drain(&mut events));
    assert!(!trailing.contains(&"recording_stats"), "got {trailing:?}");

    let listed = registry
        .list_recordings()
        .await
        .into_iter()
        .find(|r| r.id == recording.id)
        .expect("still listed inside the retention window");
    assert_eq!(listed.file_info.size, 3 * per_tick);

    // The entry disappears after the retention window.
    sleep(lifecycle::RECORDING_RETENTION).await;
    assert!(registry
        .list_recordings()
        .await
        .iter()
        .all(|r| r.id != recording.id));
}

#[tokio::test(start_paused = true)]
async fn test_transition_timing_and_correlation() {
    let registry = spawn_registry();
    seed::load_initial_data(&registry).await;
    let mut events = registry.subscribe();

    lifecycle::perform_transition(
        &registry,
        TransitionRequest {
            kind: "fade".to_string(),
            from_scene: SceneId::new("scene_default_1"),
            to_scene: SceneId::new("scene_default_2"),
            duration: 500,
        },
    )
    .await
    .expect("transition should start");

    // Started immediately, not yet completed.
    let now = kinds(&drain(&mut events));
    assert_eq!(now, vec!["transition_started"]);

    sleep(Duration::from_millis(400)).await;
    assert!(kinds(&drain(&mut events)).is_empty(), "completed too early");

    sleep(Duration::from_millis(200)).await;
    let messages = drain(&mut events);
    assert_eq!(kinds(&messages), vec!["transition_completed"]);
    match &messages[0].payload {
        ServerPayload::TransitionCompleted { transition } => {
            assert_eq!(transition.kind, "fade");
            assert_eq!(transition.from_scene.as_str(), "scene_default_1");
            assert_eq!(transition.to_scene.as_str(), "scene_default_2");
            assert_eq!(transition.duration, 500);
            assert!(transition.completed_at.is_some());
        }
        other => panic!("expected TransitionCompleted, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_transition_with_unknown_scene_emits_nothing() {
    let registry = spawn_registry();
    seed::load_initial_data(&registry).await;
    let mut events = registry.subscribe();
    drain(&mut events);

    let result = lifecycle::perform_transition(
        &registry,
        TransitionRequest {
            kind: "fade".to_string(),
            from_scene: SceneId::new("scene_default_1"),
            to_scene: SceneId::new("scene_missing"),
            duration: 500,
        },
    )
    .await;
    assert!(matches!(result, Err(RegistryError::SceneNotFound(_))));

    sleep(Duration::from_secs(2)).await;
    assert!(drain(&mut events).is_empty());
}
