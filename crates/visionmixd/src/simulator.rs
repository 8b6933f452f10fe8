//! Periodic stat simulators for streams and recordings.
//!
//! Each active stream or recording gets its own tick task. On every tick
//! the task samples a metrics source and submits the result to the
//! registry; the registry answers whether the entity is still present
//! and active. A `false` answer ends the task silently: the entity
//! disappearing between ticks (concurrent stop or delete) is expected.
//!
//! Metric generation sits behind the [`StreamMetricsSource`] and
//! [`RecordingMetricsSource`] traits so a real telemetry provider (an
//! encoder, a capture card) could replace the simulated numbers without
//! touching the registry or hub contracts.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use visionmix_core::{
    RecordingId, RecordingSample, RecordingStats, StreamId, StreamStats, RECORDING_BYTES_PER_SEC,
};

use crate::registry::RegistryHandle;

/// Tick interval for stream stat updates.
pub const STREAM_STATS_INTERVAL: Duration = Duration::from_secs(2);

/// Tick interval for recording file growth.
pub const RECORDING_STATS_INTERVAL: Duration = Duration::from_secs(1);

/// Produces one stream stats sample per tick.
pub trait StreamMetricsSource: Send + 'static {
    fn sample(&mut self) -> StreamStats;
}

/// Produces one recording progress sample per tick.
pub trait RecordingMetricsSource: Send + 'static {
    fn sample(&mut self) -> RecordingSample;
}

/// Simulated stream telemetry.
///
/// Instantaneous values jitter inside fixed bands; dropped frames and
/// viewers accumulate across ticks.
pub struct SimulatedStreamMetrics {
    rng: StdRng,
    dropped_frames: u64,
    viewers: u64,
}

impl SimulatedStreamMetrics {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            dropped_frames: 0,
            viewers: 0,
        }
    }
}

impl Default for SimulatedStreamMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamMetricsSource for SimulatedStreamMetrics {
    fn sample(&mut self) -> StreamStats {
        self.dropped_frames += self.rng.random_range(0..3);
        self.viewers += self.rng.random_range(0..5);

        StreamStats {
            bitrate: 5_000_000.0 + self.rng.random_range(0.0..3_000_000.0),
            bitrate_video: 4_500_000.0 + self.rng.random_range(0.0..2_500_000.0),
            bitrate_audio: 192_000.0,
            fps: 50.0 + self.rng.random_range(0.0..10.0),
            dropped_frames: self.dropped_frames,
            viewers: self.viewers,
            latency: 100.0 + self.rng.random_range(0.0..200.0),
        }
    }
}

/// Simulated recording progress.
///
/// Counts its own ticks instead of reading the wall clock, so file
/// growth is exactly [`RECORDING_BYTES_PER_SEC`] x tick seconds per
/// tick, deterministic under test.
pub struct SimulatedRecordingMetrics {
    rng: StdRng,
    ticks: u64,
}

impl SimulatedRecordingMetrics {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            ticks: 0,
        }
    }
}

impl Default for SimulatedRecordingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingMetricsSource for SimulatedRecordingMetrics {
    fn sample(&mut self) -> RecordingSample {
        self.ticks += 1;
        let duration = self.ticks as f64 * RECORDING_STATS_INTERVAL.as_secs_f64();
        let fps = 50.0;

        RecordingSample {
            duration,
            size: (duration * RECORDING_BYTES_PER_SEC as f64) as u64,
            stats: RecordingStats {
                video_bitrate: 5_000_000.0 + self.rng.random_range(0.0..2_000_000.0),
                audio_bitrate: 192_000.0,
                fps,
                frame_count: (duration * fps) as u64,
            },
        }
    }
}

/// Spawns the stat tick task for a running stream.
///
/// The task ends as soon as the registry reports the stream gone or no
/// longer running.
pub fn spawn_stream_simulator(
    registry: RegistryHandle,
    id: StreamId,
    mut source: impl StreamMetricsSource,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(STREAM_STATS_INTERVAL);
        tick.tick().await; // the immediate first tick

        loop {
            tick.tick().await;
            let stats = source.sample();
            if !registry.apply_stream_stats(id.clone(), stats).await {
                debug!(stream_id = %id, "Stream simulator stopping");
                break;
            }
        }
    })
}

/// Spawns the file-growth tick task for an active recording.
pub fn spawn_recording_simulator(
    registry: RegistryHandle,
    id: RecordingId,
    mut source: impl RecordingMetricsSource,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(RECORDING_STATS_INTERVAL);
        tick.tick().await;

        loop {
            tick.tick().await;
            let sample = source.sample();
            if !registry.apply_recording_stats(id.clone(), sample).await {
                debug!(record_id = %id, "Recording simulator stopping");
                break;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_growth_is_deterministic_per_tick() {
        let mut source = SimulatedRecordingMetrics::new();

        let per_tick = RECORDING_BYTES_PER_SEC * RECORDING_STATS_INTERVAL.as_secs();
        for tick in 1..=5u64 {
            let sample = source.sample();
            assert_eq!(sample.size, tick * per_tick);
            assert_eq!(
                sample.duration,
                tick as f64 * RECORDING_STATS_INTERVAL.as_secs_f64()
            );
            assert_eq!(sample.stats.frame_count, (sample.duration * 50.0) as u64);
        }
    }

    #[test]
    fn test_stream_sample_stays_in_bands() {
        let mut source = SimulatedStreamMetrics::new();

        for _ in 0..50 {
            let stats = source.sample();
            assert!((5_000_000.0..8_000_000.0).contains(&stats.bitrate));
            assert!((4_500_000.0..7_000_000.0).contains(&stats.bitrate_video));
            assert_eq!(stats.bitrate_audio, 192_000.0);
            assert!((50.0..60.0).contains(&stats.fps));
            assert!((100.0..300.0).contains(&stats.latency));
        }
    }

    #[test]
    fn test_stream_counters_are_cumulative() {
        let mut source = SimulatedStreamMetrics::new();

        let mut last_dropped = 0;
        let mut last_viewers = 0;
        for _ in 0..50 {
            let stats = source.sample();
            assert!(stats.dropped_frames >= last_dropped);
            assert!(stats.viewers >= last_viewers);
            last_dropped = stats.dropped_frames;
            last_viewers = stats.viewers;
        }
    }
}
