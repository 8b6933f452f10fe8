//! Process resource monitoring.
//!
//! Backs the system stats endpoint and `get_status` channel message
//! with live memory/CPU numbers, and runs a background task that logs
//! the same samples periodically, warning when fixed thresholds are
//! exceeded.

use std::process;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Memory usage warning threshold in MB.
pub const HIGH_MEMORY_THRESHOLD_MB: u64 = 100;

/// CPU usage warning threshold (percentage).
pub const HIGH_CPU_THRESHOLD_PERCENT: f32 = 80.0;

/// How often the background task samples usage.
pub const USAGE_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// One usage sample for the daemon process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessUsage {
    pub memory_bytes: u64,
    pub memory_mb: u64,
    pub cpu_percent: f32,
}

impl ProcessUsage {
    pub fn memory_high(&self) -> bool {
        self.memory_mb > HIGH_MEMORY_THRESHOLD_MB
    }

    pub fn cpu_high(&self) -> bool {
        self.cpu_percent > HIGH_CPU_THRESHOLD_PERCENT
    }
}

/// Samples memory and CPU usage for the current process.
///
/// sysinfo needs a previous refresh as the CPU baseline, so the first
/// sample always reports 0% CPU.
pub struct SystemMonitor {
    system: System,
    pid: Pid,
}

impl SystemMonitor {
    pub fn new() -> Self {
        Self {
            system: System::new(),
            pid: Pid::from_u32(process::id()),
        }
    }

    /// Refreshes process information and returns the current sample.
    pub fn sample(&mut self) -> ProcessUsage {
        // refresh_all is required for the CPU percentage to be computed
        // against the previous refresh.
        self.system.refresh_all();

        let (memory_bytes, cpu_percent) = self
            .system
            .process(self.pid)
            .map(|p| (p.memory(), p.cpu_usage()))
            .unwrap_or((0, 0.0));

        ProcessUsage {
            memory_bytes,
            memory_mb: memory_bytes / 1024 / 1024,
            cpu_percent,
        }
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the periodic usage logger.
pub fn spawn_usage_logger(cancel_token: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut monitor = SystemMonitor::new();
        let mut tick = interval(USAGE_LOG_INTERVAL);

        // Establish the CPU baseline.
        let _ = monitor.sample();

        info!(
            interval_secs = USAGE_LOG_INTERVAL.as_secs(),
            "Usage logger started"
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    debug!("Usage logger shutting down");
                    break;
                }

                _ = tick.tick() => {
                    let usage = monitor.sample();
                    if usage.memory_high() {
                        warn!(
                            memory_mb = usage.memory_mb,
                            threshold_mb = HIGH_MEMORY_THRESHOLD_MB,
                            "Daemon memory usage above threshold"
                        );
                    } else if usage.cpu_high() {
                        warn!(
                            cpu_percent = format!("{:.1}", usage.cpu_percent),
                            threshold_percent = HIGH_CPU_THRESHOLD_PERCENT,
                            "Daemon CPU usage above threshold"
                        );
                    } else {
                        info!(
                            memory_mb = usage.memory_mb,
                            cpu_percent = format!("{:.1}", usage.cpu_percent),
                            "Daemon resource usage"
                        );
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usage_is_not_high() {
        let usage = ProcessUsage::default();
        assert!(!usage.memory_high());
        assert!(!usage.cpu_high());
    }

    #[test]
    fn test_thresholds() {
        let usage = ProcessUsage {
            memory_bytes: 200 * 1024 * 1024,
            memory_mb: 200,
            cpu_percent: 10.0,
        };
        assert!(usage.memory_high());
        assert!(!usage.cpu_high());

        let usage = ProcessUsage {
            memory_bytes: 10 * 1024 * 1024,
            memory_mb: 10,
            cpu_percent: 95.0,
        };
        assert!(!usage.memory_high());
        assert!(usage.cpu_high());
    }

    #[test]
    fn test_sample_reports_live_memory() {
        let mut monitor = SystemMonitor::new();
        let usage = monitor.sample();

        // The process is running, so it occupies some memory.
        assert!(usage.memory_bytes > 0);
        assert!(usage.cpu_percent >= 0.0);
    }
}
