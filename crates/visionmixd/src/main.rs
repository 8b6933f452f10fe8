//! VisionMix daemon - production switcher control backend
//!
//! Runs the HTTP API and WebSocket broadcast server for the switcher
//! front-end.
//!
//! # Usage
//!
//! ```bash
//! # Start the daemon (foreground)
//! visionmixd start
//!
//! # Start the daemon (background/daemonized)
//! visionmixd start -d
//!
//! # Stop the daemon
//! visionmixd stop
//!
//! # Check daemon status
//! visionmixd status
//!
//! # Custom listen address / settings path
//! VISIONMIX_ADDR=0.0.0.0:8080 VISIONMIX_CONFIG=/etc/visionmix.json visionmixd start
//!
//! # Enable debug logging
//! RUST_LOG=visionmixd=debug visionmixd start
//! ```
//!
//! # Signal Handling
//!
//! SIGTERM/SIGINT broadcast `server_shutdown`, close every client
//! channel, and stop the listener; the process force-exits if shutdown
//! takes longer than the grace timeout.

use std::env;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use visionmix_protocol::{ServerMessage, ServerPayload};
use visionmixd::config::{ConfigStore, DEFAULT_CONFIG_PATH};
use visionmixd::hub::{spawn_event_forwarder, spawn_liveness_sweep, BroadcastHub};
use visionmixd::registry::{spawn_registry, DeviceAnnouncement};
use visionmixd::server::{create_app, AppState};
use visionmixd::stats::spawn_usage_logger;
use visionmixd::{discovery, seed};

/// Default listen address. Override with `VISIONMIX_ADDR`.
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// How long a signal-triggered shutdown may take before the process
/// force-exits.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// VisionMix daemon - production switcher control backend
#[derive(Parser, Debug)]
#[command(name = "visionmixd", version, about)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the daemon
    Start {
        /// Run as a background daemon (fork to background)
        #[arg(short = 'd', long)]
        daemon: bool,
    },
    /// Stop the running daemon
    Stop,
    /// Show daemon status
    Status,
}

/// Returns the path to the PID file.
fn pid_file_path() -> PathBuf {
    let state_dir = dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("visionmix");
    state_dir.join("visionmixd.pid")
}

/// Returns the path to the log file used when daemonized.
fn log_file_path() -> PathBuf {
    let state_dir = dirs::state_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("visionmix");
    state_dir.join("visionmixd.log")
}

/// Reads the PID from the PID file, if it exists.
fn read_pid() -> Option<u32> {
    let path = pid_file_path();
    let mut file = File::open(&path).ok()?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

/// Writes the current PID to the PID file.
fn write_pid() -> Result<()> {
    let path = pid_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create state directory")?;
    }
    let mut file = File::create(&path).context("Failed to create PID file")?;
    write!(file, "{}", process::id()).context("Failed to write PID")?;
    Ok(())
}

/// Removes the PID file.
fn remove_pid_file() {
    let path = pid_file_path();
    let _ = fs::remove_file(path);
}

/// Checks if a process with the given PID is running.
fn is_process_running(pid: u32) -> bool {
    PathBuf::from(format!("/proc/{pid}")).exists()
}

/// Checks if the daemon is already running.
fn is_daemon_running() -> Option<u32> {
    if let Some(pid) = read_pid() {
        if is_process_running(pid) {
            return Some(pid);
        }
        // Stale PID file - remove it
        remove_pid_file();
    }
    None
}

/// Sends SIGTERM to the daemon process.
fn stop_daemon(pid: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let result = unsafe { libc::kill(pid as i32, libc::SIGTERM) };
        if result != 0 {
            bail!("Failed to send SIGTERM to process {}", pid);
        }
    }
    #[cfg(not(unix))]
    {
        bail!("Stop command is only supported on Unix systems");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let command = args.command.unwrap_or(Command::Start { daemon: false });

    match command {
        Command::Start { daemon } => {
            if let Some(pid) = is_daemon_running() {
                eprintln!("Daemon is already running (PID {pid})");
                eprintln!("Use 'visionmixd stop' to stop it first.");
                process::exit(1);
            }

            if daemon {
                // Daemonize before starting the tokio runtime
                daemonize()?;
            }

            write_pid()?;
            let result = run_daemon();
            remove_pid_file();
            result
        }
        Command::Stop => {
            if let Some(pid) = is_daemon_running() {
                println!("Stopping daemon (PID {pid})...");
                stop_daemon(pid)?;

                // Wait for the process to exit (up to 5 seconds)
                for _ in 0..50 {
                    if !is_process_running(pid) {
                        println!("Daemon stopped.");
                        return Ok(());
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }

                eprintln!("Daemon did not stop within 5 seconds.");
                process::exit(1);
            } else {
                println!("Daemon is not running.");
                Ok(())
            }
        }
        Command::Status => {
            if let Some(pid) = is_daemon_running() {
                println!("Daemon is running (PID {pid})");

                let addr =
                    env::var("VISIONMIX_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
                println!("Listening on: http://{addr} (WebSocket at /ws)");
                Ok(())
            } else {
                println!("Daemon is not running.");
                process::exit(1);
            }
        }
    }
}

/// Daemonizes the current process.
fn daemonize() -> Result<()> {
    use daemonize::Daemonize;

    let log_path = log_file_path();

    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }

    let stdout = File::create(&log_path).context("Failed to create log file for stdout")?;
    let stderr = File::create(&log_path).context("Failed to create log file for stderr")?;

    let daemonize = Daemonize::new()
        .working_directory(".")
        .stdout(stdout)
        .stderr(stderr);

    daemonize.start().context("Failed to daemonize")?;

    Ok(())
}

/// Runs the daemon (async entry point).
#[tokio::main]
async fn run_daemon() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("visionmixd=info".parse()?)
                .add_directive("visionmix_core=info".parse()?)
                .add_directive("visionmix_protocol=info".parse()?),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        pid = process::id(),
        "VisionMix daemon starting"
    );

    let addr = env::var("VISIONMIX_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let config_path =
        env::var("VISIONMIX_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let cancel_token = CancellationToken::new();

    // Registry actor plus the shared event channel
    let registry = spawn_registry();
    info!("Registry started");

    // Settings document (defaults when the file is missing)
    let config = Arc::new(ConfigStore::load(&config_path, registry.event_sender()));

    // Static seed: detected hardware, default scenes and sources
    if let Err(e) = registry
        .register_devices(discovery::detect_devices(), DeviceAnnouncement::Detected)
        .await
    {
        warn!(error = %e, "Hardware detection registration failed");
    }
    seed::load_initial_data(&registry).await;

    // Broadcast hub with its forwarder and liveness sweep
    let hub = BroadcastHub::new();
    spawn_event_forwarder(hub.clone(), registry.subscribe(), cancel_token.clone());
    spawn_liveness_sweep(hub.clone(), cancel_token.clone());

    // Background resource usage logging
    spawn_usage_logger(cancel_token.clone());

    let state = AppState::new(registry, hub.clone(), config);
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "Server listening (HTTP + WebSocket)");

    // Signal handling: announce the shutdown, close every client
    // channel, then let the listener drain.
    let shutdown_hub = hub.clone();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        if let Err(e) = wait_for_shutdown_signal().await {
            error!(error = %e, "Error waiting for shutdown signal");
        }
        info!("Shutdown signal received");

        shutdown_hub
            .broadcast(&ServerMessage::new(ServerPayload::ServerShutdown {
                message: "Server is shutting down".to_string(),
            }))
            .await;
        shutdown_hub.close_all().await;
        shutdown_token.cancel();
    });

    // Watchdog: force exit if graceful shutdown exceeds the grace
    // timeout. Dies with the process on a clean exit.
    let watchdog_token = cancel_token.clone();
    tokio::spawn(async move {
        watchdog_token.cancelled().await;
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        warn!("Shutdown grace period elapsed, forcing exit");
        process::exit(1);
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel_token.clone().cancelled_owned())
        .await
        .context("Server error")?;

    info!("VisionMix daemon stopped");
    Ok(())
}

/// Waits for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM");
            }
            _ = sigint.recv() => {
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Received Ctrl+C");
    }

    Ok(())
}
