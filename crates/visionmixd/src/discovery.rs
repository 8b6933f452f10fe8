//! Simulated hardware detection.
//!
//! Stands in for real capture hardware probing: startup detection
//! returns a fixed device set, and each on-demand scan "finds" one new
//! USB camera with a fresh id. The registry deduplicates by device id,
//! so repeating the startup detection is harmless.

use tracing::info;

use visionmix_core::{Device, DeviceId, DeviceKind, DeviceStatus};

/// Devices reported by the startup detection pass.
pub fn detect_devices() -> Vec<Device> {
    let devices = vec![
        Device {
            id: DeviceId::new("device_capture_1"),
            kind: DeviceKind::CaptureCard,
            name: "DeckLink SDI".to_string(),
            status: DeviceStatus::Connected,
            model: Some("DeckLink SDI 4K".to_string()),
            address: None,
            ports: vec![
                "SDI 1".to_string(),
                "SDI 2".to_string(),
                "SDI Out 1".to_string(),
                "SDI Out 2".to_string(),
            ],
            formats: vec![
                "1080p50".to_string(),
                "1080p60".to_string(),
                "4Kp30".to_string(),
            ],
            resolution: None,
            fps: None,
        },
        Device {
            id: DeviceId::new("device_net_1"),
            kind: DeviceKind::NetworkSource,
            name: "Network Source 1".to_string(),
            status: DeviceStatus::Available,
            model: None,
            address: Some("192.168.1.100".to_string()),
            ports: Vec::new(),
            formats: Vec::new(),
            resolution: Some("1920x1080".to_string()),
            fps: Some(30),
        },
        Device {
            id: DeviceId::new("device_usb_1"),
            kind: DeviceKind::UsbCamera,
            name: "USB Webcam".to_string(),
            status: DeviceStatus::Connected,
            model: None,
            address: None,
            ports: Vec::new(),
            formats: Vec::new(),
            resolution: Some("1280x720".to_string()),
            fps: Some(30),
        },
    ];

    info!(count = devices.len(), "Hardware detection complete");
    devices
}

/// Devices "found" by one on-demand scan.
///
/// Every scan yields a single newly detected USB camera with a fresh
/// unique id, so repeated scans keep growing the device list.
pub fn scan_devices() -> Vec<Device> {
    vec![Device {
        id: DeviceId::generate(),
        kind: DeviceKind::UsbCamera,
        name: "USB Camera".to_string(),
        status: DeviceStatus::Detected,
        model: None,
        address: None,
        ports: Vec::new(),
        formats: Vec::new(),
        resolution: Some("1920x1080".to_string()),
        fps: Some(30),
    }]
}
