//! Hardware device descriptions.
//!
//! Devices come out of the (simulated) detection routine. Once registered
//! they are read-only: a scan may append new devices but never mutates or
//! removes existing entries.

use crate::DeviceId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of capture endpoint a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeviceKind {
    /// PCIe/Thunderbolt capture card with SDI ports.
    CaptureCard,
    /// Network video source reachable by address (NDI-style).
    NetworkSource,
    /// USB camera.
    UsbCamera,
}

impl DeviceKind {
    /// Human-readable name for logs and UI.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CaptureCard => "Capture card",
            Self::NetworkSource => "Network source",
            Self::UsbCamera => "USB camera",
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Connection state reported for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Physically attached and usable.
    Connected,
    /// Reachable on the network but not in use.
    Available,
    /// Newly found by a scan, not yet probed.
    Detected,
}

/// A detected or simulated hardware capture endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    #[serde(rename = "type")]
    pub kind: DeviceKind,
    pub name: String,
    pub status: DeviceStatus,
    /// Model string for capture cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Network address for network sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Physical input/output ports, in device order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// Supported capture formats (e.g. "1080p50").
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub formats: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization_is_kebab_case() {
        let json = serde_json::to_string(&DeviceKind::CaptureCard).unwrap();
        assert_eq!(json, "\"capture-card\"");

        let json = serde_json::to_string(&DeviceKind::UsbCamera).unwrap();
        assert_eq!(json, "\"usb-camera\"");
    }

    #[test]
    fn test_device_wire_shape() {
        let device = Device {
            id: DeviceId::new("device_capture_1"),
            kind: DeviceKind::CaptureCard,
            name: "DeckLink SDI".to_string(),
            status: DeviceStatus::Connected,
            model: Some("DeckLink SDI 4K".to_string()),
            address: None,
            ports: vec!["SDI 1".to_string(), "SDI 2".to_string()],
            formats: vec!["1080p50".to_string()],
            resolution: None,
            fps: None,
        };

        let value = serde_json::to_value(&device).unwrap();
        assert_eq!(value["type"], "capture-card");
        assert_eq!(value["status"], "connected");
        assert_eq!(value["ports"][0], "SDI 1");
        // absent optionals are omitted, not null
        assert!(value.get("address").is_none());
    }
}
