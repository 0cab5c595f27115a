// SPDX-License-Identifier: MPL-2.0

//! PipeWire device enumeration
//!
//! Discovers cameras and audio inputs by parsing `pw-dump` JSON output.
//! Camera position (front/back) comes from libcamera's location property
//! when present, falling back to a name heuristic for USB webcams.

use serde_json::Value;
use std::process::Command;
use tracing::{debug, warn};

use super::types::{CameraDescriptor, DevicePosition, MicrophoneDescriptor};
use crate::constants::zoom;

/// Enumerate available cameras using PipeWire
pub fn enumerate_cameras() -> Vec<CameraDescriptor> {
    let nodes = match dump_nodes() {
        Some(nodes) => nodes,
        None => return Vec::new(),
    };

    let mut cameras = Vec::new();

    for node in &nodes {
        let Some(props) = node_props(node) else {
            continue;
        };
        if props.get("media.class").and_then(|v| v.as_str()) != Some("Video/Source") {
            continue;
        }
        // Skip our own or other apps' virtual sources
        if props
            .get("media.role")
            .and_then(|v| v.as_str())
            .map(|role| role != "Camera")
            .unwrap_or(false)
        {
            continue;
        }

        let name = display_name(props);
        let serial = object_serial(props);
        let position = camera_position(props, &name);

        debug!(name = %name, serial = %serial, position = %position, "Found camera");

        cameras.push(CameraDescriptor {
            name,
            serial,
            position,
            max_zoom: zoom::DEFAULT_MAX_FACTOR,
        });
    }

    cameras
}

/// Enumerate available audio input devices using PipeWire
pub fn enumerate_microphones() -> Vec<MicrophoneDescriptor> {
    let nodes = match dump_nodes() {
        Some(nodes) => nodes,
        None => return Vec::new(),
    };

    let default_node_name = find_default_audio_source(&nodes);
    let mut devices = Vec::new();

    for node in &nodes {
        let Some(props) = node_props(node) else {
            continue;
        };
        if props.get("media.class").and_then(|v| v.as_str()) != Some("Audio/Source") {
            continue;
        }

        let name = display_name(props);
        let serial = object_serial(props);
        let node_name = props
            .get("node.name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let is_default = default_node_name.as_deref() == Some(node_name.as_str());

        debug!(name = %name, serial = %serial, is_default, "Found audio source");

        devices.push(MicrophoneDescriptor {
            name,
            serial,
            node_name,
            is_default,
        });
    }

    // Default device first so callers can take the front of the list
    devices.sort_by_key(|d| !d.is_default);
    devices
}

/// Pick the camera to open for a position, falling back to any camera
pub fn camera_for_position(
    cameras: &[CameraDescriptor],
    position: DevicePosition,
) -> Option<CameraDescriptor> {
    cameras
        .iter()
        .find(|c| c.position == position)
        .or_else(|| cameras.first())
        .cloned()
}

fn dump_nodes() -> Option<Vec<Value>> {
    let output = match Command::new("pw-dump").output() {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to run pw-dump: {}", e);
            return None;
        }
    };

    if !output.status.success() {
        warn!("pw-dump command failed");
        return None;
    }

    let stdout = match std::str::from_utf8(&output.stdout) {
        Ok(s) => s,
        Err(e) => {
            warn!("Failed to parse pw-dump output: {}", e);
            return None;
        }
    };

    match serde_json::from_str(stdout) {
        Ok(nodes) => Some(nodes),
        Err(e) => {
            warn!("Failed to parse JSON from pw-dump: {}", e);
            None
        }
    }
}

fn node_props(node: &Value) -> Option<&serde_json::Map<String, Value>> {
    node.get("info")?.get("props")?.as_object()
}

fn display_name(props: &serde_json::Map<String, Value>) -> String {
    props
        .get("node.nick")
        .or_else(|| props.get("node.description"))
        .or_else(|| props.get("node.name"))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown Device")
        .to_string()
}

/// `object.serial` may be emitted as a number or a string depending on the
/// PipeWire version
fn object_serial(props: &serde_json::Map<String, Value>) -> String {
    match props.get("object.serial") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => "0".to_string(),
    }
}

fn camera_position(props: &serde_json::Map<String, Value>, name: &str) -> DevicePosition {
    if let Some(location) = props
        .get("api.libcamera.location")
        .and_then(|v| v.as_str())
    {
        return match location {
            "front" => DevicePosition::Front,
            _ => DevicePosition::Back,
        };
    }

    let lower = name.to_lowercase();
    if lower.contains("front") || lower.contains("integrated") || lower.contains("facetime") {
        DevicePosition::Front
    } else {
        DevicePosition::Back
    }
}

/// First pass over the dump: the default audio source from session metadata
fn find_default_audio_source(nodes: &[Value]) -> Option<String> {
    for node in nodes {
        if node.get("type").and_then(|v| v.as_str()) != Some("PipeWire:Interface:Metadata") {
            continue;
        }
        let Some(props) = node.get("props") else {
            continue;
        };
        if props.get("metadata.name").and_then(|v| v.as_str()) != Some("default") {
            continue;
        }
        if let Some(metadata) = node.get("metadata").and_then(|v| v.as_array()) {
            for entry in metadata {
                let key = entry.get("key").and_then(|v| v.as_str());
                if key == Some("default.audio.source")
                    || key == Some("default.configured.audio.source")
                {
                    if let Some(name) = entry
                        .get("value")
                        .and_then(|v| v.get("name"))
                        .and_then(|v| v.as_str())
                    {
                        debug!(default_source = %name, "Found default audio source");
                        return Some(name.to_string());
                    }
                }
            }
        }
        break;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, Value)]) -> serde_json::Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_camera_position_from_libcamera_location() {
        let front = props(&[("api.libcamera.location", Value::from("front"))]);
        assert_eq!(camera_position(&front, "Camera"), DevicePosition::Front);

        let back = props(&[("api.libcamera.location", Value::from("back"))]);
        assert_eq!(camera_position(&back, "Camera"), DevicePosition::Back);
    }

    #[test]
    fn test_camera_position_name_heuristic() {
        let empty = props(&[]);
        assert_eq!(
            camera_position(&empty, "Integrated Webcam"),
            DevicePosition::Front
        );
        assert_eq!(
            camera_position(&empty, "USB Capture Device"),
            DevicePosition::Back
        );
    }

    #[test]
    fn test_object_serial_accepts_number_and_string() {
        let as_num = props(&[("object.serial", Value::from(42u64))]);
        assert_eq!(object_serial(&as_num), "42");

        let as_str = props(&[("object.serial", Value::from("77"))]);
        assert_eq!(object_serial(&as_str), "77");

        let missing = props(&[]);
        assert_eq!(object_serial(&missing), "0");
    }

    #[test]
    fn test_camera_for_position_falls_back() {
        let cameras = vec![CameraDescriptor {
            name: "Rear".to_string(),
            serial: "1".to_string(),
            position: DevicePosition::Back,
            max_zoom: 8.0,
        }];
        let chosen = camera_for_position(&cameras, DevicePosition::Front).unwrap();
        assert_eq!(chosen.name, "Rear");
        assert!(camera_for_position(&[], DevicePosition::Back).is_none());
    }
}
