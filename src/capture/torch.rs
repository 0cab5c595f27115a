// SPDX-License-Identifier: GPL-3.0-only

//! Hardware torch LED control via Linux sysfs
//!
//! Discovers and controls flash LEDs exposed at `/sys/class/leds/*:flash`.
//! Uses torch mode (brightness file) which is group-writable by `feedbackd`,
//! avoiding the root-only `flash_strobe`/`flash_brightness` interface.

use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A torch-capable LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct TorchDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Human-readable name (directory basename)
    name: String,
}

impl TorchDevice {
    /// Scan `/sys/class/leds/` for entries matching `*:flash` and return
    /// all devices that we can write to.
    pub fn discover() -> Vec<TorchDevice> {
        Self::discover_in(Path::new("/sys/class/leds"))
    }

    fn discover_in(leds_dir: &Path) -> Vec<TorchDevice> {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            warn!("Cannot read {} — torch discovery skipped", leds_dir.display());
            return Vec::new();
        };

        let mut devices: Vec<TorchDevice> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name();
                let name = file_name.to_str()?.to_string();
                // Entries look like "white:flash", "yellow:flash"
                if !name.ends_with(":flash") {
                    return None;
                }
                match TorchDevice::open(entry.path(), name) {
                    Ok(device) => Some(device),
                    Err(e) => {
                        warn!(error = %e, "Skipping flash LED");
                        None
                    }
                }
            })
            .collect();

        // Sort by name for deterministic ordering (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));
        devices
    }

    /// Open one LED directory, verifying it is usable as a torch
    fn open(path: PathBuf, name: String) -> io::Result<TorchDevice> {
        let raw = std::fs::read_to_string(path.join("max_brightness"))?;
        let max_brightness: u32 = raw
            .trim()
            .parse()
            .map_err(|_| io::Error::other(format!("bad max_brightness in {}", path.display())))?;
        if max_brightness == 0 {
            return Err(io::Error::other(format!(
                "{} reports zero max_brightness",
                path.display()
            )));
        }

        // Writable check up front; brightness is group-writable by feedbackd
        std::fs::OpenOptions::new()
            .write(true)
            .open(path.join("brightness"))?;

        info!(name = %name, max_brightness, "Discovered torch LED");
        Ok(TorchDevice {
            path,
            max_brightness,
            name,
        })
    }

    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    /// Turn the LED fully on (torch mode)
    pub fn on(&self) -> io::Result<()> {
        self.set_brightness(self.max_brightness)
    }

    /// Turn off the LED
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }
}

/// Torch state across all discovered LEDs
///
/// A device without any torch LED is valid; toggling is then a no-op and the
/// reported state stays off.
#[derive(Debug, Default)]
pub struct TorchControl {
    devices: Vec<TorchDevice>,
    enabled: bool,
}

impl TorchControl {
    pub fn discover() -> TorchControl {
        TorchControl {
            devices: TorchDevice::discover(),
            enabled: false,
        }
    }

    /// Whether the hardware has any controllable torch LED
    pub fn available(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Whether the torch is currently on
    pub fn is_on(&self) -> bool {
        self.enabled
    }

    /// Switch the torch on or off; returns the resulting state.
    ///
    /// No-op when the hardware lacks a torch.
    pub fn set(&mut self, on: bool) -> bool {
        if self.devices.is_empty() {
            return false;
        }

        for dev in &self.devices {
            let result = if on { dev.on() } else { dev.off() };
            if let Err(e) = result {
                warn!(device = %dev.name, error = %e, "Failed to switch torch LED");
            }
        }
        self.enabled = on;
        self.enabled
    }

    /// Toggle the torch; returns the resulting state
    pub fn toggle(&mut self) -> bool {
        let next = !self.enabled;
        self.set(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_without_hardware_is_noop() {
        let mut torch = TorchControl::default();
        assert!(!torch.available());
        assert!(!torch.toggle());
        assert!(!torch.is_on());
    }

    #[test]
    fn test_discover_in_missing_dir() {
        let devices = TorchDevice::discover_in(Path::new("/nonexistent/leds"));
        assert!(devices.is_empty());
    }
}
