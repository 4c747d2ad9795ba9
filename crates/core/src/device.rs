//! Device discovery.
//!
//! The mouse exposes two vendor-defined HID interfaces next to its ordinary
//! mouse interface: a control interface that takes feature and output reports
//! and streams bulk reads back as input reports, and a notify interface on
//! which the firmware announces changes made with the mouse's own buttons.

use crate::error::{Error, Result};
use crate::{TM155_PID, TM155_VID};
use serde::Serialize;
use tracing::{debug, info};

/// The vendor interfaces the tool talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interface {
    Control,
    Notify,
}

impl Interface {
    /// (usage page, usage) of the interface's top-level collection.
    pub fn usage(&self) -> (u16, u16) {
        match self {
            Self::Control => (0xFF00, 0xFF00),
            Self::Notify => (0xFF01, 0x0001),
        }
    }

    /// Classify a HID interface. `None` for anything that is not ours.
    pub fn classify(vid: u16, pid: u16, usage_page: u16, usage: u16) -> Option<Self> {
        if vid != TM155_VID || pid != TM155_PID {
            return None;
        }
        [Self::Control, Self::Notify]
            .into_iter()
            .find(|i| i.usage() == (usage_page, usage))
    }
}

/// A discovered TM155 interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub interface: Interface,
    pub path: String,
    pub serial: Option<String>,
}

/// Enumerate the TM155 interfaces currently attached.
pub fn discover_devices() -> Result<Vec<DeviceInfo>> {
    debug!("Starting HID device enumeration");
    let api = hidapi::HidApi::new()?;

    let mut devices = Vec::new();
    for info in api.device_list() {
        let Some(interface) = Interface::classify(
            info.vendor_id(),
            info.product_id(),
            info.usage_page(),
            info.usage(),
        ) else {
            continue;
        };
        info!(
            interface = ?interface,
            path = %info.path().to_string_lossy(),
            "Found TM155 interface"
        );
        devices.push(DeviceInfo {
            interface,
            path: info.path().to_string_lossy().into_owned(),
            serial: info.serial_number().map(|s| s.to_string()),
        });
    }

    debug!(count = devices.len(), "Device enumeration complete");
    Ok(devices)
}

fn find_interface(devices: &[DeviceInfo], interface: Interface) -> Result<&DeviceInfo> {
    devices
        .iter()
        .find(|d| d.interface == interface)
        .ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "no TM155 {interface:?} interface (VID 0x{TM155_VID:04X}, PID 0x{TM155_PID:04X})"
            ))
        })
}

/// Pick the control interface out of a discovery result.
pub fn find_control_interface(devices: &[DeviceInfo]) -> Result<&DeviceInfo> {
    find_interface(devices, Interface::Control)
}

/// Pick the notify interface out of a discovery result.
pub fn find_notify_interface(devices: &[DeviceInfo]) -> Result<&DeviceInfo> {
    find_interface(devices, Interface::Notify)
}
