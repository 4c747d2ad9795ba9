//! Firmware version, host flags, report clearing and bootloader control.

use crate::command::{ids, NO_ARGS};
use crate::error::Result;
use crate::transport::{get_command, set_command, HidTransport};
use serde::Serialize;
use tracing::{info, warn};

/// Flags the host writes after connecting to take over configuration.
pub const HOST_CONTROL_FLAGS: u8 = 0xFC;

const CLEAR_REPORTS_MAGIC: [u8; 6] = [0xAA, 0xCC, 0xEE, 0, 0, 0];
const BOOTLOADER_MAGIC: [u8; 6] = [0xAA, 0x55, 0xCC, 0x33, 0xBB, 0x99];

/// Firmware version as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Read the firmware version.
pub fn read_firmware_version(transport: &dyn HidTransport) -> Result<FirmwareVersion> {
    let reply = get_command(transport, ids::GET_FIRMWARE_VERSION, &NO_ARGS)?;
    Ok(FirmwareVersion {
        major: reply[1],
        minor: reply[2],
    })
}

/// Read the host flags byte.
pub fn read_flags(transport: &dyn HidTransport) -> Result<u8> {
    let reply = get_command(transport, ids::GET_FLAGS, &NO_ARGS)?;
    Ok(reply[1])
}

/// Write the host flags byte.
pub fn write_flags(transport: &dyn HidTransport, flags: u8) -> Result<()> {
    set_command(transport, ids::SET_FLAGS, &[flags, 0, 0, 0, 0, 0])
}

/// Put the device under host control. Done once after opening it.
pub fn claim_host_control(transport: &dyn HidTransport) -> Result<()> {
    info!(
        flags = format_args!("0x{:02X}", HOST_CONTROL_FLAGS),
        "Claiming host control"
    );
    write_flags(transport, HOST_CONTROL_FLAGS)
}

/// Discard any reports the device has queued.
pub fn clear_reports(transport: &dyn HidTransport) -> Result<()> {
    set_command(transport, ids::CLEAR_REPORTS, &CLEAR_REPORTS_MAGIC)
}

/// Reboot into the firmware bootloader.
pub fn activate_bootloader(transport: &dyn HidTransport) -> Result<()> {
    warn!("Activating bootloader");
    set_command(transport, ids::ACTIVATE_BOOTLOADER, &BOOTLOADER_MAGIC)
}

/// Whether the device is currently running its bootloader.
pub fn read_bootloader_state(transport: &dyn HidTransport) -> Result<bool> {
    let reply = get_command(transport, ids::GET_BOOTLOADER_STATE, &NO_ARGS)?;
    Ok(reply[1] == 0xFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build_frame;
    use crate::transport::mock::MockTransport;

    #[test]
    fn firmware_version_parses_major_minor() {
        let mock = MockTransport::new();
        mock.on_get(ids::GET_FIRMWARE_VERSION, NO_ARGS, &[1, 12]);
        let version = read_firmware_version(&mock).unwrap();
        assert_eq!(version, FirmwareVersion { major: 1, minor: 12 });
        assert_eq!(version.to_string(), "1.12");
    }

    #[test]
    fn flags_roundtrip_through_device() {
        let mock = MockTransport::new();
        mock.on_get(ids::GET_FLAGS, NO_ARGS, &[0xFC]);
        assert_eq!(read_flags(&mock).unwrap(), 0xFC);
    }

    #[test]
    fn claim_host_control_writes_fc() {
        let mock = MockTransport::new();
        claim_host_control(&mock).unwrap();
        assert_eq!(
            mock.feature_reports(),
            vec![build_frame(ids::SET_FLAGS, &[0xFC, 0, 0, 0, 0, 0]).to_vec()]
        );
    }

    #[test]
    fn clear_reports_sends_magic() {
        let mock = MockTransport::new();
        clear_reports(&mock).unwrap();
        assert_eq!(
            mock.feature_reports(),
            vec![vec![0x08, 0xAA, 0xCC, 0xEE, 0, 0, 0, 0x93]]
        );
    }

    #[test]
    fn activate_bootloader_sends_magic() {
        let mock = MockTransport::new();
        activate_bootloader(&mock).unwrap();
        assert_eq!(
            mock.feature_reports(),
            vec![vec![0x0A, 0xAA, 0x55, 0xCC, 0x33, 0xBB, 0x99, 0xA3]]
        );
    }

    #[test]
    fn bootloader_state_requires_ff() {
        let mock = MockTransport::new();
        mock.on_get(ids::GET_BOOTLOADER_STATE, NO_ARGS, &[0xFF]);
        assert!(read_bootloader_state(&mock).unwrap());

        let mock = MockTransport::new();
        mock.on_get(ids::GET_BOOTLOADER_STATE, NO_ARGS, &[0xFE]);
        assert!(!read_bootloader_state(&mock).unwrap());
    }
}
