//! DPI stage read/write.
//!
//! Commands:
//!   - 0x84 getDpiStage(profile) → reply[2] = stage
//!   - 0x04 setDpiStage(profile, stage)
//!
//! Stages are indices into the profile's DPI table, not DPI values.

use crate::command::ids;
use crate::error::Result;
use crate::safety;
use crate::transport::{get_command, set_command, HidTransport};
use tracing::debug;

/// Read the selected DPI stage of a profile.
pub fn read_dpi_stage(transport: &dyn HidTransport, profile_id: u8) -> Result<u8> {
    safety::validate_profile_id(profile_id)?;
    let reply = get_command(transport, ids::GET_DPI_STAGE, &[profile_id, 0, 0, 0, 0, 0])?;
    Ok(reply[2])
}

/// Select a DPI stage for a profile.
pub fn write_dpi_stage(transport: &dyn HidTransport, profile_id: u8, stage: u8) -> Result<()> {
    safety::validate_profile_id(profile_id)?;
    safety::validate_dpi_stage(stage)?;
    debug!(profile_id, stage, "Setting DPI stage");
    set_command(
        transport,
        ids::SET_DPI_STAGE,
        &[profile_id, stage, 0, 0, 0, 0],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build_frame;
    use crate::transport::mock::MockTransport;

    #[test]
    fn read_dpi_stage_uses_reply_byte_two() {
        let mock = MockTransport::new();
        mock.on_get(ids::GET_DPI_STAGE, [1, 0, 0, 0, 0, 0], &[1, 4]);
        assert_eq!(read_dpi_stage(&mock, 1).unwrap(), 4);
    }

    #[test]
    fn write_dpi_stage_sends_profile_then_stage() {
        let mock = MockTransport::new();
        write_dpi_stage(&mock, 3, 2).unwrap();
        assert_eq!(
            mock.feature_reports(),
            vec![build_frame(ids::SET_DPI_STAGE, &[3, 2, 0, 0, 0, 0]).to_vec()]
        );
    }

    #[test]
    fn write_dpi_stage_rejects_out_of_range() {
        let mock = MockTransport::new();
        // Validation rejects before HID communication
        assert!(write_dpi_stage(&mock, 0, 8).is_err());
        assert!(write_dpi_stage(&mock, 6, 0).is_err());
        assert!(mock.sent().is_empty());
    }
}
