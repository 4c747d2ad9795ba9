//! Report rate (polling rate) read/write.
//!
//! Commands:
//!   - 0x83 getReportRate(profile) → reply[2] = rate code
//!   - 0x03 setReportRate(profile, rate code)
//!
//! The rate code is the firmware's own selector and is passed through as-is.
//! Which rates a profile may cycle through is controlled separately by the
//! disable bitmask in the config blob (see [`crate::config::ConfigBlob`]).

use crate::command::ids;
use crate::error::Result;
use crate::safety;
use crate::transport::{get_command, set_command, HidTransport};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Polling rates the mouse supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ReportRate {
    Hz125 = 125,
    Hz250 = 250,
    Hz500 = 500,
    Hz1000 = 1000,
}

impl ReportRate {
    /// All supported rates.
    pub const ALL: &'static [ReportRate] = &[
        ReportRate::Hz125,
        ReportRate::Hz250,
        ReportRate::Hz500,
        ReportRate::Hz1000,
    ];

    /// Convert from raw Hz value.
    pub fn from_hz(hz: u16) -> Option<Self> {
        match hz {
            125 => Some(Self::Hz125),
            250 => Some(Self::Hz250),
            500 => Some(Self::Hz500),
            1000 => Some(Self::Hz1000),
            _ => None,
        }
    }

    /// Get the Hz value.
    pub fn as_hz(&self) -> u16 {
        *self as u16
    }

    /// Bit in the config blob's report-rate disable mask.
    pub fn disable_bit(&self) -> u8 {
        match self {
            Self::Hz1000 => 1 << 0,
            Self::Hz500 => 1 << 1,
            Self::Hz250 => 1 << 2,
            Self::Hz125 => 1 << 4,
        }
    }
}

impl std::fmt::Display for ReportRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.as_hz())
    }
}

/// Read the report rate code of a profile.
pub fn read_report_rate(transport: &dyn HidTransport, profile_id: u8) -> Result<u8> {
    safety::validate_profile_id(profile_id)?;
    let reply = get_command(
        transport,
        ids::GET_REPORT_RATE,
        &[profile_id, 0, 0, 0, 0, 0],
    )?;
    Ok(reply[2])
}

/// Write the report rate code of a profile.
pub fn write_report_rate(transport: &dyn HidTransport, profile_id: u8, rate: u8) -> Result<()> {
    safety::validate_profile_id(profile_id)?;
    debug!(profile_id, rate, "Setting report rate");
    set_command(
        transport,
        ids::SET_REPORT_RATE,
        &[profile_id, rate, 0, 0, 0, 0],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::build_frame;
    use crate::transport::mock::MockTransport;

    #[test]
    fn read_report_rate_returns_code() {
        let mock = MockTransport::new();
        mock.on_get(ids::GET_REPORT_RATE, [2, 0, 0, 0, 0, 0], &[2, 3]);
        assert_eq!(read_report_rate(&mock, 2).unwrap(), 3);
    }

    #[test]
    fn write_report_rate_frame() {
        let mock = MockTransport::new();
        write_report_rate(&mock, 0, 1).unwrap();
        assert_eq!(
            mock.feature_reports(),
            vec![build_frame(ids::SET_REPORT_RATE, &[0, 1, 0, 0, 0, 0]).to_vec()]
        );
    }

    #[test]
    fn write_report_rate_rejects_bad_profile() {
        let mock = MockTransport::new();
        assert!(write_report_rate(&mock, 9, 1).is_err());
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn rate_roundtrip() {
        for rate in ReportRate::ALL {
            assert_eq!(ReportRate::from_hz(rate.as_hz()), Some(*rate));
        }
    }

    #[test]
    fn rate_rejects_invalid() {
        assert_eq!(ReportRate::from_hz(200), None);
        assert_eq!(ReportRate::from_hz(0), None);
    }

    #[test]
    fn disable_bits_skip_bit_three() {
        let mask = ReportRate::ALL
            .iter()
            .fold(0u8, |acc, r| acc | r.disable_bit());
        assert_eq!(mask, 0b0001_0111);
    }
}
