//! Per-profile configuration blob.
//!
//! The blob is 128 bytes read with 0x8C and written with 0x0C. Only a handful
//! of fields are understood; every other byte is carried through untouched so
//! a read-modify-write never disturbs settings this crate does not model.
//!
//! Layout:
//!   - 0x02        profile-enable bitmask (bit i = profile i)
//!   - 0x10..0x18  DPI indicator LED segments, one byte per stage (bits 0..3)
//!   - 0x18..0x27  five RGB triples
//!   - 0x40        report-rate disable bitmask (see [`ReportRate::disable_bit`])

use crate::bulk::{request_blob, write_blob, BulkReader, DumpRegion, Pacer, PendingRead};
use crate::error::{Error, Result};
use crate::report_rate::ReportRate;
use crate::safety::{self, BLOB_LEN, DPI_STAGE_COUNT, PROFILE_COUNT};
use crate::transport::HidTransport;
use serde::{Deserialize, Serialize};
use tracing::info;

const PROFILE_ENABLE_OFFSET: usize = 0x02;
const DPI_LED_OFFSET: usize = 0x10;
const RGB_OFFSET: usize = 0x18;
const REPORT_RATE_DISABLE_OFFSET: usize = 0x40;

/// Number of RGB colour slots.
pub const RGB_SLOTS: usize = 5;
/// Bits of a DPI LED field that map to real segments.
pub const DPI_LED_MASK: u8 = 0x0F;

/// An RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `RRGGBB`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl std::fmt::Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// The 128-byte configuration blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlob([u8; BLOB_LEN]);

impl ConfigBlob {
    pub fn from_bytes(bytes: [u8; BLOB_LEN]) -> Self {
        Self(bytes)
    }

    /// Copy a blob out of a bulk read payload.
    pub fn from_slice(data: &[u8]) -> Result<Self> {
        let bytes: [u8; BLOB_LEN] = data.try_into().map_err(|_| Error::SizeError {
            expected: BLOB_LEN,
            got: data.len(),
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; BLOB_LEN] {
        &self.0
    }

    pub fn rgb(&self, slot: usize) -> Result<Rgb> {
        safety::validate_index("rgb_slot", slot, RGB_SLOTS)?;
        let at = RGB_OFFSET + 3 * slot;
        Ok(Rgb::new(self.0[at], self.0[at + 1], self.0[at + 2]))
    }

    pub fn set_rgb(&mut self, slot: usize, color: Rgb) -> Result<()> {
        safety::validate_index("rgb_slot", slot, RGB_SLOTS)?;
        let at = RGB_OFFSET + 3 * slot;
        self.0[at..at + 3].copy_from_slice(&[color.r, color.g, color.b]);
        Ok(())
    }

    /// LED segments lit for DPI stage `stage`.
    pub fn dpi_led(&self, stage: usize) -> Result<u8> {
        safety::validate_index("dpi_stage", stage, DPI_STAGE_COUNT as usize)?;
        Ok(self.0[DPI_LED_OFFSET + stage] & DPI_LED_MASK)
    }

    /// Set the LED segments for a stage. Only the low four bits are written.
    pub fn set_dpi_led(&mut self, stage: usize, segments: u8) -> Result<()> {
        safety::validate_index("dpi_stage", stage, DPI_STAGE_COUNT as usize)?;
        let byte = &mut self.0[DPI_LED_OFFSET + stage];
        *byte = (*byte & !DPI_LED_MASK) | (segments & DPI_LED_MASK);
        Ok(())
    }

    pub fn profile_enabled(&self, profile: usize) -> Result<bool> {
        safety::validate_index("profile_id", profile, PROFILE_COUNT as usize)?;
        Ok(self.0[PROFILE_ENABLE_OFFSET] & (1 << profile) != 0)
    }

    pub fn set_profile_enabled(&mut self, profile: usize, enabled: bool) -> Result<()> {
        safety::validate_index("profile_id", profile, PROFILE_COUNT as usize)?;
        set_bit(&mut self.0[PROFILE_ENABLE_OFFSET], 1 << profile, enabled);
        Ok(())
    }

    pub fn report_rate_disabled(&self, rate: ReportRate) -> bool {
        self.0[REPORT_RATE_DISABLE_OFFSET] & rate.disable_bit() != 0
    }

    pub fn set_report_rate_disabled(&mut self, rate: ReportRate, disabled: bool) {
        set_bit(
            &mut self.0[REPORT_RATE_DISABLE_OFFSET],
            rate.disable_bit(),
            disabled,
        );
    }

    /// Summary of the understood fields, for display.
    pub fn summary(&self) -> ConfigSummary {
        let bytes = &self.0;
        ConfigSummary {
            profiles_enabled: (0..PROFILE_COUNT as usize)
                .filter(|&p| bytes[PROFILE_ENABLE_OFFSET] & (1 << p) != 0)
                .collect(),
            dpi_leds: (0..DPI_STAGE_COUNT as usize)
                .map(|s| bytes[DPI_LED_OFFSET + s] & DPI_LED_MASK)
                .collect(),
            colors: (0..RGB_SLOTS)
                .map(|i| {
                    let at = RGB_OFFSET + 3 * i;
                    Rgb::new(bytes[at], bytes[at + 1], bytes[at + 2])
                })
                .collect(),
            report_rates_disabled: ReportRate::ALL
                .iter()
                .copied()
                .filter(|r| self.report_rate_disabled(*r))
                .collect(),
        }
    }
}

/// Decoded view of a [`ConfigBlob`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    pub profiles_enabled: Vec<usize>,
    pub dpi_leds: Vec<u8>,
    pub colors: Vec<Rgb>,
    pub report_rates_disabled: Vec<ReportRate>,
}

fn set_bit(byte: &mut u8, mask: u8, on: bool) {
    if on {
        *byte |= mask;
    } else {
        *byte &= !mask;
    }
}

/// Queue a read of a profile's config blob.
pub fn request_config(
    reader: &mut BulkReader,
    transport: &dyn HidTransport,
    profile_id: u8,
) -> Result<PendingRead> {
    safety::validate_profile_id(profile_id)?;
    Ok(request_blob(reader, transport, DumpRegion::Config, profile_id))
}

/// Write a profile's config blob.
pub fn write_config(
    transport: &dyn HidTransport,
    profile_id: u8,
    blob: &ConfigBlob,
    pacer: &dyn Pacer,
) -> Result<()> {
    safety::validate_profile_id(profile_id)?;
    info!(profile_id, "Writing config blob");
    write_blob(transport, DumpRegion::Config, profile_id, blob.as_bytes(), pacer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::testing::RecordingPacer;
    use crate::command::ids;
    use crate::transport::mock::MockTransport;

    fn patterned() -> ConfigBlob {
        let mut bytes = [0u8; BLOB_LEN];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = (i as u8).wrapping_mul(37).wrapping_add(11);
        }
        ConfigBlob::from_bytes(bytes)
    }

    #[test]
    fn set_rgb_touches_only_its_triple() {
        let before = patterned();
        let mut blob = before.clone();
        blob.set_rgb(2, Rgb::new(10, 20, 30)).unwrap();
        assert_eq!(blob.rgb(2).unwrap(), Rgb::new(10, 20, 30));

        let changed: Vec<usize> = (0..BLOB_LEN)
            .filter(|&i| blob.as_bytes()[i] != before.as_bytes()[i])
            .collect();
        assert!(changed.iter().all(|i| (0x1E..0x21).contains(i)));
        let untouched = (0..BLOB_LEN)
            .filter(|i| !(0x1E..0x21).contains(i))
            .filter(|&i| blob.as_bytes()[i] == before.as_bytes()[i])
            .count();
        assert_eq!(untouched, 125);
    }

    #[test]
    fn rgb_slot_out_of_range() {
        let mut blob = patterned();
        assert!(matches!(blob.rgb(5), Err(Error::OutOfRange { .. })));
        assert!(blob.set_rgb(5, Rgb::default()).is_err());
    }

    #[test]
    fn dpi_led_keeps_high_nibble() {
        let mut blob = ConfigBlob::from_bytes([0xF0; BLOB_LEN]);
        blob.set_dpi_led(3, 0xFA).unwrap();
        assert_eq!(blob.dpi_led(3).unwrap(), 0x0A);
        assert_eq!(blob.as_bytes()[0x13], 0xFA);
        assert!(blob.dpi_led(8).is_err());
    }

    #[test]
    fn profile_enable_bits() {
        let mut blob = ConfigBlob::from_bytes([0; BLOB_LEN]);
        blob.set_profile_enabled(0, true).unwrap();
        blob.set_profile_enabled(5, true).unwrap();
        assert_eq!(blob.as_bytes()[2], 0b0010_0001);
        blob.set_profile_enabled(0, false).unwrap();
        assert!(!blob.profile_enabled(0).unwrap());
        assert!(blob.profile_enabled(5).unwrap());
        assert!(blob.set_profile_enabled(6, true).is_err());
    }

    #[test]
    fn report_rate_disable_bits() {
        let mut blob = ConfigBlob::from_bytes([0; BLOB_LEN]);
        blob.set_report_rate_disabled(ReportRate::Hz125, true);
        blob.set_report_rate_disabled(ReportRate::Hz1000, true);
        assert_eq!(blob.as_bytes()[0x40], 0b0001_0001);
        assert!(blob.report_rate_disabled(ReportRate::Hz125));
        assert!(!blob.report_rate_disabled(ReportRate::Hz500));
        blob.set_report_rate_disabled(ReportRate::Hz125, false);
        assert_eq!(blob.as_bytes()[0x40], 0b0000_0001);
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(matches!(
            ConfigBlob::from_slice(&[0; 127]),
            Err(Error::SizeError {
                expected: 128,
                got: 127
            })
        ));
        assert!(ConfigBlob::from_slice(&[0; 128]).is_ok());
    }

    #[test]
    fn rgb_hex() {
        assert_eq!(Rgb::from_hex("#ff8000"), Some(Rgb::new(0xFF, 0x80, 0x00)));
        assert_eq!(Rgb::from_hex("00FF10"), Some(Rgb::new(0, 0xFF, 0x10)));
        assert_eq!(Rgb::from_hex("fff"), None);
        assert_eq!(Rgb::from_hex("zzzzzz"), None);
        // from_str_radix alone would take a sign on each channel
        assert_eq!(Rgb::from_hex("#+f+f+f"), None);
        assert_eq!(Rgb::new(1, 2, 255).to_string(), "#0102FF");
    }

    #[test]
    fn rgb_serializes_as_channels() {
        let json = serde_json::to_string(&Rgb::new(1, 2, 3)).unwrap();
        assert_eq!(json, r#"{"r":1,"g":2,"b":3}"#);
        let back: Rgb = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Rgb::new(1, 2, 3));
    }

    #[test]
    fn summary_lists_understood_fields() {
        let mut blob = ConfigBlob::from_bytes([0; BLOB_LEN]);
        blob.set_profile_enabled(1, true).unwrap();
        blob.set_rgb(4, Rgb::new(1, 2, 3)).unwrap();
        blob.set_report_rate_disabled(ReportRate::Hz250, true);
        let summary = blob.summary();
        assert_eq!(summary.profiles_enabled, vec![1]);
        assert_eq!(summary.dpi_leds, vec![0; 8]);
        assert_eq!(summary.colors[4], Rgb::new(1, 2, 3));
        assert_eq!(summary.report_rates_disabled, vec![ReportRate::Hz250]);
    }

    #[test]
    fn request_config_uses_profile_as_index() {
        let mock = MockTransport::new();
        mock.on_get(ids::READ_CONFIG, [3, 0, 0, 0, 0, 0], &[]);
        let mut reader = BulkReader::new();
        let _pending = request_config(&mut reader, &mock, 3).unwrap();
        assert_eq!(mock.feature_reports()[0][..2], [ids::READ_CONFIG, 3]);
        assert!(request_config(&mut reader, &mock, 6).is_err());
    }

    #[test]
    fn write_config_streams_two_blocks() {
        let mock = MockTransport::new();
        let pacer = RecordingPacer::default();
        write_config(&mock, 1, &patterned(), &pacer).unwrap();
        assert_eq!(mock.feature_reports()[0][..3], [ids::WRITE_CONFIG, 1, 0x80]);
        let blocks = mock.output_reports();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks.concat(), patterned().as_bytes().to_vec());
        assert_eq!(pacer.pauses().len(), 2);
    }
}
