//! Safety layer: validates write parameters before anything reaches the device.
//!
//! The firmware stores profile and stage indices straight into its tables, so
//! out-of-range values are rejected here, before any HID communication.
//!
//! ## Bounds
//! - **Profiles**: 6 (ids 0–5), matching the enable bitmask at config byte 2
//! - **DPI stages**: 8 (0–7), one per DPI indicator LED field
//! - **Bulk blobs**: exactly 128 bytes

use crate::error::{Error, Result};

/// Number of on-device profiles.
pub const PROFILE_COUNT: u8 = 6;
/// Number of DPI stages per profile.
pub const DPI_STAGE_COUNT: u8 = 8;
/// Size of every bulk blob.
pub const BLOB_LEN: usize = 0x80;

/// Warning to show before commands that can leave the mouse unusable.
pub const BOOTLOADER_WARNING: &str = "\
WARNING: this switches the mouse into its firmware bootloader. It will stop \
acting as a mouse until new firmware is flashed or it is power-cycled.";

/// Validate an index against an exclusive upper bound.
pub fn validate_index(field: &'static str, index: usize, count: usize) -> Result<()> {
    if index >= count {
        return Err(Error::OutOfRange {
            field,
            value: index as u32,
            min: 0,
            max: count.saturating_sub(1) as u32,
        });
    }
    Ok(())
}

/// Validate a profile id (0-based).
pub fn validate_profile_id(profile_id: u8) -> Result<()> {
    validate_index("profile_id", profile_id as usize, PROFILE_COUNT as usize)
}

/// Validate a DPI stage (0-based).
pub fn validate_dpi_stage(stage: u8) -> Result<()> {
    validate_index("dpi_stage", stage as usize, DPI_STAGE_COUNT as usize)
}

/// Validate the length of a blob about to be written.
pub fn validate_blob_len(data: &[u8]) -> Result<()> {
    if data.len() != BLOB_LEN {
        return Err(Error::SizeError {
            expected: BLOB_LEN,
            got: data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_ids_in_range() {
        for id in 0..PROFILE_COUNT {
            assert!(validate_profile_id(id).is_ok());
        }
    }

    #[test]
    fn profile_id_out_of_range() {
        let err = validate_profile_id(6).unwrap_err();
        assert!(matches!(
            err,
            Error::OutOfRange {
                field: "profile_id",
                value: 6,
                max: 5,
                ..
            }
        ));
    }

    #[test]
    fn dpi_stage_bounds() {
        assert!(validate_dpi_stage(7).is_ok());
        assert!(validate_dpi_stage(8).is_err());
    }

    #[test]
    fn blob_len_must_be_exact() {
        assert!(validate_blob_len(&[0; 0x80]).is_ok());
        assert!(matches!(
            validate_blob_len(&[0; 0x7F]),
            Err(Error::SizeError {
                expected: 0x80,
                got: 0x7F
            })
        ));
        assert!(validate_blob_len(&[0; 0x81]).is_err());
    }

    #[test]
    fn bootloader_warning_not_empty() {
        assert!(BOOTLOADER_WARNING.contains("WARNING"));
    }
}
