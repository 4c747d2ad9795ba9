//! TM155 command framing.
//!
//! Every command is an 8-byte feature report on report ID 0:
//!
//! ```text
//! [id, a0, a1, a2, a3, a4, a5, checksum]
//! ```
//!
//! Bit 7 of `id` selects the direction: clear for "set" commands (no reply),
//! set for "get" commands (the device answers with a feature report whose
//! first byte echoes `id`).
//!
//! `checksum = (0xFF - id) - a0 - a1 - ... - a5`, all in wrapping u8 arithmetic.

use crate::error::{Error, Result};

/// Length of a command or reply frame.
pub const FRAME_LEN: usize = 8;
/// Number of argument bytes in a frame.
pub const ARG_COUNT: usize = 6;
/// Feature/output/input report ID used by the control interface.
pub const REPORT_ID: u8 = 0;
/// Bit that marks a get command.
pub const GET_FLAG: u8 = 0x80;

/// Command argument bytes.
pub type Args = [u8; ARG_COUNT];

/// All-zero argument block.
pub const NO_ARGS: Args = [0; ARG_COUNT];

/// Command IDs understood by the firmware.
pub mod ids {
    /// Flags (host control bits).
    pub const SET_FLAGS: u8 = 0x01;
    /// Active profile.
    pub const SET_PROFILE: u8 = 0x02;
    /// Report rate for a profile.
    pub const SET_REPORT_RATE: u8 = 0x03;
    /// DPI stage for a profile.
    pub const SET_DPI_STAGE: u8 = 0x04;
    /// Side light on/off.
    pub const SET_SIDE_LIGHT: u8 = 0x05;
    /// Clear pending reports.
    pub const CLEAR_REPORTS: u8 = 0x08;
    /// Blink the lights.
    pub const BLINK_LIGHTS: u8 = 0x09;
    /// Jump into the bootloader.
    pub const ACTIVATE_BOOTLOADER: u8 = 0x0A;
    /// Bulk write of a config blob.
    pub const WRITE_CONFIG: u8 = 0x0C;
    /// Bulk write of a button mapping blob.
    pub const WRITE_BUTTONS: u8 = 0x0D;
    /// Bulk write of the extra diagnostic block.
    pub const WRITE_EXTRA: u8 = 0x0F;

    pub const GET_FIRMWARE_VERSION: u8 = 0x80;
    pub const GET_FLAGS: u8 = 0x81;
    pub const GET_PROFILE: u8 = 0x82;
    pub const GET_REPORT_RATE: u8 = 0x83;
    pub const GET_DPI_STAGE: u8 = 0x84;
    pub const GET_SIDE_LIGHT: u8 = 0x85;
    pub const GET_BOOTLOADER_STATE: u8 = 0x8A;
    pub const READ_CONFIG: u8 = 0x8C;
    pub const READ_BUTTONS: u8 = 0x8D;
    pub const READ_EXTRA: u8 = 0x8F;
}

/// Whether `id` names a get command.
pub fn is_get(id: u8) -> bool {
    id & GET_FLAG != 0
}

/// Compute the frame checksum for `id` and `args`.
pub fn checksum(id: u8, args: &Args) -> u8 {
    args.iter()
        .fold(0xFFu8.wrapping_sub(id), |acc, &b| acc.wrapping_sub(b))
}

/// Build a complete command frame.
pub fn build_frame(id: u8, args: &Args) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0] = id;
    frame[1..=ARG_COUNT].copy_from_slice(args);
    frame[FRAME_LEN - 1] = checksum(id, args);
    frame
}

/// Check that a reply frame echoes the id of its request.
///
/// The reply's own checksum is not examined. See [`reply_checksum_ok`].
pub fn validate_reply(frame: &[u8], expected_id: u8) -> Result<()> {
    match frame.first() {
        Some(&got) if got == expected_id => Ok(()),
        Some(&got) => Err(Error::MismatchedReply {
            expected: expected_id,
            got,
        }),
        None => Err(Error::MismatchedReply {
            expected: expected_id,
            got: 0,
        }),
    }
}

/// Whether a full-length reply carries a checksum consistent with its bytes.
///
/// Diagnostic only; nothing in the request path rejects on this.
pub fn reply_checksum_ok(frame: &[u8]) -> bool {
    if frame.len() < FRAME_LEN {
        return false;
    }
    let mut args = NO_ARGS;
    args.copy_from_slice(&frame[1..=ARG_COUNT]);
    checksum(frame[0], &args) == frame[FRAME_LEN - 1]
}

/// Copy a reply into a fixed frame, zero-filling anything the device left out.
pub fn reply_frame(raw: &[u8]) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    let n = raw.len().min(FRAME_LEN);
    frame[..n].copy_from_slice(&raw[..n]);
    frame
}
