//! HID transport abstraction and the synchronous command channel.
//!
//! Real HID devices and the test mock share the same [`HidTransport`] trait.
//! Input reports are not part of the trait: whoever owns the device reads
//! them and pushes them into [`crate::bulk::BulkReader::handle_input_report`].

use crate::command::{self, Args, FRAME_LEN, REPORT_ID};
use crate::error::Result;
use tracing::{trace, warn};

/// Abstraction over raw HID report I/O on the control interface.
pub trait HidTransport: Send {
    /// Send a feature report.
    fn send_feature_report(&self, data: &[u8], report_id: u8) -> Result<()>;

    /// Read back a feature report.
    fn get_feature_report(&self, report_id: u8) -> Result<Vec<u8>>;

    /// Send an output report.
    fn send_output_report(&self, data: &[u8], report_id: u8) -> Result<()>;
}

/// Send a set command. The device does not reply.
///
/// # Panics
///
/// If `id` has the get bit set.
pub fn set_command(transport: &dyn HidTransport, id: u8, args: &Args) -> Result<()> {
    assert!(!command::is_get(id), "set command 0x{id:02X} has the get bit set");
    let frame = command::build_frame(id, args);
    trace!(frame_hex = format_args!("{:02X?}", frame), "TM155 TX set");
    transport.send_feature_report(&frame, REPORT_ID)
}

/// Send a get command and return the device's reply frame.
///
/// # Panics
///
/// If `id` does not have the get bit set.
pub fn get_command(transport: &dyn HidTransport, id: u8, args: &Args) -> Result<[u8; FRAME_LEN]> {
    assert!(command::is_get(id), "get command 0x{id:02X} lacks the get bit");
    let frame = command::build_frame(id, args);
    trace!(frame_hex = format_args!("{:02X?}", frame), "TM155 TX get");
    transport.send_feature_report(&frame, REPORT_ID)?;

    let raw = transport.get_feature_report(REPORT_ID)?;
    trace!(
        reply_hex = format_args!("{:02X?}", raw),
        checksum_ok = command::reply_checksum_ok(&raw),
        "TM155 RX reply"
    );

    if let Err(e) = command::validate_reply(&raw, id) {
        warn!(id = format_args!("0x{:02X}", id), "reply id mismatch");
        return Err(e);
    }

    Ok(command::reply_frame(&raw))
}
