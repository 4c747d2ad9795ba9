//! Notifications from the notify interface.
//!
//! When the user changes a setting with the mouse's own buttons the firmware
//! sends an input report on the notify interface. Byte 1 says what changed.
//! Only the DPI stage notification is understood.

use serde::Serialize;

const KIND_DPI_STAGE: u8 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notification {
    /// The active DPI stage changed.
    DpiStage(u8),
    /// A notification kind this crate does not interpret.
    Other { kind: u8, data: Vec<u8> },
}

/// Parse a notify-interface input report. Reports too short to carry a kind
/// byte yield `None`.
pub fn parse_notification(report: &[u8]) -> Option<Notification> {
    let kind = *report.get(1)?;
    match (kind, report.get(3)) {
        (KIND_DPI_STAGE, Some(stage)) => Some(Notification::DpiStage(*stage)),
        _ => Some(Notification::Other {
            kind,
            data: report.to_vec(),
        }),
    }
}
