//! Error types for tm155-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HID transport failure. `status` is the OS error code when one is known, -1 otherwise.
    #[error("HID I/O error (status {status}): {message}")]
    Io { status: i32, message: String },

    /// Reply frame did not echo the command id that was sent.
    #[error("mismatched reply: expected id 0x{expected:02X}, got 0x{got:02X}")]
    MismatchedReply { expected: u8, got: u8 },

    /// Blob length precondition violated.
    #[error("size error: expected {expected} bytes, got {got}")]
    SizeError { expected: usize, got: usize },

    /// Value out of safe range.
    #[error("value out of range: {field} = {value} (allowed {min}..={max})")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    /// Device not found during enumeration.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// A pending bulk read was dropped before it completed.
    #[error("bulk read cancelled before completion")]
    Cancelled,
}

impl Error {
    /// Wrap a transport failure that carries no OS status.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            status: -1,
            message: message.into(),
        }
    }
}

impl From<hidapi::HidError> for Error {
    fn from(err: hidapi::HidError) -> Self {
        let status = match &err {
            hidapi::HidError::IoError { error } => error.raw_os_error().unwrap_or(-1),
            _ => -1,
        };
        Self::Io {
            status,
            message: err.to_string(),
        }
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_helper_uses_unknown_status() {
        match Error::io("pipe broke") {
            Error::Io { status, message } => {
                assert_eq!(status, -1);
                assert_eq!(message, "pipe broke");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mismatched_reply_message_shows_ids() {
        let err = Error::MismatchedReply {
            expected: 0x82,
            got: 0x00,
        };
        assert_eq!(
            err.to_string(),
            "mismatched reply: expected id 0x82, got 0x00"
        );
    }
}
