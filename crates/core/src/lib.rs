//! tm155-core: TM155 command protocol, bulk transfers, and button actions.
//!
//! This crate holds the device logic for configuring the TM155 gaming mouse
//! over its vendor HID interfaces. It talks to the hardware only through
//! [`transport::HidTransport`], so everything here runs against a mock in tests.

pub mod action;
pub mod bulk;
pub mod buttons;
pub mod command;
pub mod config;
pub mod device;
pub mod dpi;
pub mod error;
#[cfg(test)]
mod integration_tests;
pub mod keys;
pub mod lighting;
pub mod notify;
pub mod profile;
pub mod report_rate;
pub mod safety;
pub mod system;
pub mod transport;

/// TM155 USB Vendor ID.
pub const TM155_VID: u16 = 0x04D9;

/// TM155 USB Product ID.
pub const TM155_PID: u16 = 0xA118;
