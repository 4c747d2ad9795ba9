//! Button mapping blob.
//!
//! The blob is 128 bytes read with 0x8D and written with 0x0D: 32 slots of
//! four bytes, each one [`ButtonAction`] in wire form. Slots 0..16 hold the
//! primary action of each physical button; slot `index + 16` holds the action
//! used while the alternate button group is active.

use crate::action::ButtonAction;
use crate::bulk::{request_blob, write_blob, BulkReader, DumpRegion, Pacer, PendingRead};
use crate::error::{Error, Result};
use crate::safety::{self, BLOB_LEN};
use crate::transport::HidTransport;
use serde::Serialize;
use tracing::{debug, info};

/// Number of 4-byte slots in the blob.
pub const SLOT_COUNT: usize = 32;
/// Bytes per slot.
pub const SLOT_LEN: usize = 4;
/// Distance from a button's primary slot to its alternate-group slot.
pub const ALT_BUTTON_OFFSET: usize = 16;

/// A physical button and the slot its primary action lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhysicalButton {
    pub slot: usize,
    pub name: &'static str,
}

/// The buttons on the mouse, in the order they are usually listed.
pub const PHYSICAL_BUTTONS: &[PhysicalButton] = &[
    PhysicalButton { slot: 0, name: "Left" },
    PhysicalButton { slot: 1, name: "Right" },
    PhysicalButton { slot: 2, name: "Middle" },
    PhysicalButton { slot: 14, name: "Wheel Up" },
    PhysicalButton { slot: 15, name: "Wheel Down" },
    PhysicalButton { slot: 5, name: "Wheel Left" },
    PhysicalButton { slot: 6, name: "Wheel Right" },
    PhysicalButton { slot: 3, name: "DPI+" },
    PhysicalButton { slot: 4, name: "DPI-" },
    PhysicalButton { slot: 11, name: "M1" },
    PhysicalButton { slot: 10, name: "M2" },
    PhysicalButton { slot: 9, name: "M3" },
    PhysicalButton { slot: 8, name: "M4" },
    PhysicalButton { slot: 7, name: "M5" },
];

impl PhysicalButton {
    /// Look a button up by name (case-insensitive, spaces or dashes).
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().replace('-', " ");
        PHYSICAL_BUTTONS
            .iter()
            .copied()
            .find(|b| b.name.eq_ignore_ascii_case(&wanted) || b.name.eq_ignore_ascii_case(name))
    }

    /// Slot used for this button while the alternate group is active.
    pub fn alternate_slot(&self) -> usize {
        self.slot + ALT_BUTTON_OFFSET
    }
}

/// One slot of the mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ButtonSlot {
    /// `[0, 0, 0, 0]`: the button does nothing.
    Empty,
    Action(ButtonAction),
    /// Bytes that do not decode to a known action, or that decode but
    /// would not encode back to the same bytes. Written back unchanged.
    Raw([u8; SLOT_LEN]),
}

impl ButtonSlot {
    pub fn from_bytes(bytes: [u8; SLOT_LEN]) -> Self {
        if bytes == [0; SLOT_LEN] {
            return Self::Empty;
        }
        match ButtonAction::decode(bytes) {
            Some(action) if action.encode() == bytes => Self::Action(action),
            _ => Self::Raw(bytes),
        }
    }

    pub fn to_bytes(&self) -> [u8; SLOT_LEN] {
        match self {
            Self::Empty => [0; SLOT_LEN],
            Self::Action(action) => action.encode(),
            Self::Raw(bytes) => *bytes,
        }
    }

    pub fn action(&self) -> Option<ButtonAction> {
        match self {
            Self::Action(action) => Some(*action),
            Self::Empty | Self::Raw(_) => None,
        }
    }
}

impl From<Option<ButtonAction>> for ButtonSlot {
    fn from(action: Option<ButtonAction>) -> Self {
        action.map_or(Self::Empty, Self::Action)
    }
}

impl std::fmt::Display for ButtonSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("No Action"),
            Self::Action(action) => action.fmt(f),
            Self::Raw([a, b, c, d]) => write!(f, "Unknown ({a:02X} {b:02X} {c:02X} {d:02X})"),
        }
    }
}

/// All 32 slots of a button mapping blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonMap([ButtonSlot; SLOT_COUNT]);

impl ButtonMap {
    pub fn from_blob(data: &[u8]) -> Result<Self> {
        if data.len() != BLOB_LEN {
            return Err(Error::SizeError {
                expected: BLOB_LEN,
                got: data.len(),
            });
        }
        let mut slots = [ButtonSlot::Empty; SLOT_COUNT];
        for (slot, chunk) in slots.iter_mut().zip(data.chunks_exact(SLOT_LEN)) {
            let mut bytes = [0u8; SLOT_LEN];
            bytes.copy_from_slice(chunk);
            *slot = ButtonSlot::from_bytes(bytes);
        }
        let raw = slots.iter().filter(|s| matches!(s, ButtonSlot::Raw(_))).count();
        if raw > 0 {
            debug!(raw, "Button map has slots with unknown actions");
        }
        Ok(Self(slots))
    }

    pub fn to_blob(&self) -> [u8; BLOB_LEN] {
        let mut blob = [0u8; BLOB_LEN];
        for (chunk, slot) in blob.chunks_exact_mut(SLOT_LEN).zip(self.0.iter()) {
            chunk.copy_from_slice(&slot.to_bytes());
        }
        blob
    }

    pub fn slot(&self, index: usize) -> Result<ButtonSlot> {
        safety::validate_index("button_slot", index, SLOT_COUNT)?;
        Ok(self.0[index])
    }

    pub fn set_slot(&mut self, index: usize, slot: ButtonSlot) -> Result<()> {
        safety::validate_index("button_slot", index, SLOT_COUNT)?;
        self.0[index] = slot;
        Ok(())
    }

    /// Assign an action, or clear the slot with `None`.
    pub fn set_action(&mut self, index: usize, action: Option<ButtonAction>) -> Result<()> {
        self.set_slot(index, action.into())
    }

    pub fn slots(&self) -> &[ButtonSlot; SLOT_COUNT] {
        &self.0
    }

    /// Decoded actions per slot. Empty and unknown slots are both `None`.
    pub fn actions(&self) -> [Option<ButtonAction>; SLOT_COUNT] {
        self.0.map(|slot| slot.action())
    }
}

/// Queue a read of a profile's button mapping.
pub fn request_button_map(
    reader: &mut BulkReader,
    transport: &dyn HidTransport,
    profile_id: u8,
) -> Result<PendingRead> {
    safety::validate_profile_id(profile_id)?;
    Ok(request_blob(reader, transport, DumpRegion::Buttons, profile_id))
}

/// Write a profile's button mapping.
pub fn write_button_map(
    transport: &dyn HidTransport,
    profile_id: u8,
    map: &ButtonMap,
    pacer: &dyn Pacer,
) -> Result<()> {
    safety::validate_profile_id(profile_id)?;
    info!(profile_id, "Writing button map");
    write_blob(transport, DumpRegion::Buttons, profile_id, &map.to_blob(), pacer)
}
