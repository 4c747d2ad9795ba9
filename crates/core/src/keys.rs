//! Key, modifier and mouse button codes used inside button actions.
//!
//! Keys are HID keyboard usage IDs. Mouse buttons share the same byte space
//! at 0xF0..=0xF8, which HID leaves reserved, so a single byte can carry
//! either (see [`MouseOrKey`]).

use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

bitflags! {
    /// Keyboard modifier bits, in HID boot-protocol order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
    pub struct KeyModifiers: u8 {
        const LEFT_CTRL = 1 << 0;
        const LEFT_SHIFT = 1 << 1;
        const LEFT_ALT = 1 << 2;
        const LEFT_GUI = 1 << 3;
        const RIGHT_CTRL = 1 << 4;
        const RIGHT_SHIFT = 1 << 5;
        const RIGHT_ALT = 1 << 6;
        const RIGHT_GUI = 1 << 7;
    }
}

impl fmt::Display for KeyModifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [&str; 8] = [
            "LCtrl", "LShift", "LAlt", "LGui", "RCtrl", "RShift", "RAlt", "RGui",
        ];
        let mut first = true;
        for (bit, name) in NAMES.iter().enumerate() {
            if self.bits() & (1 << bit) != 0 {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A HID keyboard usage the mouse firmware accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Key(u8);

impl Key {
    /// Accept a usage ID if it names a known key.
    pub fn from_code(code: u8) -> Option<Self> {
        matches!(code, 0x04..=0x65 | 0x68..=0x73 | 0xE0..=0xE7).then_some(Self(code))
    }

    pub fn code(&self) -> u8 {
        self.0
    }

    /// Every known key, in usage order.
    pub fn all() -> impl Iterator<Item = Key> {
        (0u8..=0xE7).filter_map(Key::from_code)
    }

    /// Look a key up by its display name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Key::all().find(|k| k.to_string().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.0;
        match code {
            0x04..=0x1D => write!(f, "{}", char::from(b'A' + (code - 0x04))),
            0x1E..=0x26 => write!(f, "{}", code - 0x1D),
            0x27 => f.write_str("0"),
            0x3A..=0x45 => write!(f, "F{}", code - 0x39),
            0x59..=0x61 => write!(f, "Keypad {}", code - 0x58),
            0x68..=0x73 => write!(f, "F{}", code - 0x5B),
            _ => f.write_str(match code {
                0x28 => "Enter",
                0x29 => "Escape",
                0x2A => "Backspace",
                0x2B => "Tab",
                0x2C => "Space",
                0x2D => "-",
                0x2E => "=",
                0x2F => "[",
                0x30 => "]",
                0x31 => "\\",
                0x32 => "Non-US #",
                0x33 => ";",
                0x34 => "'",
                0x35 => "`",
                0x36 => ",",
                0x37 => ".",
                0x38 => "/",
                0x39 => "Caps Lock",
                0x46 => "Print Screen",
                0x47 => "Scroll Lock",
                0x48 => "Pause",
                0x49 => "Insert",
                0x4A => "Home",
                0x4B => "Page Up",
                0x4C => "Delete",
                0x4D => "End",
                0x4E => "Page Down",
                0x4F => "Right",
                0x50 => "Left",
                0x51 => "Down",
                0x52 => "Up",
                0x53 => "Num Lock",
                0x54 => "Keypad /",
                0x55 => "Keypad *",
                0x56 => "Keypad -",
                0x57 => "Keypad +",
                0x58 => "Keypad Enter",
                0x62 => "Keypad 0",
                0x63 => "Keypad .",
                0x64 => "Non-US \\",
                0x65 => "Application",
                0xE0 => "Left Ctrl",
                0xE1 => "Left Shift",
                0xE2 => "Left Alt",
                0xE3 => "Left GUI",
                0xE4 => "Right Ctrl",
                0xE5 => "Right Shift",
                0xE6 => "Right Alt",
                0xE7 => "Right GUI",
                _ => "Unknown",
            }),
        }
    }
}

/// Mouse buttons, by wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0xF0,
    Right = 0xF1,
    Middle = 0xF2,
    Button4 = 0xF3,
    Button5 = 0xF4,
    TiltLeft = 0xF5,
    TiltRight = 0xF6,
    WheelUp = 0xF7,
    WheelDown = 0xF8,
}

impl MouseButton {
    pub const ALL: &'static [MouseButton] = &[
        MouseButton::Left,
        MouseButton::Right,
        MouseButton::Middle,
        MouseButton::Button4,
        MouseButton::Button5,
        MouseButton::TiltLeft,
        MouseButton::TiltRight,
        MouseButton::WheelUp,
        MouseButton::WheelDown,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.code() == code)
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Left => "Left Button",
            Self::Right => "Right Button",
            Self::Middle => "Middle Button",
            Self::Button4 => "Button 4",
            Self::Button5 => "Button 5",
            Self::TiltLeft => "Tilt Left",
            Self::TiltRight => "Tilt Right",
            Self::WheelUp => "Wheel Up",
            Self::WheelDown => "Wheel Down",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A byte that names either a mouse button or a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MouseOrKey {
    Mouse(MouseButton),
    Key(Key),
}

impl MouseOrKey {
    pub fn from_code(code: u8) -> Option<Self> {
        MouseButton::from_code(code)
            .map(Self::Mouse)
            .or_else(|| Key::from_code(code).map(Self::Key))
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Mouse(button) => button.code(),
            Self::Key(key) => key.code(),
        }
    }
}

impl fmt::Display for MouseOrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mouse(button) => button.fmt(f),
            Self::Key(key) => key.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_range_membership() {
        assert!(Key::from_code(0x00).is_none());
        assert!(Key::from_code(0x03).is_none());
        assert!(Key::from_code(0x04).is_some());
        assert!(Key::from_code(0x66).is_none());
        assert!(Key::from_code(0x73).is_some());
        assert!(Key::from_code(0xE7).is_some());
        assert!(Key::from_code(0xE8).is_none());
    }

    #[test]
    fn key_names() {
        assert_eq!(Key::from_code(0x04).unwrap().to_string(), "A");
        assert_eq!(Key::from_code(0x1E).unwrap().to_string(), "1");
        assert_eq!(Key::from_code(0x27).unwrap().to_string(), "0");
        assert_eq!(Key::from_code(0x3A).unwrap().to_string(), "F1");
        assert_eq!(Key::from_code(0x45).unwrap().to_string(), "F12");
        assert_eq!(Key::from_code(0x68).unwrap().to_string(), "F13");
        assert_eq!(Key::from_code(0x73).unwrap().to_string(), "F24");
        assert_eq!(Key::from_code(0x59).unwrap().to_string(), "Keypad 1");
    }

    #[test]
    fn every_known_key_has_a_name() {
        for key in Key::all() {
            assert_ne!(key.to_string(), "Unknown", "no name for 0x{:02X}", key.code());
        }
    }

    #[test]
    fn key_from_name() {
        assert_eq!(Key::from_name("tab"), Key::from_code(0x2B));
        assert_eq!(Key::from_name("f5"), Key::from_code(0x3E));
        assert_eq!(Key::from_name("hyper"), None);
    }

    #[test]
    fn mouse_codes_do_not_collide_with_keys() {
        for button in MouseButton::ALL {
            assert!(Key::from_code(button.code()).is_none());
            assert_eq!(
                MouseOrKey::from_code(button.code()),
                Some(MouseOrKey::Mouse(*button))
            );
        }
    }

    #[test]
    fn mouse_or_key_rejects_zero() {
        assert!(MouseOrKey::from_code(0).is_none());
        assert!(MouseOrKey::from_code(0xFF).is_none());
    }

    #[test]
    fn modifier_display() {
        let mods = KeyModifiers::LEFT_CTRL | KeyModifiers::RIGHT_ALT;
        assert_eq!(mods.to_string(), "LCtrl+RAlt");
        assert_eq!(KeyModifiers::empty().to_string(), "");
    }
}
