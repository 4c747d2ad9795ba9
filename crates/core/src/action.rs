//! Button action codec.
//!
//! Every button slot holds a 4-byte tuple `(a, b, c, d)`. When the top bit of
//! `a` is set the slot is a delayed chord with a 7-bit delay. Otherwise `a`
//! selects the action family, and within the 0xA and 0xB families `b` selects
//! the sub-action. Bytes a variant does not use are written as zero and
//! ignored when decoding.
//!
//! Decoding is partial: unknown family, sub-action, key, mouse button,
//! consumer code or macro mode yields `None`. Encoding is total, and every
//! value that can be constructed decodes back to itself.

use crate::keys::{Key, KeyModifiers, MouseButton, MouseOrKey};
use crate::safety::DPI_STAGE_COUNT;
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;

const DELAYED_CHORD_FLAG: u8 = 0x80;

mod family {
    pub const KEYSTROKE: u8 = 0x0;
    pub const MOUSE: u8 = 0x1;
    pub const SYSTEM_CONTROL: u8 = 0x2;
    pub const CONSUMER_CONTROL: u8 = 0x3;
    pub const SCROLL: u8 = 0x4;
    pub const REPORT_RATE: u8 = 0x5;
    pub const NOTIFY_APP: u8 = 0x6;
    pub const DPI_STAGE: u8 = 0x7;
    pub const PROFILE: u8 = 0x8;
    pub const MACRO: u8 = 0x9;
    pub const REPEAT: u8 = 0xA;
    pub const SPECIAL: u8 = 0xB;
}

mod special {
    pub const DPI_OVERRIDE: u8 = 0x0;
    pub const SENSITIVITY_OVERRIDE: u8 = 0x1;
    pub const KEY_AND_TAB: u8 = 0x2;
    pub const ALTERNATE_GROUP: u8 = 0x3;
    pub const ADJUST_DPI: u8 = 0x4;
    pub const ADJUST_SENSITIVITY: u8 = 0x5;
    pub const CYCLE_COLOUR: u8 = 0x6;
}

const REPEAT_UNCLASSIFIED_0: u8 = 0x0;
const REPEAT_UNCLASSIFIED_1: u8 = 0x1;

/// Delay of a delayed chord, 0..=0x7F.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChordDelay(u8);

impl ChordDelay {
    pub const MAX: u8 = 0x7F;

    pub fn new(delay: u8) -> Option<Self> {
        (delay <= Self::MAX).then_some(Self(delay))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// Modifiers plus up to two keys. Never completely empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct KeyStroke {
    modifiers: KeyModifiers,
    keys: [Option<Key>; 2],
}

impl KeyStroke {
    pub fn new(modifiers: KeyModifiers, first: Option<Key>, second: Option<Key>) -> Option<Self> {
        if modifiers.is_empty() && first.is_none() && second.is_none() {
            return None;
        }
        Some(Self {
            modifiers,
            keys: [first, second],
        })
    }

    /// A single key with no modifiers.
    pub fn key(key: Key) -> Self {
        Self {
            modifiers: KeyModifiers::empty(),
            keys: [Some(key), None],
        }
    }

    pub fn modifiers(&self) -> KeyModifiers {
        self.modifiers
    }

    pub fn keys(&self) -> [Option<Key>; 2] {
        self.keys
    }
}

impl fmt::Display for KeyStroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.modifiers.is_empty() {
            parts.push(self.modifiers.to_string());
        }
        parts.extend(self.keys.iter().flatten().map(Key::to_string));
        f.write_str(&parts.join("+"))
    }
}

bitflags! {
    /// Generic desktop system-control bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct SystemControl: u8 {
        const POWER_DOWN = 1 << 0;
        const SLEEP = 1 << 1;
        const WAKE = 1 << 2;
    }
}

impl fmt::Display for SystemControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self
            .iter()
            .map(|flag| {
                if flag == SystemControl::POWER_DOWN {
                    "Power Down"
                } else if flag == SystemControl::SLEEP {
                    "Sleep"
                } else {
                    "Wake"
                }
            })
            .collect();
        if names.is_empty() {
            f.write_str("None")
        } else {
            f.write_str(&names.join("+"))
        }
    }
}

/// A HID consumer-page usage the firmware knows how to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ConsumerCode(u16);

const CONSUMER_CODES: &[(u16, &str)] = &[
    (0x00B5, "Next Track"),
    (0x00B6, "Previous Track"),
    (0x00B7, "Stop"),
    (0x00CD, "Play/Pause"),
    (0x00E2, "Mute"),
    (0x00E9, "Volume Up"),
    (0x00EA, "Volume Down"),
    (0x0183, "Media Player"),
    (0x018A, "Email"),
    (0x0192, "Calculator"),
    (0x0194, "My Computer"),
    (0x0221, "Search"),
    (0x0223, "Browser Home"),
    (0x0224, "Browser Back"),
    (0x0225, "Browser Forward"),
    (0x0226, "Browser Stop"),
    (0x0227, "Browser Refresh"),
    (0x022A, "Browser Favorites"),
];

impl ConsumerCode {
    pub const NEXT_TRACK: Self = Self(0x00B5);
    pub const PREVIOUS_TRACK: Self = Self(0x00B6);
    pub const PLAY_PAUSE: Self = Self(0x00CD);
    pub const MUTE: Self = Self(0x00E2);
    pub const VOLUME_UP: Self = Self(0x00E9);
    pub const VOLUME_DOWN: Self = Self(0x00EA);

    pub fn from_code(code: u16) -> Option<Self> {
        CONSUMER_CODES
            .iter()
            .any(|(known, _)| *known == code)
            .then_some(Self(code))
    }

    pub fn code(&self) -> u16 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        CONSUMER_CODES
            .iter()
            .find(|(code, _)| *code == self.0)
            .map(|(_, name)| *name)
            .unwrap_or("Unknown")
    }
}

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $code:literal => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)+
                    _ => None,
                }
            }

            pub fn code(&self) -> u8 {
                match self {
                    $(Self::$variant => $code),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

wire_enum!(
    /// A single scroll or tilt event.
    ScrollEvent {
        TiltLeft = 0 => "Tilt Left",
        TiltRight = 1 => "Tilt Right",
        WheelUp = 2 => "Wheel Up",
        WheelDown = 3 => "Wheel Down",
    }
);

wire_enum!(
    /// Step through a list of settings.
    CycleAdjust {
        Up = 0 => "Up",
        Down = 1 => "Down",
        Cycle = 2 => "Cycle",
    }
);

wire_enum!(
    ProfileAdjust {
        Previous = 0 => "Previous",
        Up = 1 => "Up",
        Down = 2 => "Down",
        Cycle = 3 => "Cycle",
        Unknown = 0xFF => "Unknown",
    }
);

wire_enum!(
    /// How a macro repeats while its button is used.
    MacroRepeat {
        Once = 0 => "Once",
        WhileHeld = 1 => "While Held",
        Toggle = 2 => "Toggle",
    }
);

wire_enum!(
    Direction {
        Increase = 0 => "Increase",
        Decrease = 1 => "Decrease",
    }
);

/// Index of a DPI stage, below [`DPI_STAGE_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct StageIndex(u8);

impl StageIndex {
    pub fn new(stage: u8) -> Option<Self> {
        (stage < DPI_STAGE_COUNT).then_some(Self(stage))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

/// What a mouse button does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ButtonAction {
    DelayedChord {
        delay: ChordDelay,
        first: MouseOrKey,
        second: Option<MouseOrKey>,
        modifiers: KeyModifiers,
    },
    Keystroke(KeyStroke),
    Mouse(MouseButton),
    SystemControl(SystemControl),
    ConsumerControl(ConsumerCode),
    Scroll(ScrollEvent),
    ReportRate(CycleAdjust),
    /// Opaque payload forwarded to the host application.
    NotifyApp([u8; 3]),
    DpiStage(CycleAdjust),
    Profile(ProfileAdjust),
    Macro {
        id: u8,
        repeat: MacroRepeat,
    },
    TimedRepeat {
        input: MouseOrKey,
        delay: u8,
        count: u8,
    },
    UnclassifiedA0([u8; 2]),
    UnclassifiedA1([u8; 2]),
    DpiOverride {
        stage: StageIndex,
    },
    SensitivityOverride {
        level: u8,
    },
    KeyAndTab(KeyModifiers),
    AlternateButtonGroup,
    AdjustDpi(Direction),
    AdjustSensitivity(Direction),
    CycleColour {
        max: u8,
    },
}

fn optional_input(code: u8) -> Option<Option<MouseOrKey>> {
    if code == 0 {
        Some(None)
    } else {
        MouseOrKey::from_code(code).map(Some)
    }
}

fn optional_key(code: u8) -> Option<Option<Key>> {
    if code == 0 {
        Some(None)
    } else {
        Key::from_code(code).map(Some)
    }
}

impl ButtonAction {
    /// Decode a slot. `[0, 0, 0, 0]` and anything unrecognized yield `None`.
    pub fn decode(bytes: [u8; 4]) -> Option<Self> {
        let [a, b, c, d] = bytes;
        if bytes == [0; 4] {
            return None;
        }

        if a & DELAYED_CHORD_FLAG != 0 {
            return Some(Self::DelayedChord {
                delay: ChordDelay(a & ChordDelay::MAX),
                first: MouseOrKey::from_code(b)?,
                second: optional_input(c)?,
                modifiers: KeyModifiers::from_bits_retain(d),
            });
        }

        let action = match a {
            family::KEYSTROKE => Self::Keystroke(KeyStroke::new(
                KeyModifiers::from_bits_retain(b),
                optional_key(c)?,
                optional_key(d)?,
            )?),
            family::MOUSE => Self::Mouse(MouseButton::from_code(b)?),
            family::SYSTEM_CONTROL => Self::SystemControl(SystemControl::from_bits(b)?),
            family::CONSUMER_CONTROL => {
                Self::ConsumerControl(ConsumerCode::from_code(u16::from_le_bytes([c, d]))?)
            }
            family::SCROLL => Self::Scroll(ScrollEvent::from_code(b)?),
            family::REPORT_RATE => Self::ReportRate(CycleAdjust::from_code(b)?),
            family::NOTIFY_APP => Self::NotifyApp([b, c, d]),
            family::DPI_STAGE => Self::DpiStage(CycleAdjust::from_code(b)?),
            family::PROFILE => Self::Profile(ProfileAdjust::from_code(b)?),
            family::MACRO => Self::Macro {
                id: c,
                repeat: MacroRepeat::from_code(b)?,
            },
            family::REPEAT => match b {
                REPEAT_UNCLASSIFIED_0 => Self::UnclassifiedA0([c, d]),
                REPEAT_UNCLASSIFIED_1 => Self::UnclassifiedA1([c, d]),
                input => Self::TimedRepeat {
                    input: MouseOrKey::from_code(input)?,
                    delay: c,
                    count: d,
                },
            },
            family::SPECIAL => match b {
                special::DPI_OVERRIDE => Self::DpiOverride {
                    stage: StageIndex::new(c)?,
                },
                special::SENSITIVITY_OVERRIDE => Self::SensitivityOverride { level: c },
                special::KEY_AND_TAB => Self::KeyAndTab(KeyModifiers::from_bits_retain(c)),
                special::ALTERNATE_GROUP => Self::AlternateButtonGroup,
                special::ADJUST_DPI => Self::AdjustDpi(Direction::from_code(c)?),
                special::ADJUST_SENSITIVITY => Self::AdjustSensitivity(Direction::from_code(c)?),
                special::CYCLE_COLOUR => Self::CycleColour { max: c },
                _ => return None,
            },
            _ => return None,
        };
        Some(action)
    }

    /// Encode to the 4-byte slot form.
    pub fn encode(&self) -> [u8; 4] {
        match *self {
            Self::DelayedChord {
                delay,
                first,
                second,
                modifiers,
            } => [
                DELAYED_CHORD_FLAG | delay.get(),
                first.code(),
                second.map_or(0, |s| s.code()),
                modifiers.bits(),
            ],
            Self::Keystroke(stroke) => {
                let [first, second] = stroke.keys();
                [
                    family::KEYSTROKE,
                    stroke.modifiers().bits(),
                    first.map_or(0, |k| k.code()),
                    second.map_or(0, |k| k.code()),
                ]
            }
            Self::Mouse(button) => [family::MOUSE, button.code(), 0, 0],
            Self::SystemControl(flags) => [family::SYSTEM_CONTROL, flags.bits(), 0, 0],
            Self::ConsumerControl(code) => {
                let [lo, hi] = code.code().to_le_bytes();
                [family::CONSUMER_CONTROL, 0, lo, hi]
            }
            Self::Scroll(event) => [family::SCROLL, event.code(), 0, 0],
            Self::ReportRate(adjust) => [family::REPORT_RATE, adjust.code(), 0, 0],
            Self::NotifyApp([p0, p1, p2]) => [family::NOTIFY_APP, p0, p1, p2],
            Self::DpiStage(adjust) => [family::DPI_STAGE, adjust.code(), 0, 0],
            Self::Profile(adjust) => [family::PROFILE, adjust.code(), 0, 0],
            Self::Macro { id, repeat } => [family::MACRO, repeat.code(), id, 0],
            Self::TimedRepeat {
                input,
                delay,
                count,
            } => [family::REPEAT, input.code(), delay, count],
            Self::UnclassifiedA0([p0, p1]) => [family::REPEAT, REPEAT_UNCLASSIFIED_0, p0, p1],
            Self::UnclassifiedA1([p0, p1]) => [family::REPEAT, REPEAT_UNCLASSIFIED_1, p0, p1],
            Self::DpiOverride { stage } => [family::SPECIAL, special::DPI_OVERRIDE, stage.get(), 0],
            Self::SensitivityOverride { level } => {
                [family::SPECIAL, special::SENSITIVITY_OVERRIDE, level, 0]
            }
            Self::KeyAndTab(modifiers) => {
                [family::SPECIAL, special::KEY_AND_TAB, modifiers.bits(), 0]
            }
            Self::AlternateButtonGroup => [family::SPECIAL, special::ALTERNATE_GROUP, 0, 0],
            Self::AdjustDpi(direction) => [family::SPECIAL, special::ADJUST_DPI, direction.code(), 0],
            Self::AdjustSensitivity(direction) => [
                family::SPECIAL,
                special::ADJUST_SENSITIVITY,
                direction.code(),
                0,
            ],
            Self::CycleColour { max } => [family::SPECIAL, special::CYCLE_COLOUR, max, 0],
        }
    }

    /// Parameterless actions offered by name on the command line.
    pub const PRESETS: &'static [(&'static str, ButtonAction)] = &[
        ("left", ButtonAction::Mouse(MouseButton::Left)),
        ("right", ButtonAction::Mouse(MouseButton::Right)),
        ("middle", ButtonAction::Mouse(MouseButton::Middle)),
        ("back", ButtonAction::Mouse(MouseButton::Button4)),
        ("forward", ButtonAction::Mouse(MouseButton::Button5)),
        ("wheel-up", ButtonAction::Scroll(ScrollEvent::WheelUp)),
        ("wheel-down", ButtonAction::Scroll(ScrollEvent::WheelDown)),
        ("tilt-left", ButtonAction::Scroll(ScrollEvent::TiltLeft)),
        ("tilt-right", ButtonAction::Scroll(ScrollEvent::TiltRight)),
        ("dpi-up", ButtonAction::DpiStage(CycleAdjust::Up)),
        ("dpi-down", ButtonAction::DpiStage(CycleAdjust::Down)),
        ("dpi-cycle", ButtonAction::DpiStage(CycleAdjust::Cycle)),
        ("rate-up", ButtonAction::ReportRate(CycleAdjust::Up)),
        ("rate-down", ButtonAction::ReportRate(CycleAdjust::Down)),
        ("rate-cycle", ButtonAction::ReportRate(CycleAdjust::Cycle)),
        ("profile-prev", ButtonAction::Profile(ProfileAdjust::Previous)),
        ("profile-up", ButtonAction::Profile(ProfileAdjust::Up)),
        ("profile-down", ButtonAction::Profile(ProfileAdjust::Down)),
        ("profile-cycle", ButtonAction::Profile(ProfileAdjust::Cycle)),
        ("alt-group", ButtonAction::AlternateButtonGroup),
        ("play-pause", ButtonAction::ConsumerControl(ConsumerCode::PLAY_PAUSE)),
        ("next-track", ButtonAction::ConsumerControl(ConsumerCode::NEXT_TRACK)),
        ("prev-track", ButtonAction::ConsumerControl(ConsumerCode::PREVIOUS_TRACK)),
        ("mute", ButtonAction::ConsumerControl(ConsumerCode::MUTE)),
        ("volume-up", ButtonAction::ConsumerControl(ConsumerCode::VOLUME_UP)),
        ("volume-down", ButtonAction::ConsumerControl(ConsumerCode::VOLUME_DOWN)),
        ("sleep", ButtonAction::SystemControl(SystemControl::SLEEP)),
    ];

    /// Parse an action from a CLI-friendly string (case-insensitive).
    ///
    /// Accepts:
    /// - any name in [`ButtonAction::PRESETS`]
    /// - "key:<name>", e.g. "key:f5" or "key:page up" → single keystroke
    /// - "macro:<id>" → macro played once
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        if let Some(key) = name.strip_prefix("key:") {
            return Key::from_name(key).map(|k| Self::Keystroke(KeyStroke::key(k)));
        }
        if let Some(id) = name.strip_prefix("macro:") {
            return id.parse().ok().map(|id| Self::Macro {
                id,
                repeat: MacroRepeat::Once,
            });
        }
        Self::PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, action)| *action)
    }
}

impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DelayedChord {
                delay,
                first,
                second,
                modifiers,
            } => {
                f.write_str("Chord ")?;
                if !modifiers.is_empty() {
                    write!(f, "{modifiers}+")?;
                }
                write!(f, "{first}")?;
                if let Some(second) = second {
                    write!(f, ", {second}")?;
                }
                write!(f, " (delay {})", delay.get())
            }
            Self::Keystroke(stroke) => write!(f, "Key {stroke}"),
            Self::Mouse(button) => write!(f, "{button}"),
            Self::SystemControl(flags) => write!(f, "System {flags}"),
            Self::ConsumerControl(code) => f.write_str(code.name()),
            Self::Scroll(event) => write!(f, "Scroll {event}"),
            Self::ReportRate(adjust) => write!(f, "Report Rate {adjust}"),
            Self::NotifyApp([p0, p1, p2]) => {
                write!(f, "Notify App {p0:02X} {p1:02X} {p2:02X}")
            }
            Self::DpiStage(adjust) => write!(f, "DPI {adjust}"),
            Self::Profile(adjust) => write!(f, "Profile {adjust}"),
            Self::Macro { id, repeat } => write!(f, "Macro {id} ({repeat})"),
            Self::TimedRepeat {
                input,
                delay,
                count,
            } => write!(f, "Repeat {input} x{count} (delay {delay})"),
            Self::UnclassifiedA0([p0, p1]) => write!(f, "Unclassified A0 {p0:02X} {p1:02X}"),
            Self::UnclassifiedA1([p0, p1]) => write!(f, "Unclassified A1 {p0:02X} {p1:02X}"),
            Self::DpiOverride { stage } => write!(f, "DPI Override (stage {})", stage.get()),
            Self::SensitivityOverride { level } => write!(f, "Sensitivity Override ({level})"),
            Self::KeyAndTab(modifiers) => {
                if modifiers.is_empty() {
                    f.write_str("Tab")
                } else {
                    write!(f, "{modifiers}+Tab")
                }
            }
            Self::AlternateButtonGroup => f.write_str("Alternate Button Group"),
            Self::AdjustDpi(direction) => write!(f, "DPI {direction}"),
            Self::AdjustSensitivity(direction) => write!(f, "Sensitivity {direction}"),
            Self::CycleColour { max } => write!(f, "Cycle Colour (max {max})"),
        }
    }
}
