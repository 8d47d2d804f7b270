//! Remote-control key definitions.
//!
//! Provides ergonomic constants for the buttons of the physical remote.
//! Any key code the television understands can still be sent through
//! [`Key::Other`].
//!
//! # Example
//!
//! ```ignore
//! use samsung_remote::Key;
//!
//! remote.send_key(Key::VolumeUp).await?;
//! remote.send_key(Key::from("KEY_AMBIENT")).await?;
//! remote.hold_key(Key::Power, Duration::from_secs(5)).await?;
//! ```

// ============================================================================
// Constants
// ============================================================================

/// Key codes for the number pad, indexed by digit.
const DIGIT_CODES: [&str; 10] = [
    "KEY_0", "KEY_1", "KEY_2", "KEY_3", "KEY_4", "KEY_5", "KEY_6", "KEY_7", "KEY_8", "KEY_9",
];

// ============================================================================
// Key Enum
// ============================================================================

/// Buttons of the television remote.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    // ========================================================================
    // Power & Source
    // ========================================================================
    /// Power toggle
    Power,
    /// Input source menu
    Source,
    /// Smart hub / home
    Home,

    // ========================================================================
    // Volume & Channel
    // ========================================================================
    /// Volume up
    VolumeUp,
    /// Volume down
    VolumeDown,
    /// Mute toggle
    Mute,
    /// Channel up
    ChannelUp,
    /// Channel down
    ChannelDown,
    /// Number pad digit (0-9)
    Digit(u8),

    // ========================================================================
    // Navigation
    // ========================================================================
    /// D-pad up
    Up,
    /// D-pad down
    Down,
    /// D-pad left
    Left,
    /// D-pad right
    Right,
    /// D-pad center / OK
    Enter,
    /// Back
    Return,
    /// Exit the current overlay
    Exit,
    /// Main menu
    Menu,
    /// Programme guide
    Guide,
    /// Info overlay
    Info,

    // ========================================================================
    // Playback
    // ========================================================================
    /// Play
    Play,
    /// Pause
    Pause,
    /// Stop
    Stop,
    /// Rewind
    Rewind,
    /// Fast forward
    FastForward,

    // ========================================================================
    // Raw
    // ========================================================================
    /// Any other key code, sent verbatim (e.g. `"KEY_AMBIENT"`).
    Other(String),
}

impl Key {
    /// Returns the number-pad key for `digit`, or `None` above 9.
    #[inline]
    #[must_use]
    pub fn digit(digit: u8) -> Option<Self> {
        (digit <= 9).then_some(Self::Digit(digit))
    }

    /// Returns the key code sent on the wire.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Key::Power => "KEY_POWER",
            Key::Source => "KEY_SOURCE",
            Key::Home => "KEY_HOME",
            Key::VolumeUp => "KEY_VOLUP",
            Key::VolumeDown => "KEY_VOLDOWN",
            Key::Mute => "KEY_MUTE",
            Key::ChannelUp => "KEY_CHUP",
            Key::ChannelDown => "KEY_CHDOWN",
            Key::Digit(d) => DIGIT_CODES.get(usize::from(*d)).copied().unwrap_or("KEY_0"),
            Key::Up => "KEY_UP",
            Key::Down => "KEY_DOWN",
            Key::Left => "KEY_LEFT",
            Key::Right => "KEY_RIGHT",
            Key::Enter => "KEY_ENTER",
            Key::Return => "KEY_RETURN",
            Key::Exit => "KEY_EXIT",
            Key::Menu => "KEY_MENU",
            Key::Guide => "KEY_GUIDE",
            Key::Info => "KEY_INFO",
            Key::Play => "KEY_PLAY",
            Key::Pause => "KEY_PAUSE",
            Key::Stop => "KEY_STOP",
            Key::Rewind => "KEY_REWIND",
            Key::FastForward => "KEY_FF",
            Key::Other(code) => code,
        }
    }
}

impl From<&str> for Key {
    fn from(code: &str) -> Self {
        Key::Other(code.to_string())
    }
}

impl From<String> for Key {
    fn from(code: String) -> Self {
        Key::Other(code)
    }
}

// ============================================================================
// KeyAction
// ============================================================================

/// How a key event is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyAction {
    /// Press and release in one event.
    #[default]
    Click,
    /// Key down; must be followed by [`KeyAction::Release`].
    Press,
    /// Key up.
    Release,
}

impl KeyAction {
    /// Returns the `Cmd` value sent on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyAction::Click => "Click",
            KeyAction::Press => "Press",
            KeyAction::Release => "Release",
        }
    }
}

// ============================================================================
// MouseButton
// ============================================================================

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left button
    Left,
    /// Right button
    Right,
}

impl MouseButton {
    /// Returns the `Cmd` value sent on the wire.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            MouseButton::Left => "LeftClick",
            MouseButton::Right => "RightClick",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
