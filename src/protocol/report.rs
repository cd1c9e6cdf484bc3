//! # Report Constants and Types
//!
//! Core protocol definitions for the PowerShell gamepad.

use serde::Serialize;

/// Logitech USB vendor ID
pub const VENDOR_ID_LOGITECH: u16 = 0x046d;

/// PowerShell gamepad product ID
pub const PRODUCT_ID_POWERSHELL: u16 = 0xcae2;

/// Fixed report length in bytes (marker + 10 buttons + aux)
pub const REPORT_LEN: usize = 12;

/// Offset of the framing marker byte
pub const MARKER_OFFSET: usize = 0;

/// Name the device reports for itself
pub const DEVICE_NAME: &str = "Logitech powershell gamepad and battery for IPhone";

/// Digital buttons carried by a report.
///
/// Variants are declared in wire order, so `Button::ALL[i]` lives at byte
/// `i + 1` of the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Up,
    Right,
    Down,
    Left,
    A,
    B,
    X,
    Y,
    L,
    R,
    Aux,
}

impl Button {
    /// Every button, in wire order
    pub const ALL: [Button; 11] = [
        Button::Up,
        Button::Right,
        Button::Down,
        Button::Left,
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::L,
        Button::R,
        Button::Aux,
    ];

    /// Byte offset of this button inside a report
    pub const fn offset(self) -> usize {
        match self {
            Button::Up => 1,
            Button::Right => 2,
            Button::Down => 3,
            Button::Left => 4,
            Button::A => 5,
            Button::B => 6,
            Button::X => 7,
            Button::Y => 8,
            Button::L => 9,
            Button::R => 10,
            Button::Aux => 11,
        }
    }

    /// Short upper-case label used by the diagnostic renderer
    pub const fn label(self) -> &'static str {
        match self {
            Button::Up => "UP",
            Button::Right => "RIGHT",
            Button::Down => "DOWN",
            Button::Left => "LEFT",
            Button::A => "A",
            Button::B => "B",
            Button::X => "X",
            Button::Y => "Y",
            Button::L => "L",
            Button::R => "R",
            Button::Aux => "II",
        }
    }
}

/// Decoded pressed/released state of every button in one report.
///
/// Built fresh by [`decode_report`](super::decoder::decode_report) and never
/// mutated afterwards.
///
/// # Examples
///
/// ```
/// use powershell_pad::protocol::report::{Button, ButtonState};
///
/// let state = ButtonState::default();
/// assert!(!state.pressed(Button::A));
/// assert!(!state.any_pressed());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ButtonState {
    /// Raw framing marker (byte 0), kept for diagnostics
    pub marker: u8,

    // D-Pad
    pub up: bool,
    pub right: bool,
    pub down: bool,
    pub left: bool,

    // Face buttons
    pub a: bool,
    pub b: bool,
    pub x: bool,
    pub y: bool,

    // Shoulders
    pub l: bool,
    pub r: bool,

    /// Auxiliary button; decoded but rarely wired to anything
    pub aux: bool,
}

impl ButtonState {
    /// Whether `button` is pressed
    pub fn pressed(&self, button: Button) -> bool {
        match button {
            Button::Up => self.up,
            Button::Right => self.right,
            Button::Down => self.down,
            Button::Left => self.left,
            Button::A => self.a,
            Button::B => self.b,
            Button::X => self.x,
            Button::Y => self.y,
            Button::L => self.l,
            Button::R => self.r,
            Button::Aux => self.aux,
        }
    }

    pub(crate) fn set(&mut self, button: Button, pressed: bool) {
        let slot = match button {
            Button::Up => &mut self.up,
            Button::Right => &mut self.right,
            Button::Down => &mut self.down,
            Button::Left => &mut self.left,
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::X => &mut self.x,
            Button::Y => &mut self.y,
            Button::L => &mut self.l,
            Button::R => &mut self.r,
            Button::Aux => &mut self.aux,
        };
        *slot = pressed;
    }

    /// Iterate `(button, pressed)` pairs in wire order
    pub fn iter(&self) -> impl Iterator<Item = (Button, bool)> + '_ {
        Button::ALL.iter().map(move |&button| (button, self.pressed(button)))
    }

    /// True if at least one button is held
    pub fn any_pressed(&self) -> bool {
        self.iter().any(|(_, pressed)| pressed)
    }
}
