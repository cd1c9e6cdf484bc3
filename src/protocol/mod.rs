//! # PowerShell Report Protocol
//!
//! Wire format of the Logitech PowerShell gamepad.
//!
//! Every input report is a flat 12-byte buffer:
//!
//! | Byte | Meaning |
//! |------|---------|
//! | 0 | Framing marker (observed constant `1`) |
//! | 1..=4 | D-pad up, right, down, left |
//! | 5..=8 | A, B, X, Y |
//! | 9, 10 | L, R shoulders |
//! | 11 | Auxiliary "‖" button |
//!
//! A zero byte means released, anything else means pressed.

pub mod report;
pub mod decoder;
