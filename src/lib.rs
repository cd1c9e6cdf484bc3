//! # PowerShell Pad Library
//!
//! Userspace driver and diagnostic reader for the Logitech PowerShell
//! iPhone gamepad.
//!
//! The PowerShell sends a 12-byte HID report per sample. This library decodes
//! those reports and either republishes them on a virtual joystick (driver
//! path) or renders them as text (diagnostic path).

pub mod config;
pub mod error;
pub mod protocol;
pub mod device;
pub mod transport;
pub mod input;
pub mod driver;
pub mod diagnostic;
