//! # Input Module
//!
//! The virtual joystick exposed to consumers.
//!
//! This module handles:
//! - The input-event boundary ([`InputSink`]) and its uinput implementation
//! - The virtual device model and its registration lifecycle
//! - Republishing decoded reports as key events plus a sync barrier

use std::io;

use crate::protocol::report::Button;

pub mod virtual_device;
pub mod publisher;
pub mod uinput;

pub use virtual_device::VirtualDevice;

/// Input-event subsystem that delivers key events to consumers
pub trait InputSink: Send {
    /// Create the device with a capability bit for every button in `buttons`
    fn create(&mut self, device: &VirtualDevice, buttons: &[Button]) -> io::Result<()>;

    /// Queue a key state change
    fn report_key(&mut self, button: Button, pressed: bool) -> io::Result<()>;

    /// Deliver queued changes as one atomic batch
    fn sync(&mut self) -> io::Result<()>;

    /// Remove the device. Must tolerate being called when nothing was created.
    fn destroy(&mut self);
}
