//! Logical joystick description handed to the input backend.

use crate::device::identity::DeviceIdentity;
use crate::transport::PhysicalDevice;

/// Default display name of the virtual joystick
pub const JOYPAD_NAME: &str = "Logitech powershell gamepad and battery for IPhone Joypad";

/// The exposed joystick. Identity fields are copied from the bound device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDevice {
    pub name: String,
    /// Physical address of the bound device
    pub phys: String,
    pub uniq: String,
    pub identity: DeviceIdentity,
    pub version: u16,
}

impl VirtualDevice {
    pub fn from_physical(physical: &PhysicalDevice, name: &str) -> Self {
        Self {
            name: name.to_string(),
            phys: physical.phys.clone(),
            uniq: physical.uniq.clone(),
            identity: physical.identity,
            version: physical.version,
        }
    }
}
