//! # Device Identity
//!
//! Vendor/product/bus triple read from a candidate device.

use std::fmt;

use crate::protocol::report::{PRODUCT_ID_POWERSHELL, VENDOR_ID_LOGITECH};

/// Bus a HID device is attached through (linux `BUS_*` values)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    Usb,
    Hil,
    Bluetooth,
    Virtual,
    I2c,
    Other(u32),
}

impl BusType {
    /// Map a raw `BUS_*` number
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            0x03 => BusType::Usb,
            0x04 => BusType::Hil,
            0x05 => BusType::Bluetooth,
            0x06 => BusType::Virtual,
            0x18 => BusType::I2c,
            other => BusType::Other(other),
        }
    }

    /// Raw `BUS_*` number
    pub fn raw(self) -> u32 {
        match self {
            BusType::Usb => 0x03,
            BusType::Hil => 0x04,
            BusType::Bluetooth => 0x05,
            BusType::Virtual => 0x06,
            BusType::I2c => 0x18,
            BusType::Other(raw) => raw,
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusType::Usb => f.write_str("USB"),
            BusType::Hil => f.write_str("HIL"),
            BusType::Bluetooth => f.write_str("Bluetooth"),
            BusType::Virtual => f.write_str("Virtual"),
            BusType::I2c => f.write_str("I2C"),
            BusType::Other(_) => f.write_str("Other"),
        }
    }
}

/// Identity of a HID device. Read-only; used for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    pub bus_type: BusType,
}

impl DeviceIdentity {
    pub fn new(vendor_id: u16, product_id: u16, bus_type: BusType) -> Self {
        Self { vendor_id, product_id, bus_type }
    }

    /// The Logitech PowerShell on USB
    pub fn powershell() -> Self {
        Self::new(VENDOR_ID_LOGITECH, PRODUCT_ID_POWERSHELL, BusType::Usb)
    }

    /// Vendor and product must be equal; bus type is not compared.
    pub fn matches(&self, target: &DeviceIdentity) -> bool {
        self.vendor_id == target.vendor_id && self.product_id == target.product_id
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x} ({})", self.vendor_id, self.product_id, self.bus_type)
    }
}
