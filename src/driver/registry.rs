//! # Driver Registry
//!
//! Explicit stand-in for a kernel driver table: a driver name, the device ids
//! it accepts, and the (single) device currently bound to it. Constructed at
//! startup, shut down on exit.

use std::sync::Arc;
use tracing::{debug, info};

use super::controller::{DriverController, DriverState};
use crate::device::identity::{BusType, DeviceIdentity};
use crate::error::ProbeError;
use crate::input::InputSink;
use crate::protocol::report::{PRODUCT_ID_POWERSHELL, VENDOR_ID_LOGITECH};
use crate::transport::HidTransport;

/// Name the driver registers under
pub const DRIVER_NAME: &str = "hid-lpowershell";

/// One entry of the id table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    pub bus_type: BusType,
    pub vendor_id: u16,
    pub product_id: u16,
}

impl DeviceId {
    pub const fn usb(vendor_id: u16, product_id: u16) -> Self {
        Self { bus_type: BusType::Usb, vendor_id, product_id }
    }

    /// Exact vendor/product match
    pub fn matches(&self, identity: &DeviceIdentity) -> bool {
        self.vendor_id == identity.vendor_id && self.product_id == identity.product_id
    }
}

/// Ids accepted by this driver
pub const ID_TABLE: &[DeviceId] = &[DeviceId::usb(VENDOR_ID_LOGITECH, PRODUCT_ID_POWERSHELL)];

/// Driver registration plus its current binding
pub struct DriverRegistry<T: HidTransport, S: InputSink> {
    name: &'static str,
    id_table: &'static [DeviceId],
    joypad_name: String,
    binding: Option<DriverController<T, S>>,
}

impl<T: HidTransport, S: InputSink> DriverRegistry<T, S> {
    /// Register the PowerShell driver
    pub fn new(joypad_name: impl Into<String>) -> Self {
        info!("Registered driver {}", DRIVER_NAME);
        Self {
            name: DRIVER_NAME,
            id_table: ID_TABLE,
            joypad_name: joypad_name.into(),
            binding: None,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn id_table(&self) -> &[DeviceId] {
        self.id_table
    }

    /// Whether `identity` appears in the id table
    pub fn supports(&self, identity: &DeviceIdentity) -> bool {
        self.id_table.iter().any(|id| id.matches(identity))
    }

    /// Identity to hand the device matcher
    pub fn target(&self) -> DeviceIdentity {
        let id = self.id_table[0];
        DeviceIdentity::new(id.vendor_id, id.product_id, id.bus_type)
    }

    /// Probe a device and keep the binding on success
    ///
    /// # Errors
    ///
    /// - `Unsupported`: `identity` is not in the id table
    /// - `AlreadyBound`: a device is already bound
    /// - any probe error from [`DriverController::probe`]
    pub fn attach(
        &mut self,
        identity: &DeviceIdentity,
        transport: Arc<T>,
        sink: S,
    ) -> Result<&mut DriverController<T, S>, ProbeError> {
        if !self.supports(identity) {
            return Err(ProbeError::Unsupported {
                vendor_id: identity.vendor_id,
                product_id: identity.product_id,
            });
        }
        if self.binding.is_some() {
            return Err(ProbeError::AlreadyBound);
        }

        let mut controller = DriverController::new(transport, sink, self.joypad_name.clone());
        controller.probe()?;
        Ok(self.binding.insert(controller))
    }

    /// Forward a raw report to the bound device
    pub fn dispatch(&mut self, data: &[u8]) {
        match self.binding.as_mut() {
            Some(controller) => controller.handle_report(data),
            None => debug!("{}: no device bound, dropping report", self.name),
        }
    }

    pub fn is_bound(&self) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|c| c.state() == DriverState::Bound)
    }

    pub fn binding(&self) -> Option<&DriverController<T, S>> {
        self.binding.as_ref()
    }

    /// Tear down the current binding, if any
    pub fn detach(&mut self) {
        if let Some(mut controller) = self.binding.take() {
            controller.detach();
        }
    }

    /// Detach and unregister the driver
    pub fn shutdown(mut self) {
        self.detach();
        // Drop logs the unregistration
    }
}

impl<T: HidTransport, S: InputSink> Drop for DriverRegistry<T, S> {
    fn drop(&mut self) {
        self.detach();
        info!("Unregistered driver {}", self.name);
    }
}
