//! # Virtual Input Publisher
//!
//! Owns the virtual joystick and republishes decoded reports on it.
//!
//! ## Publishing
//!
//! Publishing is level-triggered: every report produces one key event per
//! button, pressed or not and changed or not, followed by a single sync
//! barrier. Consumers see each report as one atomic batch.
//!
//! ## Open/close
//!
//! Consumers gate transport I/O through [`OpenGate`]. Opens are counted; the
//! transport is opened on the first open and closed when the last one is
//! balanced by a close. The gate is cloneable so a consumer on another thread
//! can hold its own copy.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::{InputSink, VirtualDevice};
use crate::error::{OpenError, RegisterError};
use crate::protocol::report::{Button, ButtonState};
use crate::transport::{HidTransport, PhysicalDevice};

/// Reference-counted open/close gate in front of the transport
pub struct OpenGate<T: HidTransport> {
    transport: Arc<T>,
    opens: Arc<Mutex<usize>>,
}

impl<T: HidTransport> Clone for OpenGate<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            opens: Arc::clone(&self.opens),
        }
    }
}

impl<T: HidTransport> OpenGate<T> {
    fn new(transport: Arc<T>) -> Self {
        Self {
            transport,
            opens: Arc::new(Mutex::new(0)),
        }
    }

    fn count(&self) -> MutexGuard<'_, usize> {
        // The counter stays consistent even if a holder panicked
        self.opens.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Open on behalf of one consumer
    ///
    /// # Errors
    ///
    /// Returns [`OpenError::Transport`] if this was the first open and the
    /// transport refused. The count is left unchanged.
    pub fn open(&self) -> Result<(), OpenError> {
        let mut opens = self.count();
        if *opens == 0 {
            self.transport.open().map_err(OpenError::Transport)?;
            debug!("Transport opened");
        }
        *opens += 1;
        Ok(())
    }

    /// Balance one earlier [`open`](Self::open)
    pub fn close(&self) {
        let mut opens = self.count();
        match *opens {
            0 => warn!("close() without matching open(), ignoring"),
            1 => {
                *opens = 0;
                self.transport.close();
                debug!("Transport closed");
            }
            _ => *opens -= 1,
        }
    }

    /// Number of outstanding opens
    pub fn open_count(&self) -> usize {
        *self.count()
    }

    /// Drop every outstanding open, closing the transport if it was open
    fn release_all(&self) {
        let mut opens = self.count();
        if *opens > 0 {
            debug!("Releasing {} outstanding open(s)", *opens);
            *opens = 0;
            self.transport.close();
        }
    }
}

/// Publishes button state on a virtual joystick
pub struct VirtualInputPublisher<S: InputSink, T: HidTransport> {
    sink: S,
    gate: OpenGate<T>,
    device: Option<VirtualDevice>,
}

impl<S: InputSink, T: HidTransport> VirtualInputPublisher<S, T> {
    /// Create an unregistered publisher
    pub fn new(sink: S, transport: Arc<T>) -> Self {
        Self {
            sink,
            gate: OpenGate::new(transport),
            device: None,
        }
    }

    /// Register the virtual joystick
    ///
    /// # Arguments
    ///
    /// * `physical` - Bound device whose identity is copied
    /// * `name` - Display name of the virtual joystick
    ///
    /// # Errors
    ///
    /// - `AlreadyRegistered`: called twice without `unregister`
    /// - `Backend`: the input backend refused the device; nothing is retained
    pub fn register(&mut self, physical: &PhysicalDevice, name: &str) -> Result<(), RegisterError> {
        if self.device.is_some() {
            return Err(RegisterError::AlreadyRegistered);
        }

        let device = VirtualDevice::from_physical(physical, name);
        self.sink
            .create(&device, &Button::ALL)
            .map_err(RegisterError::Backend)?;

        info!("Registered virtual joystick \"{}\" ({})", device.name, device.identity);
        self.device = Some(device);
        Ok(())
    }

    /// Remove the virtual joystick. No-op when not registered.
    pub fn unregister(&mut self) {
        if let Some(device) = self.device.take() {
            self.gate.release_all();
            self.sink.destroy();
            info!("Unregistered virtual joystick \"{}\"", device.name);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.device.is_some()
    }

    pub fn device(&self) -> Option<&VirtualDevice> {
        self.device.as_ref()
    }

    /// Emit one key event per button followed by one sync barrier
    ///
    /// # Panics
    ///
    /// Panics if the publisher has not been registered.
    ///
    /// # Errors
    ///
    /// Returns the backend's I/O error; the batch is then incomplete and no
    /// barrier is emitted.
    pub fn publish(&mut self, state: &ButtonState) -> io::Result<()> {
        assert!(
            self.device.is_some(),
            "publish() called before register()"
        );

        for (button, pressed) in state.iter() {
            self.sink.report_key(button, pressed)?;
        }
        self.sink.sync()
    }

    pub fn open(&self) -> Result<(), OpenError> {
        self.gate.open()
    }

    pub fn close(&self) {
        self.gate.close()
    }

    pub fn open_count(&self) -> usize {
        self.gate.open_count()
    }

    /// Gate handle for consumers on other threads
    pub fn gate(&self) -> OpenGate<T> {
        self.gate.clone()
    }
}

impl<S: InputSink, T: HidTransport> Drop for VirtualInputPublisher<S, T> {
    fn drop(&mut self) {
        self.unregister();
    }
}
