//! # Driver Lifecycle Controller
//!
//! Binds the physical PowerShell to a virtual joystick.
//!
//! ## States
//!
//! ```text
//! Unbound ──probe()──▶ Probing ──ok──▶ Bound
//!    ▲                    │              │
//!    └──────failure───────┘              │
//!    └──────────────detach()─────────────┘
//! ```
//!
//! While `Bound`, the transport adapter calls
//! [`handle_report`](DriverController::handle_report) once per raw report.
//! Malformed reports are logged and dropped; they never unbind the device.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::ProbeError;
use crate::input::publisher::VirtualInputPublisher;
use crate::input::InputSink;
use crate::protocol::decoder::decode_report;
use crate::transport::HidTransport;

/// Lifecycle state of a [`DriverController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Unbound,
    Probing,
    Bound,
}

/// Report counters for one binding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    /// Reports decoded and published
    pub processed: u64,
    /// Reports dropped (malformed, not bound, or publish failure)
    pub dropped: u64,
}

/// Owns the binding between one physical device and its virtual joystick
pub struct DriverController<T: HidTransport, S: InputSink> {
    transport: Arc<T>,
    publisher: VirtualInputPublisher<S, T>,
    joypad_name: String,
    state: DriverState,
    started: bool,
    stats: ReportStats,
}

impl<T: HidTransport, S: InputSink> DriverController<T, S> {
    /// Create an unbound controller
    ///
    /// # Arguments
    ///
    /// * `transport` - HID transport of the physical device
    /// * `sink` - Input backend the virtual joystick is created on
    /// * `joypad_name` - Display name of the virtual joystick
    pub fn new(transport: Arc<T>, sink: S, joypad_name: impl Into<String>) -> Self {
        let publisher = VirtualInputPublisher::new(sink, Arc::clone(&transport));
        Self {
            transport,
            publisher,
            joypad_name: joypad_name.into(),
            state: DriverState::Unbound,
            started: false,
            stats: ReportStats::default(),
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn stats(&self) -> ReportStats {
        self.stats
    }

    pub fn publisher(&self) -> &VirtualInputPublisher<S, T> {
        &self.publisher
    }

    /// Bind the device: parse, register the joystick, start delivery
    ///
    /// # Errors
    ///
    /// - `AlreadyBound`: the controller is not `Unbound`
    /// - `ParseFailed`: the transport could not describe the device
    /// - `RegisterFailed`: the joystick could not be registered
    /// - `StartFailed`: the transport would not start delivering reports
    ///
    /// On every error the controller is back in `Unbound` with nothing held.
    pub fn probe(&mut self) -> Result<(), ProbeError> {
        if self.state != DriverState::Unbound {
            return Err(ProbeError::AlreadyBound);
        }
        self.state = DriverState::Probing;

        let result = self.try_bind();
        match &result {
            Ok(()) => {
                self.state = DriverState::Bound;
                info!("Bound \"{}\"", self.joypad_name);
            }
            Err(e) => {
                error!("Probe failed: {}", e);
                self.release();
            }
        }
        result
    }

    fn try_bind(&mut self) -> Result<(), ProbeError> {
        let physical = self.transport.parse().map_err(ProbeError::ParseFailed)?;
        debug!("Parsed {} \"{}\" at {}", physical.identity, physical.name, physical.phys);

        self.publisher.register(&physical, &self.joypad_name)?;

        self.transport.start().map_err(ProbeError::StartFailed)?;
        self.started = true;
        Ok(())
    }

    /// Decode one raw report and publish it
    ///
    /// Never fails: reports that cannot be decoded or published are counted
    /// as dropped and the controller stays bound.
    pub fn handle_report(&mut self, data: &[u8]) {
        if self.state != DriverState::Bound {
            debug!("Dropping {}-byte report while {:?}", data.len(), self.state);
            self.stats.dropped += 1;
            return;
        }

        let state = match decode_report(data) {
            Ok(state) => state,
            Err(e) => {
                warn!("Dropping report: {}", e);
                self.stats.dropped += 1;
                return;
            }
        };

        match self.publisher.publish(&state) {
            Ok(()) => self.stats.processed += 1,
            Err(e) => {
                warn!("Failed to publish report: {}", e);
                self.stats.dropped += 1;
            }
        }
    }

    /// Tear the binding down. Safe in any state.
    pub fn detach(&mut self) {
        if self.state == DriverState::Unbound {
            return;
        }
        info!(
            "Detaching \"{}\" ({} reports processed, {} dropped)",
            self.joypad_name, self.stats.processed, self.stats.dropped
        );
        self.release();
    }

    fn release(&mut self) {
        if self.started {
            self.transport.stop();
            self.started = false;
        }
        self.publisher.unregister();
        self.state = DriverState::Unbound;
    }
}

impl<T: HidTransport, S: InputSink> Drop for DriverController<T, S> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::device::identity::DeviceIdentity;
    use crate::protocol::report::DEVICE_NAME;
    use crate::transport::{MockHidTransport, PhysicalDevice};

    pub fn physical() -> PhysicalDevice {
        PhysicalDevice {
            identity: DeviceIdentity::powershell(),
            name: DEVICE_NAME.to_string(),
            phys: "usb-test/input0".to_string(),
            uniq: String::new(),
            version: 0x0100,
        }
    }

    /// Transport that parses, starts and stops without complaint
    pub fn healthy_transport() -> MockHidTransport {
        let mut transport = MockHidTransport::new();
        transport.expect_parse().returning(|| Ok(physical()));
        transport.expect_start().returning(|| Ok(()));
        transport.expect_stop().return_const(());
        transport.expect_open().returning(|| Ok(()));
        transport.expect_close().return_const(());
        transport
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::input::mocks::{RecordingSink, SinkEvent};
    use crate::input::virtual_device::JOYPAD_NAME;
    use crate::protocol::report::Button;
    use crate::transport::MockHidTransport;
    use std::io;

    const UP_AND_A: [u8; 12] = [1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0];

    fn bound(sink: &RecordingSink) -> DriverController<MockHidTransport, RecordingSink> {
        let mut controller =
            DriverController::new(Arc::new(healthy_transport()), sink.clone(), JOYPAD_NAME);
        controller.probe().unwrap();
        sink.clear();
        controller
    }

    #[test]
    fn test_probe_binds() {
        let sink = RecordingSink::new();
        let mut controller =
            DriverController::new(Arc::new(healthy_transport()), sink.clone(), JOYPAD_NAME);
        assert_eq!(controller.state(), DriverState::Unbound);

        controller.probe().unwrap();

        assert_eq!(controller.state(), DriverState::Bound);
        assert!(controller.publisher().is_registered());
        assert_eq!(
            controller.publisher().device().unwrap().identity,
            physical().identity
        );
    }

    #[test]
    fn test_parse_failure_never_registers() {
        let mut transport = MockHidTransport::new();
        transport
            .expect_parse()
            .returning(|| Err(io::Error::new(io::ErrorKind::InvalidData, "bad descriptor")));
        transport.expect_start().never();
        transport.expect_stop().never();
        let sink = RecordingSink::new();
        let mut controller = DriverController::new(Arc::new(transport), sink.clone(), JOYPAD_NAME);

        let result = controller.probe();

        assert!(matches!(result, Err(ProbeError::ParseFailed(_))));
        assert_eq!(controller.state(), DriverState::Unbound);
        assert!(sink.events().is_empty(), "register must not be called");
    }

    #[test]
    fn test_register_failure_releases_everything() {
        let mut transport = MockHidTransport::new();
        transport.expect_parse().returning(|| Ok(physical()));
        transport.expect_start().never();
        transport.expect_stop().never();
        let sink = RecordingSink::new();
        sink.set_create_error(io::ErrorKind::PermissionDenied);
        let mut controller = DriverController::new(Arc::new(transport), sink.clone(), JOYPAD_NAME);

        let result = controller.probe();

        assert!(matches!(result, Err(ProbeError::RegisterFailed(_))));
        assert_eq!(controller.state(), DriverState::Unbound);
        assert!(!controller.publisher().is_registered());
    }

    #[test]
    fn test_start_failure_unregisters() {
        let mut transport = MockHidTransport::new();
        transport.expect_parse().returning(|| Ok(physical()));
        transport
            .expect_start()
            .returning(|| Err(io::Error::new(io::ErrorKind::Other, "hw start failed")));
        transport.expect_stop().never();
        let sink = RecordingSink::new();
        let mut controller = DriverController::new(Arc::new(transport), sink.clone(), JOYPAD_NAME);

        let result = controller.probe();

        assert!(matches!(result, Err(ProbeError::StartFailed(_))));
        assert_eq!(controller.state(), DriverState::Unbound);
        assert_eq!(sink.count(&SinkEvent::Destroyed), 1);
    }

    #[test]
    fn test_probe_twice_is_rejected() {
        let sink = RecordingSink::new();
        let mut controller = bound(&sink);
        assert!(matches!(controller.probe(), Err(ProbeError::AlreadyBound)));
        assert_eq!(controller.state(), DriverState::Bound);
    }

    #[test]
    fn test_handle_report_publishes() {
        let sink = RecordingSink::new();
        let mut controller = bound(&sink);

        controller.handle_report(&UP_AND_A);

        let events = sink.events();
        assert_eq!(events.len(), 12);
        assert_eq!(events[0], SinkEvent::Key(Button::Up, true));
        assert_eq!(events[4], SinkEvent::Key(Button::A, true));
        assert_eq!(events[11], SinkEvent::Sync);
        assert_eq!(controller.stats(), ReportStats { processed: 1, dropped: 0 });
    }

    #[test]
    fn test_malformed_report_is_dropped_and_binding_survives() {
        let sink = RecordingSink::new();
        let mut controller = bound(&sink);

        controller.handle_report(&UP_AND_A[..7]);
        assert_eq!(controller.state(), DriverState::Bound);
        assert!(sink.events().is_empty(), "nothing published for a bad report");

        controller.handle_report(&UP_AND_A);
        assert_eq!(sink.count(&SinkEvent::Sync), 1);
        assert_eq!(controller.stats(), ReportStats { processed: 1, dropped: 1 });
    }

    #[test]
    fn test_report_while_unbound_is_dropped() {
        let sink = RecordingSink::new();
        let mut controller =
            DriverController::new(Arc::new(healthy_transport()), sink.clone(), JOYPAD_NAME);

        controller.handle_report(&UP_AND_A);

        assert!(sink.events().is_empty());
        assert_eq!(controller.stats().dropped, 1);
    }

    #[test]
    fn test_detach_stops_and_unregisters() {
        let mut transport = MockHidTransport::new();
        transport.expect_parse().returning(|| Ok(physical()));
        transport.expect_start().times(1).returning(|| Ok(()));
        transport.expect_stop().times(1).return_const(());
        let sink = RecordingSink::new();
        let mut controller = DriverController::new(Arc::new(transport), sink.clone(), JOYPAD_NAME);
        controller.probe().unwrap();

        controller.detach();
        controller.detach();

        assert_eq!(controller.state(), DriverState::Unbound);
        assert_eq!(sink.count(&SinkEvent::Destroyed), 1);
    }

    #[test]
    fn test_detach_when_never_probed() {
        let mut transport = MockHidTransport::new();
        transport.expect_stop().never();
        let sink = RecordingSink::new();
        let mut controller = DriverController::new(Arc::new(transport), sink.clone(), JOYPAD_NAME);

        controller.detach();

        assert_eq!(controller.state(), DriverState::Unbound);
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_rebind_after_detach() {
        let sink = RecordingSink::new();
        let mut controller = bound(&sink);
        controller.detach();

        controller.probe().unwrap();

        assert_eq!(controller.state(), DriverState::Bound);
    }

    #[test]
    fn test_drop_detaches() {
        let sink = RecordingSink::new();
        drop(bound(&sink));
        assert_eq!(sink.events(), vec![SinkEvent::Destroyed]);
    }
}
