//! # uinput Sink
//!
//! [`InputSink`] over Linux uinput. The created device shows up as
//! `/dev/input/eventX` (and `/dev/input/jsX`) for games and `evtest`.
//!
//! ## Button Codes (EV_KEY)
//!
//! | Button | evdev Code |
//! |--------|------------|
//! | D-Pad | BTN_DPAD_UP / RIGHT / DOWN / LEFT |
//! | A | BTN_SOUTH |
//! | B | BTN_EAST |
//! | X | BTN_NORTH |
//! | Y | BTN_WEST |
//! | L / R | BTN_TL / BTN_TR |
//! | Aux | BTN_C |

use evdev::uinput::{VirtualDevice as UinputDevice, VirtualDeviceBuilder};
use evdev::{AttributeSet, EventType, InputEvent, InputId, Key};
use std::io;
use tracing::debug;

use super::{InputSink, VirtualDevice};
use crate::protocol::report::Button;

/// evdev key code for a button
pub fn key_for(button: Button) -> Key {
    match button {
        Button::Up => Key::BTN_DPAD_UP,
        Button::Right => Key::BTN_DPAD_RIGHT,
        Button::Down => Key::BTN_DPAD_DOWN,
        Button::Left => Key::BTN_DPAD_LEFT,
        Button::A => Key::BTN_SOUTH,
        Button::B => Key::BTN_EAST,
        Button::X => Key::BTN_NORTH,
        Button::Y => Key::BTN_WEST,
        Button::L => Key::BTN_TL,
        Button::R => Key::BTN_TR,
        Button::Aux => Key::BTN_C,
    }
}

/// uinput-backed virtual joystick
#[derive(Default)]
pub struct UinputSink {
    device: Option<UinputDevice>,
    pending: Vec<InputEvent>,
}

impl UinputSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `/dev/input/eventX` node of the created device
    pub fn device_path(&mut self) -> Option<std::path::PathBuf> {
        self.device
            .as_mut()?
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }
}

impl InputSink for UinputSink {
    fn create(&mut self, device: &VirtualDevice, buttons: &[Button]) -> io::Result<()> {
        let mut keys = AttributeSet::<Key>::new();
        for &button in buttons {
            keys.insert(key_for(button));
        }

        let id = InputId::new(
            evdev::BusType(device.identity.bus_type.raw() as u16),
            device.identity.vendor_id,
            device.identity.product_id,
            device.version,
        );

        let uinput = VirtualDeviceBuilder::new()?
            .name(&device.name)
            .input_id(id)
            .with_keys(&keys)?
            .build()?;

        self.device = Some(uinput);
        self.pending.clear();
        if let Some(path) = self.device_path() {
            debug!("uinput device node: {}", path.display());
        }
        Ok(())
    }

    fn report_key(&mut self, button: Button, pressed: bool) -> io::Result<()> {
        if self.device.is_none() {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "uinput device not created"));
        }
        self.pending.push(InputEvent::new(
            EventType::KEY,
            key_for(button).code(),
            i32::from(pressed),
        ));
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        let device = self
            .device
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "uinput device not created"))?;

        // emit() appends the SYN_REPORT barrier after the batch
        let result = device.emit(&self.pending);
        self.pending.clear();
        result
    }

    fn destroy(&mut self) {
        self.pending.clear();
        // Dropping the handle removes the device
        self.device = None;
    }
}
