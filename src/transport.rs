//! # HID Transport Boundary
//!
//! The driver path consumes a HID transport that can describe the physical
//! device, gate I/O with open/close and start/stop raw report delivery.
//!
//! [`HidrawTransport`] implements the boundary in userspace over a hidraw
//! node: reports are pulled by a dedicated reader thread and handed to the
//! async side through a bounded channel of capacity one, so a slow consumer
//! back-pressures the reader instead of queueing reports.

use bytes::Bytes;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::device::hidraw::HidrawDevice;
use crate::device::identity::DeviceIdentity;
use crate::device::{ReportSource, READ_BUF_LEN};

/// The transport's description of the bound physical device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhysicalDevice {
    pub identity: DeviceIdentity,
    pub name: String,
    pub phys: String,
    pub uniq: String,
    pub version: u16,
}

/// HID transport consumed by the driver
#[cfg_attr(test, mockall::automock)]
pub trait HidTransport: Send + Sync {
    /// Describe the physical device
    fn parse(&self) -> io::Result<PhysicalDevice>;

    /// Begin delivering raw reports
    fn start(&self) -> io::Result<()>;

    /// Stop delivering raw reports
    fn stop(&self);

    /// Make device I/O available
    fn open(&self) -> io::Result<()>;

    /// Release device I/O
    fn close(&self);
}

/// Transport over an already-opened hidraw node
#[derive(Debug)]
pub struct HidrawTransport {
    device: HidrawDevice,
    delivering: AtomicBool,
    io_open: AtomicBool,
}

impl HidrawTransport {
    pub fn new(device: HidrawDevice) -> Self {
        Self {
            device,
            delivering: AtomicBool::new(false),
            io_open: AtomicBool::new(false),
        }
    }

    pub fn is_delivering(&self) -> bool {
        self.delivering.load(Ordering::Acquire)
    }

    pub fn is_open(&self) -> bool {
        self.io_open.load(Ordering::Acquire)
    }

    /// Whether reports should reach the consumer: delivery started and
    /// device I/O opened
    pub fn accepts_reports(&self) -> bool {
        self.is_delivering() && self.is_open()
    }

    /// Spawn the blocking reader thread feeding `reports`
    ///
    /// Reports read while delivery is stopped or I/O is closed are discarded. The thread exits
    /// when the node reports end-of-stream, a read fails, or the receiver is
    /// dropped; in every case `reports` is dropped, which the receiving side
    /// observes as a detach.
    pub fn spawn_reader(self: &Arc<Self>, reports: mpsc::Sender<Bytes>) -> io::Result<JoinHandle<()>> {
        let mut reader = self.device.try_clone()?;
        let transport = Arc::clone(self);

        thread::Builder::new()
            .name("hidraw-reader".to_string())
            .spawn(move || {
                let mut buf = [0u8; READ_BUF_LEN];
                loop {
                    match reader.read_report(&mut buf) {
                        Ok(0) => {
                            info!("{} closed", reader.path().display());
                            break;
                        }
                        Ok(n) => {
                            if !transport.accepts_reports() {
                                continue;
                            }
                            if reports.blocking_send(Bytes::copy_from_slice(&buf[..n])).is_err() {
                                debug!("Report receiver dropped, reader exiting");
                                break;
                            }
                        }
                        Err(e) => {
                            warn!("Read from {} failed: {}", reader.path().display(), e);
                            break;
                        }
                    }
                }
            })
    }
}

impl HidTransport for HidrawTransport {
    fn parse(&self) -> io::Result<PhysicalDevice> {
        let identity = self.device.raw_info()?;
        let name = self.device.raw_name()?;
        let phys = self
            .device
            .raw_phys()
            .unwrap_or_else(|_| self.device.path().display().to_string());
        let uniq = self.device.raw_uniq().unwrap_or_default();

        Ok(PhysicalDevice {
            identity,
            name,
            phys,
            uniq,
            // hidraw does not expose the HID version
            version: 0,
        })
    }

    fn start(&self) -> io::Result<()> {
        self.delivering.store(true, Ordering::Release);
        debug!("Report delivery started on {}", self.device.path().display());
        Ok(())
    }

    fn stop(&self) {
        self.delivering.store(false, Ordering::Release);
        debug!("Report delivery stopped on {}", self.device.path().display());
    }

    fn open(&self) -> io::Result<()> {
        self.io_open.store(true, Ordering::Release);
        debug!("I/O opened on {}", self.device.path().display());
        Ok(())
    }

    fn close(&self) {
        self.io_open.store(false, Ordering::Release);
        debug!("I/O closed on {}", self.device.path().display());
    }
}
