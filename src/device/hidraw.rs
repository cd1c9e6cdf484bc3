//! # hidraw Device Nodes
//!
//! Access to `/dev/hidrawN` nodes: identity/name queries via ioctl and
//! blocking report reads.
//!
//! ## Enumeration
//!
//! Nodes are addressed as `<root><index>` and probed with increasing index
//! starting at 0. Enumeration ends at the first index whose node does not
//! exist. A node that exists but cannot be opened is skipped.

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::identity::{BusType, DeviceIdentity};
use super::matcher::Candidate;
use super::ReportSource;

/// Default node prefix
pub const DEFAULT_HIDRAW_ROOT: &str = "/dev/hidraw";

/// Upper bound on probed indices
const MAX_HIDRAW_NODES: usize = 256;

/// Size of the name buffer passed to `HIDIOCGRAWNAME`
const RAW_NAME_LEN: usize = 256;

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_READ: u32 = 2;

const HIDRAW_IOCTL_TYPE: u8 = b'H';
const HIDIOC_NR_GRAWINFO: u8 = 0x03;
const HIDIOC_NR_GRAWNAME: u8 = 0x04;
const HIDIOC_NR_GRAWPHYS: u8 = 0x05;
const HIDIOC_NR_GRAWUNIQ: u8 = 0x08;

/// `struct hidraw_devinfo`
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct HidrawDevInfo {
    bustype: u32,
    vendor: i16,
    product: i16,
}

const fn ioctl_code(direction: u32, kind: u8, nr: u8, size: usize) -> libc::c_ulong {
    ((direction << IOC_DIRSHIFT)
        | ((kind as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
        | ((size as u32) << IOC_SIZESHIFT)) as libc::c_ulong
}

const HIDIOCGRAWINFO: libc::c_ulong = ioctl_code(
    IOC_READ,
    HIDRAW_IOCTL_TYPE,
    HIDIOC_NR_GRAWINFO,
    std::mem::size_of::<HidrawDevInfo>(),
);

const fn hidiocgrawname(len: usize) -> libc::c_ulong {
    ioctl_code(IOC_READ, HIDRAW_IOCTL_TYPE, HIDIOC_NR_GRAWNAME, len)
}

const fn hidiocgrawphys(len: usize) -> libc::c_ulong {
    ioctl_code(IOC_READ, HIDRAW_IOCTL_TYPE, HIDIOC_NR_GRAWPHYS, len)
}

const fn hidiocgrawuniq(len: usize) -> libc::c_ulong {
    ioctl_code(IOC_READ, HIDRAW_IOCTL_TYPE, HIDIOC_NR_GRAWUNIQ, len)
}

fn parse_c_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// An open hidraw node. Closed on drop.
#[derive(Debug)]
pub struct HidrawDevice {
    file: File,
    path: PathBuf,
}

impl HidrawDevice {
    /// Open a hidraw node for reading
    ///
    /// # Errors
    ///
    /// `io::ErrorKind::NotFound` if the node does not exist; other kinds for
    /// permission or device errors.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).open(&path)?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Second handle on the same node, for a dedicated reader
    pub fn try_clone(&self) -> io::Result<Self> {
        Ok(Self {
            file: self.file.try_clone()?,
            path: self.path.clone(),
        })
    }

    /// `HIDIOCGRAWINFO`
    pub fn raw_info(&self) -> io::Result<DeviceIdentity> {
        let mut info = HidrawDevInfo::default();
        // SAFETY: HIDIOCGRAWINFO writes exactly one hidraw_devinfo into `info`.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), HIDIOCGRAWINFO, &mut info) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        // The kernel hands vendor/product back as signed shorts
        Ok(DeviceIdentity::new(
            u16::from_ne_bytes(info.vendor.to_ne_bytes()),
            u16::from_ne_bytes(info.product.to_ne_bytes()),
            BusType::from_raw(info.bustype),
        ))
    }

    /// `HIDIOCGRAWNAME`
    pub fn raw_name(&self) -> io::Result<String> {
        self.string_ioctl(hidiocgrawname(RAW_NAME_LEN))
    }

    /// `HIDIOCGRAWPHYS`, the physical address (e.g. `usb-0000:00:14.0-2/input0`)
    pub fn raw_phys(&self) -> io::Result<String> {
        self.string_ioctl(hidiocgrawphys(RAW_NAME_LEN))
    }

    /// `HIDIOCGRAWUNIQ`; older kernels reject it
    pub fn raw_uniq(&self) -> io::Result<String> {
        self.string_ioctl(hidiocgrawuniq(RAW_NAME_LEN))
    }

    fn string_ioctl(&self, request: libc::c_ulong) -> io::Result<String> {
        let mut buf = [0u8; RAW_NAME_LEN];
        // SAFETY: every request passed here encodes RAW_NAME_LEN, so the kernel
        // writes at most buf.len() bytes.
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), request, buf.as_mut_ptr()) };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(parse_c_string(&buf))
    }
}

/// Read once, retrying when a signal interrupts the call
fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}

impl ReportSource for HidrawDevice {
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        read_retrying(&mut self.file, buf)
    }
}

impl Candidate for HidrawDevice {
    fn identity(&mut self) -> io::Result<DeviceIdentity> {
        self.raw_info()
    }

    fn name(&mut self) -> io::Result<String> {
        self.raw_name()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Lazily opens `<root>0`, `<root>1`, ... until a node is missing
#[derive(Debug)]
pub struct HidrawEnumerator {
    root: String,
    next_index: usize,
    exhausted: bool,
}

impl HidrawEnumerator {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            next_index: 0,
            exhausted: false,
        }
    }

    fn node_path(&self, index: usize) -> String {
        format!("{}{}", self.root, index)
    }
}

impl Default for HidrawEnumerator {
    fn default() -> Self {
        Self::new(DEFAULT_HIDRAW_ROOT)
    }
}

impl Iterator for HidrawEnumerator {
    type Item = HidrawDevice;

    fn next(&mut self) -> Option<HidrawDevice> {
        while !self.exhausted && self.next_index < MAX_HIDRAW_NODES {
            let path = self.node_path(self.next_index);
            self.next_index += 1;

            match HidrawDevice::open(&path) {
                Ok(device) => return Some(device),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{} does not exist, enumeration done", path);
                    self.exhausted = true;
                }
                Err(e) => warn!("Could not open {}: {}", path, e),
            }
        }
        None
    }
}

/// One line of `list` output
#[derive(Debug, Clone)]
pub struct NodeSummary {
    pub path: PathBuf,
    pub name: Option<String>,
    pub identity: Option<DeviceIdentity>,
}

/// Query every enumerable node under `root`
pub fn list_nodes(root: &str) -> Vec<NodeSummary> {
    HidrawEnumerator::new(root)
        .map(|device| NodeSummary {
            name: device.raw_name().ok(),
            identity: device.raw_info().ok(),
            path: device.path,
        })
        .collect()
}
