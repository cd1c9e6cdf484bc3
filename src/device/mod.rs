//! # Device Module
//!
//! Discovery of the PowerShell among HID device nodes.
//!
//! This module handles:
//! - Device identity (vendor/product/bus)
//! - Matching candidates against the PowerShell identity
//! - Opening and querying `/dev/hidrawN` nodes

use std::io;

pub mod identity;
pub mod matcher;
pub mod hidraw;

/// Read buffer size for report sources. Larger than a report so oversized
/// reports surface as length mismatches instead of being truncated.
pub const READ_BUF_LEN: usize = 64;

/// Blocking source of raw reports
pub trait ReportSource {
    /// Read one report into `buf`, returning the number of bytes read.
    ///
    /// Blocks until a report arrives. `Ok(0)` means the device went away.
    /// Implementations retry reads interrupted by signals.
    fn read_report(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}
