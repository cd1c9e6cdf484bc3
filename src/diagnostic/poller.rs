//! # Diagnostic Poller
//!
//! Unprivileged reader: find the PowerShell node, then read, decode and
//! render reports until the process is stopped or the device goes away.
//! Runs on the calling thread and blocks on every read.

use std::io::{self, Write};
use tracing::{info, warn};

use super::render::{self, RenderFormat};
use crate::device::matcher::{Candidate, DeviceMatcher, Discovery};
use crate::device::{ReportSource, READ_BUF_LEN};
use crate::protocol::decoder::decode_report;

/// Why polling stopped
#[derive(Debug)]
pub enum StopReason {
    /// `max_reports` reports were read
    LimitReached,
    /// The device returned end-of-stream
    EndOfStream,
    /// A read failed
    ReadFailed(io::Error),
}

/// Result of a poller run
#[derive(Debug)]
pub enum PollOutcome {
    /// No matching device; nothing was read
    NotFound { scanned: usize },
    /// Polling ended after `reports` reads
    Finished { reports: u64, reason: StopReason },
}

/// Blocking read/decode/render loop
pub struct DiagnosticPoller<W: Write> {
    out: W,
    format: RenderFormat,
    max_reports: Option<u64>,
}

impl<W: Write> DiagnosticPoller<W> {
    /// # Arguments
    ///
    /// * `out` - Where rendered reports go
    /// * `format` - Text or JSON lines
    /// * `max_reports` - Stop after this many reads; `None` polls forever
    pub fn new(out: W, format: RenderFormat, max_reports: Option<u64>) -> Self {
        Self { out, format, max_reports }
    }

    /// Discover the device among `candidates`, then poll it
    ///
    /// # Errors
    ///
    /// Only output errors are returned. Device read failures end polling and
    /// are reported through [`PollOutcome::Finished`].
    pub fn run<I, H>(&mut self, matcher: &DeviceMatcher, candidates: I) -> io::Result<PollOutcome>
    where
        I: IntoIterator<Item = H>,
        H: Candidate + ReportSource,
    {
        let matched = match matcher.find(candidates) {
            Discovery::Found(matched) => matched,
            Discovery::NotFound { scanned } => {
                info!("Device not present ({} candidates scanned)", scanned);
                render::render_not_found(&mut self.out, self.format, scanned)?;
                self.out.flush()?;
                return Ok(PollOutcome::NotFound { scanned });
            }
        };

        render::render_found(
            &mut self.out,
            self.format,
            &matched.handle.location(),
            matched.name.as_deref(),
            &matched.identity,
        )?;

        self.poll(matched.handle)
    }

    /// Poll an already-open handle. The handle is released on return.
    pub fn poll<H: ReportSource>(&mut self, mut handle: H) -> io::Result<PollOutcome> {
        let mut buf = [0u8; READ_BUF_LEN];
        let mut reports: u64 = 0;

        let reason = loop {
            if self.max_reports.is_some_and(|max| reports >= max) {
                break StopReason::LimitReached;
            }

            let n = match handle.read_report(&mut buf) {
                Ok(0) => break StopReason::EndOfStream,
                Ok(n) => n,
                Err(e) => {
                    warn!("Read failed: {}", e);
                    break StopReason::ReadFailed(e);
                }
            };
            reports += 1;

            match decode_report(&buf[..n]) {
                Ok(state) => render::render_state(&mut self.out, self.format, reports, &state)?,
                Err(e) => render::render_malformed(&mut self.out, self.format, reports, &e)?,
            }
            self.out.flush()?;
        };

        drop(handle);
        info!("Polling stopped after {} reports: {:?}", reports, reason);
        Ok(PollOutcome::Finished { reports, reason })
    }

    /// Recover the output sink
    pub fn into_inner(self) -> W {
        self.out
    }
}
