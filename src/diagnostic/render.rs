//! # Diagnostic Rendering
//!
//! Human-readable (`text`) and machine-readable (`json`) views of decoded
//! reports.

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::io::{self, Write};

use crate::device::identity::DeviceIdentity;
use crate::error::DecodeError;
use crate::protocol::report::ButtonState;

/// Output format of the diagnostic poller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RenderFormat {
    /// One line per button
    #[default]
    Text,
    /// One JSON object per report
    Json,
}

/// Announce the matched device
pub fn render_found<W: Write>(
    out: &mut W,
    format: RenderFormat,
    location: &str,
    name: Option<&str>,
    identity: &DeviceIdentity,
) -> io::Result<()> {
    match format {
        RenderFormat::Text => {
            writeln!(out, "Name: {}", name.unwrap_or("<unknown>"))?;
            writeln!(out, "\tpath: {}", location)?;
            writeln!(out, "\tvendor: 0x{:04x}", identity.vendor_id)?;
            writeln!(out, "\tproduct: 0x{:04x}", identity.product_id)?;
            writeln!(out, "\tbus: {}", identity.bus_type)?;
            writeln!(out, "found!")
        }
        RenderFormat::Json => {
            let line = json!({
                "event": "found",
                "path": location,
                "name": name,
                "vendor_id": identity.vendor_id,
                "product_id": identity.product_id,
                "bus": identity.bus_type.to_string(),
            });
            writeln!(out, "{}", line)
        }
    }
}

/// Report that no device matched
pub fn render_not_found<W: Write>(out: &mut W, format: RenderFormat, scanned: usize) -> io::Result<()> {
    match format {
        RenderFormat::Text => writeln!(out, "device not present ({} nodes scanned)", scanned),
        RenderFormat::Json => writeln!(out, "{}", json!({ "event": "not_found", "scanned": scanned })),
    }
}

/// Render one decoded report
pub fn render_state<W: Write>(
    out: &mut W,
    format: RenderFormat,
    seq: u64,
    state: &ButtonState,
) -> io::Result<()> {
    match format {
        RenderFormat::Text => {
            writeln!(out, "ALIGN? {}", state.marker)?;
            for (button, pressed) in state.iter() {
                writeln!(out, "{}: {}", button.label(), u8::from(pressed))?;
            }
            writeln!(out)
        }
        RenderFormat::Json => {
            let line = json!({
                "event": "report",
                "seq": seq,
                "timestamp": Utc::now().to_rfc3339(),
                "state": state,
            });
            writeln!(out, "{}", line)
        }
    }
}

/// Render a report that failed to decode
pub fn render_malformed<W: Write>(
    out: &mut W,
    format: RenderFormat,
    seq: u64,
    error: &DecodeError,
) -> io::Result<()> {
    match format {
        RenderFormat::Text => writeln!(out, "malformed report #{}: {}", seq, error),
        RenderFormat::Json => writeln!(
            out,
            "{}",
            json!({
                "event": "malformed",
                "seq": seq,
                "timestamp": Utc::now().to_rfc3339(),
                "error": error.to_string(),
            })
        ),
    }
}
