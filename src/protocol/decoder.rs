//! # Report Decoder
//!
//! Maps a raw PowerShell report to a [`ButtonState`].

use super::report::*;
use crate::error::DecodeError;

/// Decode a complete PowerShell report
///
/// # Arguments
///
/// * `report` - Raw report bytes, including the leading marker byte
///
/// # Returns
///
/// * `Result<ButtonState, DecodeError>` - Decoded snapshot
///
/// # Errors
///
/// Returns [`DecodeError::LengthMismatch`] if `report` is not exactly
/// [`REPORT_LEN`] bytes long.
///
/// # Examples
///
/// ```
/// use powershell_pad::protocol::decoder::decode_report;
///
/// let state = decode_report(&[1, 1, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0])?;
/// assert!(state.up && state.a);
/// # Ok::<(), powershell_pad::error::DecodeError>(())
/// ```
pub fn decode_report(report: &[u8]) -> Result<ButtonState, DecodeError> {
    if report.len() != REPORT_LEN {
        return Err(DecodeError::LengthMismatch {
            expected: REPORT_LEN,
            actual: report.len(),
        });
    }

    let mut state = ButtonState {
        marker: report[MARKER_OFFSET],
        ..ButtonState::default()
    };

    // Magnitude carries no meaning, only zero vs non-zero
    for button in Button::ALL {
        state.set(button, report[button.offset()] != 0);
    }

    Ok(state)
}
