//! # Diagnostic Module
//!
//! The unprivileged path: read the PowerShell's hidraw node directly and
//! print what each report decodes to.

pub mod poller;
pub mod render;
