//! # PowerShell Pad
//!
//! Userspace driver and diagnostic reader for the Logitech PowerShell
//! iPhone gamepad.
//!
//! # Commands
//!
//! - `run`: find the gamepad, create a virtual joystick and republish every
//!   report on it until Ctrl+C or the gamepad is unplugged (needs access to
//!   the hidraw node and `/dev/uinput`)
//! - `diag`: print every decoded report; only needs read access to the node
//! - `list`: show all hidraw nodes with their ids
//!
//! # Examples
//!
//! ```bash
//! sudo powershell-pad run
//! powershell-pad diag --format json --count 10
//! ```
//!
//! Expected output of `run`:
//! ```text
//! INFO powershell_pad::device::matcher: Found 046d:cae2 (USB) at: /dev/hidraw3
//! INFO powershell_pad::input::publisher: Registered virtual joystick "Logitech powershell gamepad and battery for IPhone Joypad" (046d:cae2 (USB))
//! INFO powershell_pad::driver::controller: Bound "Logitech powershell gamepad and battery for IPhone Joypad"
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use powershell_pad::config::{Config, LoggingConfig};
use powershell_pad::device::hidraw::{list_nodes, HidrawEnumerator};
use powershell_pad::device::identity::DeviceIdentity;
use powershell_pad::device::matcher::{DeviceMatcher, Discovery};
use powershell_pad::diagnostic::poller::{DiagnosticPoller, PollOutcome, StopReason};
use powershell_pad::diagnostic::render::RenderFormat;
use powershell_pad::driver::event_loop::{drive, DriveOutcome};
use powershell_pad::driver::registry::DriverRegistry;
use powershell_pad::input::uinput::UinputSink;
use powershell_pad::transport::HidrawTransport;

/// Log file name prefix when `[logging] log_dir` is set
const LOG_FILE_PREFIX: &str = "powershell-pad.log";

#[derive(Debug, Parser)]
#[command(name = "powershell-pad", version, about = "Logitech PowerShell gamepad driver")]
struct Cli {
    /// Configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bind the gamepad to a virtual joystick
    Run,
    /// Print decoded reports
    Diag {
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<RenderFormat>,
        /// Stop after this many reports
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },
    /// List hidraw nodes
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging);
    info!("PowerShell Pad v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Run => run_driver(&config).await,
        Command::Diag { format, count } => diagnose(config, format, count).await,
        Command::List => {
            list(&config);
            Ok(())
        }
    }
}

/// Initialize logging to stderr, or to a daily rolling file when configured
///
/// `RUST_LOG` overrides the configured level. The returned guard must live
/// until exit so buffered lines reach the file.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.log_dir.is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&logging.log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

/// Driver path: bind, republish until Ctrl+C or unplug, tear down
async fn run_driver(config: &Config) -> Result<()> {
    let mut registry: DriverRegistry<HidrawTransport, UinputSink> =
        DriverRegistry::new(&config.device.name);

    let matcher = DeviceMatcher::new(registry.target());
    let matched = match matcher.find(HidrawEnumerator::new(&config.device.root)) {
        Discovery::Found(matched) => matched,
        Discovery::NotFound { scanned } => {
            bail!("PowerShell not found ({} hidraw nodes scanned)", scanned);
        }
    };

    let transport = Arc::new(HidrawTransport::new(matched.handle));
    let controller = registry
        .attach(&matched.identity, Arc::clone(&transport), UinputSink::new())
        .context("failed to bind PowerShell")?;

    // The bridge is itself a consumer of the device
    controller.publisher().open()?;

    let (report_tx, report_rx) = mpsc::channel(1);
    transport.spawn_reader(report_tx)?;

    info!("Republishing reports, press Ctrl+C to exit");
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let (outcome, received) = drive(&mut registry, report_rx, shutdown).await;

    match outcome {
        DriveOutcome::Shutdown => info!("Received Ctrl+C, shutting down..."),
        DriveOutcome::Detached => warn!("PowerShell disconnected"),
    }
    info!("Total reports received: {}", received);

    registry.shutdown();
    Ok(())
}

/// Run the diagnostic loop on the blocking pool; Ctrl+C ends the process
async fn diagnose(config: Config, format: Option<RenderFormat>, count: Option<u64>) -> Result<()> {
    tokio::task::spawn_blocking(move || run_diagnostic(&config, format, count)).await?
}

/// Diagnostic path: blocking read/decode/print loop on stdout
fn run_diagnostic(config: &Config, format: Option<RenderFormat>, count: Option<u64>) -> Result<()> {
    let format = format.unwrap_or(config.diagnostic.format);
    let limit = count.or(config.max_reports());

    let mut poller = DiagnosticPoller::new(io::stdout().lock(), format, limit);
    let outcome = poller.run(
        &DeviceMatcher::powershell(),
        HidrawEnumerator::new(&config.device.root),
    )?;

    match outcome {
        PollOutcome::NotFound { scanned } => {
            warn!("PowerShell not present ({} hidraw nodes scanned)", scanned);
        }
        PollOutcome::Finished { reports, reason: StopReason::ReadFailed(e) } => {
            warn!("Stopped after {} reports: {}", reports, e);
        }
        PollOutcome::Finished { reports, reason } => {
            info!("Stopped after {} reports ({:?})", reports, reason);
        }
    }
    Ok(())
}

/// Print every hidraw node and flag the PowerShell
fn list(config: &Config) {
    let target = DeviceIdentity::powershell();

    for node in list_nodes(&config.device.root) {
        let name = node.name.as_deref().unwrap_or("<unknown>");
        match node.identity {
            Some(identity) => println!(
                "{}\t{}\t{}{}",
                node.path.display(),
                identity,
                name,
                if identity.matches(&target) { "\t<- PowerShell" } else { "" }
            ),
            None => println!("{}\t????:????\t{}", node.path.display(), name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_diag_overrides() {
        let cli = Cli::parse_from(["powershell-pad", "diag", "--format", "json", "-n", "5"]);
        match cli.command {
            Command::Diag { format, count } => {
                assert_eq!(format, Some(RenderFormat::Json));
                assert_eq!(count, Some(5));
            }
            other => panic!("expected diag, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_config_flag() {
        let cli = Cli::parse_from(["powershell-pad", "run", "--config", "/etc/pad.toml"]);
        assert!(matches!(cli.command, Command::Run));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/pad.toml")));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["powershell-pad"]).is_err());
    }

    #[tokio::test]
    async fn test_diagnose_without_device_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.device.root = format!("{}/hidraw", dir.path().display());

        assert!(diagnose(config, Some(RenderFormat::Text), Some(1)).await.is_ok());
    }

    #[test]
    fn test_log_file_prefix() {
        assert_eq!(LOG_FILE_PREFIX, "powershell-pad.log");
    }
}
