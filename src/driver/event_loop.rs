//! # Driver Event Loop
//!
//! Feeds raw reports from the transport adapter into the registry, one at a
//! time, until shutdown is requested or the device goes away.

use bytes::Bytes;
use std::future::Future;
use tokio::sync::mpsc;
use tracing::info;

use super::registry::DriverRegistry;
use crate::input::InputSink;
use crate::transport::HidTransport;

/// Why [`drive`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The shutdown future completed; the binding is left in place
    Shutdown,
    /// The report stream ended; the binding was detached
    Detached,
}

/// Run until `shutdown` resolves or `reports` closes
///
/// Each report is dispatched to completion before the next one is received.
///
/// # Returns
///
/// * `(DriveOutcome, u64)` - Why the loop ended and how many reports it received
pub async fn drive<T, S, F>(
    registry: &mut DriverRegistry<T, S>,
    mut reports: mpsc::Receiver<Bytes>,
    shutdown: F,
) -> (DriveOutcome, u64)
where
    T: HidTransport,
    S: InputSink,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut received: u64 = 0;

    loop {
        tokio::select! {
            report = reports.recv() => match report {
                Some(report) => {
                    received += 1;
                    registry.dispatch(&report);
                }
                None => {
                    info!("Report stream closed, device detached");
                    registry.detach();
                    return (DriveOutcome::Detached, received);
                }
            },

            _ = &mut shutdown => {
                info!("Shutdown requested after {} reports", received);
                return (DriveOutcome::Shutdown, received);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::identity::DeviceIdentity;
    use crate::driver::controller::test_support::healthy_transport;
    use crate::input::mocks::{RecordingSink, SinkEvent};
    use crate::input::virtual_device::JOYPAD_NAME;
    use crate::transport::MockHidTransport;
    use std::sync::Arc;

    fn bound_registry(sink: &RecordingSink) -> DriverRegistry<MockHidTransport, RecordingSink> {
        let mut registry = DriverRegistry::new(JOYPAD_NAME);
        registry
            .attach(&DeviceIdentity::powershell(), Arc::new(healthy_transport()), sink.clone())
            .unwrap();
        sink.clear();
        registry
    }

    #[tokio::test]
    async fn test_drive_processes_reports_until_stream_closes() {
        let sink = RecordingSink::new();
        let mut registry = bound_registry(&sink);
        let (tx, rx) = mpsc::channel(4);

        tx.send(Bytes::from_static(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])).await.unwrap();
        tx.send(Bytes::from_static(&[1, 2, 3])).await.unwrap();
        tx.send(Bytes::from_static(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0])).await.unwrap();
        drop(tx);

        let (outcome, received) = drive(&mut registry, rx, std::future::pending()).await;

        assert_eq!(outcome, DriveOutcome::Detached);
        assert_eq!(received, 3);
        assert_eq!(sink.count(&SinkEvent::Sync), 2, "malformed report is skipped");
        assert_eq!(sink.count(&SinkEvent::Destroyed), 1, "closing the stream detaches");
        assert!(!registry.is_bound());
    }

    #[tokio::test]
    async fn test_drive_stops_on_shutdown() {
        let sink = RecordingSink::new();
        let mut registry = bound_registry(&sink);
        let (_tx, rx) = mpsc::channel::<Bytes>(1);

        let (outcome, received) = drive(&mut registry, rx, async {}).await;

        assert_eq!(outcome, DriveOutcome::Shutdown);
        assert_eq!(received, 0);
        assert!(registry.is_bound(), "shutdown leaves teardown to the caller");
    }

    #[test]
    fn test_drive_with_block_on() {
        let sink = RecordingSink::new();
        let mut registry = bound_registry(&sink);
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        let (outcome, _) = tokio_test::block_on(drive(&mut registry, rx, std::future::pending()));

        assert_eq!(outcome, DriveOutcome::Detached);
    }
}
