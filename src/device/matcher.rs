//! # Device Matcher
//!
//! Walks candidate devices in enumeration order and keeps the first one
//! whose vendor/product pair equals the target.
//!
//! Candidates are consumed lazily from an iterator. A candidate that does
//! not match is dropped (and so released) before the next one is opened, so
//! at most one candidate handle is alive at a time.

use std::io;
use tracing::{debug, info};

use super::identity::DeviceIdentity;

/// A device handle that can be queried during discovery
pub trait Candidate {
    /// Query the device's vendor/product/bus identity
    fn identity(&mut self) -> io::Result<DeviceIdentity>;

    /// Query the human-readable device name
    fn name(&mut self) -> io::Result<String>;

    /// Where the handle came from, for logging
    fn location(&self) -> String;
}

/// A matched candidate
#[derive(Debug)]
pub struct Matched<H> {
    pub handle: H,
    /// Position in the enumeration
    pub index: usize,
    pub identity: DeviceIdentity,
    /// Device name, if the name query succeeded
    pub name: Option<String>,
}

/// Result of a discovery scan
#[derive(Debug)]
pub enum Discovery<H> {
    Found(Matched<H>),
    /// Enumeration ran out; `scanned` candidates were inspected and released
    NotFound { scanned: usize },
}

impl<H> Discovery<H> {
    pub fn is_found(&self) -> bool {
        matches!(self, Discovery::Found(_))
    }
}

/// Selects the first candidate matching a fixed identity
#[derive(Debug, Clone, Copy)]
pub struct DeviceMatcher {
    target: DeviceIdentity,
}

impl DeviceMatcher {
    pub fn new(target: DeviceIdentity) -> Self {
        Self { target }
    }

    /// Matcher for the Logitech PowerShell
    pub fn powershell() -> Self {
        Self::new(DeviceIdentity::powershell())
    }

    pub fn target(&self) -> &DeviceIdentity {
        &self.target
    }

    /// Scan `candidates` until one matches
    ///
    /// # Arguments
    ///
    /// * `candidates` - Lazily opened handles in increasing enumeration order
    ///
    /// # Returns
    ///
    /// * `Discovery::Found` with the open handle, or `Discovery::NotFound`
    ///   once the iterator is exhausted
    ///
    /// A candidate whose identity query fails is treated as a non-match.
    pub fn find<I, H>(&self, candidates: I) -> Discovery<H>
    where
        I: IntoIterator<Item = H>,
        H: Candidate,
    {
        let mut scanned = 0;

        for (index, mut candidate) in candidates.into_iter().enumerate() {
            scanned += 1;
            let location = candidate.location();

            let identity = match candidate.identity() {
                Ok(identity) => identity,
                Err(e) => {
                    debug!("Could not query {}: {}", location, e);
                    continue;
                }
            };

            let name = candidate.name().ok();
            debug!(
                "Found HID device: {} name={:?} (vendor: 0x{:04x}, product: 0x{:04x})",
                location,
                name.as_deref().unwrap_or(""),
                identity.vendor_id,
                identity.product_id
            );

            if identity.matches(&self.target) {
                info!("Found {} at: {}", self.target, location);
                return Discovery::Found(Matched {
                    handle: candidate,
                    index,
                    identity,
                    name,
                });
            }
            // candidate dropped here, before the next one is opened
        }

        debug!("No {} among {} candidates", self.target, scanned);
        Discovery::NotFound { scanned }
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Shared log of candidate lifecycle events
    #[derive(Clone, Default)]
    pub struct CandidateLog {
        pub opened: Arc<Mutex<Vec<usize>>>,
        pub released: Arc<Mutex<Vec<usize>>>,
    }

    impl CandidateLog {
        pub fn opened(&self) -> Vec<usize> {
            self.opened.lock().unwrap().clone()
        }

        pub fn released(&self) -> Vec<usize> {
            self.released.lock().unwrap().clone()
        }

        /// Lazily yield candidates for `identities`; `None` fails the query
        pub fn candidates(
            &self,
            identities: Vec<Option<DeviceIdentity>>,
        ) -> impl Iterator<Item = MockCandidate> {
            let log = self.clone();
            identities.into_iter().enumerate().map(move |(index, identity)| {
                log.opened.lock().unwrap().push(index);
                MockCandidate { index, identity, log: log.clone() }
            })
        }
    }

    /// Candidate that records its release
    pub struct MockCandidate {
        pub index: usize,
        identity: Option<DeviceIdentity>,
        log: CandidateLog,
    }

    impl Candidate for MockCandidate {
        fn identity(&mut self) -> io::Result<DeviceIdentity> {
            self.identity
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "not a hid device"))
        }

        fn name(&mut self) -> io::Result<String> {
            Ok(format!("mock{}", self.index))
        }

        fn location(&self) -> String {
            format!("mock{}", self.index)
        }
    }

    impl Drop for MockCandidate {
        fn drop(&mut self) {
            self.log.released.lock().unwrap().push(self.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::CandidateLog;
    use super::*;
    use crate::device::identity::BusType;

    fn other(product_id: u16) -> Option<DeviceIdentity> {
        Some(DeviceIdentity::new(0x1234, product_id, BusType::Usb))
    }

    #[test]
    fn test_finds_match_and_releases_earlier_candidates() {
        let log = CandidateLog::default();
        let candidates = log.candidates(vec![
            other(1),
            other(2),
            Some(DeviceIdentity::powershell()),
            other(3),
        ]);

        let discovery = DeviceMatcher::powershell().find(candidates);

        match discovery {
            Discovery::Found(matched) => {
                assert_eq!(matched.index, 2);
                assert_eq!(matched.handle.index, 2);
                assert_eq!(matched.name.as_deref(), Some("mock2"));
                assert_eq!(log.released(), vec![0, 1], "earlier candidates should be released");
                assert_eq!(log.opened(), vec![0, 1, 2], "scan should stop at the match");
            }
            Discovery::NotFound { .. } => panic!("expected a match"),
        }
    }

    #[test]
    fn test_not_found_releases_every_candidate_once() {
        let log = CandidateLog::default();
        let candidates = log.candidates(vec![other(1), other(2), other(3)]);

        let discovery = DeviceMatcher::powershell().find(candidates);

        assert!(matches!(discovery, Discovery::NotFound { scanned: 3 }));
        assert_eq!(log.released(), vec![0, 1, 2]);
    }

    #[test]
    fn test_query_failure_is_a_non_match() {
        let log = CandidateLog::default();
        let candidates = log.candidates(vec![None, Some(DeviceIdentity::powershell())]);

        let discovery = DeviceMatcher::powershell().find(candidates);

        assert!(discovery.is_found());
        assert_eq!(log.released(), vec![0]);
    }

    #[test]
    fn test_bus_type_is_not_compared() {
        let log = CandidateLog::default();
        let bt = DeviceIdentity::new(0x046d, 0xcae2, BusType::Bluetooth);
        let discovery = DeviceMatcher::powershell().find(log.candidates(vec![Some(bt)]));
        assert!(discovery.is_found());
    }

    #[test]
    fn test_empty_enumeration() {
        let log = CandidateLog::default();
        let discovery = DeviceMatcher::powershell().find(log.candidates(vec![]));
        assert!(matches!(discovery, Discovery::NotFound { scanned: 0 }));
    }
}
