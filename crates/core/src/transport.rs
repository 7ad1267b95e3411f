//! hidraw transport abstraction.
//!
//! Provides a trait-based transport layer so that the Linux hidraw backend
//! and simulated devices share the same interface.

use crate::device::DeviceIdentity;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// How a device node is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Enough for the info query and SET_FEATURE.
    ReadOnly,
    /// Needed to write output reports.
    ReadWrite,
}

impl OpenMode {
    /// Least-privilege mode for a run: write access only when the standard
    /// LEDs are going to be written.
    pub fn for_request(writes_standard_leds: bool) -> Self {
        if writes_standard_leds {
            Self::ReadWrite
        } else {
            Self::ReadOnly
        }
    }
}

/// An open raw HID device node.
///
/// Dropping the value closes the underlying handle.
pub trait HidrawDevice {
    /// Query the USB vendor/product identifiers.
    fn identity(&self) -> Result<DeviceIdentity>;

    /// Send a feature report (SET_FEATURE control transfer).
    ///
    /// The first byte of `data` is the report ID.
    fn send_feature_report(&mut self, data: &[u8]) -> Result<()>;

    /// Send an output report through the node's write path.
    ///
    /// The first byte of `data` is the report ID.
    fn write_output_report(&mut self, data: &[u8]) -> Result<()>;
}

/// Source of candidate device nodes.
pub trait HidrawBus {
    type Device: HidrawDevice;

    /// List candidate node paths, in whatever order the host yields them.
    fn candidate_paths(&self) -> Result<Vec<PathBuf>>;

    /// Open one node.
    fn open(&self, path: &Path, mode: OpenMode) -> Result<Self::Device>;
}

/// A simulated hidraw bus for testing.
///
/// Records every open, close and transmitted report in a shared log.
/// Built for this crate's tests and, with the `mock` feature, for
/// downstream tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use crate::error::Error;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;
    use std::rc::Rc;

    /// Something that happened on the simulated bus.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Opened(PathBuf, OpenMode),
        Closed(PathBuf),
        FeatureReport(PathBuf, Vec<u8>),
        OutputReport(PathBuf, Vec<u8>),
    }

    /// Behaviour of one simulated node.
    #[derive(Debug, Clone, Default)]
    pub struct SimNode {
        pub identity: DeviceIdentity,
        pub fail_open: bool,
        pub fail_info: bool,
        pub fail_feature: bool,
        pub fail_output: bool,
    }

    impl SimNode {
        pub fn new(vendor_id: u16, product_id: u16) -> Self {
            Self {
                identity: DeviceIdentity {
                    vendor_id,
                    product_id,
                },
                ..Self::default()
            }
        }
    }

    /// Simulated bus holding a fixed set of nodes.
    pub struct MockBus {
        nodes: Vec<(PathBuf, SimNode)>,
        fail_scan: bool,
        log: Rc<RefCell<Vec<Event>>>,
    }

    impl MockBus {
        pub fn new() -> Self {
            Self {
                nodes: Vec::new(),
                fail_scan: false,
                log: Rc::new(RefCell::new(Vec::new())),
            }
        }

        /// Add a node at `path`.
        pub fn with_node(mut self, path: &str, node: SimNode) -> Self {
            self.nodes.push((PathBuf::from(path), node));
            self
        }

        /// Make `candidate_paths` fail.
        pub fn with_failing_scan(mut self) -> Self {
            self.fail_scan = true;
            self
        }

        pub fn events(&self) -> Vec<Event> {
            self.log.borrow().clone()
        }

        pub fn feature_reports(&self) -> Vec<(PathBuf, Vec<u8>)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::FeatureReport(p, d) => Some((p, d)),
                    _ => None,
                })
                .collect()
        }

        pub fn output_reports(&self) -> Vec<(PathBuf, Vec<u8>)> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::OutputReport(p, d) => Some((p, d)),
                    _ => None,
                })
                .collect()
        }

        /// Opens and closes per path.
        pub fn open_close_counts(&self) -> HashMap<PathBuf, (usize, usize)> {
            let mut counts: HashMap<PathBuf, (usize, usize)> = HashMap::new();
            for event in self.events() {
                match event {
                    Event::Opened(p, _) => counts.entry(p).or_default().0 += 1,
                    Event::Closed(p) => counts.entry(p).or_default().1 += 1,
                    _ => {}
                }
            }
            counts
        }

        pub fn open_modes(&self) -> Vec<OpenMode> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    Event::Opened(_, mode) => Some(mode),
                    _ => None,
                })
                .collect()
        }
    }

    impl Default for MockBus {
        fn default() -> Self {
            Self::new()
        }
    }

    /// Open handle on the simulated bus.
    pub struct MockDevice {
        path: PathBuf,
        node: SimNode,
        log: Rc<RefCell<Vec<Event>>>,
    }

    fn sim_error() -> io::Error {
        io::Error::from_raw_os_error(32) // EPIPE
    }

    impl HidrawDevice for MockDevice {
        fn identity(&self) -> Result<DeviceIdentity> {
            if self.node.fail_info {
                return Err(Error::DeviceInfoQueryFailed {
                    path: self.path.clone(),
                    source: sim_error(),
                });
            }
            Ok(self.node.identity)
        }

        fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
            self.log
                .borrow_mut()
                .push(Event::FeatureReport(self.path.clone(), data.to_vec()));
            if self.node.fail_feature {
                return Err(Error::FeatureReportSendFailed {
                    path: self.path.clone(),
                    source: sim_error(),
                });
            }
            Ok(())
        }

        fn write_output_report(&mut self, data: &[u8]) -> Result<()> {
            self.log
                .borrow_mut()
                .push(Event::OutputReport(self.path.clone(), data.to_vec()));
            if self.node.fail_output {
                return Err(Error::OutputReportSendFailed {
                    path: self.path.clone(),
                    source: sim_error(),
                });
            }
            Ok(())
        }
    }

    impl Drop for MockDevice {
        fn drop(&mut self) {
            self.log
                .borrow_mut()
                .push(Event::Closed(self.path.clone()));
        }
    }

    impl HidrawBus for MockBus {
        type Device = MockDevice;

        fn candidate_paths(&self) -> Result<Vec<PathBuf>> {
            if self.fail_scan {
                return Err(Error::DeviceScanFailed {
                    path: PathBuf::from("/dev"),
                    source: io::Error::from_raw_os_error(13), // EACCES
                });
            }
            Ok(self.nodes.iter().map(|(p, _)| p.clone()).collect())
        }

        fn open(&self, path: &Path, mode: OpenMode) -> Result<MockDevice> {
            let node = self
                .nodes
                .iter()
                .find(|(p, _)| p == path)
                .map(|(_, n)| n.clone())
                .ok_or_else(|| Error::DeviceOpenFailed {
                    path: path.to_path_buf(),
                    source: io::Error::from_raw_os_error(2), // ENOENT
                })?;
            if node.fail_open {
                return Err(Error::DeviceOpenFailed {
                    path: path.to_path_buf(),
                    source: io::Error::from_raw_os_error(13), // EACCES
                });
            }
            self.log
                .borrow_mut()
                .push(Event::Opened(path.to_path_buf(), mode));
            Ok(MockDevice {
                path: path.to_path_buf(),
                node,
                log: Rc::clone(&self.log),
            })
        }
    }
}
