//! Device model: hidraw discovery and identity matching.

use crate::error::Result;
use crate::transport::{HidrawBus, HidrawDevice, OpenMode};
use crate::{pids, RGO_VID};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// USB vendor/product identifiers as reported by the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl std::fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "VID: 0x{:04X}, PID: 0x{:04X}",
            self.vendor_id, self.product_id
        )
    }
}

/// The keyboard a run is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
}

impl TargetIdentity {
    pub fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }

    /// Exact match on both identifiers.
    pub fn matches(&self, identity: &DeviceIdentity) -> bool {
        identity.vendor_id == self.vendor_id && identity.product_id == self.product_id
    }
}

impl Default for TargetIdentity {
    fn default() -> Self {
        Self::new(RGO_VID, pids::SPLIT_BREAK)
    }
}

/// A matched device node with its handle still open.
///
/// The handle is closed when this value is dropped.
pub struct CandidateDevice<D> {
    pub path: PathBuf,
    pub device: D,
}

/// Lazy scan over hidraw nodes yielding only those matching a target.
///
/// Produced by [`enumerate_and_match`]. Each pass is a fresh scan; the
/// iterator cannot be restarted.
pub struct Matches<'a, B: HidrawBus> {
    bus: &'a B,
    paths: std::vec::IntoIter<PathBuf>,
    target: TargetIdentity,
    mode: OpenMode,
}

impl<B: HidrawBus> Iterator for Matches<'_, B> {
    type Item = CandidateDevice<B::Device>;

    fn next(&mut self) -> Option<Self::Item> {
        for path in self.paths.by_ref() {
            let device = match self.bus.open(&path, self.mode) {
                Ok(device) => device,
                Err(e) => {
                    warn!(error = %e, "Skipping hidraw node");
                    continue;
                }
            };

            // Any early `continue` below drops `device` and closes the node.
            let identity = match device.identity() {
                Ok(identity) => identity,
                Err(e) => {
                    warn!(error = %e, "Skipping hidraw node");
                    continue;
                }
            };

            if self.target.matches(&identity) {
                info!(
                    path = %path.display(),
                    vid = format_args!("0x{:04X}", identity.vendor_id),
                    pid = format_args!("0x{:04X}", identity.product_id),
                    "Found target keyboard"
                );
                return Some(CandidateDevice { path, device });
            }

            debug!(
                path = %path.display(),
                vid = format_args!("0x{:04X}", identity.vendor_id),
                pid = format_args!("0x{:04X}", identity.product_id),
                "Not the target device"
            );
        }
        None
    }
}

/// Scan the bus and lazily yield every node whose identity equals `target`.
///
/// Nodes that fail to open or to answer the info query are logged and
/// skipped. Only a failure to list the nodes at all is returned.
pub fn enumerate_and_match<B: HidrawBus>(
    bus: &B,
    target: TargetIdentity,
    mode: OpenMode,
) -> Result<Matches<'_, B>> {
    let paths = bus.candidate_paths()?;
    debug!(count = paths.len(), ?mode, "Scanning hidraw nodes");
    Ok(Matches {
        bus,
        paths: paths.into_iter(),
        target,
        mode,
    })
}

/// A hidraw node that answered the info query.
#[derive(Debug, Clone, Serialize)]
pub struct ProbedDevice {
    pub path: PathBuf,
    #[serde(flatten)]
    pub identity: DeviceIdentity,
    /// Whether the identity equals the requested target.
    pub matches_target: bool,
}

/// Open every node read-only, read its identity and close it again.
pub fn probe_devices<B: HidrawBus>(bus: &B, target: TargetIdentity) -> Result<Vec<ProbedDevice>> {
    let mut devices = Vec::new();
    for path in bus.candidate_paths()? {
        match probe_one(bus, &path) {
            Ok(identity) => devices.push(ProbedDevice {
                path,
                identity,
                matches_target: target.matches(&identity),
            }),
            Err(e) => warn!(error = %e, "Skipping hidraw node"),
        }
    }
    debug!(count = devices.len(), "Probe complete");
    Ok(devices)
}

fn probe_one<B: HidrawBus>(bus: &B, path: &Path) -> Result<DeviceIdentity> {
    let device = bus.open(path, OpenMode::ReadOnly)?;
    device.identity()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::{MockBus, SimNode};

    fn two_device_bus() -> MockBus {
        MockBus::new()
            .with_node("/dev/hidraw0", SimNode::new(0x046D, 0xC08B))
            .with_node("/dev/hidraw1", SimNode::new(0x0911, 0x2188))
    }

    #[test]
    fn default_target_is_rgo_keyboard() {
        let target = TargetIdentity::default();
        assert_eq!(target.vendor_id, 0x0911);
        assert_eq!(target.product_id, 0x2188);
    }

    #[test]
    fn target_requires_both_ids() {
        let target = TargetIdentity::new(0x0911, 0x2188);
        assert!(target.matches(&DeviceIdentity {
            vendor_id: 0x0911,
            product_id: 0x2188
        }));
        assert!(!target.matches(&DeviceIdentity {
            vendor_id: 0x0911,
            product_id: 0x2189
        }));
        assert!(!target.matches(&DeviceIdentity {
            vendor_id: 0x0912,
            product_id: 0x2188
        }));
    }

    #[test]
    fn yields_only_matching_nodes() {
        let bus = two_device_bus();
        let matched: Vec<PathBuf> =
            enumerate_and_match(&bus, TargetIdentity::default(), OpenMode::ReadOnly)
                .unwrap()
                .map(|c| c.path.clone())
                .collect();
        assert_eq!(matched, vec![PathBuf::from("/dev/hidraw1")]);
    }

    #[test]
    fn non_matching_handle_closed_before_next_open() {
        let bus = two_device_bus();
        let mut matches =
            enumerate_and_match(&bus, TargetIdentity::default(), OpenMode::ReadOnly).unwrap();
        let first = matches.next().unwrap();
        let counts = bus.open_close_counts();
        assert_eq!(counts[Path::new("/dev/hidraw0")], (1, 1));
        assert_eq!(counts[Path::new("/dev/hidraw1")], (1, 0));
        drop(first);
        assert_eq!(bus.open_close_counts()[Path::new("/dev/hidraw1")], (1, 1));
        assert!(matches.next().is_none());
    }

    #[test]
    fn open_and_query_failures_are_skipped() {
        let bus = MockBus::new()
            .with_node(
                "/dev/hidraw0",
                SimNode {
                    fail_open: true,
                    ..SimNode::new(0x0911, 0x2188)
                },
            )
            .with_node(
                "/dev/hidraw1",
                SimNode {
                    fail_info: true,
                    ..SimNode::new(0x0911, 0x2188)
                },
            )
            .with_node("/dev/hidraw2", SimNode::new(0x0911, 0x2188));

        let matched: Vec<PathBuf> =
            enumerate_and_match(&bus, TargetIdentity::default(), OpenMode::ReadWrite)
                .unwrap()
                .map(|c| c.path.clone())
                .collect();
        assert_eq!(matched, vec![PathBuf::from("/dev/hidraw2")]);

        let counts = bus.open_close_counts();
        assert!(!counts.contains_key(Path::new("/dev/hidraw0")));
        assert_eq!(counts[Path::new("/dev/hidraw1")], (1, 1));
        assert_eq!(counts[Path::new("/dev/hidraw2")], (1, 1));
    }

    #[test]
    fn scan_failure_is_returned() {
        let bus = MockBus::new().with_failing_scan();
        assert!(enumerate_and_match(&bus, TargetIdentity::default(), OpenMode::ReadOnly).is_err());
        assert!(probe_devices(&bus, TargetIdentity::default()).is_err());
    }

    #[test]
    fn probe_lists_every_answering_node() {
        let bus = two_device_bus().with_node(
            "/dev/hidraw2",
            SimNode {
                fail_info: true,
                ..SimNode::new(0x1234, 0x5678)
            },
        );
        let probed = probe_devices(&bus, TargetIdentity::default()).unwrap();
        assert_eq!(probed.len(), 2);
        assert_eq!(probed[0].identity.vendor_id, 0x046D);
        assert!(!probed[0].matches_target);
        assert_eq!(probed[1].path, PathBuf::from("/dev/hidraw1"));
        assert!(probed[1].matches_target);
        assert!(bus.open_modes().iter().all(|m| *m == OpenMode::ReadOnly));
        for (opens, closes) in bus.open_close_counts().values() {
            assert_eq!(opens, closes);
        }
    }

    #[test]
    fn probed_device_serializes_flat() {
        let probed = ProbedDevice {
            path: PathBuf::from("/dev/hidraw4"),
            identity: DeviceIdentity {
                vendor_id: 0x0911,
                product_id: 0x2188,
            },
            matches_target: true,
        };
        let json = serde_json::to_value(&probed).unwrap();
        assert_eq!(json["path"], "/dev/hidraw4");
        assert_eq!(json["vendor_id"], 0x0911);
        assert_eq!(json["product_id"], 0x2188);
        assert_eq!(json["matches_target"], true);
    }
}
