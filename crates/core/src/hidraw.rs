//! Linux `/dev/hidraw*` backend.
//!
//! hidraw lets us send control transfers to endpoint 0 without detaching
//! the kernel's input driver. Linux fixes bmRequestType (0x21), bRequest
//! (0x09, SET_REPORT) and wIndex (the interface number); the report type in
//! the high byte of wValue is chosen by the call we make:
//! - `HIDIOCSFEATURE` sends a feature report (wValue high byte 0x03)
//! - `write(2)` sends an output report (wValue high byte 0x02)
//!
//! In both cases the low byte of wValue is the first byte of our buffer.

use crate::device::DeviceIdentity;
use crate::error::{Error, Result};
use crate::transport::{HidrawBus, HidrawDevice, OpenMode};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{trace, warn};

/// Directory holding the raw HID nodes.
pub const HIDRAW_DIR: &str = "/dev";
/// Name prefix of raw HID nodes inside [`HIDRAW_DIR`].
pub const HIDRAW_PREFIX: &str = "hidraw";

mod ioctl {
    /// `struct hidraw_devinfo` from `linux/hidraw.h`.
    #[repr(C)]
    #[derive(Debug, Clone, Copy, Default)]
    pub struct HidrawDevinfo {
        pub bustype: u32,
        pub vendor: i16,
        pub product: i16,
    }

    // HIDIOCGRAWINFO: _IOR('H', 0x03, struct hidraw_devinfo)
    nix::ioctl_read!(hidiocgrawinfo, b'H', 0x03, HidrawDevinfo);
    // HIDIOCSFEATURE(len): _IOC(_IOC_WRITE|_IOC_READ, 'H', 0x06, len)
    nix::ioctl_readwrite_buf!(hidiocsfeature, b'H', 0x06, u8);
}

/// Entries of `dir` whose name starts with [`HIDRAW_PREFIX`], in listing
/// order. Unreadable entries are logged and skipped.
fn hidraw_nodes_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|source| Error::DeviceScanFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let paths = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping hidraw entry");
                None
            }
        })
        .filter(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .starts_with(HIDRAW_PREFIX)
        })
        .map(|entry| entry.path())
        .collect();
    Ok(paths)
}

/// The host's hidraw nodes.
#[derive(Debug, Clone, Default)]
pub struct LinuxHidrawBus;

impl LinuxHidrawBus {
    pub fn new() -> Self {
        Self
    }
}

impl HidrawBus for LinuxHidrawBus {
    type Device = LinuxHidrawDevice;

    fn candidate_paths(&self) -> Result<Vec<PathBuf>> {
        hidraw_nodes_in(Path::new(HIDRAW_DIR))
    }

    fn open(&self, path: &Path, mode: OpenMode) -> Result<LinuxHidrawDevice> {
        let file = OpenOptions::new()
            .read(true)
            .write(mode == OpenMode::ReadWrite)
            .open(path)
            .map_err(|source| Error::DeviceOpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        trace!(path = %path.display(), ?mode, "Opened hidraw node");
        Ok(LinuxHidrawDevice {
            path: path.to_path_buf(),
            file,
        })
    }
}

/// An open hidraw node. Closed on drop.
#[derive(Debug)]
pub struct LinuxHidrawDevice {
    path: PathBuf,
    file: File,
}

impl HidrawDevice for LinuxHidrawDevice {
    fn identity(&self) -> Result<DeviceIdentity> {
        let mut info = ioctl::HidrawDevinfo::default();
        // SAFETY: the fd is owned by `self.file` and stays open for the call;
        // `info` is a live, correctly sized `hidraw_devinfo`.
        let rc = unsafe { ioctl::hidiocgrawinfo(self.file.as_raw_fd(), &mut info) };
        rc.map_err(|errno| Error::DeviceInfoQueryFailed {
            path: self.path.clone(),
            source: io::Error::from(errno),
        })?;

        trace!(
            path = %self.path.display(),
            bustype = info.bustype,
            "HIDIOCGRAWINFO"
        );

        // The kernel hands back signed 16-bit fields; USB IDs are unsigned.
        Ok(DeviceIdentity {
            vendor_id: info.vendor as u16,
            product_id: info.product as u16,
        })
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<()> {
        let mut buf = data.to_vec();
        trace!(
            path = %self.path.display(),
            report_hex = format_args!("{:02X?}", buf),
            "HIDIOCSFEATURE"
        );
        // SAFETY: the fd is owned by `self.file`; the ioctl reads and may
        // write back at most `buf.len()` bytes, which the request encodes.
        let rc = unsafe { ioctl::hidiocsfeature(self.file.as_raw_fd(), &mut buf) };
        rc.map_err(|errno| Error::FeatureReportSendFailed {
            path: self.path.clone(),
            source: io::Error::from(errno),
        })?;
        Ok(())
    }

    fn write_output_report(&mut self, data: &[u8]) -> Result<()> {
        trace!(
            path = %self.path.display(),
            report_hex = format_args!("{:02X?}", data),
            "hidraw write"
        );
        let written = self
            .file
            .write(data)
            .map_err(|source| Error::OutputReportSendFailed {
                path: self.path.clone(),
                source,
            })?;
        if written != data.len() {
            return Err(Error::OutputReportSendFailed {
                path: self.path.clone(),
                source: io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("short write: {written} of {} bytes", data.len()),
                ),
            });
        }
        Ok(())
    }
}
