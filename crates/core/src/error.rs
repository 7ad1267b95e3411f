//! Error types for rgo-led-core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core library error type.
///
/// Per-device variants carry the device node path and the OS error that
/// caused them. They are reported and skipped, never fatal to a run.
#[derive(Debug, Error)]
pub enum Error {
    /// The hidraw device directory could not be listed.
    #[error("scan {}: {source}", .path.display())]
    DeviceScanFailed { path: PathBuf, source: io::Error },

    /// A hidraw node could not be opened.
    #[error("open {}: {source}", .path.display())]
    DeviceOpenFailed { path: PathBuf, source: io::Error },

    /// The raw device info query (vendor/product) failed.
    #[error("device info query on {}: {source}", .path.display())]
    DeviceInfoQueryFailed { path: PathBuf, source: io::Error },

    /// Sending the color feature report failed.
    #[error("sending feature report to {}: {source}", .path.display())]
    FeatureReportSendFailed { path: PathBuf, source: io::Error },

    /// Writing the standard LED output report failed.
    #[error("sending output report to {}: {source}", .path.display())]
    OutputReportSendFailed { path: PathBuf, source: io::Error },

    /// Vendor or product ID is zero.
    #[error("invalid vendor or product ID (VID=0x{vendor_id:04X} PID=0x{product_id:04X})")]
    InvalidTargetIdentity { vendor_id: u16, product_id: u16 },

    /// Neither a color nor a standard LED change was requested.
    #[error("no action requested: need a color or a standard LED change")]
    NoActionRequested,
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_device_errors_name_the_path() {
        let err = Error::FeatureReportSendFailed {
            path: PathBuf::from("/dev/hidraw3"),
            source: io::Error::from_raw_os_error(32),
        };
        assert!(err.to_string().starts_with("sending feature report to /dev/hidraw3"));
    }

    #[test]
    fn invalid_target_formats_ids_as_hex() {
        let err = Error::InvalidTargetIdentity {
            vendor_id: 0,
            product_id: 0x2188,
        };
        assert!(err.to_string().contains("VID=0x0000"));
        assert!(err.to_string().contains("PID=0x2188"));
    }
}
