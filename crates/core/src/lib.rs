//! rgo-led-core: hidraw discovery and LED report encoding.
//!
//! This crate drives the vendor status LED and the standard lock LEDs of
//! R-Go keyboards from userspace through Linux hidraw, without detaching the
//! kernel's input driver.

pub mod device;
pub mod error;
#[cfg(target_os = "linux")]
pub mod hidraw;
pub mod leds;
pub mod report;
pub mod safety;
pub mod transport;

/// R-Go Tools USB Vendor ID.
pub const RGO_VID: u16 = 0x0911;

/// Known R-Go keyboard product IDs.
pub mod pids {
    /// R-Go Split Break keyboard with the multi-color break indicator LED.
    pub const SPLIT_BREAK: u16 = 0x2188;
}
