//! HID report encoding for the two LED reports.
//!
//! The keyboard accepts two reports on the same hidraw node:
//! - Color feature report: 8 bytes, report ID 0x30 (sent via SET_FEATURE)
//! - Standard LED output report: 2 bytes, report ID 0x00 (sent via write)
//!
//! For the feature report, Linux takes the report ID from the first payload
//! byte and still sends it as part of the payload, so 0x30 shows up both in
//! wValue and at offset 0. The output report ID is not duplicated.

use bitflags::bitflags;

/// Report ID of the vendor color feature report.
pub const COLOR_REPORT_ID: u8 = 0x30;
/// Fixed vendor sub-command at offset 1 of the color report.
pub const COLOR_SUBCOMMAND: u8 = 0x91;
/// Color feature report length (including report ID).
pub const COLOR_REPORT_LEN: usize = 8;

/// Report ID of the standard LED output report.
pub const STANDARD_LEDS_REPORT_ID: u8 = 0x00;
/// Standard LED output report length (including report ID).
pub const STANDARD_LEDS_REPORT_LEN: usize = 2;

/// Requested state of the vendor multi-color status LED.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LedColor {
    Red,
    Green,
    Yellow,
    Off,
    /// Leave the color LED alone; no feature report is sent.
    #[default]
    Unchanged,
}

impl LedColor {
    /// Wire code at offset 2 of the feature report.
    pub fn code(&self) -> Option<u8> {
        match self {
            Self::Red => Some(0x01),
            Self::Green => Some(0x02),
            Self::Yellow => Some(0x03),
            Self::Off => Some(0x04),
            Self::Unchanged => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Off => "off",
            Self::Unchanged => "unchanged",
        }
    }

    /// Parse a color name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "red" | "r" => Some(Self::Red),
            "green" | "g" => Some(Self::Green),
            "yellow" | "y" => Some(Self::Yellow),
            "off" | "o" | "none" => Some(Self::Off),
            "unchanged" | "keep" => Some(Self::Unchanged),
            _ => None,
        }
    }
}

impl std::fmt::Display for LedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

bitflags! {
    /// Standard keyboard lock LEDs, as laid out in the HID boot keyboard
    /// output report.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct StandardLeds: u8 {
        const NUM_LOCK = 1 << 0;
        const CAPS_LOCK = 1 << 1;
        const SCROLL_LOCK = 1 << 2;
    }
}

impl std::fmt::Display for StandardLeds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "all off");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        write!(f, "{}", names.join(" | "))
    }
}

/// Build the 8-byte color feature report.
///
/// Returns `None` for [`LedColor::Unchanged`]. Bytes 3..8 are zero padding;
/// the device expects the full fixed length.
pub fn encode_color_report(color: LedColor) -> Option<[u8; COLOR_REPORT_LEN]> {
    let code = color.code()?;
    let mut buf = [0u8; COLOR_REPORT_LEN];
    buf[0] = COLOR_REPORT_ID;
    buf[1] = COLOR_SUBCOMMAND;
    buf[2] = code;
    Some(buf)
}

/// Build the 2-byte standard LED output report.
///
/// Unknown bits are masked off so bits 3..8 are always zero.
pub fn encode_standard_leds_report(leds: StandardLeds) -> [u8; STANDARD_LEDS_REPORT_LEN] {
    [STANDARD_LEDS_REPORT_ID, (leds & StandardLeds::all()).bits()]
}
