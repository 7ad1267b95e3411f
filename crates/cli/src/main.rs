//! rgo-led CLI: set the status and lock LEDs of an R-Go keyboard.

#[cfg(not(target_os = "linux"))]
compile_error!("rgo-led drives Linux hidraw nodes and only builds on Linux");

use anyhow::Result;
use clap::{ArgGroup, Parser};
use rgo_led_core::device::{probe_devices, TargetIdentity};
use rgo_led_core::error::Error;
use rgo_led_core::hidraw::LinuxHidrawBus;
use rgo_led_core::leds::{set_leds, LedRequest};
use rgo_led_core::report::{LedColor, StandardLeds};
use rgo_led_core::safety::STANDARD_LED_CAVEAT;
use rgo_led_core::transport::HidrawBus;
use tracing::warn;
use tracing_subscriber::filter::LevelFilter;

const USAGE_HINT: &str =
    "Need one of [-r|-g|-y|-o] to specify color or one of [-N|-C|-S|-O] to change standard LEDs";

/// Parse a USB ID given in decimal or as `0x`-prefixed hex.
fn parse_usb_id(s: &str) -> std::result::Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("'{s}' is not a 16-bit USB ID: {e}"))
}

/// Parse a status LED color by name.
fn parse_color(s: &str) -> std::result::Result<LedColor, String> {
    LedColor::from_name(s).ok_or_else(|| {
        format!("unknown color '{s}' (expected red, green, yellow, off or unchanged)")
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "rgo-led",
    version,
    about = "Set the status LED and lock LEDs of an R-Go keyboard via hidraw",
    after_long_help = STANDARD_LED_CAVEAT,
    args_override_self = true
)]
#[command(group(ArgGroup::new("status_color").args(["red", "green", "yellow", "off", "color"])))]
struct Cli {
    /// Status LED red.
    #[arg(short = 'r', long)]
    red: bool,
    /// Status LED green.
    #[arg(short = 'g', long)]
    green: bool,
    /// Status LED yellow.
    #[arg(short = 'y', long)]
    yellow: bool,
    /// Status LED off.
    #[arg(short = 'o', long)]
    off: bool,
    /// Status LED color by name: red, green, yellow, off or unchanged.
    #[arg(long, value_name = "NAME", value_parser = parse_color)]
    color: Option<LedColor>,

    /// Light Num Lock (other standard LEDs not given are turned off).
    #[arg(short = 'N', long)]
    num_lock: bool,
    /// Light Caps Lock (other standard LEDs not given are turned off).
    #[arg(short = 'C', long)]
    caps_lock: bool,
    /// Light Scroll Lock (other standard LEDs not given are turned off).
    #[arg(short = 'S', long)]
    scroll_lock: bool,
    /// Turn all standard LEDs off.
    #[arg(short = 'O', long, conflicts_with_all = ["num_lock", "caps_lock", "scroll_lock"])]
    all_off: bool,

    /// USB vendor ID of the keyboard (decimal or 0x-hex).
    #[arg(short = 'v', long, value_parser = parse_usb_id, default_value = "0x0911")]
    vendor: u16,
    /// USB product ID of the keyboard (decimal or 0x-hex).
    #[arg(short = 'p', long, value_parser = parse_usb_id, default_value = "0x2188")]
    product: u16,

    /// List hidraw devices and their IDs instead of setting LEDs.
    #[arg(
        long,
        conflicts_with_all = [
            "red", "green", "yellow", "off", "color",
            "num_lock", "caps_lock", "scroll_lock", "all_off",
        ]
    )]
    list: bool,
    /// Print the device list as JSON.
    #[arg(long, requires = "list")]
    json: bool,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn led_color(&self) -> LedColor {
        if let Some(color) = self.color {
            color
        } else if self.red {
            LedColor::Red
        } else if self.green {
            LedColor::Green
        } else if self.yellow {
            LedColor::Yellow
        } else if self.off {
            LedColor::Off
        } else {
            LedColor::Unchanged
        }
    }

    fn standard(&self) -> Option<StandardLeds> {
        if self.all_off {
            return Some(StandardLeds::empty());
        }
        let mut leds = StandardLeds::empty();
        leds.set(StandardLeds::NUM_LOCK, self.num_lock);
        leds.set(StandardLeds::CAPS_LOCK, self.caps_lock);
        leds.set(StandardLeds::SCROLL_LOCK, self.scroll_lock);
        (!leds.is_empty()).then_some(leds)
    }

    fn target(&self) -> TargetIdentity {
        TargetIdentity::new(self.vendor, self.product)
    }

    fn request(&self) -> LedRequest {
        LedRequest {
            target: self.target(),
            color: self.led_color(),
            standard: self.standard(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(default_level.into())
                .from_env_lossy(),
        )
        .init();
}

fn list_devices<B: HidrawBus>(bus: &B, target: TargetIdentity, json: bool) -> Result<()> {
    let devices = probe_devices(bus, target)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No readable hidraw devices found.");
        println!("Check that /dev/hidraw* exists and that you have read access.");
    }
    for dev in &devices {
        let marker = if dev.matches_target { " [target]" } else { "" };
        println!("{} ({}){marker}", dev.path.display(), dev.identity);
    }
    Ok(())
}

/// Carry out one invocation against `bus`.
///
/// Returns an error only for invalid requests or an unreadable device
/// directory; per-device send failures are logged and do not fail the run.
fn run<B: HidrawBus>(cli: &Cli, bus: &B) -> Result<()> {
    if cli.list {
        return list_devices(bus, cli.target(), cli.json);
    }

    let request = cli.request();
    let summary = match set_leds(bus, &request) {
        Ok(summary) => summary,
        Err(e @ Error::NoActionRequested) => anyhow::bail!("{e}\n{USAGE_HINT}"),
        Err(e) => return Err(e.into()),
    };

    if summary.matched() == 0 {
        warn!(
            vid = format_args!("0x{:04X}", request.target.vendor_id),
            pid = format_args!("0x{:04X}", request.target.product_id),
            "No matching keyboard found"
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli, &LinuxHidrawBus::new())
}
