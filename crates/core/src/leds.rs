//! Applying LED requests to matched devices.
//!
//! A run is a single linear pass: validate, enumerate, match, encode,
//! transmit, close. The color and standard LED reports are independent; a
//! failure of one never stops the other, and a failure on one device never
//! stops the next. Nothing is retried.

use crate::device::{enumerate_and_match, CandidateDevice, TargetIdentity};
use crate::error::{Error, Result};
use crate::report::{encode_color_report, encode_standard_leds_report, LedColor, StandardLeds};
use crate::safety::{validate_action, validate_target};
use crate::transport::{HidrawBus, HidrawDevice, OpenMode};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Everything one invocation asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedRequest {
    pub target: TargetIdentity,
    pub color: LedColor,
    /// `None` leaves the standard LEDs alone; `Some(empty)` turns them off.
    pub standard: Option<StandardLeds>,
}

impl LedRequest {
    pub fn open_mode(&self) -> OpenMode {
        OpenMode::for_request(self.standard.is_some())
    }
}

/// Results of the two sub-operations on one device.
///
/// `None` means the sub-operation was not requested.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    pub color: Option<Result<()>>,
    pub standard: Option<Result<()>>,
}

impl ApplyOutcome {
    /// True when every requested sub-operation succeeded.
    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Error> {
        self.color
            .iter()
            .chain(self.standard.iter())
            .filter_map(|r| r.as_ref().err())
    }
}

/// Send the requested reports to one matched device.
pub fn apply<D: HidrawDevice>(
    candidate: &mut CandidateDevice<D>,
    color: LedColor,
    standard: Option<StandardLeds>,
) -> ApplyOutcome {
    let path = candidate.path.display();
    let mut outcome = ApplyOutcome::default();

    if let Some(report) = encode_color_report(color) {
        let result = candidate.device.send_feature_report(&report);
        match &result {
            Ok(()) => info!(path = %path, %color, "Color LED set"),
            Err(e) => error!(error = %e, "Color LED not set"),
        }
        outcome.color = Some(result);
    }

    if let Some(leds) = standard {
        let report = encode_standard_leds_report(leds);
        let result = candidate.device.write_output_report(&report);
        match &result {
            Ok(()) => info!(path = %path, leds = %leds, "Standard LEDs set"),
            Err(e) => error!(error = %e, "Standard LEDs not set"),
        }
        outcome.standard = Some(result);
    }

    outcome
}

/// Outcome for one matched device.
#[derive(Debug)]
pub struct DeviceOutcome {
    pub path: PathBuf,
    pub outcome: ApplyOutcome,
}

/// What a whole run did.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub devices: Vec<DeviceOutcome>,
}

impl RunSummary {
    pub fn matched(&self) -> usize {
        self.devices.len()
    }

    pub fn failures(&self) -> usize {
        self.devices
            .iter()
            .map(|d| d.outcome.errors().count())
            .sum()
    }
}

/// Validate `request`, then apply it to every matching device on `bus`.
///
/// Validation errors are returned before any node is opened. Per-device
/// failures are logged and recorded in the summary; they do not make the
/// run fail.
pub fn set_leds<B: HidrawBus>(bus: &B, request: &LedRequest) -> Result<RunSummary> {
    let target = validate_target(request.target)?;
    validate_action(request.color, request.standard)?;

    let mut summary = RunSummary::default();
    for mut candidate in enumerate_and_match(bus, target, request.open_mode())? {
        let outcome = apply(&mut candidate, request.color, request.standard);
        summary.devices.push(DeviceOutcome {
            path: candidate.path,
            outcome,
        });
    }

    debug!(
        matched = summary.matched(),
        failures = summary.failures(),
        "LED run complete"
    );
    Ok(summary)
}
