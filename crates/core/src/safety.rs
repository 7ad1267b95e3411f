//! Safety layer: validates a request before any device is touched.
//!
//! # Invariants
//! 1. No device node is opened for a request with a zero vendor or product ID
//! 2. No device node is opened for a request that changes nothing
//! 3. Reports only go to nodes whose queried identity equals the target
//!    (enforced by [`crate::device::enumerate_and_match`])
//!
//! # Standard LEDs
//! Writing the Num/Caps/Scroll Lock LEDs only changes what the LEDs show.
//! See [`STANDARD_LED_CAVEAT`].

use crate::device::TargetIdentity;
use crate::error::{Error, Result};
use crate::report::{LedColor, StandardLeds};

/// Caveat for any user-facing output about standard LED writes.
pub const STANDARD_LED_CAVEAT: &str = "\
NOTE: The kernel input driver keeps its own Num/Caps/Scroll Lock LED state and \
does not see this write. It will overwrite the LEDs the next time a lock key is \
pressed. Changing an LED does not change the modifier state on the host \
(lighting Caps Lock does not enable Caps Lock), although the keyboard firmware \
may react to it. Use with caution.";

/// Reject a target with a zero vendor or product ID.
pub fn validate_target(target: TargetIdentity) -> Result<TargetIdentity> {
    if target.vendor_id == 0 || target.product_id == 0 {
        return Err(Error::InvalidTargetIdentity {
            vendor_id: target.vendor_id,
            product_id: target.product_id,
        });
    }
    Ok(target)
}

/// Reject a request that neither sets a color nor touches the standard LEDs.
///
/// `Some(StandardLeds::empty())` is an action: it turns all three off.
pub fn validate_action(color: LedColor, standard: Option<StandardLeds>) -> Result<()> {
    if color == LedColor::Unchanged && standard.is_none() {
        return Err(Error::NoActionRequested);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_target_accepts_default() {
        let target = TargetIdentity::default();
        assert_eq!(validate_target(target).unwrap(), target);
    }

    #[test]
    fn validate_target_rejects_zero_ids() {
        assert!(matches!(
            validate_target(TargetIdentity::new(0, 0x2188)),
            Err(Error::InvalidTargetIdentity { vendor_id: 0, .. })
        ));
        assert!(matches!(
            validate_target(TargetIdentity::new(0x0911, 0)),
            Err(Error::InvalidTargetIdentity { product_id: 0, .. })
        ));
    }

    #[test]
    fn validate_action_requires_something() {
        assert!(matches!(
            validate_action(LedColor::Unchanged, None),
            Err(Error::NoActionRequested)
        ));
    }

    #[test]
    fn validate_action_accepts_each_half() {
        assert!(validate_action(LedColor::Red, None).is_ok());
        assert!(validate_action(LedColor::Off, None).is_ok());
        assert!(validate_action(LedColor::Unchanged, Some(StandardLeds::CAPS_LOCK)).is_ok());
        assert!(validate_action(LedColor::Green, Some(StandardLeds::NUM_LOCK)).is_ok());
    }

    #[test]
    fn explicit_all_off_is_an_action() {
        assert!(validate_action(LedColor::Unchanged, Some(StandardLeds::empty())).is_ok());
    }

    #[test]
    fn caveat_mentions_kernel_override() {
        assert!(STANDARD_LED_CAVEAT.contains("kernel"));
        assert!(STANDARD_LED_CAVEAT.contains("overwrite"));
    }
}
