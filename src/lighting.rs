//! Lighting value types.
//!
//! [`LightingState`] is the unit of exchange between the fade orchestrator,
//! the scene catalog and the bus encoder: five independent 8-bit channels,
//! always fully defined, copied by value across every boundary.

use core::time::Duration;

use serde::{Deserialize, Serialize};

/// A complete set of lighting parameters.
///
/// Brightness is a peer channel, not a multiplier — receivers apply it as
/// master intensity in hardware, never in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightingState {
    /// Master brightness (0-255)
    pub brightness: u8,
    /// Red channel (0-255)
    pub red: u8,
    /// Green channel (0-255)
    pub green: u8,
    /// Blue channel (0-255)
    pub blue: u8,
    /// White channel (0-255)
    pub white: u8,
}

impl LightingState {
    /// All channels dark — the assumed state of receivers after power-on.
    pub const OFF: Self = Self {
        brightness: 0,
        red: 0,
        green: 0,
        blue: 0,
        white: 0,
    };

    /// Channel-wise linear interpolation towards `target` at the exact
    /// fraction `num / den`. Integer arithmetic so that `num == den` lands
    /// precisely on `target` (no float rounding at 100%).
    pub fn lerp(&self, target: &Self, num: u32, den: u32) -> Self {
        debug_assert!(den > 0 && num <= den);
        let mix = |a: u8, b: u8| -> u8 {
            let delta = i64::from(b) - i64::from(a);
            (i64::from(a) + delta * i64::from(num) / i64::from(den)) as u8
        };
        Self {
            brightness: mix(self.brightness, target.brightness),
            red: mix(self.red, target.red),
            green: mix(self.green, target.green),
            blue: mix(self.blue, target.blue),
            white: mix(self.white, target.white),
        }
    }
}

/// A request to transition the layout to `target` over `duration`.
///
/// Zero duration means "apply immediately, no interpolation". Durations
/// longer than one bus segment (255 s) are split by the fade orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeRequest {
    pub target: LightingState,
    pub duration: Duration,
}

impl FadeRequest {
    /// An immediate-apply request (duration zero).
    pub fn immediate(target: LightingState) -> Self {
        Self {
            target,
            duration: Duration::ZERO,
        }
    }
}
