//! Easing curves for normalized animation progress.
//!
//! The set is fixed: droid motion only needs a linear ramp, an overshooting
//! "back out" for the rise out of the floor, and an exponential-out for
//! recoil and explosions.

use serde::{Deserialize, Serialize};

/// Overshoot constant of the back-out curve.
const BACK_OVERSHOOT: f32 = 1.701_58;

/// Easing function applied to a normalized time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    /// Linear interpolation.
    #[default]
    Linear,
    /// Fast start that overshoots the target and settles back.
    BackOut,
    /// Exponential deceleration.
    ExponentialOut,
}

impl Easing {
    /// Applies the easing function to a normalized time value.
    ///
    /// Input is clamped to `[0, 1]`, so every curve maps `0 -> 0` and `1 -> 1`.
    #[must_use]
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::BackOut => back_out(t),
            Self::ExponentialOut => exponential_out(t),
        }
    }
}

/// Back-out curve; peaks slightly above 1 before settling.
#[must_use]
pub fn back_out(t: f32) -> f32 {
    let k = t - 1.0;
    k * k * ((BACK_OVERSHOOT + 1.0) * k + BACK_OVERSHOOT) + 1.0
}

/// Exponential-out curve.
#[must_use]
pub fn exponential_out(t: f32) -> f32 {
    if t >= 1.0 {
        1.0
    } else {
        1.0 - 2.0_f32.powf(-10.0 * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints() {
        for easing in [Easing::Linear, Easing::BackOut, Easing::ExponentialOut] {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_back_out_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::BackOut.apply(i as f32 / 100.0))
            .fold(f32::MIN, f32::max);
        assert!(peak > 1.05);
        assert!(peak < 1.15);
    }

    #[test]
    fn test_exponential_out_is_monotonic() {
        let mut last = 0.0;
        for i in 1..=100 {
            let v = Easing::ExponentialOut.apply(i as f32 / 100.0);
            assert!(v >= last);
            last = v;
        }
        assert!(Easing::ExponentialOut.apply(0.5) > 0.96);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Easing::ExponentialOut.apply(1.7), 1.0);
        assert_eq!(Easing::BackOut.apply(-3.0), Easing::BackOut.apply(0.0));
        assert_eq!(Easing::Linear.apply(f32::NAN), 0.0);
    }
}
