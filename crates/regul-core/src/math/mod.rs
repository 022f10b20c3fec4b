//! Math utilities for regulators: saturation, blending and filters
//!
//! The saturation primitive is shared by every regulator. The filters are
//! the numeric collaborators regulators own: a first-order differentiator
//! and a trapezoidal integrator.

mod filter;

pub use filter::{Differentiator, Filter, TrapezoidIntegrator};

/// Clamp a value to `[-bound, bound]`
///
/// A `bound` of exactly zero disables clamping and returns `value`
/// unchanged: zero is the "unclamped" sentinel, not a zero-width interval.
/// Only the magnitude of `bound` is used, and a NaN bound also disables
/// clamping.
///
/// # Example
/// ```
/// use regul_core::math::saturate;
///
/// assert_eq!(saturate(12.0, 10.0), 10.0);
/// assert_eq!(saturate(-12.0, 10.0), -10.0);
/// assert_eq!(saturate(12.0, 0.0), 12.0);
/// ```
#[inline]
pub fn saturate(value: f64, bound: f64) -> f64 {
    if bound == 0.0 {
        return value;
    }
    let bound = bound.abs();
    if value > bound {
        bound
    } else if value < -bound {
        -bound
    } else {
        value
    }
}

/// Blend two control values
///
/// Returns `first * coeff + second * (1 - coeff)` with `coeff` clamped to
/// `[0, 1]` first, so `coeff = 1` selects `first` and `coeff = 0` selects
/// `second`. Used to hand off smoothly from one regulator to another.
///
/// # Example
/// ```
/// use regul_core::math::mix;
///
/// assert_eq!(mix(4.0, 2.0, 0.5), 3.0);
/// assert_eq!(mix(4.0, 2.0, -3.0), 2.0);
/// ```
#[inline]
pub fn mix(first: f64, second: f64, coeff: f64) -> f64 {
    let coeff = coeff.clamp(0.0, 1.0);
    first * coeff + second * (1.0 - coeff)
}

/// Raise `|value|` to `|exponent|`, keeping the sign of `value`
///
/// Exponents of exactly 1, 0 and -1 leave the value untouched.
#[inline]
pub fn signed_pow(value: f64, exponent: f64) -> f64 {
    if exponent == 1.0 || exponent == 0.0 || exponent == -1.0 {
        return value;
    }
    let shaped = value.abs().powf(exponent.abs());
    if value < 0.0 {
        -shaped
    } else {
        shaped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_saturate() {
        assert_eq!(saturate(5.0, 10.0), 5.0);
        assert_eq!(saturate(15.0, 10.0), 10.0);
        assert_eq!(saturate(-15.0, 10.0), -10.0);
        assert_eq!(saturate(10.0, 10.0), 10.0);
    }

    #[test]
    fn test_saturate_zero_bound_is_disabled() {
        assert_eq!(saturate(1e9, 0.0), 1e9);
        assert_eq!(saturate(-1e9, 0.0), -1e9);
        assert_eq!(saturate(-1e9, -0.0), -1e9);
    }

    #[test]
    fn test_saturate_negative_bound_uses_magnitude() {
        assert_eq!(saturate(15.0, -10.0), 10.0);
        assert_eq!(saturate(-15.0, -10.0), -10.0);
    }

    #[test]
    fn test_mix() {
        assert_relative_eq!(mix(0.0, 10.0, 0.25), 7.5);
        assert_eq!(mix(3.0, 7.0, 1.0), 3.0);
        assert_eq!(mix(3.0, 7.0, 0.0), 7.0);
    }

    #[test]
    fn test_mix_clamps_coefficient() {
        // Above one selects the first value
        assert_eq!(mix(3.0, 7.0, 1.5), 3.0);
        // Below zero selects the second value
        assert_eq!(mix(3.0, 7.0, -0.5), 7.0);
    }

    #[test]
    fn test_signed_pow() {
        assert_relative_eq!(signed_pow(4.0, 0.5), 2.0);
        assert_relative_eq!(signed_pow(-4.0, 0.5), -2.0);
        assert_relative_eq!(signed_pow(-2.0, -2.0), -4.0);
        assert_eq!(signed_pow(-3.0, 1.0), -3.0);
        assert_eq!(signed_pow(-3.0, 0.0), -3.0);
        assert_eq!(signed_pow(-3.0, -1.0), -3.0);
    }
}
