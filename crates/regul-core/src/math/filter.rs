//! Numeric filters owned by regulators
//!
//! Both filters are exact-value state machines that remember one previous
//! sample and run at a fixed sampling period chosen at construction.

use serde::{Deserialize, Serialize};

use super::saturate;
use crate::{Error, Result};

/// Trait for sampled-signal filters
pub trait Filter: Send + Sync {
    /// Feed a new sample and return the filter output
    fn update(&mut self, sample: f64) -> f64;

    /// Forget all cached samples
    fn reset(&mut self);

    /// Get the last output without updating
    fn value(&self) -> f64;
}

fn check_period(dt: f64) -> Result<f64> {
    if !dt.is_finite() || dt <= 0.0 {
        tracing::warn!("rejecting sampling period {}", dt);
        return Err(Error::InvalidTimeStep(dt));
    }
    Ok(dt)
}

/// First-order differentiator
///
/// Estimates the rate of change of a sampled signal with a backward
/// difference, `(sample - previous) / dt`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Differentiator {
    /// Previous sample
    prev_sample: Option<f64>,
    /// Sample period in seconds
    dt: f64,
    /// Last rate estimate
    rate: f64,
}

impl Differentiator {
    /// Create a new differentiator
    ///
    /// # Arguments
    /// * `dt` - Sampling period in seconds, must be positive and finite
    pub fn new(dt: f64) -> Result<Self> {
        Ok(Self {
            prev_sample: None,
            dt: check_period(dt)?,
            rate: 0.0,
        })
    }

    /// Get the sample period
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Estimate the rate of change for a new sample
    ///
    /// The first sample after construction or [`Filter::reset`] has nothing
    /// to difference against and yields 0.
    #[inline]
    pub fn differentiate(&mut self, sample: f64) -> f64 {
        self.rate = match self.prev_sample {
            Some(prev) => (sample - prev) / self.dt,
            None => 0.0,
        };
        self.prev_sample = Some(sample);
        self.rate
    }
}

impl Filter for Differentiator {
    fn update(&mut self, sample: f64) -> f64 {
        self.differentiate(sample)
    }

    fn reset(&mut self) {
        self.prev_sample = None;
        self.rate = 0.0;
    }

    fn value(&self) -> f64 {
        self.rate
    }
}

/// Trapezoidal integrator
///
/// Each call contributes the trapezoid between the previous and the current
/// sample, `(previous + sample) / 2 * dt`. In accumulating mode the
/// integrator keeps (and saturates) its own running sum; otherwise it hands
/// back the incremental area and leaves accumulation to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrapezoidIntegrator {
    /// Previous sample
    prev_sample: Option<f64>,
    /// Sample period in seconds
    dt: f64,
    /// Keep a running sum instead of returning increments
    accumulate: bool,
    /// Bound for the running sum (0 = unclamped)
    saturation: f64,
    /// Running sum (accumulating mode only)
    sum: f64,
    /// Last returned value
    output: f64,
}

impl TrapezoidIntegrator {
    /// Create a new trapezoidal integrator
    ///
    /// # Arguments
    /// * `dt` - Sampling period in seconds, must be positive and finite
    /// * `accumulate` - Keep a running sum and return it from each call
    /// * `saturation` - Bound for the running sum, 0 disables clamping
    pub fn new(dt: f64, accumulate: bool, saturation: f64) -> Result<Self> {
        let dt = check_period(dt)?;
        if saturation.is_nan() || saturation < 0.0 {
            tracing::warn!("rejecting integrator saturation {}", saturation);
            return Err(Error::InvalidSaturation {
                name: "integrator saturation",
                value: saturation,
            });
        }
        Ok(Self {
            prev_sample: None,
            dt,
            accumulate,
            saturation,
            sum: 0.0,
            output: 0.0,
        })
    }

    /// Get the sample period
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Whether the integrator keeps its own running sum
    pub fn is_accumulating(&self) -> bool {
        self.accumulate
    }

    /// Get the running sum (always 0 when not accumulating)
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Integrate a new sample
    ///
    /// Returns the incremental area, or the saturated running sum in
    /// accumulating mode. The first sample only primes the integrator.
    #[inline]
    pub fn integrate(&mut self, sample: f64) -> f64 {
        let area = match self.prev_sample {
            Some(prev) => (prev + sample) * 0.5 * self.dt,
            None => 0.0,
        };
        self.prev_sample = Some(sample);

        self.output = if self.accumulate {
            self.sum = saturate(self.sum + area, self.saturation);
            self.sum
        } else {
            area
        };
        self.output
    }
}

impl Filter for TrapezoidIntegrator {
    fn update(&mut self, sample: f64) -> f64 {
        self.integrate(sample)
    }

    fn reset(&mut self) {
        self.prev_sample = None;
        self.sum = 0.0;
        self.output = 0.0;
    }

    fn value(&self) -> f64 {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_differentiator_rejects_bad_period() {
        assert_eq!(Differentiator::new(0.0), Err(Error::InvalidTimeStep(0.0)));
        assert!(Differentiator::new(-0.01).is_err());
        assert!(Differentiator::new(f64::NAN).is_err());
        assert!(Differentiator::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_differentiator_first_sample_is_zero() {
        let mut diff = Differentiator::new(0.01).unwrap();
        assert_eq!(diff.differentiate(5.0), 0.0);
    }

    #[test]
    fn test_differentiator() {
        let mut diff = Differentiator::new(0.01).unwrap();
        diff.differentiate(0.0);
        // 1.0 / 0.01 = 100.0
        assert_relative_eq!(diff.differentiate(1.0), 100.0, epsilon = 1e-9);
        assert_relative_eq!(diff.value(), 100.0, epsilon = 1e-9);
        assert_relative_eq!(diff.differentiate(1.0), 0.0);
    }

    #[test]
    fn test_differentiator_reset() {
        let mut diff = Differentiator::new(0.1).unwrap();
        diff.update(1.0);
        diff.update(2.0);
        diff.reset();
        assert_eq!(diff.value(), 0.0);
        assert_eq!(diff.update(10.0), 0.0);
    }

    #[test]
    fn test_integrator_increments() {
        let mut integ = TrapezoidIntegrator::new(0.1, false, 0.0).unwrap();
        assert_eq!(integ.integrate(1.0), 0.0);
        // (1 + 3) / 2 * 0.1
        assert_relative_eq!(integ.integrate(3.0), 0.2, epsilon = 1e-12);
        assert_relative_eq!(integ.integrate(3.0), 0.3, epsilon = 1e-12);
        assert_eq!(integ.sum(), 0.0);
    }

    #[test]
    fn test_integrator_accumulates() {
        let mut integ = TrapezoidIntegrator::new(0.5, true, 0.0).unwrap();
        integ.integrate(2.0);
        integ.integrate(2.0);
        integ.integrate(2.0);
        assert_relative_eq!(integ.sum(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(integ.value(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_integrator_saturates_sum() {
        let mut integ = TrapezoidIntegrator::new(1.0, true, 3.0).unwrap();
        for _ in 0..10 {
            integ.integrate(-2.0);
        }
        assert_eq!(integ.sum(), -3.0);
    }

    #[test]
    fn test_integrator_rejects_negative_saturation() {
        assert!(matches!(
            TrapezoidIntegrator::new(0.1, true, -1.0),
            Err(Error::InvalidSaturation { .. })
        ));
    }

    #[test]
    fn test_integrator_reset() {
        let mut integ = TrapezoidIntegrator::new(1.0, true, 0.0).unwrap();
        integ.update(1.0);
        integ.update(1.0);
        integ.reset();
        assert_eq!(integ.sum(), 0.0);
        assert_eq!(integ.update(1.0), 0.0);
    }
}
