//! PID regulator implementation
//!
//! Proportional + trapezoidal integral + derivative regulator with an
//! independently saturated integral term and a saturated output. The
//! derivative is either supplied by the caller (e.g. a gyro rate) or
//! estimated internally from the error.

use serde::{Deserialize, Serialize};

use crate::math::{saturate, Differentiator, Filter, TrapezoidIntegrator};
use crate::{Error, Result};

/// PID regulator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Sampling period in seconds
    pub dt: f64,
    /// Output bound, must be non-zero
    pub output_saturation: f64,
    /// Integral bound (0 for no limit)
    #[serde(default)]
    pub integral_saturation: f64,
}

impl PidConfig {
    /// Create a new PID config with given gains
    pub fn new(kp: f64, ki: f64, kd: f64, dt: f64, output_saturation: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            dt,
            output_saturation,
            integral_saturation: 0.0,
        }
    }

    /// Create a P-only config
    pub fn p(kp: f64, dt: f64, output_saturation: f64) -> Self {
        Self::new(kp, 0.0, 0.0, dt, output_saturation)
    }

    /// Create a PI config
    pub fn pi(kp: f64, ki: f64, dt: f64, output_saturation: f64) -> Self {
        Self::new(kp, ki, 0.0, dt, output_saturation)
    }

    /// Create a PD config
    pub fn pd(kp: f64, kd: f64, dt: f64, output_saturation: f64) -> Self {
        Self::new(kp, 0.0, kd, dt, output_saturation)
    }

    /// Set integral windup limit
    pub fn with_integral_saturation(mut self, limit: f64) -> Self {
        self.integral_saturation = limit;
        self
    }

    /// Check the config without building a regulator
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(Error::InvalidTimeStep(self.dt));
        }
        if self.output_saturation.is_nan() || self.output_saturation <= 0.0 {
            return Err(Error::InvalidSaturation {
                name: "output_saturation",
                value: self.output_saturation,
            });
        }
        if self.integral_saturation.is_nan() || self.integral_saturation < 0.0 {
            return Err(Error::InvalidSaturation {
                name: "integral_saturation",
                value: self.integral_saturation,
            });
        }
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() {
                return Err(Error::InvalidCoefficient { name, value });
            }
        }
        Ok(())
    }
}

/// Individual terms of the last computed output
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidTerms {
    /// `error * kp`
    pub proportional: f64,
    /// Saturated accumulated integral
    pub integral: f64,
    /// `derivative * kd`
    pub derivative: f64,
}

/// PID regulator internal state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Accumulated integral term
    pub integral: f64,
    /// Terms of the previous tick
    pub terms: PidTerms,
    /// Previous output
    pub prev_output: f64,
}

/// PID regulator
///
/// # Example
/// ```
/// use regul_core::control::{Pid, PidConfig};
///
/// let config = PidConfig::new(1.0, 0.1, 0.05, 0.01, 10.0)
///     .with_integral_saturation(5.0);
///
/// let mut pid = Pid::new(config)?;
///
/// // In a 100 Hz control loop
/// let error = 0.5;
/// let output = pid.compute(error, None);
/// assert_eq!(output, 0.5);
/// # Ok::<(), regul_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Pid {
    config: PidConfig,
    integrator: TrapezoidIntegrator,
    differentiator: Differentiator,
    state: PidState,
}

impl Pid {
    /// Create a new PID regulator with the given configuration
    ///
    /// Fails if the sampling period or the output bound is zero, or if
    /// either owned filter cannot be built for the period.
    pub fn new(config: PidConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            tracing::warn!("PID configuration rejected: {}", e);
            return Err(e);
        }

        // Unreachable after validate, kept so a filter that tightens its own
        // checks still fails init instead of panicking.
        let integrator = TrapezoidIntegrator::new(config.dt, false, config.integral_saturation)
            .map_err(Error::collaborator("PID integrator"))?;
        let differentiator =
            Differentiator::new(config.dt).map_err(Error::collaborator("PID differentiator"))?;

        tracing::debug!(
            kp = config.kp,
            ki = config.ki,
            kd = config.kd,
            dt = config.dt,
            output_saturation = config.output_saturation,
            integral_saturation = config.integral_saturation,
            "PID regulator initialized"
        );

        Ok(Self {
            config,
            integrator,
            differentiator,
            state: PidState::default(),
        })
    }

    /// Re-initialize in place
    ///
    /// On success all transient state is cleared. On failure the regulator
    /// keeps its previous configuration and state.
    pub fn reinit(&mut self, config: PidConfig) -> Result<()> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// Run one tick
    ///
    /// # Arguments
    /// * `error` - Regulation error (setpoint - measurement)
    /// * `derivative` - Precomputed derivative of the error, or `None` to
    ///   estimate it from successive errors
    ///
    /// # Returns
    /// The saturated control output
    #[inline]
    pub fn compute(&mut self, error: f64, derivative: Option<f64>) -> f64 {
        // Proportional term
        let p_term = error * self.config.kp;

        // Integral term with windup protection
        let area = self.integrator.integrate(error * self.config.ki);
        self.state.integral = saturate(
            self.state.integral + area,
            self.config.integral_saturation,
        );

        // Derivative term; the estimator is fed every tick so that switching
        // back from a supplied derivative does not difference a stale sample
        let estimate = self.differentiator.differentiate(error);
        let derivative = derivative.unwrap_or(estimate);
        let d_term = derivative * self.config.kd;

        let output = saturate(
            p_term + self.state.integral + d_term,
            self.config.output_saturation,
        );

        self.state.terms = PidTerms {
            proportional: p_term,
            integral: self.state.integral,
            derivative: d_term,
        };
        self.state.prev_output = output;

        output
    }

    /// Reset the regulator state, keeping the configuration
    pub fn reset(&mut self) {
        self.state = PidState::default();
        self.integrator.reset();
        self.differentiator.reset();
    }

    /// Get the current state
    pub fn state(&self) -> &PidState {
        &self.state
    }

    /// Get the accumulated integral
    pub fn integral(&self) -> f64 {
        self.state.integral
    }

    /// Get the configuration
    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    /// Set the gains
    ///
    /// Accumulated state is kept, so the change takes effect smoothly.
    /// Non-finite gains are rejected and leave the regulator unchanged.
    pub fn set_gains(&mut self, kp: f64, ki: f64, kd: f64) -> Result<()> {
        for (name, value) in [("kp", kp), ("ki", ki), ("kd", kd)] {
            if !value.is_finite() {
                tracing::warn!("PID gain {} rejected: {}", name, value);
                return Err(Error::InvalidCoefficient { name, value });
            }
        }
        self.config.kp = kp;
        self.config.ki = ki;
        self.config.kd = kd;
        Ok(())
    }
}
