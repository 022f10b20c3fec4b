//! Integral backstepping controller (IBSC)
//!
//! Tracks a desired trajectory for one second-order degree of freedom
//! (position `phi`, rate `omega`). The position error is corrected through
//! a virtual desired rate `omega_xd`, which carries an integral term `chi`
//! that removes steady-state error; the rate error against `omega_xd` then
//! yields the actuation.
//!
//! ```text
//! e1       = phi_d - phi
//! chi     += lambda * e1 * dt
//! omega_xd = c1 * e1 + d(phi_d)/dt + lambda * chi
//! e2       = omega_xd - omega
//! u        = ((1 - c1^2 + lambda) * e1 + (c1 + c2) * e2 - c1 * lambda * chi) / b1
//! ```
//!
//! See "Design and control of quadrotors with application to autonomous
//! flying", eq. 4.45 - 4.53.

use serde::{Deserialize, Serialize};

use crate::math::{saturate, signed_pow, Differentiator, Filter};
use crate::{Error, Result};

/// IBSC tuning gains
///
/// `Default` is the all-zero value; `b1` must be set before use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IbscCoefficients {
    /// Position error gain
    pub c1: f64,
    /// Rate error gain
    pub c2: f64,
    /// Input gain of the plant (eq. 4.53), non-zero; the sign is normalized
    pub b1: f64,
    /// Integral gain on the position error
    pub lambda: f64,
    /// Gain on the derivative of the position error
    #[serde(default)]
    pub e1_second_deriv_coeff: f64,
}

impl IbscCoefficients {
    /// Create a coefficient set without derivative feedback
    pub fn new(c1: f64, c2: f64, b1: f64, lambda: f64) -> Self {
        Self {
            c1,
            c2,
            b1,
            lambda,
            e1_second_deriv_coeff: 0.0,
        }
    }

    /// Set the gain on the position error derivative
    pub fn with_e1_second_deriv_coeff(mut self, coeff: f64) -> Self {
        self.e1_second_deriv_coeff = coeff;
        self
    }
}

/// Mode switches that alter behavior without touching the gains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tumblers {
    /// Rectify the position error
    pub take_error_modulus: bool,
    /// The `desired` input of [`Ibsc::compute`] already is the position error
    pub input_is_error: bool,
    /// Apply [`PowerShaping`] to the position and rate errors
    pub enable_power_shaping: bool,
}

/// Signed power applied to the errors when power shaping is enabled
///
/// Each error becomes `sign(e) * |e|^|exponent|`. Exponents of exactly
/// 1, 0 and -1 leave the error unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PowerShaping {
    /// Exponent for the position error `e1`
    pub e1_exponent: f64,
    /// Exponent for the rate error `e2`
    pub e2_exponent: f64,
}

impl Default for PowerShaping {
    fn default() -> Self {
        Self {
            e1_exponent: 1.0,
            e2_exponent: 1.0,
        }
    }
}

/// IBSC regulator configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IbscConfig {
    /// Tuning gains
    pub coefficients: IbscCoefficients,
    /// Sampling period in seconds
    pub dt: f64,
    /// Bound for output, `chi` and `omega_xd` (0 for no limit)
    #[serde(default)]
    pub saturation: f64,
    /// Mode switches
    #[serde(default)]
    pub tumblers: Tumblers,
    /// Exponents used when power shaping is enabled
    #[serde(default)]
    pub power_shaping: PowerShaping,
}

impl IbscConfig {
    /// Create a config with no saturation and all modes off
    pub fn new(coefficients: IbscCoefficients, dt: f64) -> Self {
        Self {
            coefficients,
            dt,
            saturation: 0.0,
            tumblers: Tumblers::default(),
            power_shaping: PowerShaping::default(),
        }
    }

    /// Set the saturation bound
    pub fn with_saturation(mut self, saturation: f64) -> Self {
        self.saturation = saturation;
        self
    }

    /// Set the mode switches
    ///
    /// Power shaping already enabled by [`with_power_shaping`](Self::with_power_shaping)
    /// stays enabled, so the two builders can be chained in either order.
    /// Clear `tumblers.enable_power_shaping` on the record to turn it off.
    pub fn with_tumblers(mut self, tumblers: Tumblers) -> Self {
        let enable_power_shaping =
            tumblers.enable_power_shaping || self.tumblers.enable_power_shaping;
        self.tumblers = Tumblers {
            enable_power_shaping,
            ..tumblers
        };
        self
    }

    /// Enable power shaping with the given exponents
    pub fn with_power_shaping(mut self, e1_exponent: f64, e2_exponent: f64) -> Self {
        self.tumblers.enable_power_shaping = true;
        self.power_shaping = PowerShaping {
            e1_exponent,
            e2_exponent,
        };
        self
    }

    /// Check the config without building a regulator
    pub fn validate(&self) -> Result<()> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(Error::InvalidTimeStep(self.dt));
        }
        if self.saturation.is_nan() || self.saturation < 0.0 {
            return Err(Error::InvalidSaturation {
                name: "saturation",
                value: self.saturation,
            });
        }

        let c = &self.coefficients;
        if c.b1 == 0.0 {
            return Err(Error::InvalidCoefficient {
                name: "b1",
                value: c.b1,
            });
        }
        let gains = [
            ("c1", c.c1),
            ("c2", c.c2),
            ("b1", c.b1),
            ("lambda", c.lambda),
            ("e1_second_deriv_coeff", c.e1_second_deriv_coeff),
            ("e1_exponent", self.power_shaping.e1_exponent),
            ("e2_exponent", self.power_shaping.e2_exponent),
        ];
        for (name, value) in gains {
            if !value.is_finite() {
                return Err(Error::InvalidCoefficient { name, value });
            }
        }
        Ok(())
    }
}

/// Intermediate values of the last tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IbscDiagnostics {
    /// Position error after modulus and shaping
    pub e1: f64,
    /// Rate error after shaping
    pub e2: f64,
    /// Derivative of the desired trajectory
    pub phi_d_deriv: f64,
    /// Derivative of the position error
    pub e1_deriv: f64,
    /// Integral state
    pub chi: f64,
    /// Desired rate
    pub omega_xd: f64,
    /// Saturated output
    pub output: f64,
}

/// Integral backstepping regulator
///
/// # Example
/// ```
/// use regul_core::control::{Ibsc, IbscCoefficients, IbscConfig};
///
/// let coefficients = IbscCoefficients::new(2.0, 1.0, 1.0, 0.5);
/// let mut ibsc = Ibsc::new(IbscConfig::new(coefficients, 0.01).with_saturation(10.0))?;
///
/// let u = ibsc.compute(1.0, 0.0, 0.0);
/// assert!((u - 3.5025).abs() < 1e-9);
/// # Ok::<(), regul_core::Error>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Ibsc {
    coefficients: IbscCoefficients,
    dt: f64,
    /// Bound for output, `chi` and `omega_xd` (0 = unclamped)
    saturation: f64,
    tumblers: Tumblers,
    power_shaping: PowerShaping,
    /// Running integral of the position error
    chi: f64,
    /// Last desired rate
    omega_xd: f64,
    phi_d_deriv: Differentiator,
    e1_deriv: Differentiator,
    /// Second stage for a true second derivative of e1; not wired into
    /// the control law yet, only initialized and reset.
    e1_second_deriv: Differentiator,
    diagnostics: IbscDiagnostics,
}

impl Ibsc {
    /// Create a new IBSC regulator
    ///
    /// Fails if the sampling period is zero, `b1` is zero, or an owned
    /// differentiator cannot be built for the period.
    pub fn new(config: IbscConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            tracing::warn!("IBSC configuration rejected: {}", e);
            return Err(e);
        }

        // validate already rejects these periods; the mapping only fires if a
        // differentiator grows stricter checks than the config.
        let phi_d_deriv = Differentiator::new(config.dt)
            .map_err(Error::collaborator("phi_d differentiator"))?;
        let e1_deriv =
            Differentiator::new(config.dt).map_err(Error::collaborator("e1 differentiator"))?;
        let e1_second_deriv = Differentiator::new(config.dt)
            .map_err(Error::collaborator("e1 second differentiator"))?;

        if config.coefficients.b1 < 0.0 {
            tracing::warn!(
                b1 = config.coefficients.b1,
                "negative b1 will be sign-normalized"
            );
        }
        tracing::debug!(
            c1 = config.coefficients.c1,
            c2 = config.coefficients.c2,
            b1 = config.coefficients.b1,
            lambda = config.coefficients.lambda,
            dt = config.dt,
            saturation = config.saturation,
            tumblers = ?config.tumblers,
            "IBSC regulator initialized"
        );

        Ok(Self {
            coefficients: config.coefficients,
            dt: config.dt,
            saturation: config.saturation,
            tumblers: config.tumblers,
            power_shaping: config.power_shaping,
            chi: 0.0,
            omega_xd: 0.0,
            phi_d_deriv,
            e1_deriv,
            e1_second_deriv,
            diagnostics: IbscDiagnostics::default(),
        })
    }

    /// Re-initialize in place
    ///
    /// On success all transient state is cleared. On failure the regulator
    /// keeps its previous configuration and state.
    pub fn reinit(&mut self, config: IbscConfig) -> Result<()> {
        *self = Self::new(config)?;
        Ok(())
    }

    /// Run one tick
    ///
    /// # Arguments
    /// * `desired` - Desired position `phi_d`, or the position error itself
    ///   when [`Tumblers::input_is_error`] is set
    /// * `measured_position` - Measured position `phi` (ignored when
    ///   `input_is_error` is set)
    /// * `measured_rate` - Measured rate `omega`
    ///
    /// When `input_is_error` is set there is no trajectory to differentiate,
    /// so the feed-forward rate term is zero. Use
    /// [`compute_from_error`](Self::compute_from_error) to keep it.
    ///
    /// # Returns
    /// The control output, saturated when a bound is configured
    #[inline]
    pub fn compute(&mut self, desired: f64, measured_position: f64, measured_rate: f64) -> f64 {
        let e1 = if self.tumblers.input_is_error {
            desired
        } else {
            desired - measured_position
        };
        let e1 = self.shape_e1(e1);

        let phi_d_deriv = if self.tumblers.input_is_error {
            0.0
        } else {
            self.phi_d_deriv.differentiate(desired)
        };

        self.step(e1, phi_d_deriv, measured_rate)
    }

    /// Run one tick with a precomputed position error
    ///
    /// `desired` is the desired trajectory and only feeds the feed-forward
    /// rate term. Modulus and power shaping still apply to `e1`.
    #[inline]
    pub fn compute_from_error(&mut self, e1: f64, desired: f64, measured_rate: f64) -> f64 {
        let e1 = self.shape_e1(e1);
        let phi_d_deriv = self.phi_d_deriv.differentiate(desired);
        self.step(e1, phi_d_deriv, measured_rate)
    }

    fn shape_e1(&self, e1: f64) -> f64 {
        let e1 = if self.tumblers.take_error_modulus {
            e1.abs()
        } else {
            e1
        };
        if self.tumblers.enable_power_shaping {
            signed_pow(e1, self.power_shaping.e1_exponent)
        } else {
            e1
        }
    }

    fn step(&mut self, e1: f64, phi_d_deriv: f64, measured_rate: f64) -> f64 {
        let IbscCoefficients { c1, c2, lambda, .. } = self.coefficients;

        // Integral of the position error (eq. 4.46)
        self.chi = saturate(self.chi + e1 * lambda * self.dt, self.saturation);

        // Desired rate (eq. 4.46)
        self.omega_xd = saturate(c1 * e1 + phi_d_deriv + lambda * self.chi, self.saturation);

        // Rate error (eq. 4.48)
        let mut e2 = self.omega_xd - measured_rate;
        if self.tumblers.enable_power_shaping {
            e2 = signed_pow(e2, self.power_shaping.e2_exponent);
        }

        if self.coefficients.b1 < 0.0 {
            self.coefficients.b1 = -self.coefficients.b1;
        }
        let b1 = self.coefficients.b1;

        // Control law (eq. 4.53)
        let mut u = (1.0 / b1)
            * ((1.0 - c1 * c1 + lambda) * e1 + (c1 + c2) * e2 - c1 * lambda * self.chi);

        let e1_deriv = self.e1_deriv.differentiate(e1);
        u += e1_deriv * self.coefficients.e1_second_deriv_coeff;

        let output = saturate(u, self.saturation);

        self.diagnostics = IbscDiagnostics {
            e1,
            e2,
            phi_d_deriv,
            e1_deriv,
            chi: self.chi,
            omega_xd: self.omega_xd,
            output,
        };

        output
    }

    /// Reset the regulator state, keeping the configuration
    pub fn reset(&mut self) {
        self.chi = 0.0;
        self.omega_xd = 0.0;
        self.phi_d_deriv.reset();
        self.e1_deriv.reset();
        self.e1_second_deriv.reset();
        self.diagnostics = IbscDiagnostics::default();
    }

    /// Get the integral state
    pub fn chi(&self) -> f64 {
        self.chi
    }

    /// Get the last desired rate
    pub fn omega_xd(&self) -> f64 {
        self.omega_xd
    }

    /// Get the gains (`b1` is positive after the first tick)
    pub fn coefficients(&self) -> &IbscCoefficients {
        &self.coefficients
    }

    /// Get the sampling period
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Get the saturation bound
    pub fn saturation(&self) -> f64 {
        self.saturation
    }

    /// Get the mode switches
    pub fn tumblers(&self) -> Tumblers {
        self.tumblers
    }

    /// Change the mode switches
    ///
    /// The trajectory differentiator is not fed while `input_is_error` is
    /// set, so it restarts whenever that flag changes.
    pub fn set_tumblers(&mut self, tumblers: Tumblers) {
        if tumblers.input_is_error != self.tumblers.input_is_error {
            self.phi_d_deriv.reset();
        }
        self.tumblers = tumblers;
    }

    /// Get the intermediate values of the last tick
    pub fn diagnostics(&self) -> &IbscDiagnostics {
        &self.diagnostics
    }
}
