//! regul-core: per-tick numeric regulators for fixed-rate control loops
//!
//! Each regulator is a small state machine that is constructed once with its
//! coefficients and sampling period, then evaluated once per control tick.
//! Every call mutates the regulator's own state and returns one scalar
//! actuation value.
//!
//! # Modules
//!
//! - [`math`] - Saturation, blending and the numeric collaborators
//!   (differentiator, trapezoidal integrator)
//! - [`control`] - Integral backstepping (IBSC) and PID regulators
//!
//! # Example
//!
//! ```
//! use regul_core::control::{Ibsc, IbscCoefficients, IbscConfig};
//!
//! let coefficients = IbscCoefficients::new(2.0, 1.0, 1.0, 0.5);
//! let config = IbscConfig::new(coefficients, 0.01).with_saturation(10.0);
//! let mut ibsc = Ibsc::new(config)?;
//!
//! // One 100 Hz tick: desired angle, measured angle, measured rate
//! let u = ibsc.compute(1.0, 0.0, 0.0);
//! assert!(u > 0.0);
//! # Ok::<(), regul_core::Error>(())
//! ```
//!
//! Nothing here allocates or blocks after construction, so `compute` is safe
//! to call from an interrupt handler or a hard real-time scheduler tick.

#![warn(unused_must_use)]

pub mod control;
pub mod math;

// Re-exports for convenience
pub use control::{Ibsc, IbscCoefficients, IbscConfig, Pid, PidConfig, Tumblers};
pub use math::{mix, saturate, Differentiator, Filter, TrapezoidIntegrator};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for regul-core
///
/// Every variant is a configuration error. They are detected when a
/// regulator or collaborator is initialized and never during `compute`.
///
/// # Example
/// ```
/// use regul_core::{Error, Pid, PidConfig};
///
/// match Pid::new(PidConfig::p(1.0, 0.0, 10.0)) {
///     Ok(_) => unreachable!(),
///     Err(Error::InvalidTimeStep(dt)) => assert_eq!(dt, 0.0),
///     Err(e) => panic!("unexpected error: {e}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[must_use = "errors must be handled or explicitly ignored with let _ = ..."]
#[non_exhaustive]
pub enum Error {
    /// Sampling period is zero, negative or not finite.
    /// Handle by: passing the period of the tick that will call `compute`.
    #[error("Invalid time step: {0}")]
    InvalidTimeStep(f64),

    /// A required saturation bound is zero, or a bound is negative or NaN.
    /// Handle by: using a positive bound, or 0 where "unclamped" is allowed.
    #[error("Invalid saturation bound {name}: {value}")]
    InvalidSaturation {
        /// Name of the offending bound
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// A gain is unusable, e.g. `b1 == 0` which the control law divides by.
    /// Handle by: checking the tuning before building the regulator.
    #[error("Invalid coefficient {name}: {value}")]
    InvalidCoefficient {
        /// Name of the offending coefficient
        name: &'static str,
        /// Rejected value
        value: f64,
    },

    /// An owned differentiator or integrator failed to initialize.
    #[error("{role} initialization failed: {source}")]
    Collaborator {
        /// Which collaborator instance failed
        role: &'static str,
        /// Underlying error
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap a collaborator initialization failure
    pub(crate) fn collaborator(role: &'static str) -> impl FnOnce(Error) -> Error {
        move |source| Error::Collaborator {
            role,
            source: Box::new(source),
        }
    }
}

/// Result type alias for regul-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Flat outcome of an initialization call
///
/// Useful where a status code is logged or forwarded instead of the error
/// itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RegulatorStatus {
    Error,
    Success,
}

impl<T> From<&Result<T>> for RegulatorStatus {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(_) => Self::Error,
        }
    }
}

impl std::fmt::Display for RegulatorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}
