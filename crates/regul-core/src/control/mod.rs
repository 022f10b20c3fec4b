//! Per-tick regulators
//!
//! Provides the integral backstepping controller (IBSC) for second-order
//! trajectory tracking and a PID regulator for general error regulation.

mod ibsc;
mod pid;

pub use ibsc::{Ibsc, IbscCoefficients, IbscConfig, IbscDiagnostics, PowerShaping, Tumblers};
pub use pid::{Pid, PidConfig, PidState, PidTerms};
