//! Roll-axis step response: IBSC vs PID on a simulated double integrator
//!
//! The plant is `phi'' = b1 * u`. Both regulators track a step in the desired
//! roll angle; halfway through, control is blended from PID to IBSC with
//! `mix` to show a bumpless hand-off.
//!
//! Run with: cargo run --example roll_axis

use regul_core::control::{Ibsc, IbscCoefficients, IbscConfig, Pid, PidConfig};
use regul_core::math::mix;

const DT: f64 = 0.002; // 500Hz
const B1: f64 = 1.0;
const STEPS: usize = 5_000;
const HANDOFF_START: usize = 2_000;
const HANDOFF_TICKS: usize = 500;

fn main() -> regul_core::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let ibsc_config = IbscConfig::new(IbscCoefficients::new(3.0, 3.0, B1, 2.0), DT)
        .with_saturation(20.0);
    let mut ibsc = Ibsc::new(ibsc_config)?;

    let pid_config = PidConfig::new(6.0, 1.0, 4.0, DT, 20.0).with_integral_saturation(5.0);
    let mut pid = Pid::new(pid_config)?;

    let desired = 0.5;
    let (mut phi, mut omega) = (0.0f64, 0.0f64);

    for tick in 0..STEPS {
        let u_ibsc = ibsc.compute(desired, phi, omega);
        // Gyro rate as the derivative of the error
        let u_pid = pid.compute(desired - phi, Some(-omega));

        let coeff = tick.saturating_sub(HANDOFF_START) as f64 / HANDOFF_TICKS as f64;
        let u = mix(u_ibsc, u_pid, coeff);

        omega += B1 * u * DT;
        phi += omega * DT;

        if tick % 250 == 0 {
            let d = ibsc.diagnostics();
            tracing::info!(
                t = tick as f64 * DT,
                phi,
                omega,
                u,
                blend = coeff.min(1.0),
                e1 = d.e1,
                chi = d.chi,
                omega_xd = d.omega_xd,
                "tick"
            );
        }
    }

    tracing::info!(phi, omega, "final state");
    Ok(())
}
