use crate::dynamics::{
    forces_and_moments, local_to_global, propeller_inflow, wrap_angle, Ambient, BoatParams, BoatState,
    ForceMoments, RelativeFlow,
};
use crate::error::{SimError, SimResult};
use crate::physics::{SolverBranch, ThrustSolution};

// ---------------------------------------------------------------------------
// Second-order displacement / Euler velocity step
// ---------------------------------------------------------------------------

/// What the step computed besides the new state, kept for telemetry.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepTelemetry {
    pub forces: ForceMoments,
    pub flow: RelativeFlow,
    pub solver: Option<SolverBranch>,
}

/// Advance one boat by `dt`. Controls must already be applied for this tick.
///
/// Displacements use the half-acceleration formula in the hull frame and are
/// rotated into the global frame with the heading *after* the update.
/// Velocities are advanced with a first-order Euler step.
pub fn step_boat(
    name: &str,
    params: &BoatParams,
    state: &mut BoatState,
    ambient: &Ambient,
    dt: f64,
    time: f64,
) -> SimResult<StepTelemetry> {
    // 1. thrust
    let solution = if state.fuel <= 0.0 {
        state.power = 0.0;
        None
    } else {
        let inflow = propeller_inflow(params, state);
        state.alpha = inflow.alpha;
        Some(inflow.solve())
    };
    state.thrust = solution.map_or(0.0, |s: ThrustSolution| s.thrust);

    // 2. global velocity for the current heading
    state.sync_global_velocity();

    // 3. forces and moments
    let (forces, flow) = forces_and_moments(params, state, ambient, state.thrust);
    if !forces.is_finite() {
        return Err(non_finite(name, "force or moment", first_non_finite(&forces)));
    }
    let fx = forces.fx();
    let fy = forces.fy();
    let mom = forces.moment();

    // 4. hull-frame displacement and heading increment
    let dt2 = dt * dt;
    let dxp = state.vel_local.x * dt + 0.5 * fx / params.mass * dt2;
    let dyp = state.vel_local.y * dt + 0.5 * fy / params.mass * dt2;
    let dpsi = state.psi_dot * dt + 0.5 * mom * (params.hull_length / 2.0) / params.moi * dt2;

    // 5. heading
    state.psi = wrap_angle(state.psi + dpsi);

    // 6. position, rotated with the new heading
    let displacement = local_to_global(&nalgebra::Vector2::new(dxp, dyp), state.psi);
    state.pos += displacement;

    // 7. velocities
    state.vel_local.x += fx / params.mass * dt;
    state.vel_local.y += fy / params.mass * dt;
    state.psi_dot += mom / params.moi * dt;

    // 8. global velocity again
    state.sync_global_velocity();

    // 9. accelerations
    state.acc_local = nalgebra::Vector2::new(fx / params.mass, fy / params.mass);
    state.psi_ddot = mom / params.moi;
    state.acc = local_to_global(&state.acc_local, state.psi);

    // 10. fuel
    state.fuel = (state.fuel - state.power * params.bsfc * dt).max(0.0);

    // 11. time
    state.time = time;

    check_finite(name, state)?;

    Ok(StepTelemetry { forces, flow, solver: solution.map(|s| s.branch) })
}

fn non_finite(name: &str, quantity: &'static str, value: f64) -> SimError {
    SimError::NonFinite { mover: name.to_string(), quantity, value }
}

fn first_non_finite(forces: &ForceMoments) -> f64 {
    [
        forces.f_d_air,
        forces.f_s_air,
        forces.m_air,
        forces.f_d_water,
        forces.f_s_water,
        forces.m_water,
        forces.fx_p,
        forces.fy_p,
        forces.my_p,
        forces.mr,
    ]
    .into_iter()
    .find(|v| !v.is_finite())
    .unwrap_or(f64::NAN)
}

fn check_finite(name: &str, state: &BoatState) -> SimResult<()> {
    let quantities = [
        ("x position", state.pos.x),
        ("y position", state.pos.y),
        ("heading", state.psi),
        ("surge velocity", state.vel_local.x),
        ("sway velocity", state.vel_local.y),
        ("yaw rate", state.psi_dot),
        ("thrust", state.thrust),
        ("fuel", state.fuel),
    ];
    for (quantity, value) in quantities {
        if !value.is_finite() {
            return Err(non_finite(name, quantity, value));
        }
    }
    Ok(())
}
