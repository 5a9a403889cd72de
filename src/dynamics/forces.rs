//! Force and moment composition for a boat in wind and current.
//!
//! Every function here is pure: the result depends only on the parameters,
//! the current state, the ambient flow and the thrust handed in.

use std::f64::consts::FRAC_PI_2;

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use super::state::{global_to_local, BoatParams, BoatState};
use crate::physics::{air_coefficients, dynamic_force, water_coefficients, PropellerInflow};

/// Uniform wind and current over the whole domain.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Ambient {
    pub wind: Vector2<f64>,    // m/s, global frame
    pub current: Vector2<f64>, // m/s, global frame
}

/// Relative flow seen by the hull, for telemetry and observations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RelativeFlow {
    pub air_local: Vector2<f64>,   // m/s
    pub water_local: Vector2<f64>, // m/s
    pub phi_air: f64,              // rad
    pub phi_water: f64,            // rad
}

/// All forces and moments on the hull for one tick, hull frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ForceMoments {
    pub f_d_air: f64,   // N axial
    pub f_s_air: f64,   // N lateral
    pub m_air: f64,     // N·m
    pub f_d_water: f64, // N axial
    pub f_s_water: f64, // N lateral
    pub m_water: f64,   // N·m
    pub fx_p: f64,      // N propeller axial
    pub fy_p: f64,      // N propeller lateral
    pub my_p: f64,      // N·m propeller yaw
    pub mr: f64,        // N·m hull rotation damping
}

impl ForceMoments {
    /// Total axial force.
    pub fn fx(&self) -> f64 {
        self.f_d_air + self.f_d_water + self.fx_p
    }

    /// Total lateral force.
    pub fn fy(&self) -> f64 {
        self.f_s_air + self.f_s_water + self.fy_p
    }

    /// Total yaw moment.
    pub fn moment(&self) -> f64 {
        self.m_air + self.m_water + self.my_p + self.mr
    }

    pub fn is_finite(&self) -> bool {
        [
            self.f_d_air,
            self.f_s_air,
            self.m_air,
            self.f_d_water,
            self.f_s_water,
            self.m_water,
            self.fx_p,
            self.fy_p,
            self.my_p,
            self.mr,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Forces and moments on the hull given the thrust for this tick.
///
/// `state.vel` must already hold the global velocity for the current heading.
pub fn forces_and_moments(
    params: &BoatParams,
    state: &BoatState,
    ambient: &Ambient,
    thrust: f64,
) -> (ForceMoments, RelativeFlow) {
    let l = params.hull_length;

    let air_local = global_to_local(&(ambient.wind - state.vel), state.psi);
    let water_local = global_to_local(&(ambient.current - state.vel), state.psi);
    let phi_air = air_local.y.atan2(air_local.x);
    let phi_water = water_local.y.atan2(water_local.x);

    let air = air_coefficients(phi_air);
    let water = water_coefficients(phi_water);

    let v_air = air_local.norm();
    let v_water = water_local.norm();

    let f_d_air = dynamic_force(params.density_air, v_air, params.area_air, air.cd);
    let f_s_air = dynamic_force(params.density_air, v_air, params.area_air, air.cs);
    let m_air = -dynamic_force(params.density_air, v_air, params.area_air * l, air.cy);

    let f_d_water = dynamic_force(params.density_water, v_water, params.area_water, water.cd);
    let f_s_water = dynamic_force(params.density_water, v_water, params.area_water, water.cs);
    // the water moment is scaled with the air density
    let m_water = -dynamic_force(params.density_air, v_water, params.area_water * l, water.cy);

    let fx_p = thrust * state.delta.cos();
    let fy_p = thrust * state.delta.sin();
    let my_p = -fy_p * l / 2.0;

    let mr = hull_rotation_moment(
        water.cr,
        params.area_water,
        params.density_water,
        l,
        state.psi_dot,
        state.vel_local.y,
    );

    (
        ForceMoments {
            f_d_air,
            f_s_air,
            m_air,
            f_d_water,
            f_s_water,
            m_water,
            fx_p,
            fy_p,
            my_p,
            mr,
        },
        RelativeFlow { air_local, water_local, phi_air, phi_water },
    )
}

/// Yaw rate below which the hull moment is treated as non-rotating, rad/s.
const SLOW_ROTATION: f64 = 1e-9;

/// Damping moment from the hull sweeping sideways through the water.
///
/// Integrates the normal-flow drag along both halves of the hull. The bow
/// half always sees `vy + ωx`; the stern half changes sign somewhere along
/// its length when `|vy| < |ωL/2|`, which needs the second closed form. The
/// result always opposes the rotation.
pub fn hull_rotation_moment(cr: f64, area: f64, density: f64, length: f64, omega: f64, vy: f64) -> f64 {
    let l = length;
    let alpha = cr * area * density / (l / 2.0);

    let front = l * l * alpha / 192.0
        * (3.0 * l * l * omega * omega + 16.0 * l * omega * vy + 24.0 * vy * vy);

    // the split form divides by ω², so near-zero rates use the polynomial
    let back = if vy.abs() >= (omega * l / 2.0).abs() || omega.abs() < SLOW_ROTATION {
        -l * l * alpha / 192.0 * (3.0 * l * l * omega * omega - 16.0 * l * omega * vy + 24.0 * vy * vy)
    } else {
        alpha / (192.0 * omega * omega)
            * ((l * omega - 2.0 * vy).powi(3) * (3.0 * l * omega + 2.0 * vy) - 16.0 * vy.powi(4))
    };

    let mr = front + back;
    if omega < 0.0 {
        mr.abs()
    } else {
        -mr.abs()
    }
}

/// Operating point of the propeller for the current state and power.
pub fn propeller_inflow(params: &BoatParams, state: &BoatState) -> PropellerInflow {
    let axis = Vector2::new((state.delta + FRAC_PI_2).cos(), (state.delta + FRAC_PI_2).sin());
    let inflow = Vector2::new(
        -state.vel_local.x,
        state.psi_dot * params.hull_length / 2.0 - state.vel_local.y,
    );
    let alpha = (inflow.y * axis.x - inflow.x * axis.y).atan2(axis.x * inflow.x + axis.y * inflow.y);

    PropellerInflow {
        power: state.power,
        v0: state.vel_local.norm(),
        alpha,
        density: params.density_water,
        disk_area: params.prop_area(),
    }
}
