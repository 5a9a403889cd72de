use std::f64::consts::{FRAC_PI_4, PI, TAU};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

// ---------------------------------------------------------------------------
// Physical constants of a boat
// ---------------------------------------------------------------------------

/// Geometry, mass properties and powertrain of a river boat.
///
/// Defaults describe the standard training boat. Unknown keys are rejected
/// when the parameters are read from a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoatParams {
    pub area_air: f64,       // m^2 projected area above the waterline
    pub area_water: f64,     // m^2 projected area below the waterline
    pub bsfc: f64,           // kg/(W·s) brake-specific fuel consumption
    pub delta: f64,          // rad initial propeller angle
    pub delta_min: f64,      // rad
    pub delta_max: f64,      // rad
    pub density_air: f64,    // kg/m^3
    pub density_water: f64,  // kg/m^3
    pub fom: f64,            // propeller figure of merit (telemetry only)
    pub fuel: f64,           // kg fuel at construction, capped at capacity
    pub fuel_capacity: f64,  // kg fuel after every reset
    pub hull_length: f64,    // m
    pub hull_width: f64,     // m
    pub mass: f64,           // kg
    pub moi: f64,            // kg·m^2 yaw moment of inertia
    pub power: f64,          // W initial power setting
    pub power_max: f64,      // W
    pub psi: f64,            // rad initial heading
    pub prop_diam: f64,      // m
}

impl Default for BoatParams {
    fn default() -> Self {
        Self {
            area_air: 15.0,
            area_water: 2.5,
            bsfc: 5.0e-7,
            delta: 0.0,
            delta_min: -FRAC_PI_4,
            delta_max: FRAC_PI_4,
            density_air: 1.225,
            density_water: 998.0,
            fom: 0.75,
            fuel: 2.0,
            fuel_capacity: 2.0,
            hull_length: 10.0,
            hull_width: 2.5,
            mass: 5000.0,
            moi: 23000.0,
            power: 9500.0,
            power_max: 9500.0,
            psi: 0.0,
            prop_diam: 0.25,
        }
    }
}

impl BoatParams {
    /// Propeller disk area, `π·d²` with `d` the diameter.
    pub fn prop_area(&self) -> f64 {
        PI * self.prop_diam * self.prop_diam
    }

    /// Reject parameter sets the integrator cannot advance.
    pub fn validate(&self, name: &str) -> SimResult<()> {
        let positive = [
            ("mass", self.mass),
            ("moi", self.moi),
            ("hull_length", self.hull_length),
            ("density_air", self.density_air),
            ("density_water", self.density_water),
            ("prop_diam", self.prop_diam),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidMover {
                    name: name.to_string(),
                    reason: format!("{field} must be positive, got {value}"),
                });
            }
        }
        let non_negative = [
            ("area_air", self.area_air),
            ("area_water", self.area_water),
            ("bsfc", self.bsfc),
            ("fuel", self.fuel),
            ("fuel_capacity", self.fuel_capacity),
            ("power_max", self.power_max),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::InvalidMover {
                    name: name.to_string(),
                    reason: format!("{field} must be non-negative, got {value}"),
                });
            }
        }
        if !(self.delta_min <= self.delta_max) {
            return Err(SimError::InvalidMover {
                name: name.to_string(),
                reason: format!(
                    "propeller angle bounds are inverted ({} > {})",
                    self.delta_min, self.delta_max
                ),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Kinematic state of a boat
// ---------------------------------------------------------------------------

/// Everything about a boat that changes during an episode.
///
/// The global velocity is never integrated on its own; it is rebuilt from
/// the local pair and the heading whenever either changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoatState {
    pub time: f64,              // s of the last integrated tick
    pub pos: Vector2<f64>,      // m, global frame
    pub psi: f64,               // rad heading in [0, 2π)
    pub vel_local: Vector2<f64>, // m/s (surge, sway)
    pub vel: Vector2<f64>,      // m/s, global frame
    pub psi_dot: f64,           // rad/s
    pub psi_ddot: f64,          // rad/s^2
    pub acc_local: Vector2<f64>, // m/s^2
    pub acc: Vector2<f64>,      // m/s^2, global frame
    pub power: f64,             // W
    pub delta: f64,             // rad propeller angle
    pub thrust: f64,            // N
    pub alpha: f64,             // rad propeller inflow incidence
    pub fuel: f64,              // kg
    pub dest_dist: f64,         // m
    pub theta: f64,             // rad bearing to the destination, global frame
    pub mu: f64,                // rad bearing to the destination relative to the hull
}

impl BoatState {
    /// State at construction or reset: at rest at the origin with the
    /// configured initial heading, controls and fuel.
    pub fn initial(params: &BoatParams) -> Self {
        Self {
            time: 0.0,
            pos: Vector2::zeros(),
            psi: wrap_angle(params.psi),
            vel_local: Vector2::zeros(),
            vel: Vector2::zeros(),
            psi_dot: 0.0,
            psi_ddot: 0.0,
            acc_local: Vector2::zeros(),
            acc: Vector2::zeros(),
            power: params.power,
            delta: params.delta,
            thrust: 0.0,
            alpha: 0.0,
            fuel: params.fuel.min(params.fuel_capacity).max(0.0),
            dest_dist: 0.0,
            theta: 0.0,
            mu: 0.0,
        }
    }

    pub fn control(&self) -> ControlState {
        ControlState { power: self.power, delta: self.delta }
    }

    /// Rebuild the global velocity from the local pair and the heading.
    pub fn sync_global_velocity(&mut self) {
        self.vel = local_to_global(&self.vel_local, self.psi);
    }

    /// Distance and bearings to `destination`.
    pub fn update_navigation(&mut self, destination: &Vector2<f64>) {
        let delta = destination - self.pos;
        self.dest_dist = delta.norm();
        self.theta = delta.y.atan2(delta.x);
        self.mu = relative_bearing(self.theta, self.psi);
    }
}

/// Actuator settings handed to the action operation each tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ControlState {
    pub power: f64, // W
    pub delta: f64, // rad
}

// ---------------------------------------------------------------------------
// Frame transforms
// ---------------------------------------------------------------------------

/// Hull frame → global frame.
pub fn local_to_global(v: &Vector2<f64>, psi: f64) -> Vector2<f64> {
    let (s, c) = (-psi).sin_cos();
    Vector2::new(v.x * c + v.y * s, -v.x * s + v.y * c)
}

/// Global frame → hull frame (rotation by −ψ).
pub fn global_to_local(v: &Vector2<f64>, psi: f64) -> Vector2<f64> {
    let (s, c) = (-psi).sin_cos();
    Vector2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}

/// Wrap an angle into `[0, 2π)`.
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid rounds tiny negatives up to exactly 2π
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Signed angle from heading `psi` to bearing `theta`, in `(-π, π]`.
pub fn relative_bearing(theta: f64, psi: f64) -> f64 {
    let mu = theta - psi;
    let explement = if mu >= 0.0 { mu - TAU } else { mu + TAU };
    if explement.abs() < mu.abs() {
        explement
    } else {
        mu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn default_boat_is_valid() {
        let p = BoatParams::default();
        assert!(p.validate("river_boat").is_ok());
        assert!((p.prop_area() - PI * 0.0625).abs() < 1e-12);
    }

    #[test]
    fn initial_fuel_fits_the_tank() {
        let p = BoatParams::default();
        assert_eq!(BoatState::initial(&p).fuel, p.fuel_capacity);
        let overfilled = BoatParams { fuel: 10.0, ..BoatParams::default() };
        assert_eq!(BoatState::initial(&overfilled).fuel, overfilled.fuel_capacity);
    }

    #[test]
    fn inverted_angle_bounds_rejected() {
        let p = BoatParams { delta_min: 0.5, delta_max: -0.5, ..Default::default() };
        assert!(matches!(p.validate("b"), Err(SimError::InvalidMover { .. })));
    }

    #[test]
    fn zero_mass_rejected() {
        let p = BoatParams { mass: 0.0, ..Default::default() };
        assert!(p.validate("b").is_err());
    }

    #[test]
    fn unknown_parameter_rejected() {
        let err = serde_json::from_str::<BoatParams>(r#"{ "mass": 10.0, "warp_drive": 1.0 }"#);
        assert!(err.is_err());
        let ok: BoatParams = serde_json::from_str(r#"{ "mass": 10.0 }"#).unwrap();
        assert_eq!(ok.mass, 10.0);
        assert_eq!(ok.moi, 23000.0);
    }

    #[test]
    fn surge_points_along_heading() {
        let v = local_to_global(&Vector2::new(2.0, 0.0), FRAC_PI_2);
        assert!(v.x.abs() < 1e-12);
        assert!((v.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bearing_is_signed() {
        assert!((relative_bearing(FRAC_PI_2, 0.0) - FRAC_PI_2).abs() < 1e-12);
        assert!((relative_bearing(-FRAC_PI_2, 0.0) + FRAC_PI_2).abs() < 1e-12);
        // destination just to starboard of a boat heading almost north-east round the wrap
        let mu = relative_bearing(-0.1, 6.2);
        assert!(mu < 0.0 && mu > -0.2, "got {mu}");
    }

    #[test]
    fn navigation_to_point_ahead() {
        let mut s = BoatState::initial(&BoatParams::default());
        s.pos = Vector2::new(1.0, 1.0);
        s.update_navigation(&Vector2::new(4.0, 5.0));
        assert!((s.dest_dist - 5.0).abs() < 1e-12);
        assert!((s.theta - 4.0_f64.atan2(3.0)).abs() < 1e-12);
        assert!((s.mu - s.theta).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn frames_round_trip(x in -50.0f64..50.0, y in -50.0f64..50.0, psi in -10.0f64..10.0) {
            let v = Vector2::new(x, y);
            let back = global_to_local(&local_to_global(&v, psi), psi);
            prop_assert!((back - v).norm() < 1e-9);
        }

        #[test]
        fn wrapped_heading_in_range(angle in -1.0e4f64..1.0e4) {
            let w = wrap_angle(angle);
            prop_assert!((0.0..TAU).contains(&w));
        }

        #[test]
        fn bearing_in_half_open_range(theta in -PI..PI, psi in 0.0..TAU) {
            let mu = relative_bearing(theta, psi);
            prop_assert!(mu.abs() <= PI + 1e-12);
        }
    }
}
