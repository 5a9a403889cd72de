use std::f64::consts::{FRAC_PI_2, PI};

// ---------------------------------------------------------------------------
// Empirical hull coefficient curves
// ---------------------------------------------------------------------------

/// Coefficients of one fluid acting on the hull at a relative flow angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowCoefficients {
    pub cd: f64, // axial (drag)
    pub cs: f64, // lateral (side force)
    pub cy: f64, // yaw moment
    pub cr: f64, // side force with the flow normal to the hull
}

/// Sign with `sign(0) == 0`.
///
/// `f64::signum` maps zero to one, which would put a side force on a boat
/// moving straight into the flow.
pub(crate) fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Aerodynamic coefficients of the superstructure.
/// `phi` is the relative wind angle in the hull frame (rad, from `atan2`).
pub fn air_coefficients(phi: f64) -> FlowCoefficients {
    let a = phi.abs();

    let cd = 0.195738 + 0.518615 * a - 0.496029 * phi * phi + 0.0941925 * a.powf(3.0)
        + 1.86427
            * (2.0 * PI * (a / PI).powf(1.05)).sin()
            * (-2.17281 * (a - FRAC_PI_2).powf(2.0)).exp();

    let cs = sign(phi)
        * (12.3722 - 15.453 * a + 6.0261 * (phi * phi).abs() - 0.532325 * a.powf(3.0))
        * a.sin()
        * (-1.68668 * (a - FRAC_PI_2).powf(2.0)).exp();

    let cy = sign(phi)
        * (0.710204 - 0.297196 * a + 0.0857296 * (phi * phi).abs())
        * (PI * 2.0 * (a / PI).powf(1.05)).sin();

    FlowCoefficients { cd, cs, cy, cr: 0.904313 }
}

/// Hydrodynamic coefficients of the wetted hull.
/// `phi` is the relative current angle in the hull frame (rad).
pub fn water_coefficients(phi: f64) -> FlowCoefficients {
    let a = phi.abs();

    let cd = 0.245219 - 0.93044 * a + 0.745752 * (phi * phi).abs() - 0.15915 * a.powf(3.0)
        + 2.79188 * (2.0 * a).sin() * (-1.05667 * (a - FRAC_PI_2).powf(2.0)).exp();

    let cs = sign(phi) * (0.115554 + 3.09423 * a - 0.984923 * phi * phi) * a.sin();

    let cy = sign(phi) * (0.322986 + 0.317964 * a - 0.1021844 * phi * phi) * (2.0 * a).sin();

    FlowCoefficients { cd, cs, cy, cr: 2.545759 }
}

/// Dynamic-pressure force `½·ρ·|v|²·A·c`, shared by both fluids.
pub fn dynamic_force(density: f64, speed: f64, area: f64, coefficient: f64) -> f64 {
    0.5 * density * speed * speed * area * coefficient
}
