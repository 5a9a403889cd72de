//! Propeller thrust from delivered power.
//!
//! Momentum theory relates the induced velocity `v` through the disk to the
//! delivered power with a quartic that has no convenient closed form once the
//! inflow is oblique. The residual is written in units of the hover induced
//! velocity `v_h = (P / (2ρA))^(1/3)`:
//!
//! ```text
//! f(v) = [ (v/v_h)^4 + 2 (v0/v_h)(v/v_h)^3 sin α + (v0/v_h)^2 (v/v_h)^2 ]
//!        · ((v0 sin α + v)/v_h)^2 - 1
//! ```
//!
//! `f(0) = -1` for any positive power, so the root is found by walking up
//! from zero until the sign flips and then bisecting the bracket.

use super::aerodynamics::sign;

/// Step tolerance of the directional line search.
const LINE_SEARCH_EPS: f64 = 1e-3;
/// Initial step of the directional line search, m/s.
const LINE_SEARCH_STEP: f64 = 0.1;
/// Bisection tolerance after the line search found a bracket.
pub const FINE_TOLERANCE: f64 = 1e-6;
/// Bisection tolerance after the widening search found a bracket.
pub const COARSE_TOLERANCE: f64 = 1e-3;
/// Induced velocity above which the widening search gives up, m/s.
pub const INDUCED_VELOCITY_CAP: f64 = 100.0;

const GOLDEN_RATIO: f64 = 1.61803;
const WIDENING_START: f64 = 1e-6;
const WIDENING_STEP: f64 = 0.1;
const MAX_BISECTIONS: usize = 200;

/// Operating point of the propeller for one solve.
#[derive(Debug, Clone, Copy)]
pub struct PropellerInflow {
    pub power: f64,   // W delivered to the disk
    pub v0: f64,      // m/s free-stream speed through the disk
    pub alpha: f64,   // rad angle of incidence
    pub density: f64, // kg/m^3
    pub disk_area: f64, // m^2
}

/// Which path of the solver produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverBranch {
    /// No power, the solver was not run.
    Idle,
    /// Bracket found by the directional line search.
    LineSearch,
    /// Bracket found by the golden-ratio widening search.
    Widening,
    /// Widening search passed the velocity cap without a sign change.
    Failed,
}

#[derive(Debug, Clone, Copy)]
pub struct ThrustSolution {
    pub thrust: f64,           // N
    pub induced_velocity: f64, // m/s
    pub residual: f64,         // f(induced_velocity)
    pub branch: SolverBranch,
}

impl ThrustSolution {
    fn idle() -> Self {
        Self { thrust: 0.0, induced_velocity: 0.0, residual: 0.0, branch: SolverBranch::Idle }
    }

    fn failed(residual: f64) -> Self {
        Self { thrust: 0.0, induced_velocity: 0.0, residual, branch: SolverBranch::Failed }
    }
}

/// Hover induced velocity of a disk at the given power.
pub fn hover_induced_velocity(power: f64, density: f64, disk_area: f64) -> f64 {
    (power / (2.0 * density * disk_area)).powf(1.0 / 3.0)
}

impl PropellerInflow {
    /// Momentum-theory residual at induced velocity `v`.
    pub fn residual(&self, v: f64) -> f64 {
        let vh = hover_induced_velocity(self.power, self.density, self.disk_area);
        let r = v / vh;
        let r0 = self.v0 / vh;
        let sin_a = self.alpha.sin();

        let p1 = r.powf(4.0) + 2.0 * r0 * r.powf(3.0) * sin_a + r0.powf(2.0) * r.powf(2.0);
        let p2 = ((self.v0 * sin_a + v) / vh).powf(2.0);

        p1 * p2 - 1.0
    }

    /// Solve for the induced velocity and return the resulting thrust
    /// `T = P / (v0 + v_i)`.
    ///
    /// Zero or negative power short-circuits to zero thrust.
    pub fn solve(&self) -> ThrustSolution {
        if self.power <= 0.0 {
            return ThrustSolution::idle();
        }
        if !self.residual(0.0).is_finite() {
            log::warn!(
                "thrust solver given a non-finite operating point (v0={}, alpha={}); thrust set to zero",
                self.v0,
                self.alpha
            );
            return ThrustSolution::failed(self.residual(0.0));
        }

        let (bracket, branch, tolerance) = match self.line_search() {
            Some(b) => (b, SolverBranch::LineSearch, FINE_TOLERANCE),
            None => match self.widening_search() {
                Some(b) => (b, SolverBranch::Widening, COARSE_TOLERANCE),
                None => {
                    log::warn!(
                        "thrust solver found no root below {} m/s (P={:.1} W, v0={:.3} m/s, alpha={:.3} rad); thrust set to zero",
                        INDUCED_VELOCITY_CAP,
                        self.power,
                        self.v0,
                        self.alpha
                    );
                    return ThrustSolution::failed(self.residual(0.0));
                }
            },
        };

        let v_induced = self.bisect(bracket.0, bracket.1, tolerance);
        log::trace!("induced velocity {:.6} m/s via {:?}", v_induced, branch);

        ThrustSolution {
            thrust: self.power / (self.v0 + v_induced),
            induced_velocity: v_induced,
            residual: self.residual(v_induced),
            branch,
        }
    }

    /// Walk up from zero. When the residual drops the search has stepped over
    /// an inflection, so it backs up two steps and refines the step tenfold.
    /// Returns `(0, v)` once the sign of the residual changes.
    fn line_search(&self) -> Option<(f64, f64)> {
        let mut step = LINE_SEARCH_STEP;
        let mut v = 0.0;
        let mut f_old = self.residual(v);

        while step.abs() > LINE_SEARCH_EPS {
            v += step;
            let f_new = self.residual(v);

            if f_new < f_old {
                v -= 2.0 * step;
                step /= 10.0;
            }

            if sign(f_new) != sign(f_old) {
                return Some((0.0, v));
            }

            f_old = f_new;
        }

        None
    }

    /// Grow the guess by `0.1·φ^k` from a tiny seed until the sign changes or
    /// the guess passes [`INDUCED_VELOCITY_CAP`].
    fn widening_search(&self) -> Option<(f64, f64)> {
        let mut prev_v = WIDENING_START;
        let mut prev_f = self.residual(prev_v);
        let mut k = 1;

        loop {
            let v = prev_v + WIDENING_STEP * GOLDEN_RATIO.powi(k);
            let f = self.residual(v);

            if sign(prev_f) != sign(f) {
                return Some((prev_v, v));
            }
            if v > INDUCED_VELOCITY_CAP {
                return None;
            }

            prev_v = v;
            prev_f = f;
            k += 1;
        }
    }

    /// Bisect `[a, b]` until the half width is within `tolerance` and the
    /// residual at the midpoint is too.
    fn bisect(&self, mut a: f64, mut b: f64, tolerance: f64) -> f64 {
        let mut fa = self.residual(a);
        let mut c = 0.5 * (a + b);

        for _ in 0..MAX_BISECTIONS {
            c = 0.5 * (a + b);
            let fc = self.residual(c);

            if sign(fa) == sign(fc) {
                a = c;
                fa = fc;
            } else {
                b = c;
            }

            if 0.5 * (b - a) <= tolerance && fc.abs() <= tolerance {
                break;
            }
        }

        c
    }
}
