pub mod aerodynamics;
pub mod thrust;

pub use aerodynamics::{air_coefficients, dynamic_force, water_coefficients, FlowCoefficients};
pub use thrust::{PropellerInflow, SolverBranch, ThrustSolution};
