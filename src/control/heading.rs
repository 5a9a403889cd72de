use super::Pid;
use crate::agent::{Policy, PolicyOutput};
use crate::error::{SimError, SimResult};
use crate::vehicle::RiverBoat;

/// Points the bow at the destination and runs at full power.
///
/// Reads the normalized relative bearing `mu` and propeller angle `delta`
/// from the observation. A positive propeller angle yaws the hull clockwise,
/// so the commanded angle has the opposite sign of the bearing.
#[derive(Debug, Clone)]
pub struct HeadingPolicy {
    pid: Pid,
    dt: f64,
    mu_index: usize,
    delta_index: usize,
}

impl HeadingPolicy {
    pub fn new(mu_index: usize, delta_index: usize, dt: f64) -> Self {
        Self { pid: Pid::new(2.0, 0.1, 0.2).limit(1.0), dt, mu_index, delta_index }
    }

    /// Locate `mu` and `delta` in `boat`'s observation layout.
    pub fn for_boat(boat: &RiverBoat, dt: f64) -> SimResult<Self> {
        let index = |key: &str| {
            boat.observation_entries()
                .iter()
                .position(|e| e.key == key)
                .ok_or_else(|| SimError::UnknownStateKey { mover: boat.name.clone(), key: key.to_string() })
        };
        Ok(Self::new(index("mu")?, index("delta")?, dt))
    }

    pub fn gains(mut self, kp: f64, ki: f64, kd: f64) -> Self {
        self.pid.kp = kp;
        self.pid.ki = ki;
        self.pid.kd = kd;
        self
    }
}

impl Policy for HeadingPolicy {
    fn predict(&mut self, observation: &[f64]) -> PolicyOutput {
        let mu = observation.get(self.mu_index).copied().unwrap_or(0.0);
        let delta = observation.get(self.delta_index).copied().unwrap_or(0.0);
        let target = self.pid.update(-mu, self.dt);
        let angle = (target - delta).clamp(-1.0, 1.0);
        PolicyOutput { action: vec![angle, 1.0], critic: vec![target] }
    }

    fn reset(&mut self) {
        self.pid.reset();
    }

    fn name(&self) -> &str {
        "heading-pid"
    }
}
