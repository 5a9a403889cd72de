//! Contracts between the step loop and the learning side, plus the
//! reference implementations used by the demo and the tests.

pub mod direct;
pub mod replay;
pub mod reward;
pub mod sensor;

pub use direct::DirectControl;
pub use replay::TransitionBuffer;
pub use reward::{InstantStep, MultiStep, RewardFunction, RewardKind};
pub use sensor::{ProximitySensor, Sensor};

use crate::dynamics::ControlState;
use crate::sim::record::Transition;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Raw policy output for one observation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyOutput {
    pub action: Vec<f64>,
    pub critic: Vec<f64>,
}

/// Maps a normalized observation to a raw action. Called once per tick and
/// blocks the loop until it returns.
pub trait Policy {
    fn predict(&mut self, observation: &[f64]) -> PolicyOutput;

    fn reset(&mut self) {}

    fn name(&self) -> &str {
        "unnamed"
    }
}

impl<F> Policy for F
where
    F: FnMut(&[f64]) -> PolicyOutput,
{
    fn predict(&mut self, observation: &[f64]) -> PolicyOutput {
        self(observation)
    }
}

// ---------------------------------------------------------------------------
// Action operation
// ---------------------------------------------------------------------------

/// Actuator change requested for one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutput {
    pub power_delta: f64, // W
    pub angle_delta: f64, // rad
    /// Action as the policy produced it.
    pub original: Vec<f64>,
    /// Action actually applied, possibly exploratory.
    pub used: Vec<f64>,
    /// Control points of a planned path, for path-following schemes.
    pub path: Option<Vec<f64>>,
    /// This tick concludes the current decision.
    pub end_step: bool,
}

/// Turns raw policy outputs into actuator deltas.
pub trait ActionOperation {
    fn translate(
        &mut self,
        episode: usize,
        time: f64,
        control: &ControlState,
        raw_action: &[f64],
        evaluation: bool,
    ) -> ActionOutput;

    fn reset(&mut self);

    /// Number of raw outputs the policy must produce.
    fn action_size(&self) -> usize;

    /// Number of values recorded per used action.
    fn selection_size(&self) -> usize;

    /// Whether resets start boats at full power instead of a random setting.
    fn max_power_on_reset(&self) -> bool {
        true
    }
}

// ---------------------------------------------------------------------------
// Replay storage
// ---------------------------------------------------------------------------

/// Receives one transition per completed decision during training.
pub trait ReplayStorage {
    fn push(&mut self, transition: Transition);

    /// Called once after each training episode.
    fn finish_episode(&mut self) {}
}

impl ReplayStorage for Vec<Transition> {
    fn push(&mut self, transition: Transition) {
        Vec::push(self, transition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_policies() {
        let mut calls = 0;
        let mut policy = |obs: &[f64]| {
            calls += 1;
            PolicyOutput { action: vec![obs.iter().sum()], critic: vec![] }
        };
        let out = Policy::predict(&mut policy, &[1.0, 2.0]);
        assert_eq!(out.action, vec![3.0]);
        assert_eq!(Policy::name(&policy), "unnamed");
        drop(policy);
        assert_eq!(calls, 1);
    }
}
