use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{ActionOperation, ActionOutput};
use crate::dynamics::ControlState;

/// Direct actuator control.
///
/// The raw action is `[angle, power]`, each clipped to `[-1, 1]` and scaled
/// by `angle_step` (rad) and `power_step` (W). A decision is held for
/// `hold_ticks` ticks: the change is applied on the first tick, the
/// remaining ticks keep the actuators where they are, and `end_step` is
/// raised on the last one. During training an ε-greedy draw may replace the
/// action with a uniform random one.
#[derive(Debug, Clone)]
pub struct DirectControl {
    angle_step: f64,
    power_step: f64,
    hold_ticks: usize,
    epsilon: f64,
    max_power_reset: bool,
    rng: ChaCha8Rng,
    tick_in_hold: usize,
    held: Option<(Vec<f64>, Vec<f64>)>,
}

impl DirectControl {
    pub fn new(angle_step: f64, power_step: f64) -> Self {
        Self {
            angle_step,
            power_step,
            hold_ticks: 1,
            epsilon: 0.0,
            max_power_reset: true,
            rng: ChaCha8Rng::seed_from_u64(0),
            tick_in_hold: 0,
            held: None,
        }
    }

    pub fn hold_ticks(mut self, ticks: usize) -> Self {
        self.hold_ticks = ticks.max(1);
        self
    }

    pub fn exploration(mut self, epsilon: f64, seed: u64) -> Self {
        self.epsilon = epsilon.clamp(0.0, 1.0);
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn max_power_reset(mut self, enabled: bool) -> Self {
        self.max_power_reset = enabled;
        self
    }

    fn clip(raw: &[f64]) -> Vec<f64> {
        (0..2).map(|i| raw.get(i).copied().unwrap_or(0.0).clamp(-1.0, 1.0)).collect()
    }
}

impl ActionOperation for DirectControl {
    fn translate(
        &mut self,
        _episode: usize,
        _time: f64,
        _control: &ControlState,
        raw_action: &[f64],
        evaluation: bool,
    ) -> ActionOutput {
        let first_tick = self.tick_in_hold == 0;
        let (original, used) = match self.held.clone().filter(|_| !first_tick) {
            Some(held) => held,
            None => {
                let original = Self::clip(raw_action);
                let explore = !evaluation && self.epsilon > 0.0 && self.rng.gen::<f64>() < self.epsilon;
                let used = if explore {
                    (0..2).map(|_| self.rng.gen_range(-1.0..=1.0)).collect()
                } else {
                    original.clone()
                };
                self.held = Some((original.clone(), used.clone()));
                (original, used)
            }
        };

        self.tick_in_hold += 1;
        let end_step = self.tick_in_hold >= self.hold_ticks;
        if end_step {
            self.tick_in_hold = 0;
        }

        let (angle_delta, power_delta) = if first_tick {
            (used[0] * self.angle_step, used[1] * self.power_step)
        } else {
            (0.0, 0.0)
        };

        ActionOutput { power_delta, angle_delta, original, used, path: None, end_step }
    }

    fn reset(&mut self) {
        self.tick_in_hold = 0;
        self.held = None;
    }

    fn action_size(&self) -> usize {
        2
    }

    fn selection_size(&self) -> usize {
        2
    }

    fn max_power_on_reset(&self) -> bool {
        self.max_power_reset
    }
}
