use serde::Serialize;

use super::event::Termination;

// ---------------------------------------------------------------------------
// Per-tick record
// ---------------------------------------------------------------------------

/// One row of the episode log, in a stable field order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickRecord {
    pub time: f64,
    pub reward: f64,
    pub is_terminal: bool,
    pub is_crashed: bool,
    pub is_success: bool,
    pub destination_x: f64,
    pub destination_y: f64,
    pub original_action: Vec<f64>,
    pub used_action: Vec<f64>,
    /// `None` when the action scheme has no path; written as a single
    /// `path` column holding zero.
    pub path: Option<Vec<f64>>,
    pub critic_values: Vec<f64>,
}

impl TickRecord {
    /// Column names matching [`TickRecord::row`].
    pub fn header(&self) -> Vec<String> {
        let mut cols: Vec<String> = [
            "time",
            "reward",
            "is_terminal",
            "is_crashed",
            "is_success",
            "destination_x",
            "destination_y",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        cols.extend((0..self.original_action.len()).map(|i| format!("original_action_{i}")));
        cols.extend((0..self.used_action.len()).map(|i| format!("used_action_{i}")));
        match &self.path {
            Some(p) => cols.extend((0..p.len()).map(|i| format!("path_{i}"))),
            None => cols.push("path".into()),
        }
        cols.extend((0..self.critic_values.len()).map(|i| format!("critic_{i}")));
        cols
    }

    /// Flags are written as 0/1.
    pub fn row(&self) -> Vec<f64> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let mut row = vec![
            self.time,
            self.reward,
            flag(self.is_terminal),
            flag(self.is_crashed),
            flag(self.is_success),
            self.destination_x,
            self.destination_y,
        ];
        row.extend_from_slice(&self.original_action);
        row.extend_from_slice(&self.used_action);
        match &self.path {
            Some(p) => row.extend_from_slice(p),
            None => row.push(0.0),
        }
        row.extend_from_slice(&self.critic_values);
        row
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// How the episode stood when a transition was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Crash,
    Success,
    Other,
}

impl Outcome {
    pub fn from_flags(crashed: bool, success: bool) -> Self {
        if crashed {
            Outcome::Crash
        } else if success {
            Outcome::Success
        } else {
            Outcome::Other
        }
    }
}

/// One completed agent decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transition {
    /// Observation at the first tick of the decision.
    pub state: Vec<f64>,
    pub action: Vec<f64>,
    /// Reward summed over every tick of the decision.
    pub reward: f64,
    /// Observation after the last tick of the decision.
    pub next_state: Vec<f64>,
    pub terminal: bool,
    pub outcome: Outcome,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    pub episode: usize,
    pub cumulative_reward: f64,
    pub crashed: bool,
    pub success: bool,
    /// Closest approach to the destination over the episode, m.
    pub min_dist: f64,
    /// Simulated time when the episode ended, s.
    pub time: f64,
    pub ticks: usize,
    pub termination: Termination,
}

/// Results of one pass over the evaluation fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub episode: usize,
    pub runs: Vec<EpisodeSummary>,
    pub success_rate: f64,
    pub crash_rate: f64,
    pub mean_min_dist: f64,
    pub mean_reward: f64,
    pub mean_time: f64,
}

impl EvaluationReport {
    pub fn from_runs(episode: usize, runs: Vec<EpisodeSummary>) -> Self {
        let n = runs.len().max(1) as f64;
        let mean = |f: &dyn Fn(&EpisodeSummary) -> f64| runs.iter().map(f).sum::<f64>() / n;
        let success_rate = mean(&|r| if r.success { 1.0 } else { 0.0 });
        let crash_rate = mean(&|r| if r.crashed { 1.0 } else { 0.0 });
        let mean_min_dist = mean(&|r| r.min_dist);
        let mean_reward = mean(&|r| r.cumulative_reward);
        let mean_time = mean(&|r| r.time);
        Self { episode, runs, success_rate, crash_rate, mean_min_dist, mean_reward, mean_time }
    }
}
