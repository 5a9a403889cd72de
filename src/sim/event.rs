use serde::Serialize;

// ---------------------------------------------------------------------------
// Episode state machine
// ---------------------------------------------------------------------------

/// Why an episode stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Success,
    Crash,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    Running,
    Terminal(Termination),
}

/// Clock and outcome flags of the running episode.
///
/// Once terminal, later flag reports are ignored until the next reset.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeState {
    pub time: f64, // s
    pub tick: usize,
    pub is_terminal: bool,
    pub is_crashed: bool,
    pub is_success: bool,
    phase: EpisodePhase,
}

impl Default for EpisodeState {
    fn default() -> Self {
        Self::new()
    }
}

impl EpisodeState {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            tick: 0,
            is_terminal: false,
            is_crashed: false,
            is_success: false,
            phase: EpisodePhase::Running,
        }
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == EpisodePhase::Running
    }

    /// Fold the reward function's flags for the tick just taken.
    /// A crash clears success.
    pub fn report(&mut self, terminal: bool, crashed: bool, success: bool) {
        if !self.is_running() {
            return;
        }
        self.is_crashed = crashed;
        self.is_success = success && !crashed;
        if terminal || crashed || success {
            self.is_terminal = true;
            self.phase = EpisodePhase::Terminal(if self.is_crashed {
                Termination::Crash
            } else if self.is_success {
                Termination::Success
            } else {
                // terminal without either flag only happens with custom rewards
                Termination::Timeout
            });
            log::debug!("episode terminal at t={:.2} s ({:?})", self.time, self.phase);
        }
    }

    /// Move the clock to the next tick.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.time = self.tick as f64 * dt;
    }

    /// Close the episode at the step cap. Flags stay false.
    pub fn time_out(&mut self) {
        if self.is_running() {
            self.phase = EpisodePhase::Terminal(Termination::Timeout);
        }
    }

    pub fn termination(&self) -> Option<Termination> {
        match self.phase {
            EpisodePhase::Running => None,
            EpisodePhase::Terminal(t) => Some(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_terminal() {
        let mut ep = EpisodeState::new();
        ep.report(true, false, true);
        assert!(ep.is_terminal && ep.is_success && !ep.is_crashed);
        assert_eq!(ep.termination(), Some(Termination::Success));
    }

    #[test]
    fn terminal_is_absorbing() {
        let mut ep = EpisodeState::new();
        ep.report(true, true, false);
        ep.report(false, false, true);
        assert!(ep.is_terminal && ep.is_crashed && !ep.is_success);
        assert_eq!(ep.phase(), EpisodePhase::Terminal(Termination::Crash));
    }

    #[test]
    fn crash_clears_success() {
        let mut ep = EpisodeState::new();
        ep.report(true, true, true);
        assert!(ep.is_crashed && !ep.is_success);
    }

    #[test]
    fn timeout_keeps_flags_false() {
        let mut ep = EpisodeState::new();
        ep.report(false, false, false);
        assert!(ep.is_running());
        ep.time_out();
        assert_eq!(ep.termination(), Some(Termination::Timeout));
        assert!(!ep.is_terminal && !ep.is_crashed && !ep.is_success);
    }

    #[test]
    fn clock_is_tick_times_dt() {
        let mut ep = EpisodeState::new();
        for _ in 0..3 {
            ep.advance(0.1);
        }
        assert_eq!(ep.tick, 3);
        assert_eq!(ep.time, 3.0 * 0.1);
    }
}
