use crate::vehicle::MoverRegistry;

/// Scores a tick and decides whether the episode is over.
pub trait RewardFunction {
    /// Reward for the tick that just finished at `time`.
    fn reward(&mut self, time: f64, registry: &MoverRegistry) -> f64;

    /// Forget everything about the previous episode. `registry` has already
    /// been reset and measured.
    fn reset(&mut self, registry: &MoverRegistry);

    fn terminal(&self) -> bool;
    fn is_crashed(&self) -> bool;
    fn is_success(&self) -> bool;

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Flags {
    terminal: bool,
    crashed: bool,
    success: bool,
}

/// Terms shared by both variants for one tick.
#[derive(Debug, Clone, Copy)]
struct TickScore {
    progress: f64,
    success: bool,
    crashed: bool,
}

/// Score the agent boat's progress since `old_dist` and check for arrival
/// and collision. Updates `old_dist`.
fn score(registry: &MoverRegistry, old_dist: &mut f64, dt: f64, success_radius: f64) -> TickScore {
    let Some(agent) = registry.agent() else {
        return TickScore { progress: 0.0, success: false, crashed: false };
    };
    let dist = agent.state.dest_dist;
    let closed = *old_dist - dist;
    *old_dist = dist;

    // every obstacle radius is compared with the closest range reading of any sensor
    let crashed = agent
        .min_sensor_distance()
        .map_or(false, |min| registry.obstacles().any(|o| o.radius >= min));

    TickScore {
        progress: if closed >= 0.0 { closed / (5.0 * dt) } else { 0.0 },
        success: dist < success_radius,
        crashed,
    }
}

fn agent_distance(registry: &MoverRegistry) -> f64 {
    registry.agent().map_or(0.0, |a| a.state.dest_dist)
}

// ---------------------------------------------------------------------------
// Reward every tick
// ---------------------------------------------------------------------------

/// Pays for closing distance every tick. Arrival adds a bonus; a collision
/// replaces the whole tick's reward with the crash penalty.
#[derive(Debug, Clone)]
pub struct InstantStep {
    dt: f64,
    crash_reward: f64,
    success_reward: f64,
    success_radius: f64,
    old_dist: f64,
    flags: Flags,
}

impl InstantStep {
    pub fn new(dt: f64, crash_reward: f64, success_reward: f64, success_radius: f64) -> Self {
        Self { dt, crash_reward, success_reward, success_radius, old_dist: 0.0, flags: Flags::default() }
    }
}

impl RewardFunction for InstantStep {
    fn reward(&mut self, _time: f64, registry: &MoverRegistry) -> f64 {
        self.flags.crashed = false;
        self.flags.success = false;

        let tick = score(registry, &mut self.old_dist, self.dt, self.success_radius);
        let mut reward = tick.progress;

        if tick.success {
            self.flags.terminal = true;
            self.flags.success = true;
            reward += self.success_reward;
        }
        if tick.crashed {
            self.flags.terminal = true;
            self.flags.crashed = true;
            self.flags.success = false;
            reward = self.crash_reward;
        }
        reward
    }

    fn reset(&mut self, registry: &MoverRegistry) {
        self.old_dist = agent_distance(registry);
        self.flags = Flags::default();
    }

    fn terminal(&self) -> bool {
        self.flags.terminal
    }

    fn is_crashed(&self) -> bool {
        self.flags.crashed
    }

    fn is_success(&self) -> bool {
        self.flags.success
    }

    fn name(&self) -> &str {
        "instant_step"
    }
}

// ---------------------------------------------------------------------------
// Reward paid per agent decision
// ---------------------------------------------------------------------------

/// Accumulates the same terms into a pot that is paid out once per agent
/// step (`agent_step_size` seconds) or when the episode ends. The crash
/// penalty is added to the pot rather than replacing it.
#[derive(Debug, Clone)]
pub struct MultiStep {
    dt: f64,
    crash_reward: f64,
    success_reward: f64,
    success_radius: f64,
    agent_step_size: f64, // s
    old_dist: f64,
    pot: f64,
    last_payout: f64,
    flags: Flags,
}

impl MultiStep {
    pub fn new(dt: f64, crash_reward: f64, success_reward: f64, success_radius: f64, agent_step_size: f64) -> Self {
        Self {
            dt,
            crash_reward,
            success_reward,
            success_radius,
            agent_step_size,
            old_dist: 0.0,
            pot: 0.0,
            last_payout: 0.0,
            flags: Flags::default(),
        }
    }

    /// Reward earned but not yet paid out.
    pub fn pending(&self) -> f64 {
        self.pot
    }
}

impl RewardFunction for MultiStep {
    fn reward(&mut self, time: f64, registry: &MoverRegistry) -> f64 {
        self.flags.crashed = false;
        self.flags.success = false;

        let tick = score(registry, &mut self.old_dist, self.dt, self.success_radius);
        self.pot += tick.progress;

        if tick.success {
            self.flags.terminal = true;
            self.flags.success = true;
            self.pot += self.success_reward;
        }
        if tick.crashed {
            self.flags.terminal = true;
            self.flags.crashed = true;
            self.flags.success = false;
            self.pot += self.crash_reward;
        }

        if time - self.last_payout >= self.agent_step_size || self.flags.terminal {
            self.last_payout = time;
            std::mem::take(&mut self.pot)
        } else {
            0.0
        }
    }

    fn reset(&mut self, registry: &MoverRegistry) {
        self.old_dist = agent_distance(registry);
        self.pot = 0.0;
        self.last_payout = 0.0;
        self.flags = Flags::default();
    }

    fn terminal(&self) -> bool {
        self.flags.terminal
    }

    fn is_crashed(&self) -> bool {
        self.flags.crashed
    }

    fn is_success(&self) -> bool {
        self.flags.success
    }

    fn name(&self) -> &str {
        "multi_step"
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Reward variant chosen once from the scenario.
#[derive(Debug, Clone)]
pub enum RewardKind {
    InstantStep(InstantStep),
    MultiStep(MultiStep),
}

impl RewardKind {
    fn inner(&self) -> &dyn RewardFunction {
        match self {
            RewardKind::InstantStep(r) => r,
            RewardKind::MultiStep(r) => r,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn RewardFunction {
        match self {
            RewardKind::InstantStep(r) => r,
            RewardKind::MultiStep(r) => r,
        }
    }
}

impl RewardFunction for RewardKind {
    fn reward(&mut self, time: f64, registry: &MoverRegistry) -> f64 {
        self.inner_mut().reward(time, registry)
    }

    fn reset(&mut self, registry: &MoverRegistry) {
        self.inner_mut().reset(registry)
    }

    fn terminal(&self) -> bool {
        self.inner().terminal()
    }

    fn is_crashed(&self) -> bool {
        self.inner().is_crashed()
    }

    fn is_success(&self) -> bool {
        self.inner().is_success()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}
