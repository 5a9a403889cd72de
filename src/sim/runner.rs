use std::f64::consts::TAU;

use nalgebra::Vector2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::event::{EpisodeState, Termination};
use super::record::{EpisodeSummary, EvaluationReport, Outcome, TickRecord, Transition};
use crate::agent::{ActionOperation, Policy, ReplayStorage, RewardFunction, RewardKind};
use crate::config::{EvaluationFixture, ScenarioSettings};
use crate::dynamics::{wrap_angle, Ambient};
use crate::error::{SimError, SimResult};
use crate::vehicle::{Mover, MoverRegistry, RiverBoat, StaticCircle};

/// Draws allowed per mover before a random reset gives up.
const PLACEMENT_ATTEMPTS: usize = 10_000;
/// Draw count past which placement starts complaining.
const PLACEMENT_WARN: usize = 100;

// ---------------------------------------------------------------------------
// Run modes and tick results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Random initial conditions, transitions go to replay storage.
    Training,
    /// Initial conditions from fixture row `row`, doubled step cap, no replay.
    Evaluation { row: usize },
}

impl RunMode {
    pub fn is_evaluation(&self) -> bool {
        matches!(self, RunMode::Evaluation { .. })
    }
}

/// Everything one tick produced.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub record: TickRecord,
    /// Agent observation before the movers stepped.
    pub state: Vec<f64>,
    /// Agent observation after the movers stepped.
    pub next_state: Vec<f64>,
    pub end_step: bool,
    pub dest_dist: f64,
}

/// Decision in progress: first-tick observation and action plus the reward
/// summed so far.
struct PendingDecision {
    state: Vec<f64>,
    action: Vec<f64>,
    reward: f64,
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Owns the world and drives episodes one tick at a time.
pub struct Environment {
    settings: ScenarioSettings,
    ambient: Ambient,
    registry: MoverRegistry,
    destination: Vector2<f64>,
    reward: RewardKind,
    action: Box<dyn ActionOperation>,
    fixture: Option<EvaluationFixture>,
    rng: ChaCha8Rng,
    episode: EpisodeState,
    mode: RunMode,
    step_cap: usize,
    records: Vec<TickRecord>,
}

impl Environment {
    pub fn new(
        settings: ScenarioSettings,
        registry: MoverRegistry,
        reward: RewardKind,
        action: Box<dyn ActionOperation>,
    ) -> SimResult<Self> {
        settings.validate()?;
        let agents = registry.agent_count();
        if agents != 1 {
            return Err(SimError::AgentCount(agents));
        }
        let rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let step_cap = Self::cap_for(&settings, false);
        Ok(Self {
            ambient: settings.ambient(),
            settings,
            registry,
            destination: Vector2::zeros(),
            reward,
            action,
            fixture: None,
            rng,
            episode: EpisodeState::new(),
            mode: RunMode::Training,
            step_cap,
            records: Vec::new(),
        })
    }

    /// Attach evaluation starts. Every mover and field a row names must exist.
    pub fn with_fixture(mut self, fixture: EvaluationFixture) -> SimResult<Self> {
        if fixture.rows.is_empty() {
            return Err(SimError::Fixture("fixture has no rows".into()));
        }
        for (i, row) in fixture.rows.iter().enumerate() {
            if !row.destination.iter().all(|v| v.is_finite()) {
                return Err(SimError::Fixture(format!("row {i}: destination is not finite")));
            }
            for (name, overrides) in &row.movers {
                let mover = self
                    .registry
                    .get(name)
                    .ok_or_else(|| SimError::Fixture(format!("row {i}: no mover named '{name}'")))?;
                for key in overrides.keys() {
                    mover.state_value(key)?;
                }
            }
        }
        self.fixture = Some(fixture);
        Ok(self)
    }

    fn cap_for(settings: &ScenarioSettings, evaluation: bool) -> usize {
        let cap = (settings.max_time / settings.time_step).ceil() as usize;
        if evaluation {
            cap * 2
        } else {
            cap
        }
    }

    /// Tick cap of one episode.
    pub fn max_steps(&self, evaluation: bool) -> usize {
        Self::cap_for(&self.settings, evaluation)
    }

    // -- resets ---------------------------------------------------------------

    /// Random destination and random starts for every mover.
    pub fn reset_random(&mut self) -> SimResult<()> {
        let domain = self.settings.domain;
        let max_power = self.action.max_power_on_reset();
        self.destination = sample_point(&mut self.rng, domain);

        let names: Vec<String> = self.registry.iter().map(|m| m.name().to_string()).collect();
        for name in &names {
            let others: Vec<Vector2<f64>> = self
                .registry
                .iter()
                .filter(|m| m.name() != name)
                .map(Mover::position)
                .collect();
            match self.registry.try_get_mut(name)? {
                Mover::Boat(boat) => randomize_boat(
                    boat,
                    &mut self.rng,
                    &self.destination,
                    domain,
                    self.settings.min_start_distance,
                    max_power,
                )?,
                Mover::Obstacle(circle) => {
                    place_obstacle(circle, &mut self.rng, &self.destination, &others, domain)?
                }
            }
        }
        log::debug!(
            "random reset, destination ({:.1}, {:.1})",
            self.destination.x,
            self.destination.y
        );
        self.finish_reset(RunMode::Training)
    }

    /// Starts from fixture row `row`. Parameter overrides stay on the boat.
    pub fn reset_fixture(&mut self, row: usize) -> SimResult<()> {
        let fixture = self
            .fixture
            .as_ref()
            .ok_or_else(|| SimError::Fixture("no evaluation fixture configured".into()))?;
        let entry = fixture
            .rows
            .get(row)
            .ok_or_else(|| SimError::Fixture(format!("row {row} out of range ({} rows)", fixture.rows.len())))?
            .clone();
        let max_power = self.action.max_power_on_reset();
        self.destination = entry.destination;

        for mover in self.registry.iter_mut() {
            let overrides = entry.movers.get(mover.name());
            match mover {
                Mover::Boat(boat) => {
                    boat.reinitialize();
                    for (key, value) in overrides.into_iter().flatten() {
                        boat.set_state_value(key, *value)?;
                    }
                    let power = if max_power {
                        boat.params.power_max
                    } else {
                        self.rng.gen::<f64>() * boat.params.power_max
                    };
                    let delta = boat.state.delta;
                    boat.set_control(power, delta);
                    boat.state.fuel = boat.params.fuel_capacity;
                }
                Mover::Obstacle(circle) => {
                    for (key, value) in overrides.into_iter().flatten() {
                        circle.set_state_value(key, *value)?;
                    }
                }
            }
        }
        log::debug!("fixture reset from row {row}");
        self.finish_reset(RunMode::Evaluation { row })
    }

    fn finish_reset(&mut self, mode: RunMode) -> SimResult<()> {
        self.registry.update_measurements(&self.destination)?;
        self.reward.reset(&self.registry);
        self.action.reset();
        self.episode = EpisodeState::new();
        self.mode = mode;
        self.step_cap = Self::cap_for(&self.settings, mode.is_evaluation());
        self.records = Vec::with_capacity(self.step_cap);
        self.registry.reset_histories(self.step_cap);
        Ok(())
    }

    // -- ticking ----------------------------------------------------------------

    /// Advance the world by one tick in the mode of the last reset. Returns
    /// `None` once the episode is over; nothing moves after that.
    pub fn tick(&mut self, episode: usize, policy: &mut dyn Policy) -> SimResult<Option<TickOutcome>> {
        if !self.episode.is_running() {
            return Ok(None);
        }
        let t = self.episode.time;
        let dt = self.settings.time_step;

        self.registry.update_measurements(&self.destination)?;

        let agent = self.registry.agent().ok_or(SimError::AgentCount(0))?;
        let state = agent.observation()?;
        let control = agent.state.control();
        let prediction = policy.predict(&state);
        let evaluation = self.mode.is_evaluation();
        let action = self.action.translate(episode, t, &control, &prediction.action, evaluation);

        if let Some(agent) = self.registry.agent_mut() {
            agent.set_control(control.power + action.power_delta, control.delta + action.angle_delta);
        }

        self.registry.step_all(&self.ambient, dt, t)?;
        self.registry.update_measurements(&self.destination)?;

        let agent = self.registry.agent().ok_or(SimError::AgentCount(0))?;
        let next_state = agent.observation()?;
        let dest_dist = agent.state.dest_dist;

        let reward = self.reward.reward(t, &self.registry);
        self.episode
            .report(self.reward.terminal(), self.reward.is_crashed(), self.reward.is_success());
        self.registry.add_step_histories();

        let record = TickRecord {
            time: t,
            reward,
            is_terminal: self.episode.is_terminal,
            is_crashed: self.episode.is_crashed,
            is_success: self.episode.is_success,
            destination_x: self.destination.x,
            destination_y: self.destination.y,
            original_action: action.original,
            used_action: action.used,
            path: action.path,
            critic_values: prediction.critic,
        };
        log::trace!("t={:.2} reward={:.3} dist={:.2}", t, reward, dest_dist);
        self.records.push(record.clone());

        self.episode.advance(dt);
        if self.episode.tick >= self.step_cap {
            self.episode.time_out();
        }

        Ok(Some(TickOutcome { record, state, next_state, end_step: action.end_step, dest_dist }))
    }

    /// Reset, then tick until the episode ends.
    pub fn run_simulation(
        &mut self,
        episode: usize,
        mode: RunMode,
        policy: &mut dyn Policy,
        replay: &mut dyn ReplayStorage,
    ) -> SimResult<EpisodeSummary> {
        match mode {
            RunMode::Training => self.reset_random()?,
            RunMode::Evaluation { row } => self.reset_fixture(row)?,
        }
        policy.reset();
        let evaluation = mode.is_evaluation();

        let mut pending: Option<PendingDecision> = None;
        let mut cumulative_reward = 0.0;
        let mut min_dist = f64::INFINITY;

        while let Some(out) = self.tick(episode, policy)? {
            min_dist = min_dist.min(out.dest_dist);
            cumulative_reward += out.record.reward;

            let decision = pending.get_or_insert_with(|| PendingDecision {
                state: out.state.clone(),
                action: out.record.used_action.clone(),
                reward: 0.0,
            });
            decision.reward += out.record.reward;

            if out.end_step || out.record.is_terminal {
                if let Some(decision) = pending.take() {
                    if !evaluation {
                        replay.push(Transition {
                            state: decision.state,
                            action: decision.action,
                            reward: decision.reward,
                            next_state: out.next_state,
                            terminal: out.record.is_terminal,
                            outcome: Outcome::from_flags(out.record.is_crashed, out.record.is_success),
                        });
                    }
                }
            }
        }

        self.registry.trim_histories();
        self.records.shrink_to_fit();
        if !evaluation {
            replay.finish_episode();
        }

        let summary = EpisodeSummary {
            episode,
            cumulative_reward,
            crashed: self.episode.is_crashed,
            success: self.episode.is_success,
            min_dist,
            time: self.episode.time,
            ticks: self.episode.tick,
            termination: self.episode.termination().unwrap_or(Termination::Timeout),
        };
        log::info!(
            "episode {} ({}): success={} crashed={} min_dist={:.2} m reward={:.2} t={:.1} s",
            episode,
            if evaluation { "eval" } else { "train" },
            summary.success,
            summary.crashed,
            summary.min_dist,
            summary.cumulative_reward,
            summary.time
        );
        Ok(summary)
    }

    /// Run every fixture row in evaluation mode.
    pub fn run_evaluation_set(&mut self, episode: usize, policy: &mut dyn Policy) -> SimResult<EvaluationReport> {
        let rows = self.fixture_rows();
        if rows == 0 {
            return Err(SimError::Fixture("no evaluation fixture configured".into()));
        }
        let mut unused: Vec<Transition> = Vec::new();
        let mut runs = Vec::with_capacity(rows);
        for row in 0..rows {
            runs.push(self.run_simulation(episode, RunMode::Evaluation { row }, policy, &mut unused)?);
        }
        let report = EvaluationReport::from_runs(episode, runs);
        log::info!(
            "evaluation after episode {}: success {:.0}% crash {:.0}% mean min dist {:.2} m",
            episode,
            report.success_rate * 100.0,
            report.crash_rate * 100.0,
            report.mean_min_dist
        );
        Ok(report)
    }

    // -- accessors ----------------------------------------------------------------

    pub fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    pub fn registry(&self) -> &MoverRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MoverRegistry {
        &mut self.registry
    }

    pub fn destination(&self) -> Vector2<f64> {
        self.destination
    }

    pub fn set_destination(&mut self, destination: Vector2<f64>) {
        self.destination = destination;
    }

    /// Mode chosen by the last reset.
    pub fn run_mode(&self) -> RunMode {
        self.mode
    }

    pub fn episode_state(&self) -> &EpisodeState {
        &self.episode
    }

    pub fn reward_function(&self) -> &RewardKind {
        &self.reward
    }

    pub fn records(&self) -> &[TickRecord] {
        &self.records
    }

    pub fn fixture_rows(&self) -> usize {
        self.fixture.as_ref().map_or(0, |f| f.rows.len())
    }
}

// ---------------------------------------------------------------------------
// Random placement
// ---------------------------------------------------------------------------

fn sample_point(rng: &mut ChaCha8Rng, domain: f64) -> Vector2<f64> {
    Vector2::new(rng.gen::<f64>() * domain, rng.gen::<f64>() * domain)
}

/// Draw points until `clear` accepts one.
fn sample_clear(
    rng: &mut ChaCha8Rng,
    domain: f64,
    name: &str,
    clear: impl Fn(&Vector2<f64>) -> bool,
) -> SimResult<Vector2<f64>> {
    for attempt in 1..=PLACEMENT_ATTEMPTS {
        let p = sample_point(rng, domain);
        if clear(&p) {
            if attempt > PLACEMENT_WARN {
                log::warn!("'{}' placed after {} draws", name, attempt);
            }
            return Ok(p);
        }
    }
    Err(SimError::Placement { name: name.to_string(), attempts: PLACEMENT_ATTEMPTS })
}

fn randomize_boat(
    boat: &mut RiverBoat,
    rng: &mut ChaCha8Rng,
    destination: &Vector2<f64>,
    domain: f64,
    min_start_distance: f64,
    max_power: bool,
) -> SimResult<()> {
    boat.reinitialize();
    let pos = sample_clear(rng, domain, &boat.name, |p| (p - destination).norm() > min_start_distance)?;

    let s = &mut boat.state;
    s.pos = pos;
    s.psi = wrap_angle(rng.gen::<f64>() * TAU);
    s.delta = (rng.gen::<f64>() - 0.5) * 2.0 * boat.params.delta_min.abs();
    s.vel_local = Vector2::new(rng.gen::<f64>(), rng.gen::<f64>() - 0.5);
    s.psi_dot = 0.0;
    s.sync_global_velocity();

    let power = if max_power { boat.params.power_max } else { rng.gen::<f64>() * boat.params.power_max };
    let delta = boat.state.delta;
    boat.set_control(power, delta);
    boat.state.fuel = boat.params.fuel_capacity;
    Ok(())
}

/// Keep the circle more than two radii from the destination and every other mover.
fn place_obstacle(
    circle: &mut StaticCircle,
    rng: &mut ChaCha8Rng,
    destination: &Vector2<f64>,
    others: &[Vector2<f64>],
    domain: f64,
) -> SimResult<()> {
    let keep_out = 2.0 * circle.radius;
    circle.pos = sample_clear(rng, domain, &circle.name, |p| {
        (p - destination).norm() > keep_out && others.iter().all(|o| (p - o).norm() > keep_out)
    })?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{ActionOutput, DirectControl, InstantStep, PolicyOutput, ProximitySensor, TransitionBuffer};
    use crate::dynamics::ControlState;
    use crate::config::FixtureRow;
    use crate::vehicle::RiverBoatBuilder;
    use std::collections::BTreeMap;

    fn settings() -> ScenarioSettings {
        ScenarioSettings { max_time: 5.0, ..ScenarioSettings::default() }
    }

    fn environment(hold_ticks: usize) -> Environment {
        let s = settings();
        let mut registry = MoverRegistry::new();
        let mut boat = RiverBoatBuilder::new("river_boat_0")
            .observe("dest_dist", 200.0)
            .observe("mu", std::f64::consts::PI)
            .agent()
            .build()
            .unwrap();
        boat.add_sensor(Box::new(ProximitySensor::new("prox", "river_boat_0", 50.0).unwrap()));
        registry.add(boat).unwrap();
        registry.add(StaticCircle::new("static_circle_0", 5.0).unwrap()).unwrap();
        registry.add(StaticCircle::new("static_circle_1", 5.0).unwrap()).unwrap();
        let reward = RewardKind::InstantStep(InstantStep::new(s.time_step, -10.0, 10.0, s.success_radius));
        let action = DirectControl::new(0.1, 500.0).hold_ticks(hold_ticks);
        Environment::new(s, registry, reward, Box::new(action)).unwrap()
    }

    fn straight() -> impl FnMut(&[f64]) -> PolicyOutput {
        |_: &[f64]| PolicyOutput { action: vec![0.0, 1.0], critic: vec![0.5] }
    }

    fn fixture_row(boat: [(&str, f64); 3], rock: (f64, f64), destination: (f64, f64)) -> FixtureRow {
        let mut movers = BTreeMap::new();
        movers.insert("river_boat_0".to_string(), boat.iter().map(|&(k, v)| (k.to_string(), v)).collect());
        movers.insert(
            "static_circle_0".to_string(),
            BTreeMap::from([("x_pos".to_string(), rock.0), ("y_pos".to_string(), rock.1)]),
        );
        movers.insert(
            "static_circle_1".to_string(),
            BTreeMap::from([("x_pos".to_string(), 190.0), ("y_pos".to_string(), 190.0)]),
        );
        FixtureRow { destination: Vector2::new(destination.0, destination.1), movers }
    }

    #[test]
    fn new_requires_exactly_one_agent() {
        let s = settings();
        let reward = RewardKind::InstantStep(InstantStep::new(0.25, -1.0, 1.0, 5.0));
        let r = Environment::new(s, MoverRegistry::new(), reward, Box::new(DirectControl::new(0.1, 1.0)));
        assert!(matches!(r, Err(SimError::AgentCount(0))));
    }

    #[test]
    fn step_cap_doubles_in_evaluation() {
        let env = environment(1);
        assert_eq!(env.max_steps(false), 20);
        assert_eq!(env.max_steps(true), 40);
    }

    #[test]
    fn random_reset_respects_clearances() {
        let mut env = environment(1);
        for _ in 0..20 {
            env.reset_random().unwrap();
            let dest = env.destination();
            let boat = env.registry().agent().unwrap();
            assert!(boat.state.dest_dist > 30.0);
            assert_eq!(boat.state.fuel, boat.params.fuel_capacity);
            assert_eq!(boat.state.power, boat.params.power_max);
            assert!((0.0..TAU).contains(&boat.state.psi));
            assert!(boat.state.delta.abs() <= boat.params.delta_min.abs());
            for rock in env.registry().obstacles() {
                assert!(rock.distance_to(&dest) > 10.0);
                assert!(rock.distance_to(&boat.state.pos) > 10.0);
            }
        }
    }

    #[test]
    fn same_seed_same_resets() {
        let mut a = environment(1);
        let mut b = environment(1);
        for _ in 0..3 {
            a.reset_random().unwrap();
            b.reset_random().unwrap();
            assert_eq!(a.destination(), b.destination());
            assert_eq!(a.registry().agent().unwrap().state, b.registry().agent().unwrap().state);
        }
    }

    #[test]
    fn training_episode_pushes_one_transition_per_tick() {
        let mut env = environment(1);
        let mut buffer = TransitionBuffer::new(1000);
        let summary = env.run_simulation(0, RunMode::Training, &mut straight(), &mut buffer).unwrap();
        assert_eq!(buffer.len(), summary.ticks);
        assert_eq!(buffer.episodes(), 1);
        assert_eq!(env.records().len(), summary.ticks);
        assert_eq!(env.registry().agent().unwrap().history().len(), summary.ticks);
        assert!((summary.time - summary.ticks as f64 * 0.25).abs() < 1e-12);
        let total: f64 = buffer.iter().map(|t| t.reward).sum();
        assert!((total - summary.cumulative_reward).abs() < 1e-9);
    }

    #[test]
    fn held_decisions_sum_their_rewards() {
        let mut env = environment(4);
        let mut buffer = TransitionBuffer::new(1000);
        let summary = env.run_simulation(0, RunMode::Training, &mut straight(), &mut buffer).unwrap();
        let decisions = if summary.termination == Termination::Timeout {
            summary.ticks / 4
        } else {
            (summary.ticks + 3) / 4
        };
        assert_eq!(buffer.len(), decisions);
        let per_tick: Vec<f64> = env.records().iter().map(|r| r.reward).collect();
        let first: f64 = per_tick[..4].iter().sum();
        assert!((buffer.iter().next().unwrap().reward - first).abs() < 1e-12);
    }

    #[test]
    fn evaluation_uses_fixture_and_skips_replay() {
        let fixture = EvaluationFixture {
            rows: vec![fixture_row([("x_pos", 20.0), ("y_pos", 100.0), ("psi", 0.0)], (100.0, 20.0), (180.0, 100.0))],
        };
        let mut env = environment(1).with_fixture(fixture).unwrap();
        let mut buffer = TransitionBuffer::new(16);
        let summary = env
            .run_simulation(3, RunMode::Evaluation { row: 0 }, &mut straight(), &mut buffer)
            .unwrap();
        assert!(buffer.is_empty());
        assert_eq!(buffer.episodes(), 0);
        assert_eq!(summary.ticks, 40);
        assert_eq!(summary.termination, Termination::Timeout);
        assert!(!summary.crashed && !summary.success);
        assert_eq!(env.destination(), Vector2::new(180.0, 100.0));
        assert!(summary.min_dist < 160.0);
    }

    /// Zero action that remembers the evaluation flag of every call.
    struct FlagLog(std::rc::Rc<std::cell::RefCell<Vec<bool>>>);

    impl ActionOperation for FlagLog {
        fn translate(&mut self, _: usize, _: f64, _: &ControlState, raw: &[f64], evaluation: bool) -> ActionOutput {
            self.0.borrow_mut().push(evaluation);
            ActionOutput {
                power_delta: 0.0,
                angle_delta: 0.0,
                original: raw.to_vec(),
                used: raw.to_vec(),
                path: None,
                end_step: true,
            }
        }
        fn reset(&mut self) {}
        fn action_size(&self) -> usize {
            2
        }
        fn selection_size(&self) -> usize {
            2
        }
    }

    #[test]
    fn ticks_follow_the_mode_of_the_last_reset() {
        let flags = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let s = settings();
        let mut registry = MoverRegistry::new();
        let boat = RiverBoatBuilder::new("river_boat_0").observe("dest_dist", 200.0).agent().build().unwrap();
        registry.add(boat).unwrap();
        let reward = RewardKind::InstantStep(InstantStep::new(s.time_step, -10.0, 10.0, s.success_radius));
        let fixture = EvaluationFixture {
            rows: vec![FixtureRow {
                destination: Vector2::new(190.0, 190.0),
                movers: BTreeMap::from([(
                    "river_boat_0".to_string(),
                    BTreeMap::from([("x_pos".to_string(), 10.0), ("y_pos".to_string(), 10.0)]),
                )]),
            }],
        };
        let mut env = Environment::new(s, registry, reward, Box::new(FlagLog(flags.clone())))
            .unwrap()
            .with_fixture(fixture)
            .unwrap();
        let mut policy = straight();

        env.reset_fixture(0).unwrap();
        assert_eq!(env.run_mode(), RunMode::Evaluation { row: 0 });
        let mut ticks = 0;
        while env.tick(0, &mut policy).unwrap().is_some() {
            ticks += 1;
        }
        assert_eq!(ticks, env.max_steps(true));
        assert!(flags.borrow().iter().all(|&e| e));

        flags.borrow_mut().clear();
        env.reset_random().unwrap();
        assert_eq!(env.run_mode(), RunMode::Training);
        env.tick(0, &mut policy).unwrap().unwrap();
        assert_eq!(*flags.borrow(), vec![false]);
    }

    #[test]
    fn fixture_naming_unknown_mover_is_rejected() {
        let mut row = fixture_row([("x_pos", 0.0), ("y_pos", 0.0), ("psi", 0.0)], (1.0, 1.0), (2.0, 2.0));
        row.movers.insert("ghost".into(), BTreeMap::new());
        let r = environment(1).with_fixture(EvaluationFixture { rows: vec![row] });
        assert!(matches!(r, Err(SimError::Fixture(_))));

        let row = fixture_row([("x_pos", 0.0), ("y_pos", 0.0), ("warp", 9.0)], (1.0, 1.0), (2.0, 2.0));
        let r = environment(1).with_fixture(EvaluationFixture { rows: vec![row] });
        assert!(matches!(r, Err(SimError::UnknownStateKey { .. })));
    }

    #[test]
    fn missing_row_is_a_fixture_error() {
        let mut env = environment(1);
        assert!(matches!(env.reset_fixture(0), Err(SimError::Fixture(_))));
    }

    #[test]
    fn nothing_moves_after_terminal() {
        let fixture = EvaluationFixture {
            rows: vec![fixture_row([("x_pos", 100.0), ("y_pos", 100.0), ("psi", 0.0)], (30.0, 30.0), (102.0, 100.0))],
        };
        let mut env = environment(1).with_fixture(fixture).unwrap();
        env.reset_fixture(0).unwrap();
        let mut policy = straight();
        let first = env.tick(0, &mut policy).unwrap().unwrap();
        assert!(first.record.is_success && first.record.is_terminal);
        let pos = env.registry().agent().unwrap().state.pos;
        assert!(env.tick(0, &mut policy).unwrap().is_none());
        assert_eq!(env.registry().agent().unwrap().state.pos, pos);
        assert_eq!(env.records().len(), 1);
    }
}
