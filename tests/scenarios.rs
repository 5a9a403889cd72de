use std::collections::BTreeMap;
use std::f64::consts::TAU;

use nalgebra::Vector2;
use proptest::prelude::*;

use riverboat_sim::agent::{PolicyOutput, TransitionBuffer};
use riverboat_sim::config::{
    presets, EvaluationFixture, FixtureRow, MoverConfig, RewardConfig, SensorConfig,
};
use riverboat_sim::dynamics::{Ambient, BoatParams};
use riverboat_sim::sim::{RunMode, Termination};
use riverboat_sim::vehicle::RiverBoat;
use riverboat_sim::{Environment, ScenarioConfig};

fn idle_policy() -> impl FnMut(&[f64]) -> PolicyOutput {
    |_: &[f64]| PolicyOutput { action: vec![0.0, 0.0], critic: vec![] }
}

/// One agent boat at (100, 100) heading +x, one rock, one fixture row.
fn fixture_world(rock: (f64, f64), rock_radius: f64, destination: (f64, f64)) -> Environment {
    let mut cfg = presets::open_water();
    cfg.movers.push(MoverConfig::StaticCircle { name: "rock".into(), radius: rock_radius });
    cfg.sensors.push(SensorConfig::Proximity {
        name: "prox".into(),
        install_on: "river_boat_0".into(),
        max_range: 50.0,
        max_angle: std::f64::consts::PI,
        dist_norm: None,
        angle_norm: None,
    });
    cfg.reward = RewardConfig::InstantStep { crash: -10.0, success: 10.0 };

    let mut movers = BTreeMap::new();
    movers.insert(
        "river_boat_0".to_string(),
        BTreeMap::from([
            ("x_pos".to_string(), 100.0),
            ("y_pos".to_string(), 100.0),
            ("psi".to_string(), 0.0),
        ]),
    );
    movers.insert(
        "rock".to_string(),
        BTreeMap::from([("x_pos".to_string(), rock.0), ("y_pos".to_string(), rock.1)]),
    );
    cfg.evaluation = Some(EvaluationFixture {
        rows: vec![FixtureRow { destination: Vector2::new(destination.0, destination.1), movers }],
    });
    cfg.build_environment().unwrap()
}

// ---------------------------------------------------------------------------
// Single-boat scenarios
// ---------------------------------------------------------------------------

#[test]
fn empty_boat_at_rest_stays_put() {
    let mut boat = RiverBoat::new("b", BoatParams::default()).unwrap();
    boat.set_control(0.0, 0.0);
    boat.state.fuel = 0.0;
    let before = boat.state.pos;
    boat.step(&Ambient::default(), 0.25, 0.0).unwrap();
    assert_eq!(boat.state.thrust, 0.0);
    assert_eq!(boat.state.pos, before);
    assert_eq!(boat.state.fuel, 0.0);
}

#[test]
fn full_power_accelerates_forward() {
    let mut boat = RiverBoat::new("b", BoatParams::default()).unwrap();
    boat.set_control(boat.params.power_max, 0.0);
    let before = boat.state.vel_local.x;
    boat.step(&Ambient::default(), 0.25, 0.0).unwrap();
    assert!(boat.state.thrust > 0.0);
    assert!(boat.last_forces().fx_p > 0.0);
    assert!(boat.state.vel_local.x > before);
}

// ---------------------------------------------------------------------------
// Episode scenarios
// ---------------------------------------------------------------------------

#[test]
fn arrival_pays_success_bonus_once() {
    let mut env = fixture_world((30.0, 30.0), 5.0, (102.0, 100.0));
    let mut replay = TransitionBuffer::new(16);
    let summary = env
        .run_simulation(0, RunMode::Evaluation { row: 0 }, &mut idle_policy(), &mut replay)
        .unwrap();

    assert!(summary.success && !summary.crashed);
    assert_eq!(summary.termination, Termination::Success);
    assert_eq!(summary.ticks, 1);
    let record = &env.records()[0];
    assert!(record.is_success && record.is_terminal);
    assert!(record.reward >= 10.0 && record.reward < 11.0, "reward {}", record.reward);
    assert_eq!(summary.cumulative_reward, record.reward);
}

#[test]
fn collision_reward_is_exactly_the_penalty() {
    let mut env = fixture_world((103.0, 100.0), 5.0, (180.0, 180.0));
    let mut replay = TransitionBuffer::new(16);
    let summary = env
        .run_simulation(0, RunMode::Evaluation { row: 0 }, &mut idle_policy(), &mut replay)
        .unwrap();

    assert!(summary.crashed && !summary.success);
    assert_eq!(summary.termination, Termination::Crash);
    let record = &env.records()[0];
    assert!(record.is_crashed && record.is_terminal);
    assert_eq!(record.reward, -10.0);
}

#[test]
fn open_water_evaluation_times_out_with_flags_clear() {
    let mut env = fixture_world((10.0, 190.0), 2.0, (190.0, 10.0));
    let mut replay = TransitionBuffer::new(16);
    let summary = env
        .run_simulation(0, RunMode::Evaluation { row: 0 }, &mut idle_policy(), &mut replay)
        .unwrap();
    assert_eq!(summary.termination, Termination::Timeout);
    assert_eq!(summary.ticks, env.max_steps(true));
    assert!(!summary.crashed && !summary.success);
    assert!(replay.is_empty());
}

#[test]
fn terminal_episode_never_steps_again() {
    let mut env = fixture_world((103.0, 100.0), 5.0, (180.0, 180.0));
    env.reset_fixture(0).unwrap();
    let mut policy = idle_policy();
    let first = env.tick(0, &mut policy).unwrap().unwrap();
    assert!(first.record.is_terminal);
    let frozen = env.registry().agent().unwrap().state.clone();
    for _ in 0..5 {
        assert!(env.tick(0, &mut policy).unwrap().is_none());
    }
    assert_eq!(env.registry().agent().unwrap().state, frozen);
    assert!(env.episode_state().is_terminal);
}

#[test]
fn same_seed_reproduces_training_episodes() {
    let run = || {
        let mut env = ScenarioConfig::default().build_environment().unwrap();
        let mut replay = TransitionBuffer::new(10_000);
        let mut out = Vec::new();
        for ep in 0..3 {
            let mut policy = |obs: &[f64]| PolicyOutput { action: vec![-obs[3], 1.0], critic: vec![] };
            out.push(env.run_simulation(ep, RunMode::Training, &mut policy, &mut replay).unwrap());
        }
        (out, env.records().to_vec())
    };
    assert_eq!(run(), run());
}

#[test]
fn evaluation_set_reports_every_row() {
    let mut env = ScenarioConfig::default().build_environment().unwrap();
    let report = env.run_evaluation_set(0, &mut idle_policy()).unwrap();
    assert_eq!(report.runs.len(), env.fixture_rows());
    assert!((0.0..=1.0).contains(&report.success_rate));
    assert!(report.runs.iter().all(|r| r.ticks <= env.max_steps(true)));
}

// ---------------------------------------------------------------------------
// Properties over arbitrary control sequences
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn heading_stays_wrapped(
        controls in prop::collection::vec((0.0f64..9500.0, -1.0f64..1.0), 1..40),
        psi in -10.0f64..10.0,
        wind in (-5.0f64..5.0, -5.0f64..5.0),
    ) {
        let mut boat = RiverBoat::new("b", BoatParams::default()).unwrap();
        boat.set_state_value("psi", psi).unwrap();
        let ambient = Ambient { wind: Vector2::new(wind.0, wind.1), current: Vector2::zeros() };
        for (i, (power, delta)) in controls.into_iter().enumerate() {
            boat.set_control(power, delta);
            boat.step(&ambient, 0.25, i as f64 * 0.25).unwrap();
            prop_assert!((0.0..TAU).contains(&boat.state.psi));
        }
    }

    #[test]
    fn fuel_never_increases(
        controls in prop::collection::vec(0.0f64..20_000.0, 1..40),
        fuel in 0.0f64..0.01,
    ) {
        let mut boat = RiverBoat::new("b", BoatParams::default()).unwrap();
        boat.state.fuel = fuel;
        for (i, power) in controls.into_iter().enumerate() {
            boat.set_control(power, 0.0);
            let before = boat.state.fuel;
            boat.step(&Ambient::default(), 0.25, i as f64 * 0.25).unwrap();
            prop_assert!(boat.state.fuel <= before);
            prop_assert!(boat.state.fuel >= 0.0);
        }
    }
}
