use std::error::Error;

use riverboat_sim::agent::TransitionBuffer;
use riverboat_sim::control::HeadingPolicy;
use riverboat_sim::io::{write_json, TrackSummary};
use riverboat_sim::sim::RunMode;
use riverboat_sim::{ScenarioConfig, SimError};

const TRAINING_EPISODES: usize = 5;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // -----------------------------------------------------------------------
    // Scenario: JSON file from the first argument, else the reference world
    // -----------------------------------------------------------------------
    let mut scenario_path = None;
    let mut json_out = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json_out = true,
            path => scenario_path = Some(path.to_string()),
        }
    }
    let config = match &scenario_path {
        Some(path) => ScenarioConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => ScenarioConfig::default(),
    };

    let mut env = config.build_environment()?;
    let dt = env.settings().time_step;
    let agent = env.registry().agent().ok_or(SimError::AgentCount(0))?;
    let mut policy = HeadingPolicy::for_boat(agent, dt)?;
    let mut replay = TransitionBuffer::new(100_000);

    // -----------------------------------------------------------------------
    // Training episodes
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  RIVER BOAT NAVIGATION");
    println!("====================================================================");
    println!();
    println!("  {:>4}  {:>9}  {:>8}  {:>8}  {:>9}  {:>7}", "ep", "reward", "min (m)", "t (s)", "outcome", "ticks");
    println!("  {}", "─".repeat(56));

    for episode in 0..TRAINING_EPISODES {
        let s = env.run_simulation(episode, RunMode::Training, &mut policy, &mut replay)?;
        println!(
            "  {:>4}  {:>9.2}  {:>8.2}  {:>8.1}  {:>9}  {:>7}",
            episode,
            s.cumulative_reward,
            s.min_dist,
            s.time,
            format!("{:?}", s.termination).to_lowercase(),
            s.ticks
        );
        if let Some(track) = env.registry().agent().and_then(|b| TrackSummary::from_history(b.history())) {
            log::debug!(
                "track: {:.1} m travelled, max {:.2} m/s, {:.4} kg fuel",
                track.path_length,
                track.max_speed,
                track.fuel_used
            );
        }
    }
    println!();
    println!("  Replay buffer: {} transitions over {} episodes", replay.len(), replay.episodes());

    // -----------------------------------------------------------------------
    // Evaluation set
    // -----------------------------------------------------------------------
    if env.fixture_rows() > 0 {
        let report = env.run_evaluation_set(TRAINING_EPISODES, &mut policy)?;
        println!();
        println!("  Evaluation");
        println!("  ──────────────────────────────────────────────────────────────────");
        println!(
            "  Success: {:>5.1}%   Crash: {:>5.1}%   Mean min dist: {:>7.2} m   Mean t: {:>6.1} s",
            report.success_rate * 100.0,
            report.crash_rate * 100.0,
            report.mean_min_dist,
            report.mean_time
        );
        if json_out {
            println!();
            write_json(&mut std::io::stdout().lock(), &report)?;
        }
    }
    println!("====================================================================");
    println!();
    Ok(())
}
