//! Scenario description: world settings, movers, sensors, reward and action
//! scheme, and the optional evaluation fixture.
//!
//! Every kind is a closed enum, so an unknown mover, sensor, reward or action
//! kind fails when the document is parsed.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::agent::{DirectControl, InstantStep, MultiStep, ProximitySensor, RewardKind};
use crate::dynamics::{Ambient, BoatParams};
use crate::error::{SimError, SimResult};
use crate::sim::Environment;
use crate::vehicle::{MoverRegistry, RiverBoat, StaticCircle};

// ---------------------------------------------------------------------------
// World settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioSettings {
    pub time_step: f64,          // s
    pub max_time: f64,           // s per training episode
    pub domain: f64,             // m, side of the square world
    pub seed: u64,
    pub success_radius: f64,     // m
    pub min_start_distance: f64, // m between boat and destination at reset
    pub wind: Vector2<f64>,      // m/s
    pub current: Vector2<f64>,   // m/s
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            time_step: 0.25,
            max_time: 300.0,
            domain: 200.0,
            seed: 0,
            success_radius: 5.0,
            min_start_distance: 30.0,
            wind: Vector2::zeros(),
            current: Vector2::zeros(),
        }
    }
}

impl ScenarioSettings {
    pub fn ambient(&self) -> Ambient {
        Ambient { wind: self.wind, current: self.current }
    }

    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            ("time_step", self.time_step),
            ("max_time", self.max_time),
            ("domain", self.domain),
            ("success_radius", self.success_radius),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SimError::InvalidScenario(format!("{field} must be positive, got {value}")));
            }
        }
        if !(self.min_start_distance.is_finite() && self.min_start_distance >= 0.0) {
            return Err(SimError::InvalidScenario(format!(
                "min_start_distance must be non-negative, got {}",
                self.min_start_distance
            )));
        }
        if !(self.wind.iter().chain(self.current.iter()).all(|v| v.is_finite())) {
            return Err(SimError::InvalidScenario("wind and current must be finite".into()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Movers and sensors
// ---------------------------------------------------------------------------

/// Normalization constant: a number, or a parameter of the boat itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormConfig {
    Value(f64),
    Derived { derived: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservationConfig {
    pub key: String,
    pub norm: NormConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MoverConfig {
    RiverBoat {
        name: String,
        #[serde(default)]
        params: BoatParams,
        #[serde(default)]
        observation: Vec<ObservationConfig>,
        #[serde(default)]
        is_agent: bool,
    },
    StaticCircle {
        name: String,
        radius: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SensorConfig {
    Proximity {
        name: String,
        install_on: String,
        max_range: f64,
        #[serde(default = "default_field_of_view")]
        max_angle: f64,
        #[serde(default)]
        dist_norm: Option<f64>,
        #[serde(default)]
        angle_norm: Option<f64>,
    },
}

fn default_field_of_view() -> f64 {
    PI
}

// ---------------------------------------------------------------------------
// Reward and action scheme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case", deny_unknown_fields)]
pub enum RewardConfig {
    InstantStep { crash: f64, success: f64 },
    MultiStep { crash: f64, success: f64, agent_step_size: f64 },
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardConfig::InstantStep { crash: -10.0, success: 10.0 }
    }
}

impl RewardConfig {
    pub fn build(&self, settings: &ScenarioSettings) -> RewardKind {
        let dt = settings.time_step;
        let radius = settings.success_radius;
        match *self {
            RewardConfig::InstantStep { crash, success } => {
                RewardKind::InstantStep(InstantStep::new(dt, crash, success, radius))
            }
            RewardConfig::MultiStep { crash, success, agent_step_size } => {
                RewardKind::MultiStep(MultiStep::new(dt, crash, success, radius, agent_step_size))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectControlConfig {
    pub angle_step: f64, // rad per decision at full deflection
    pub power_step: f64, // W per decision at full deflection
    pub hold_ticks: usize,
    pub epsilon: f64,
    pub max_power_reset: bool,
}

impl Default for DirectControlConfig {
    fn default() -> Self {
        Self { angle_step: PI / 16.0, power_step: 950.0, hold_ticks: 1, epsilon: 0.0, max_power_reset: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionConfig {
    Direct(DirectControlConfig),
}

impl Default for ActionConfig {
    fn default() -> Self {
        ActionConfig::Direct(DirectControlConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Evaluation fixture
// ---------------------------------------------------------------------------

/// One evaluation start: destination plus per-mover field overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureRow {
    pub destination: Vector2<f64>,
    #[serde(default)]
    pub movers: BTreeMap<String, BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationFixture {
    pub rows: Vec<FixtureRow>,
}

// ---------------------------------------------------------------------------
// Whole scenario
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    pub scenario: ScenarioSettings,
    pub movers: Vec<MoverConfig>,
    pub sensors: Vec<SensorConfig>,
    pub reward: RewardConfig,
    pub action: ActionConfig,
    pub evaluation: Option<EvaluationFixture>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        presets::reference()
    }
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolve every kind and build a ready-to-run environment.
    pub fn build_environment(&self) -> SimResult<Environment> {
        self.scenario.validate()?;
        let registry = self.build_registry()?;
        let reward = self.reward.build(&self.scenario);
        let action = match &self.action {
            ActionConfig::Direct(c) => DirectControl::new(c.angle_step, c.power_step)
                .hold_ticks(c.hold_ticks)
                .exploration(c.epsilon, self.scenario.seed)
                .max_power_reset(c.max_power_reset),
        };

        let env = Environment::new(self.scenario.clone(), registry, reward, Box::new(action))?;
        match &self.evaluation {
            Some(fixture) => env.with_fixture(fixture.clone()),
            None => Ok(env),
        }
    }

    fn build_registry(&self) -> SimResult<MoverRegistry> {
        let mut registry = MoverRegistry::new();
        for mover in &self.movers {
            match mover {
                MoverConfig::RiverBoat { name, params, observation, is_agent } => {
                    let mut boat = RiverBoat::new(name.clone(), params.clone())?;
                    boat.is_agent = *is_agent;
                    for entry in observation {
                        let norm = match &entry.norm {
                            NormConfig::Value(v) => *v,
                            NormConfig::Derived { derived } => boat.state_value(derived)?,
                        };
                        boat.observe(entry.key.clone(), norm)?;
                    }
                    registry.add(boat)?;
                }
                MoverConfig::StaticCircle { name, radius } => {
                    registry.add(StaticCircle::new(name.clone(), *radius)?)?;
                }
            }
        }

        for sensor in &self.sensors {
            match sensor {
                SensorConfig::Proximity { name, install_on, max_range, max_angle, dist_norm, angle_norm } => {
                    let built = ProximitySensor::new(name.clone(), install_on.clone(), *max_range)?
                        .field_of_view(*max_angle)
                        .normalization(dist_norm.unwrap_or(*max_range), angle_norm.unwrap_or(PI))?;
                    registry
                        .boat_mut(install_on)
                        .ok_or_else(|| SimError::UnknownMover(install_on.clone()))?
                        .add_sensor(Box::new(built));
                }
            }
        }
        Ok(registry)
    }
}

// ---------------------------------------------------------------------------
// Preset scenarios
// ---------------------------------------------------------------------------

pub mod presets {
    use super::*;

    fn observation(key: &str, norm: NormConfig) -> ObservationConfig {
        ObservationConfig { key: key.into(), norm }
    }

    fn agent_boat(name: &str, domain: f64) -> MoverConfig {
        MoverConfig::RiverBoat {
            name: name.into(),
            params: BoatParams::default(),
            observation: vec![
                observation("v_xp", NormConfig::Value(5.0)),
                observation("v_yp", NormConfig::Value(2.0)),
                observation("psi_dot", NormConfig::Value(0.5)),
                observation("mu", NormConfig::Value(PI)),
                observation("dest_dist", NormConfig::Value(domain)),
                observation("delta", NormConfig::Derived { derived: "delta_max".into() }),
                observation("power", NormConfig::Derived { derived: "power_max".into() }),
            ],
            is_agent: true,
        }
    }

    /// Reference boat on a 200 m square with three 5 m rocks.
    pub fn reference() -> ScenarioConfig {
        let settings = ScenarioSettings::default();
        let mut movers = vec![agent_boat("river_boat_0", settings.domain)];
        movers.extend(
            (0..3).map(|i| MoverConfig::StaticCircle { name: format!("static_circle_{i}"), radius: 5.0 }),
        );

        let row = |dest: (f64, f64), boat: [(&str, f64); 3], rocks: [(f64, f64); 3]| {
            let mut movers = BTreeMap::new();
            movers.insert(
                "river_boat_0".to_string(),
                boat.iter().map(|&(k, v)| (k.to_string(), v)).collect(),
            );
            for (i, (x, y)) in rocks.iter().enumerate() {
                movers.insert(
                    format!("static_circle_{i}"),
                    BTreeMap::from([("x_pos".to_string(), *x), ("y_pos".to_string(), *y)]),
                );
            }
            FixtureRow { destination: Vector2::new(dest.0, dest.1), movers }
        };

        ScenarioConfig {
            scenario: settings,
            movers,
            sensors: vec![SensorConfig::Proximity {
                name: "river_boat_0_prox".into(),
                install_on: "river_boat_0".into(),
                max_range: 50.0,
                max_angle: FRAC_PI_2,
                dist_norm: None,
                angle_norm: None,
            }],
            reward: RewardConfig::default(),
            action: ActionConfig::default(),
            evaluation: Some(EvaluationFixture {
                rows: vec![
                    row(
                        (150.0, 100.0),
                        [("x_pos", 50.0), ("y_pos", 100.0), ("psi", 0.0)],
                        [(100.0, 40.0), (100.0, 160.0), (30.0, 30.0)],
                    ),
                    row(
                        (40.0, 160.0),
                        [("x_pos", 160.0), ("y_pos", 40.0), ("psi", 2.3)],
                        [(180.0, 180.0), (20.0, 20.0), (160.0, 120.0)],
                    ),
                ],
            }),
        }
    }

    /// One agent boat, no obstacles, no sensors.
    pub fn open_water() -> ScenarioConfig {
        let settings = ScenarioSettings::default();
        ScenarioConfig {
            movers: vec![agent_boat("river_boat_0", settings.domain)],
            sensors: vec![],
            evaluation: None,
            scenario: settings,
            ..reference()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scenario_builds() {
        let cfg = ScenarioConfig::default();
        let env = cfg.build_environment().unwrap();
        assert_eq!(env.registry().len(), 4);
        assert_eq!(env.registry().agent().unwrap().observation_size(), 9);
        assert_eq!(env.fixture_rows(), 2);
    }

    #[test]
    fn json_round_trip_preserves_scenario() {
        let cfg = ScenarioConfig::default();
        let json = cfg.to_json_string().unwrap();
        assert_eq!(ScenarioConfig::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn partial_document_uses_defaults() {
        let cfg = ScenarioConfig::from_json_str(
            r#"{
                "scenario": { "time_step": 0.1, "seed": 7 },
                "movers": [
                    { "kind": "river_boat", "name": "b", "is_agent": true,
                      "params": { "mass": 4000.0 },
                      "observation": [ { "key": "power", "norm": { "derived": "power_max" } } ] }
                ],
                "reward": { "name": "multi_step", "crash": -5.0, "success": 5.0, "agent_step_size": 1.0 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.scenario.time_step, 0.1);
        assert_eq!(cfg.scenario.domain, 200.0);
        assert!(cfg.sensors.is_empty());
        let env = cfg.build_environment().unwrap();
        let boat = env.registry().agent().unwrap();
        assert_eq!(boat.params.mass, 4000.0);
        assert_eq!(boat.observation_entries()[0].norm, 9500.0);
    }

    #[test]
    fn unknown_kinds_are_rejected_at_parse_time() {
        let bad_mover = r#"{ "movers": [ { "kind": "submarine", "name": "s" } ] }"#;
        assert!(matches!(ScenarioConfig::from_json_str(bad_mover), Err(SimError::Config(_))));
        let bad_reward = r#"{ "reward": { "name": "vibes", "crash": 1.0, "success": 1.0 } }"#;
        assert!(ScenarioConfig::from_json_str(bad_reward).is_err());
        let bad_param = r#"{ "movers": [ { "kind": "river_boat", "name": "b", "params": { "sails": 2 } } ] }"#;
        assert!(ScenarioConfig::from_json_str(bad_param).is_err());
    }

    #[test]
    fn sensor_on_missing_mover_fails() {
        let mut cfg = presets::open_water();
        cfg.sensors.push(SensorConfig::Proximity {
            name: "p".into(),
            install_on: "ghost".into(),
            max_range: 10.0,
            max_angle: PI,
            dist_norm: None,
            angle_norm: None,
        });
        assert!(matches!(cfg.build_environment(), Err(SimError::UnknownMover(_))));
    }

    #[test]
    fn agent_count_is_enforced() {
        let mut cfg = presets::open_water();
        if let MoverConfig::RiverBoat { is_agent, .. } = &mut cfg.movers[0] {
            *is_agent = false;
        }
        assert!(matches!(cfg.build_environment(), Err(SimError::AgentCount(0))));
    }

    #[test]
    fn bad_time_step_is_rejected() {
        let mut cfg = presets::open_water();
        cfg.scenario.time_step = 0.0;
        assert!(matches!(cfg.build_environment(), Err(SimError::InvalidScenario(_))));
    }
}
