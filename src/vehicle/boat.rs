use nalgebra::Vector2;
use serde::Serialize;

use crate::agent::sensor::{check_norm, Sensor};
use crate::dynamics::{wrap_angle, Ambient, BoatParams, BoatState, ForceMoments, RelativeFlow};
use crate::error::{SimError, SimResult};
use crate::sim::integrator::{step_boat, StepTelemetry};

// ---------------------------------------------------------------------------
// River boat
// ---------------------------------------------------------------------------

/// One observed quantity and the constant it is divided by.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationEntry {
    pub key: String,
    pub norm: f64,
}

/// Per-tick telemetry of a boat.
#[derive(Debug, Clone, Serialize)]
pub struct BoatSnapshot {
    pub time: f64,
    pub state: BoatState,
    pub forces: ForceMoments,
    pub flow: RelativeFlow,
    pub sensors: Vec<(String, f64)>,
}

/// A powered boat: fixed parameters, mutable state, its sensors and, when it
/// is the learning agent, the observation layout handed to the policy.
#[derive(Debug)]
pub struct RiverBoat {
    pub name: String,
    pub params: BoatParams,
    pub state: BoatState,
    pub is_agent: bool,
    observation: Vec<ObservationEntry>,
    sensors: Vec<Box<dyn Sensor>>,
    last_step: StepTelemetry,
    history: Vec<BoatSnapshot>,
}

impl RiverBoat {
    pub fn new(name: impl Into<String>, params: BoatParams) -> SimResult<Self> {
        let name = name.into();
        params.validate(&name)?;
        let state = BoatState::initial(&params);
        Ok(Self {
            name,
            params,
            state,
            is_agent: false,
            observation: Vec::new(),
            sensors: Vec::new(),
            last_step: StepTelemetry::default(),
            history: Vec::new(),
        })
    }

    /// Wipe the state back to what the parameters describe.
    pub fn reinitialize(&mut self) {
        self.state = BoatState::initial(&self.params);
        self.last_step = StepTelemetry::default();
    }

    /// Saturate and store the actuator settings. Never fails.
    pub fn set_control(&mut self, power: f64, delta: f64) {
        self.state.power = power.clamp(0.0, self.params.power_max);
        self.state.delta = delta.clamp(self.params.delta_min, self.params.delta_max);
    }

    pub fn step(&mut self, ambient: &Ambient, dt: f64, time: f64) -> SimResult<()> {
        self.last_step = step_boat(&self.name, &self.params, &mut self.state, ambient, dt, time)?;
        Ok(())
    }

    pub fn derived_measurements(&mut self, destination: &Vector2<f64>) {
        self.state.update_navigation(destination);
    }

    pub fn last_forces(&self) -> &ForceMoments {
        &self.last_step.forces
    }

    // -- keyed access -------------------------------------------------------

    /// Read any state, telemetry or parameter field by name.
    pub fn state_value(&self, key: &str) -> SimResult<f64> {
        let s = &self.state;
        let p = &self.params;
        let f = &self.last_step.forces;
        let flow = &self.last_step.flow;
        let value = match key {
            "time" => s.time,
            "x_pos" => s.pos.x,
            "y_pos" => s.pos.y,
            "psi" => s.psi,
            "v_xp" => s.vel_local.x,
            "v_yp" => s.vel_local.y,
            "v_x" => s.vel.x,
            "v_y" => s.vel.y,
            "psi_dot" => s.psi_dot,
            "psi_double_dot" => s.psi_ddot,
            "acc_xp" => s.acc_local.x,
            "acc_yp" => s.acc_local.y,
            "acc_x" => s.acc.x,
            "acc_y" => s.acc.y,
            "power" => s.power,
            "delta" => s.delta,
            "thrust" => s.thrust,
            "alpha" => s.alpha,
            "fuel" => s.fuel,
            "dest_dist" => s.dest_dist,
            "theta" => s.theta,
            "mu" => s.mu,
            "psi_eff_air" => flow.phi_air,
            "psi_eff_water" => flow.phi_water,
            "v_x_eff_air" => flow.air_local.x,
            "v_y_eff_air" => flow.air_local.y,
            "v_x_eff_water" => flow.water_local.x,
            "v_y_eff_water" => flow.water_local.y,
            "f_d_air" => f.f_d_air,
            "f_s_air" => f.f_s_air,
            "m_air" => f.m_air,
            "f_d_water" => f.f_d_water,
            "f_s_water" => f.f_s_water,
            "m_water" => f.m_water,
            "fx_p" => f.fx_p,
            "fy_p" => f.fy_p,
            "my_p" => f.my_p,
            "mr" => f.mr,
            "prop_area" => p.prop_area(),
            _ => return self.param_value(key),
        };
        Ok(value)
    }

    fn param_value(&self, key: &str) -> SimResult<f64> {
        let p = &self.params;
        let value = match key {
            "area_air" => p.area_air,
            "area_water" => p.area_water,
            "bsfc" => p.bsfc,
            "delta_min" => p.delta_min,
            "delta_max" => p.delta_max,
            "density_air" => p.density_air,
            "density_water" => p.density_water,
            "fom" => p.fom,
            "fuel_capacity" => p.fuel_capacity,
            "hull_length" => p.hull_length,
            "hull_width" => p.hull_width,
            "mass" => p.mass,
            "moi" => p.moi,
            "power_max" => p.power_max,
            "prop_diam" => p.prop_diam,
            _ => return Err(self.unknown(key)),
        };
        Ok(value)
    }

    /// Overwrite a state field or a parameter. Derived quantities are
    /// rejected; the global velocity follows the local one and the heading.
    pub fn set_state_value(&mut self, key: &str, value: f64) -> SimResult<()> {
        let s = &mut self.state;
        match key {
            "x_pos" => s.pos.x = value,
            "y_pos" => s.pos.y = value,
            "psi" => s.psi = wrap_angle(value),
            "v_xp" => s.vel_local.x = value,
            "v_yp" => s.vel_local.y = value,
            "psi_dot" => s.psi_dot = value,
            "power" => s.power = value,
            "delta" => s.delta = value,
            "thrust" => s.thrust = value,
            "alpha" => s.alpha = value,
            "fuel" => s.fuel = value.min(self.params.fuel_capacity).max(0.0),
            _ => return self.set_param_value(key, value),
        }
        self.state.sync_global_velocity();
        Ok(())
    }

    fn set_param_value(&mut self, key: &str, value: f64) -> SimResult<()> {
        let mut p = self.params.clone();
        match key {
            "area_air" => p.area_air = value,
            "area_water" => p.area_water = value,
            "bsfc" => p.bsfc = value,
            "delta_min" => p.delta_min = value,
            "delta_max" => p.delta_max = value,
            "density_air" => p.density_air = value,
            "density_water" => p.density_water = value,
            "fom" => p.fom = value,
            "fuel_capacity" => p.fuel_capacity = value,
            "hull_length" => p.hull_length = value,
            "hull_width" => p.hull_width = value,
            "mass" => p.mass = value,
            "moi" => p.moi = value,
            "power_max" => p.power_max = value,
            "prop_diam" => p.prop_diam = value,
            _ if self.state_value(key).is_ok() => {
                return Err(SimError::ReadOnlyStateKey { mover: self.name.clone(), key: key.to_string() })
            }
            _ => return Err(self.unknown(key)),
        }
        p.validate(&self.name)?;
        self.params = p;
        Ok(())
    }

    fn unknown(&self, key: &str) -> SimError {
        SimError::UnknownStateKey { mover: self.name.clone(), key: key.to_string() }
    }

    // -- observation ----------------------------------------------------------

    /// Append `key / norm` to the observation vector.
    pub fn observe(&mut self, key: impl Into<String>, norm: f64) -> SimResult<()> {
        let key = key.into();
        self.state_value(&key)?;
        let norm = check_norm(&key, norm)?;
        self.observation.push(ObservationEntry { key, norm });
        Ok(())
    }

    pub fn observation_entries(&self) -> &[ObservationEntry] {
        &self.observation
    }

    /// Normalized state entries followed by every sensor's normalized readings.
    pub fn observation(&self) -> SimResult<Vec<f64>> {
        let mut obs = Vec::with_capacity(self.observation_size());
        for entry in &self.observation {
            obs.push(self.state_value(&entry.key)? / entry.norm);
        }
        for sensor in &self.sensors {
            obs.extend(sensor.normalized_measurements().into_iter().map(|(_, v)| v));
        }
        Ok(obs)
    }

    pub fn observation_size(&self) -> usize {
        self.observation.len() + self.sensors.iter().map(|s| s.measurement_count()).sum::<usize>()
    }

    // -- sensors ----------------------------------------------------------------

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn sensors(&self) -> &[Box<dyn Sensor>] {
        &self.sensors
    }

    pub(crate) fn take_sensors(&mut self) -> Vec<Box<dyn Sensor>> {
        std::mem::take(&mut self.sensors)
    }

    pub(crate) fn restore_sensors(&mut self, sensors: Vec<Box<dyn Sensor>>) {
        self.sensors = sensors;
    }

    /// Smallest range reading over all sensors, `None` without range sensors.
    pub fn min_sensor_distance(&self) -> Option<f64> {
        self.sensors.iter().filter_map(|s| s.distance()).reduce(f64::min)
    }

    // -- history ------------------------------------------------------------------

    pub fn reset_history(&mut self, capacity: usize) {
        self.history = Vec::with_capacity(capacity);
    }

    pub fn add_step_history(&mut self) {
        let sensors = self.sensors.iter().flat_map(|s| s.raw_measurements()).collect();
        self.history.push(BoatSnapshot {
            time: self.state.time,
            state: self.state.clone(),
            forces: self.last_step.forces,
            flow: self.last_step.flow,
            sensors,
        });
    }

    pub fn trim_history(&mut self) {
        self.history.shrink_to_fit();
    }

    pub fn history(&self) -> &[BoatSnapshot] {
        &self.history
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct RiverBoatBuilder {
    name: String,
    params: BoatParams,
    observation: Vec<(String, f64)>,
    is_agent: bool,
}

impl RiverBoatBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), params: BoatParams::default(), observation: vec![], is_agent: false }
    }

    pub fn params(mut self, p: BoatParams) -> Self { self.params = p; self }
    pub fn mass(mut self, v: f64) -> Self { self.params.mass = v; self }
    pub fn moi(mut self, v: f64) -> Self { self.params.moi = v; self }
    pub fn hull_length(mut self, v: f64) -> Self { self.params.hull_length = v; self }
    pub fn power_max(mut self, v: f64) -> Self { self.params.power_max = v; self }
    pub fn prop_diam(mut self, v: f64) -> Self { self.params.prop_diam = v; self }
    pub fn fuel_capacity(mut self, v: f64) -> Self { self.params.fuel_capacity = v; self }
    pub fn angle_limits(mut self, min: f64, max: f64) -> Self { self.params.delta_min = min; self.params.delta_max = max; self }
    pub fn observe(mut self, key: impl Into<String>, norm: f64) -> Self { self.observation.push((key.into(), norm)); self }
    pub fn agent(mut self) -> Self { self.is_agent = true; self }

    pub fn build(self) -> SimResult<RiverBoat> {
        let mut boat = RiverBoat::new(self.name, self.params)?;
        boat.is_agent = self.is_agent;
        for (key, norm) in self.observation {
            boat.observe(key, norm)?;
        }
        Ok(boat)
    }
}
