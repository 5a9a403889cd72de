use std::collections::HashMap;

use nalgebra::Vector2;

use super::boat::RiverBoat;
use super::obstacle::StaticCircle;
use crate::dynamics::Ambient;
use crate::error::{SimError, SimResult};

// ---------------------------------------------------------------------------
// Mover kinds
// ---------------------------------------------------------------------------

/// The closed set of things that live in the world.
#[derive(Debug)]
pub enum Mover {
    Boat(RiverBoat),
    Obstacle(StaticCircle),
}

impl Mover {
    pub fn name(&self) -> &str {
        match self {
            Mover::Boat(b) => &b.name,
            Mover::Obstacle(o) => &o.name,
        }
    }

    pub fn position(&self) -> Vector2<f64> {
        match self {
            Mover::Boat(b) => b.state.pos,
            Mover::Obstacle(o) => o.pos,
        }
    }

    /// Advance by one tick. Obstacles do not move.
    pub fn step(&mut self, ambient: &Ambient, dt: f64, time: f64) -> SimResult<()> {
        match self {
            Mover::Boat(b) => b.step(ambient, dt, time),
            Mover::Obstacle(_) => Ok(()),
        }
    }

    pub fn derived_measurements(&mut self, destination: &Vector2<f64>) {
        if let Mover::Boat(b) = self {
            b.derived_measurements(destination);
        }
    }

    pub fn reset_history(&mut self, capacity: usize) {
        match self {
            Mover::Boat(b) => b.reset_history(capacity),
            Mover::Obstacle(o) => o.reset_history(capacity),
        }
    }

    pub fn add_step_history(&mut self) {
        match self {
            Mover::Boat(b) => b.add_step_history(),
            Mover::Obstacle(o) => o.add_step_history(),
        }
    }

    pub fn trim_history(&mut self) {
        match self {
            Mover::Boat(b) => b.trim_history(),
            Mover::Obstacle(o) => o.trim_history(),
        }
    }

    pub fn state_value(&self, key: &str) -> SimResult<f64> {
        match self {
            Mover::Boat(b) => b.state_value(key),
            Mover::Obstacle(o) => o.state_value(key),
        }
    }

    pub fn set_state_value(&mut self, key: &str, value: f64) -> SimResult<()> {
        match self {
            Mover::Boat(b) => b.set_state_value(key, value),
            Mover::Obstacle(o) => o.set_state_value(key, value),
        }
    }

    pub fn as_boat(&self) -> Option<&RiverBoat> {
        match self {
            Mover::Boat(b) => Some(b),
            Mover::Obstacle(_) => None,
        }
    }

    pub fn as_boat_mut(&mut self) -> Option<&mut RiverBoat> {
        match self {
            Mover::Boat(b) => Some(b),
            Mover::Obstacle(_) => None,
        }
    }

    pub fn as_obstacle(&self) -> Option<&StaticCircle> {
        match self {
            Mover::Obstacle(o) => Some(o),
            Mover::Boat(_) => None,
        }
    }
}

impl From<RiverBoat> for Mover {
    fn from(b: RiverBoat) -> Self {
        Mover::Boat(b)
    }
}

impl From<StaticCircle> for Mover {
    fn from(o: StaticCircle) -> Self {
        Mover::Obstacle(o)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Movers in insertion order with lookup by name.
///
/// Sensing, stepping and reward evaluation all walk the movers in the order
/// they were added, which keeps episodes reproducible.
#[derive(Debug, Default)]
pub struct MoverRegistry {
    movers: Vec<Mover>,
    index: HashMap<String, usize>,
}

impl MoverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mover: impl Into<Mover>) -> SimResult<()> {
        let mover = mover.into();
        let name = mover.name().to_string();
        if name.trim().is_empty() {
            return Err(SimError::InvalidMover { name, reason: "name must not be empty".into() });
        }
        if self.index.contains_key(&name) {
            return Err(SimError::DuplicateMover(name));
        }
        log::debug!("registered mover '{}'", name);
        self.index.insert(name, self.movers.len());
        self.movers.push(mover);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.movers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mover> {
        self.movers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Mover> {
        self.movers.iter_mut()
    }

    pub fn get(&self, name: &str) -> Option<&Mover> {
        self.index.get(name).map(|&i| &self.movers[i])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Mover> {
        self.index.get(name).map(|&i| &mut self.movers[i])
    }

    pub fn try_get_mut(&mut self, name: &str) -> SimResult<&mut Mover> {
        self.get_mut(name).ok_or_else(|| SimError::UnknownMover(name.to_string()))
    }

    pub fn boat(&self, name: &str) -> Option<&RiverBoat> {
        self.get(name).and_then(Mover::as_boat)
    }

    pub fn boat_mut(&mut self, name: &str) -> Option<&mut RiverBoat> {
        self.get_mut(name).and_then(Mover::as_boat_mut)
    }

    pub fn boats(&self) -> impl Iterator<Item = &RiverBoat> {
        self.movers.iter().filter_map(Mover::as_boat)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &StaticCircle> {
        self.movers.iter().filter_map(Mover::as_obstacle)
    }

    /// The single learning boat, if one is registered.
    pub fn agent(&self) -> Option<&RiverBoat> {
        self.boats().find(|b| b.is_agent)
    }

    pub fn agent_mut(&mut self) -> Option<&mut RiverBoat> {
        self.movers.iter_mut().filter_map(Mover::as_boat_mut).find(|b| b.is_agent)
    }

    pub fn agent_count(&self) -> usize {
        self.boats().filter(|b| b.is_agent).count()
    }

    /// Update every boat's sensors against the current world, then the
    /// derived navigation measurements against `destination`.
    pub fn update_measurements(&mut self, destination: &Vector2<f64>) -> SimResult<()> {
        for i in 0..self.movers.len() {
            let mut sensors = match &mut self.movers[i] {
                Mover::Boat(b) => b.take_sensors(),
                Mover::Obstacle(_) => continue,
            };
            let result = {
                let registry: &MoverRegistry = self;
                sensors.iter_mut().try_for_each(|s| s.update(registry))
            };
            if let Mover::Boat(b) = &mut self.movers[i] {
                b.restore_sensors(sensors);
            }
            result?;
        }
        for mover in &mut self.movers {
            mover.derived_measurements(destination);
        }
        Ok(())
    }

    pub fn step_all(&mut self, ambient: &Ambient, dt: f64, time: f64) -> SimResult<()> {
        self.movers.iter_mut().try_for_each(|m| m.step(ambient, dt, time))
    }

    pub fn reset_histories(&mut self, capacity: usize) {
        self.movers.iter_mut().for_each(|m| m.reset_history(capacity));
    }

    pub fn add_step_histories(&mut self) {
        self.movers.iter_mut().for_each(Mover::add_step_history);
    }

    pub fn trim_histories(&mut self) {
        self.movers.iter_mut().for_each(Mover::trim_history);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::sensor::{ProximitySensor, Sensor};
    use crate::dynamics::BoatParams;

    fn boat(name: &str) -> RiverBoat {
        RiverBoat::new(name, BoatParams::default()).unwrap()
    }

    #[test]
    fn keeps_insertion_order() {
        let mut reg = MoverRegistry::new();
        reg.add(StaticCircle::new("c", 1.0).unwrap()).unwrap();
        reg.add(boat("a")).unwrap();
        reg.add(StaticCircle::new("b", 1.0).unwrap()).unwrap();
        let names: Vec<_> = reg.iter().map(Mover::name).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(reg.obstacles().count(), 2);
    }

    #[test]
    fn rejects_duplicates() {
        let mut reg = MoverRegistry::new();
        reg.add(boat("a")).unwrap();
        assert!(matches!(reg.add(StaticCircle::new("a", 1.0).unwrap()), Err(SimError::DuplicateMover(_))));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rejects_empty_name() {
        let mut reg = MoverRegistry::new();
        assert!(matches!(reg.add(boat(" ")), Err(SimError::InvalidMover { .. })));
    }

    #[test]
    fn lookup_by_name() {
        let mut reg = MoverRegistry::new();
        reg.add(boat("a")).unwrap();
        reg.add(StaticCircle::new("rock", 2.0).unwrap().at(3.0, 4.0)).unwrap();
        assert!(reg.boat("a").is_some());
        assert!(reg.boat("rock").is_none());
        assert_eq!(reg.get("rock").unwrap().position(), Vector2::new(3.0, 4.0));
        assert!(reg.try_get_mut("ghost").is_err());
    }

    #[test]
    fn obstacles_do_not_move() {
        let mut reg = MoverRegistry::new();
        reg.add(StaticCircle::new("rock", 2.0).unwrap().at(3.0, 4.0)).unwrap();
        reg.step_all(&Ambient::default(), 0.25, 0.0).unwrap();
        assert_eq!(reg.get("rock").unwrap().position(), Vector2::new(3.0, 4.0));
    }

    #[test]
    fn measurements_update_sensors_and_navigation() {
        let mut reg = MoverRegistry::new();
        let mut b = boat("a");
        b.add_sensor(Box::new(ProximitySensor::new("prox", "a", 50.0).unwrap()));
        reg.add(b).unwrap();
        reg.add(StaticCircle::new("rock", 2.0).unwrap().at(0.0, 8.0)).unwrap();

        reg.update_measurements(&Vector2::new(30.0, 40.0)).unwrap();
        let a = reg.boat("a").unwrap();
        assert_eq!(a.sensors().len(), 1);
        assert_eq!(a.sensors()[0].distance(), Some(8.0));
        assert!((a.state.dest_dist - 50.0).abs() < 1e-12);
        assert_eq!(a.min_sensor_distance(), Some(8.0));
    }

    #[test]
    fn failing_sensor_is_restored() {
        let mut reg = MoverRegistry::new();
        let mut b = boat("a");
        b.add_sensor(Box::new(ProximitySensor::new("prox", "nobody", 50.0).unwrap()));
        reg.add(b).unwrap();
        assert!(reg.update_measurements(&Vector2::zeros()).is_err());
        assert_eq!(reg.boat("a").unwrap().sensors().len(), 1);
    }
}
