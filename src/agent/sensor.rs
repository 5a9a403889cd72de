use std::f64::consts::PI;
use std::fmt;

use crate::dynamics::relative_bearing;
use crate::error::{SimError, SimResult};
use crate::vehicle::MoverRegistry;

/// A measurement device installed on a boat.
///
/// Sensors are updated in installation order after every reset and twice per
/// tick (before the decision and after integration).
pub trait Sensor: fmt::Debug {
    fn name(&self) -> &str;

    /// Name of the mover the sensor is installed on.
    fn owner(&self) -> &str;

    /// Sample the world. The owner is looked up in `registry`.
    fn update(&mut self, registry: &MoverRegistry) -> SimResult<()>;

    /// Readings in physical units, keyed `<sensor>_<quantity>`.
    fn raw_measurements(&self) -> Vec<(String, f64)>;

    /// Readings divided by their normalization constants, same keys and order.
    fn normalized_measurements(&self) -> Vec<(String, f64)>;

    fn measurement_count(&self) -> usize {
        self.raw_measurements().len()
    }

    /// Range reading used for crash detection, if this sensor measures one.
    fn distance(&self) -> Option<f64> {
        None
    }
}

pub(crate) fn check_norm(key: &str, value: f64) -> SimResult<f64> {
    if value.is_finite() && value != 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidNormalization { key: key.to_string(), value })
    }
}

// ---------------------------------------------------------------------------
// Nearest-obstacle proximity sensor
// ---------------------------------------------------------------------------

/// Reports the nearest static obstacle inside a range and field of view.
///
/// `<name>_dist` is the centre-to-centre distance, or `max_range` when
/// nothing is in view. `<name>_angle` is the obstacle's bearing relative to
/// the owner's heading, zero when nothing is in view.
#[derive(Debug, Clone)]
pub struct ProximitySensor {
    name: String,
    owner: String,
    max_range: f64, // m
    max_angle: f64, // rad half-width of the field of view
    dist_norm: f64,
    angle_norm: f64,
    dist: f64,
    angle: f64,
}

impl ProximitySensor {
    pub fn new(name: impl Into<String>, owner: impl Into<String>, max_range: f64) -> SimResult<Self> {
        let name = name.into();
        if !(max_range.is_finite() && max_range > 0.0) {
            return Err(SimError::InvalidMover {
                name: name.clone(),
                reason: format!("sensor range must be positive, got {max_range}"),
            });
        }
        Ok(Self {
            name,
            owner: owner.into(),
            max_range,
            max_angle: PI,
            dist_norm: max_range,
            angle_norm: PI,
            dist: max_range,
            angle: 0.0,
        })
    }

    pub fn field_of_view(mut self, max_angle: f64) -> Self {
        self.max_angle = max_angle.abs();
        self
    }

    pub fn normalization(mut self, dist_norm: f64, angle_norm: f64) -> SimResult<Self> {
        self.dist_norm = check_norm(&format!("{}_dist", self.name), dist_norm)?;
        self.angle_norm = check_norm(&format!("{}_angle", self.name), angle_norm)?;
        Ok(self)
    }
}

impl Sensor for ProximitySensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn update(&mut self, registry: &MoverRegistry) -> SimResult<()> {
        let owner = registry
            .boat(&self.owner)
            .ok_or_else(|| SimError::UnknownMover(self.owner.clone()))?;
        let origin = owner.state.pos;
        let heading = owner.state.psi;

        let mut best: Option<(f64, f64)> = None;
        for obstacle in registry.obstacles() {
            let offset = obstacle.pos - origin;
            let dist = offset.norm();
            let bearing = relative_bearing(offset.y.atan2(offset.x), heading);
            if dist > self.max_range || bearing.abs() > self.max_angle {
                continue;
            }
            if best.map_or(true, |(d, _)| dist < d) {
                best = Some((dist, bearing));
            }
        }

        (self.dist, self.angle) = best.unwrap_or((self.max_range, 0.0));
        Ok(())
    }

    fn raw_measurements(&self) -> Vec<(String, f64)> {
        vec![
            (format!("{}_dist", self.name), self.dist),
            (format!("{}_angle", self.name), self.angle),
        ]
    }

    fn normalized_measurements(&self) -> Vec<(String, f64)> {
        vec![
            (format!("{}_dist", self.name), self.dist / self.dist_norm),
            (format!("{}_angle", self.name), self.angle / self.angle_norm),
        ]
    }

    fn measurement_count(&self) -> usize {
        2
    }

    fn distance(&self) -> Option<f64> {
        Some(self.dist)
    }
}
