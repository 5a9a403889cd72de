use nalgebra::Vector2;

use crate::error::{SimError, SimResult};

// ---------------------------------------------------------------------------
// Static circular obstacle
// ---------------------------------------------------------------------------

/// A circle that never moves. It takes part in resets, sensing and crash
/// checks like any other mover.
#[derive(Debug, Clone)]
pub struct StaticCircle {
    pub name: String,
    pub pos: Vector2<f64>, // m, global frame
    pub radius: f64,       // m
    history: Vec<Vector2<f64>>,
}

impl StaticCircle {
    pub fn new(name: impl Into<String>, radius: f64) -> SimResult<Self> {
        let name = name.into();
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimError::InvalidMover {
                name,
                reason: format!("radius must be positive, got {radius}"),
            });
        }
        Ok(Self { name, pos: Vector2::zeros(), radius, history: Vec::new() })
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.pos = Vector2::new(x, y);
        self
    }

    pub fn state_value(&self, key: &str) -> SimResult<f64> {
        match key {
            "x_pos" => Ok(self.pos.x),
            "y_pos" => Ok(self.pos.y),
            "radius" => Ok(self.radius),
            _ => Err(SimError::UnknownStateKey { mover: self.name.clone(), key: key.to_string() }),
        }
    }

    pub fn set_state_value(&mut self, key: &str, value: f64) -> SimResult<()> {
        match key {
            "x_pos" => self.pos.x = value,
            "y_pos" => self.pos.y = value,
            "radius" if value.is_finite() && value > 0.0 => self.radius = value,
            "radius" => {
                return Err(SimError::InvalidMover {
                    name: self.name.clone(),
                    reason: format!("radius must be positive, got {value}"),
                })
            }
            _ => {
                return Err(SimError::UnknownStateKey {
                    mover: self.name.clone(),
                    key: key.to_string(),
                })
            }
        }
        Ok(())
    }

    /// Distance from `point` to the circle's centre.
    pub fn distance_to(&self, point: &Vector2<f64>) -> f64 {
        (self.pos - point).norm()
    }

    pub fn reset_history(&mut self, capacity: usize) {
        self.history = Vec::with_capacity(capacity);
    }

    pub fn add_step_history(&mut self) {
        self.history.push(self.pos);
    }

    pub fn trim_history(&mut self) {
        self.history.shrink_to_fit();
    }

    pub fn history(&self) -> &[Vector2<f64>] {
        &self.history
    }
}
