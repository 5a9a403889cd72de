use std::io::{self, Write};

use serde::Serialize;

use crate::vehicle::BoatSnapshot;

/// Summary statistics computed from a boat's telemetry history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackSummary {
    pub duration: f64,      // s
    pub path_length: f64,   // m
    pub max_speed: f64,     // m/s
    pub max_yaw_rate: f64,  // rad/s
    pub fuel_used: f64,     // kg
    pub final_dist: f64,    // m to the destination
    pub min_dist: f64,      // m
}

impl TrackSummary {
    /// `None` for an empty history.
    pub fn from_history(history: &[BoatSnapshot]) -> Option<Self> {
        let first = history.first()?;
        let last = history.last()?;

        let path_length = history
            .windows(2)
            .map(|w| (w[1].state.pos - w[0].state.pos).norm())
            .sum();
        let max_speed = history.iter().map(|h| h.state.vel.norm()).fold(0.0_f64, f64::max);
        let max_yaw_rate = history.iter().map(|h| h.state.psi_dot.abs()).fold(0.0_f64, f64::max);
        let min_dist = history.iter().map(|h| h.state.dest_dist).fold(f64::INFINITY, f64::min);

        Some(TrackSummary {
            duration: last.time - first.time,
            path_length,
            max_speed,
            max_yaw_rate,
            fuel_used: first.state.fuel - last.state.fuel,
            final_dist: last.state.dest_dist,
            min_dist,
        })
    }
}

/// Write any serializable record (episode summary, evaluation report,
/// track summary, scenario) as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value)?;
    writeln!(writer)
}
