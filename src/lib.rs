//! Planar powered-boat dynamics and the episode loop that trains and
//! evaluates a navigation agent against it.

pub mod agent;
pub mod config;
pub mod control;
pub mod dynamics;
pub mod error;
pub mod io;
pub mod physics;
pub mod sim;
pub mod vehicle;

pub use config::ScenarioConfig;
pub use error::{SimError, SimResult};
pub use sim::{Environment, RunMode};
