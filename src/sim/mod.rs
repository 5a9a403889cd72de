pub mod event;
pub mod integrator;
pub mod record;
pub mod runner;

pub use event::{EpisodePhase, EpisodeState, Termination};
pub use integrator::{step_boat, StepTelemetry};
pub use record::{EpisodeSummary, EvaluationReport, Outcome, TickRecord, Transition};
pub use runner::{Environment, RunMode, TickOutcome};
