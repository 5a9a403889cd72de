use thiserror::Error;

/// Errors raised while building a scenario or advancing an episode.
///
/// Configuration problems surface at setup time; the only error a running
/// episode can produce is [`SimError::NonFinite`].
#[derive(Debug, Error)]
pub enum SimError {
    #[error("malformed scenario configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("invalid scenario: {0}")]
    InvalidScenario(String),

    #[error("mover '{mover}' has no state field '{key}'")]
    UnknownStateKey { mover: String, key: String },

    #[error("field '{key}' of mover '{mover}' is derived and cannot be set")]
    ReadOnlyStateKey { mover: String, key: String },

    #[error("a mover named '{0}' is already registered")]
    DuplicateMover(String),

    #[error("no mover named '{0}' is registered")]
    UnknownMover(String),

    #[error("mover '{name}' is invalid: {reason}")]
    InvalidMover { name: String, reason: String },

    #[error("scenario must contain exactly one learning boat, found {0}")]
    AgentCount(usize),

    #[error("normalization constant for '{key}' must be finite and non-zero, got {value}")]
    InvalidNormalization { key: String, value: f64 },

    #[error("evaluation fixture: {0}")]
    Fixture(String),

    #[error("could not place '{name}' clear of other movers after {attempts} attempts")]
    Placement { name: String, attempts: usize },

    #[error("mover '{mover}' produced a non-finite {quantity} ({value})")]
    NonFinite {
        mover: String,
        quantity: &'static str,
        value: f64,
    },
}

pub type SimResult<T> = Result<T, SimError>;
