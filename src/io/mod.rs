//! Writers for episode logs and summaries. Everything writes into a caller
//! supplied `io::Write`.

pub mod csv;
pub mod json;

pub use self::csv::{write_boat_history, write_tick_records};
pub use self::json::{write_json, TrackSummary};
