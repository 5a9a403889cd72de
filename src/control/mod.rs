//! Reference steering used by the demo binary and the scenario tests.

pub mod heading;
pub mod pid;

pub use heading::HeadingPolicy;
pub use pid::Pid;
