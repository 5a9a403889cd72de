pub mod boat;
pub mod obstacle;
pub mod registry;

pub use boat::{BoatSnapshot, ObservationEntry, RiverBoat, RiverBoatBuilder};
pub use obstacle::StaticCircle;
pub use registry::{Mover, MoverRegistry};
