pub mod forces;
pub mod state;

pub use forces::{forces_and_moments, hull_rotation_moment, propeller_inflow, Ambient, ForceMoments, RelativeFlow};
pub use state::{global_to_local, local_to_global, relative_bearing, wrap_angle, BoatParams, BoatState, ControlState};
