// coordinator/mod.rs
pub mod seed;
pub mod signal_state;
pub mod types;

pub use signal_state::{apply_periodic_drift, recommend, set_lane_state, set_mode};
pub use types::{
    ControlMode, Direction, Intersection, IntersectionId, IntersectionStatus, Lane, Lanes,
    Location, SignalState,
};
