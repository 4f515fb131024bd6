//! Ride simulation: a workout ridden along a route, one tick at a time.

pub mod simulation;
pub mod types;

pub use simulation::Ride;
pub use types::{
    LapCompletion, RideError, RideOptions, RideStatus, RideSummary, RideTick, DT,
    DEFAULT_MAX_SEGMENT_ADVANCE, TICKS_PER_SECOND,
};
