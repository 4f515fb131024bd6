//! Ridecast - Workout Estimation on Virtual Cycling Routes
//!
//! Parses structured workout text, builds routes from elevation samples and
//! simulates a rider holding the workout's power targets along the route,
//! tick by tick, to see how far they get and which laps they finish.

pub mod ride;
pub mod storage;
pub mod workouts;
pub mod world;

// Re-export commonly used types
pub use ride::{Ride, RideSummary, RideTick};
pub use storage::config::{RiderProfile, ScenarioConfig};
pub use workouts::{parse_interval, parse_workout, Workout};
pub use world::{Rider, Route};
