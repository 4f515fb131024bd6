//! Workout module for structured training sessions.

pub mod parser;
pub mod types;

pub use parser::{
    normalize_watts, parse_interval, parse_interval_prefix, parse_interval_with, parse_workout,
    parse_workout_with, ParseOptions,
};
pub use types::{
    FreeRideInterval, Interval, IntervalKind, RampInterval, SetInterval, SteadyInterval, Workout,
    WorkoutParseError, WorkoutStep,
};
