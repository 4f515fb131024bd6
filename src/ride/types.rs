//! Ride simulation types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::route::RouteError;

/// Simulation timestep in seconds.
pub const DT: f64 = 0.1;

/// Ticks per simulated second.
pub const TICKS_PER_SECOND: u64 = 10;

/// Segments the route may advance within one tick before the ride is aborted.
pub const DEFAULT_MAX_SEGMENT_ADVANCE: usize = 20;

/// Ride lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Built, no tick pulled yet
    #[default]
    NotStarted,
    /// Producing ticks
    Running,
    /// Workout time used up, or the ride was aborted
    Finished,
}

/// Rider state after one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RideTick {
    /// Speed at the start of the tick (m/s)
    pub velocity_mps: f64,
    /// Distance covered since the start of the ride (km)
    pub distance_km: f64,
    /// Climbing so far (m)
    pub elevation_gain_m: f64,
    /// Simulated time at the end of the tick (s)
    pub elapsed_seconds: f64,
}

/// A lap (or the lead-in) finished during the ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapCompletion {
    /// 1-based position among all completions, lead-in included
    pub index: usize,
    /// Simulated time when the lap was finished
    pub elapsed_seconds: f64,
    /// Workout time still to go at that point
    pub remaining_seconds: f64,
    /// Whether this was the lead-in
    pub lead_in: bool,
}

impl std::fmt::Display for LapCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.elapsed_seconds.round() as u64;
        write!(
            f,
            "{}m{}s (with {:.2}s to-go in the workout)",
            seconds / 60,
            seconds % 60,
            self.remaining_seconds
        )
    }
}

/// Totals reported when a ride finishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RideSummary {
    /// Completed laps in order
    pub laps: Vec<LapCompletion>,
    /// Whether the unfinished lap is the lead-in
    pub in_lead_in: bool,
    /// Distance covered on the unfinished lap (km)
    pub current_lap_km: f64,
    /// Length of the unfinished lap (km)
    pub current_lap_length_km: f64,
    /// Total distance (km)
    pub distance_km: f64,
    /// Total climbing (m), counting only segments entered while riding
    pub elevation_gain_m: f64,
    /// Total simulated time (s)
    pub elapsed_seconds: f64,
}

impl RideSummary {
    /// Share of the unfinished lap that was covered, between 0 and 1.
    pub fn current_lap_fraction(&self) -> f64 {
        if self.current_lap_length_km > 0.0 {
            self.current_lap_km / self.current_lap_length_km
        } else {
            0.0
        }
    }

    /// Completed primary laps, lead-in excluded.
    pub fn completed_laps(&self) -> usize {
        self.laps.iter().filter(|lap| !lap.lead_in).count()
    }
}

/// Tuning for the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RideOptions {
    /// Most route segments that may be passed within a single tick
    pub max_segment_advance: usize,
}

impl Default for RideOptions {
    fn default() -> Self {
        Self {
            max_segment_advance: DEFAULT_MAX_SEGMENT_ADVANCE,
        }
    }
}

/// Errors raised by the ride simulation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RideError {
    /// No workout steps to ride
    #[error("Workout has no steps")]
    EmptyWorkout,

    /// Route could not be walked
    #[error("Route error: {0}")]
    Route(#[from] RouteError),

    /// Distance moved past more segments in one tick than allowed
    #[error(
        "Route advanced more than {limit} segments in one tick at {distance_m:.2}m \
         (segment {segment}) after {} completed laps; distance accounting is out of step \
         with the route",
        .laps.len()
    )]
    RouteAdvancementOverrun {
        limit: usize,
        distance_m: f64,
        segment: String,
        laps: Vec<LapCompletion>,
    },
}
