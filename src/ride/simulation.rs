//! Fixed-timestep ride simulation.
//!
//! A [`Ride`] is an iterator: every call to `next` advances simulated time by
//! [`DT`] and yields the rider's state. Two cursors move in lockstep, one over
//! workout time and one over route distance, and both are only ever moved
//! forward.

use crate::ride::types::{
    LapCompletion, RideError, RideOptions, RideStatus, RideSummary, RideTick, DT,
    TICKS_PER_SECOND,
};
use crate::workouts::types::WorkoutStep;
use crate::world::physics::Rider;
use crate::world::route::{LapBoundary, Route, RouteCursor, RouteError, Segment};

/// One simulated ride of a workout along a route.
#[derive(Debug)]
pub struct Ride<'a> {
    rider: Rider,
    steps: &'a [WorkoutStep],
    route: &'a Route,
    options: RideOptions,
    status: RideStatus,

    /// Route cursor and the segment currently under the wheels
    cursor: RouteCursor<'a>,
    segment: Segment,

    /// Workout cursor: active step and the tick at which it ends
    step_index: usize,
    step_end_tick: u64,
    total_ticks: u64,
    ticks: u64,

    distance_m: f64,
    elevation_gain_m: f64,
    laps: Vec<LapCompletion>,
    summary: Option<RideSummary>,
}

fn step_ticks(step: &WorkoutStep) -> u64 {
    u64::from(step.duration_seconds()) * TICKS_PER_SECOND
}

fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

impl<'a> Ride<'a> {
    /// Set up a ride with default options.
    pub fn new(rider: Rider, steps: &'a [WorkoutStep], route: &'a Route) -> Result<Self, RideError> {
        Self::with_options(rider, steps, route, RideOptions::default())
    }

    /// Set up a ride. The rider is brought to a stop at the start line.
    pub fn with_options(
        mut rider: Rider,
        steps: &'a [WorkoutStep],
        route: &'a Route,
        options: RideOptions,
    ) -> Result<Self, RideError> {
        let first_step = steps.first().ok_or(RideError::EmptyWorkout)?;

        let mut cursor = route.cursor();
        let segment = cursor
            .next()
            .ok_or_else(|| RouteError::EmptyLap(route.name().to_string()))?;
        tracing::debug!("Initial route segment: {}", segment);

        rider.reset();

        Ok(Self {
            rider,
            steps,
            route,
            options,
            status: RideStatus::NotStarted,
            cursor,
            segment,
            step_index: 0,
            step_end_tick: step_ticks(first_step),
            total_ticks: steps.iter().map(step_ticks).sum(),
            ticks: 0,
            distance_m: 0.0,
            elevation_gain_m: 0.0,
            laps: Vec::new(),
            summary: None,
        })
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn rider(&self) -> &Rider {
        &self.rider
    }

    /// Hand the rider back once the ride is no longer needed.
    pub fn into_rider(self) -> Rider {
        self.rider
    }

    pub fn route(&self) -> &Route {
        self.route
    }

    /// Laps completed so far.
    pub fn laps(&self) -> &[LapCompletion] {
        &self.laps
    }

    pub fn elapsed_seconds(&self) -> f64 {
        ticks_to_seconds(self.ticks)
    }

    /// Total workout duration in seconds.
    pub fn workout_seconds(&self) -> f64 {
        ticks_to_seconds(self.total_ticks)
    }

    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn elevation_gain_m(&self) -> f64 {
        self.elevation_gain_m
    }

    /// The step being ridden, if the ride has not finished.
    pub fn current_step(&self) -> Option<&'a WorkoutStep> {
        match self.status {
            RideStatus::Finished => None,
            _ => self.steps.get(self.step_index),
        }
    }

    pub fn current_segment(&self) -> &Segment {
        &self.segment
    }

    /// Final totals, available once the ride has finished cleanly.
    pub fn summary(&self) -> Option<&RideSummary> {
        self.summary.as_ref()
    }

    /// Drive the ride to the end and return its summary.
    pub fn run_to_completion(&mut self) -> Result<RideSummary, RideError> {
        for tick in self.by_ref() {
            tick?;
        }
        Ok(self.build_summary())
    }

    /// Move to the workout step covering the current tick.
    fn advance_step(&mut self) -> Option<&'a WorkoutStep> {
        while self.ticks >= self.step_end_tick {
            self.step_index += 1;
            let step = self.steps.get(self.step_index)?;
            self.step_end_tick += step_ticks(step);
            tracing::debug!("Next workout step: {}", step);
        }
        self.steps.get(self.step_index)
    }

    /// Move to the route segment under the current distance.
    fn advance_segment(&mut self) -> Result<(), RideError> {
        let mut advanced = 0;
        while self.distance_m >= self.segment.traveled() {
            advanced += 1;
            if advanced > self.options.max_segment_advance {
                return Err(self.overrun());
            }
            self.segment = self
                .cursor
                .next()
                .ok_or_else(|| RouteError::EmptyLap(self.route.name().to_string()))?;
            self.elevation_gain_m += self.segment.elevation_gain();
            tracing::debug!("Next route segment: {}", self.segment);

            for event in self.cursor.drain_lap_events() {
                match event {
                    LapBoundary::LeadInComplete => {
                        tracing::debug!("Route cursor left the lead-in");
                    }
                    LapBoundary::LapComplete { lap } => {
                        tracing::debug!("Route cursor wrapped after lap {}", lap);
                    }
                }
            }
        }
        Ok(())
    }

    fn overrun(&mut self) -> RideError {
        self.status = RideStatus::Finished;
        tracing::warn!(
            "Route advancement overrun at {:.2}m on segment {} (ends at {:.2}m)",
            self.distance_m,
            self.segment,
            self.segment.traveled()
        );
        for lap in &self.laps {
            tracing::warn!("Workout would complete lap {} in {}", lap.index, lap);
        }
        RideError::RouteAdvancementOverrun {
            limit: self.options.max_segment_advance,
            distance_m: self.distance_m,
            segment: self.segment.to_string(),
            laps: self.laps.clone(),
        }
    }

    /// Distance at which the next lap (or the lead-in) is finished, and
    /// whether that is the lead-in.
    fn next_lap_boundary(&self) -> (f64, bool) {
        let lead_in_m = self.route.lead_in().length_m();
        let lap_m = self.route.lap().length_m();
        let lead_in_pending = self.route.has_lead_in() && self.laps.is_empty();
        if lead_in_pending {
            return (lead_in_m, true);
        }

        let primary_done = self.laps.iter().filter(|lap| !lap.lead_in).count();
        (lead_in_m + lap_m * (primary_done + 1) as f64, false)
    }

    fn record_laps(&mut self) {
        loop {
            let (boundary, lead_in) = self.next_lap_boundary();
            if self.distance_m < boundary {
                break;
            }

            let elapsed = ticks_to_seconds(self.ticks);
            let completion = LapCompletion {
                index: self.laps.len() + 1,
                elapsed_seconds: elapsed,
                remaining_seconds: self.workout_seconds() - elapsed,
                lead_in,
            };
            if lead_in {
                tracing::info!("Lead-in complete at {}", completion);
            } else {
                tracing::info!("Lap {} complete at {}", completion.index, completion);
            }
            self.laps.push(completion);
        }
    }

    fn build_summary(&self) -> RideSummary {
        let lead_in_m = self.route.lead_in().length_m();
        let in_lead_in = self.route.has_lead_in() && self.laps.is_empty();
        let (lap_start_m, lap_length_m) = if in_lead_in {
            (0.0, lead_in_m)
        } else {
            let primary_done = self.laps.iter().filter(|lap| !lap.lead_in).count();
            let lap_m = self.route.lap().length_m();
            (lead_in_m + lap_m * primary_done as f64, lap_m)
        };

        RideSummary {
            laps: self.laps.clone(),
            in_lead_in,
            current_lap_km: (self.distance_m - lap_start_m).max(0.0) / 1000.0,
            current_lap_length_km: lap_length_m / 1000.0,
            distance_km: self.distance_km(),
            elevation_gain_m: self.elevation_gain_m,
            elapsed_seconds: self.elapsed_seconds(),
        }
    }

    fn finish(&mut self) {
        self.status = RideStatus::Finished;
        let summary = self.build_summary();

        for lap in &summary.laps {
            tracing::info!("Workout would complete lap {} in {}", lap.index, lap);
        }
        tracing::info!(
            "Workout would only finish {:.2}% of the current {} ({:.2}km out of {:.2}km)",
            summary.current_lap_fraction() * 100.0,
            if summary.in_lead_in { "lead-in" } else { "lap" },
            summary.current_lap_km,
            summary.current_lap_length_km
        );
        tracing::info!(
            "Ride finished: {:.2}km, {:.0}m climbed in {:.0}s",
            summary.distance_km,
            summary.elevation_gain_m,
            summary.elapsed_seconds
        );

        self.summary = Some(summary);
    }

    fn tick(&mut self) -> Result<RideTick, RideError> {
        let velocity = self.rider.velocity();
        self.distance_m += velocity * DT;

        if self.ticks == 0 {
            // The first segment is entered on the first tick.
            self.elevation_gain_m += self.segment.elevation_gain();
        }

        let Some(step) = self.advance_step() else {
            // Only reachable when step durations do not add up to the total.
            return Err(RideError::EmptyWorkout);
        };
        self.advance_segment()?;

        let watts = step.target(self.rider.ftp());
        self.rider.apply_watts(
            watts,
            self.segment.gradient(),
            DT,
            self.cursor.surfaces(),
        );

        self.ticks += 1;
        self.record_laps();

        Ok(RideTick {
            velocity_mps: velocity,
            distance_km: self.distance_km(),
            elevation_gain_m: self.elevation_gain_m,
            elapsed_seconds: self.elapsed_seconds(),
        })
    }
}

impl Iterator for Ride<'_> {
    type Item = Result<RideTick, RideError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.status {
            RideStatus::Finished => return None,
            RideStatus::NotStarted => {
                self.status = RideStatus::Running;
                tracing::info!(
                    "Ride started: {} steps over {:.0}s on '{}' ({:.2}km lap)",
                    self.steps.len(),
                    self.workout_seconds(),
                    self.route.name(),
                    self.route.lap().length()
                );
            }
            RideStatus::Running => {}
        }

        if self.ticks >= self.total_ticks {
            self.finish();
            return None;
        }

        let result = self.tick();
        if result.is_err() {
            self.status = RideStatus::Finished;
        }
        Some(result)
    }
}
