//! Workout interval types and enums.
//!
//! An [`Interval`] is the parsed form of one line of workout text. Ramps and
//! sets are compound; [`Interval::expand`] flattens any interval into the
//! atomic [`WorkoutStep`]s the ride simulation consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of each constant-power step a ramp is split into.
pub const RAMP_STEP_SECONDS: u32 = 15;

/// Kind of workout interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalKind {
    /// Constant power
    Steady,
    /// Linear power change
    Ramp,
    /// Repeated block of intervals
    Set,
    /// Unstructured riding
    FreeRide,
}

impl std::fmt::Display for IntervalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntervalKind::Steady => write!(f, "Steady"),
            IntervalKind::Ramp => write!(f, "Ramp"),
            IntervalKind::Set => write!(f, "Set"),
            IntervalKind::FreeRide => write!(f, "Free Ride"),
        }
    }
}

/// Constant power held for a fixed duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SteadyInterval {
    duration_seconds: u32,
    pct_ftp: f64,
    cadence: Option<u16>,
    round_to_5: bool,
}

impl SteadyInterval {
    /// Create a steady interval from an integer percentage of FTP.
    pub fn new(duration_seconds: u32, percent: u16) -> Self {
        Self::from_fraction(duration_seconds, f64::from(percent) / 100.0)
    }

    pub(crate) fn from_fraction(duration_seconds: u32, pct_ftp: f64) -> Self {
        Self {
            duration_seconds,
            pct_ftp,
            cadence: None,
            round_to_5: false,
        }
    }

    /// Attach a cadence target in RPM.
    pub fn with_cadence(mut self, cadence: Option<u16>) -> Self {
        self.cadence = cadence;
        self
    }

    /// Round the wattage target to the nearest 5 W.
    pub fn rounded(mut self, round_to_5: bool) -> Self {
        self.round_to_5 = round_to_5;
        self
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    /// Fraction of FTP (0.75 for 75%).
    pub fn pct_ftp(&self) -> f64 {
        self.pct_ftp
    }

    pub fn cadence(&self) -> Option<u16> {
        self.cadence
    }

    pub fn round_to_5(&self) -> bool {
        self.round_to_5
    }

    /// Target wattage for a rider with the given FTP.
    ///
    /// When rounding is enabled the wattage is first rounded up to a whole
    /// watt and then to the nearest multiple of five, ties to even.
    pub fn target(&self, ftp: u16) -> f64 {
        let watts = self.pct_ftp * f64::from(ftp);
        if self.round_to_5 {
            (watts.ceil() / 5.0).round_ties_even() * 5.0
        } else {
            watts
        }
    }
}

/// Power that changes linearly from a start to an end percentage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RampInterval {
    duration_seconds: u32,
    start_pct: f64,
    end_pct: f64,
    cadence: Option<u16>,
}

impl RampInterval {
    /// Create a ramp between two integer percentages of FTP.
    pub fn new(duration_seconds: u32, start_percent: u16, end_percent: u16) -> Self {
        Self {
            duration_seconds,
            start_pct: f64::from(start_percent) / 100.0,
            end_pct: f64::from(end_percent) / 100.0,
            cadence: None,
        }
    }

    /// Attach a cadence target in RPM.
    pub fn with_cadence(mut self, cadence: Option<u16>) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn start_pct(&self) -> f64 {
        self.start_pct
    }

    pub fn end_pct(&self) -> f64 {
        self.end_pct
    }

    pub fn cadence(&self) -> Option<u16> {
        self.cadence
    }

    /// Split the ramp into 15 s steady steps.
    ///
    /// The last step takes whatever time is left, so step durations always
    /// sum to the ramp duration. Percentages are spread evenly over the step
    /// index: the first step sits at the start percentage, the last at the end.
    pub fn steps(&self) -> Vec<SteadyInterval> {
        if self.duration_seconds == 0 {
            return Vec::new();
        }

        let count = self.duration_seconds.div_ceil(RAMP_STEP_SECONDS);
        let span = self.end_pct - self.start_pct;

        (0..count)
            .map(|k| {
                let offset = k * RAMP_STEP_SECONDS;
                let duration = RAMP_STEP_SECONDS.min(self.duration_seconds - offset);
                let progress = if count > 1 {
                    f64::from(k) / f64::from(count - 1)
                } else {
                    0.0
                };
                SteadyInterval::from_fraction(duration, self.start_pct + span * progress)
                    .with_cadence(self.cadence)
            })
            .collect()
    }
}

/// A block of intervals repeated a number of times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetInterval {
    reps: u32,
    children: Vec<Interval>,
}

impl SetInterval {
    /// Create a set. Needs at least one repetition and one child.
    pub fn new(reps: u32, children: Vec<Interval>) -> Result<Self, WorkoutParseError> {
        if reps == 0 {
            return Err(WorkoutParseError::InvalidValue {
                field: "reps".to_string(),
                value: reps.to_string(),
            });
        }
        if children.is_empty() {
            return Err(WorkoutParseError::EmptyWorkout);
        }
        if total_duration(&children).and_then(|block| block.checked_mul(reps)).is_none() {
            return Err(WorkoutParseError::InvalidValue {
                field: "reps".to_string(),
                value: format!("{} (set is longer than {} seconds)", reps, u32::MAX),
            });
        }
        Ok(Self { reps, children })
    }

    pub fn reps(&self) -> u32 {
        self.reps
    }

    pub fn children(&self) -> &[Interval] {
        &self.children
    }

    pub fn duration_seconds(&self) -> u32 {
        total_duration(&self.children)
            .and_then(|block| block.checked_mul(self.reps))
            .unwrap_or(u32::MAX)
    }
}

/// Summed duration of intervals ridden back to back, `None` on overflow.
fn total_duration(intervals: &[Interval]) -> Option<u32> {
    intervals
        .iter()
        .try_fold(0u32, |total, interval| total.checked_add(interval.duration_seconds()))
}

/// Unstructured riding at threshold power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeRideInterval {
    duration_seconds: u32,
    cadence: Option<u16>,
}

impl FreeRideInterval {
    pub fn new(duration_seconds: u32) -> Self {
        Self {
            duration_seconds,
            cadence: None,
        }
    }

    /// Attach a cadence target in RPM.
    pub fn with_cadence(mut self, cadence: Option<u16>) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn cadence(&self) -> Option<u16> {
        self.cadence
    }

    /// Free rides are simulated at 100% of FTP.
    pub fn target(&self, ftp: u16) -> f64 {
        f64::from(ftp)
    }
}

/// A parsed workout interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interval {
    Steady(SteadyInterval),
    Ramp(RampInterval),
    Set(SetInterval),
    FreeRide(FreeRideInterval),
}

impl Interval {
    pub fn kind(&self) -> IntervalKind {
        match self {
            Interval::Steady(_) => IntervalKind::Steady,
            Interval::Ramp(_) => IntervalKind::Ramp,
            Interval::Set(_) => IntervalKind::Set,
            Interval::FreeRide(_) => IntervalKind::FreeRide,
        }
    }

    /// Total duration in seconds, including every repetition of a set.
    pub fn duration_seconds(&self) -> u32 {
        match self {
            Interval::Steady(s) => s.duration_seconds(),
            Interval::Ramp(r) => r.duration_seconds(),
            Interval::Set(s) => s.duration_seconds(),
            Interval::FreeRide(f) => f.duration_seconds(),
        }
    }

    /// Target wattage at the start of the interval.
    pub fn target(&self, ftp: u16) -> f64 {
        match self {
            Interval::Steady(s) => s.target(ftp),
            Interval::Ramp(r) => r.start_pct() * f64::from(ftp),
            Interval::Set(s) => s.children().first().map_or(0.0, |c| c.target(ftp)),
            Interval::FreeRide(f) => f.target(ftp),
        }
    }

    /// Flatten into the atomic steps the simulation consumes, in order.
    pub fn expand(&self) -> Vec<WorkoutStep> {
        match self {
            Interval::Steady(s) => vec![WorkoutStep::Steady(s.clone())],
            Interval::Ramp(r) => r.steps().into_iter().map(WorkoutStep::Steady).collect(),
            Interval::Set(s) => {
                let block: Vec<WorkoutStep> =
                    s.children().iter().flat_map(Interval::expand).collect();
                let mut steps = Vec::with_capacity(block.len() * s.reps() as usize);
                for _ in 0..s.reps() {
                    steps.extend(block.iter().cloned());
                }
                steps
            }
            Interval::FreeRide(f) => vec![WorkoutStep::FreeRide(f.clone())],
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Steady(s) => write!(
                f,
                "Steady: {}s at {:.0}% FTP",
                s.duration_seconds(),
                s.pct_ftp() * 100.0
            ),
            Interval::Ramp(r) => write!(
                f,
                "Ramp: {}s from {:.0}% to {:.0}% FTP",
                r.duration_seconds(),
                r.start_pct() * 100.0,
                r.end_pct() * 100.0
            ),
            Interval::Set(s) => write!(
                f,
                "Set: {}x {} intervals ({}s)",
                s.reps(),
                s.children().len(),
                s.duration_seconds()
            ),
            Interval::FreeRide(r) => write!(f, "Free Ride: {}s", r.duration_seconds()),
        }
    }
}

/// One atomic instruction: a single power target held for a duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkoutStep {
    Steady(SteadyInterval),
    FreeRide(FreeRideInterval),
}

impl WorkoutStep {
    pub fn duration_seconds(&self) -> u32 {
        match self {
            WorkoutStep::Steady(s) => s.duration_seconds(),
            WorkoutStep::FreeRide(f) => f.duration_seconds(),
        }
    }

    pub fn target(&self, ftp: u16) -> f64 {
        match self {
            WorkoutStep::Steady(s) => s.target(ftp),
            WorkoutStep::FreeRide(f) => f.target(ftp),
        }
    }

    pub fn cadence(&self) -> Option<u16> {
        match self {
            WorkoutStep::Steady(s) => s.cadence(),
            WorkoutStep::FreeRide(f) => f.cadence(),
        }
    }

    pub fn is_free_ride(&self) -> bool {
        matches!(self, WorkoutStep::FreeRide(_))
    }
}

impl std::fmt::Display for WorkoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkoutStep::Steady(s) => Interval::Steady(s.clone()).fmt(f),
            WorkoutStep::FreeRide(r) => Interval::FreeRide(r.clone()).fmt(f),
        }
    }
}

/// A structured training workout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workout {
    /// Workout name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Parsed intervals, one per line of workout text
    pub intervals: Vec<Interval>,
    /// Atomic steps in riding order
    pub steps: Vec<WorkoutStep>,
    /// Total workout duration in seconds (calculated)
    pub total_duration_seconds: u32,
    /// Estimated Training Stress Score
    pub estimated_tss: Option<f32>,
    /// Estimated Intensity Factor
    pub estimated_if: Option<f32>,
}

impl Workout {
    /// Create a new workout with the given name and intervals.
    ///
    /// Fails when the intervals add up to more than `u32::MAX` seconds.
    pub fn new(name: String, intervals: Vec<Interval>) -> Result<Self, WorkoutParseError> {
        let total_duration_seconds =
            total_duration(&intervals).ok_or_else(|| WorkoutParseError::InvalidValue {
                field: "duration".to_string(),
                value: format!("workout '{}' is longer than {} seconds", name, u32::MAX),
            })?;
        let steps: Vec<WorkoutStep> = intervals.iter().flat_map(Interval::expand).collect();

        Ok(Self {
            name,
            description: None,
            intervals,
            steps,
            total_duration_seconds,
            estimated_tss: None,
            estimated_if: None,
        })
    }

    /// Calculate estimated TSS and IF for a given FTP.
    ///
    /// Free ride steps have no prescribed intensity and are left out of the
    /// weighted average.
    pub fn calculate_estimates(&mut self, ftp: u16) {
        if self.steps.is_empty() || ftp == 0 {
            return;
        }

        let mut total_weighted_power = 0.0f64;
        let mut total_duration = 0u32;

        for step in self.steps.iter().filter(|s| !s.is_free_ride()) {
            let duration = step.duration_seconds();
            total_weighted_power += step.target(ftp) * f64::from(duration);
            total_duration += duration;
        }

        if total_duration > 0 {
            let avg_power = total_weighted_power / f64::from(total_duration);
            let intensity_factor = (avg_power / f64::from(ftp)) as f32;
            let duration_hours = total_duration as f32 / 3600.0;
            let tss = duration_hours * intensity_factor * intensity_factor * 100.0;

            self.estimated_if = Some(intensity_factor);
            self.estimated_tss = Some(tss);
        }
    }
}

/// Errors during workout text parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkoutParseError {
    /// Text does not match any interval grammar
    #[error("Malformed interval '{text}': {reason}")]
    MalformedInterval { text: String, reason: String },

    /// Interval matched but gave neither minutes nor seconds
    #[error("Interval has no duration: '{0}'")]
    MissingDuration(String),

    /// Invalid field value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Empty workout (no intervals)
    #[error("Workout has no intervals")]
    EmptyWorkout,
}
