//! Route definitions: elevation samples turned into constant-gradient segments
//!
//! A [`Route`] is an optional lead-in ridden once, followed by a primary
//! [`Lap`] repeated forever. [`RouteCursor`] walks the segments and stamps
//! each with its absolute distance from the start of the ride.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::world::equipment::SurfaceMix;

/// Errors while building laps and routes
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("Route '{0}' has an empty lap")]
    EmptyLap(String),

    #[error("Sample {index} goes backwards: {current:.2}m after {previous:.2}m")]
    NonMonotonicDistance {
        index: usize,
        previous: f64,
        current: f64,
    },
}

/// A (distance, elevation) sample along a route, both in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub distance: f64,
    pub elevation: f64,
}

impl Point {
    pub fn new(distance: f64, elevation: f64) -> Self {
        Self {
            distance,
            elevation,
        }
    }
}

impl From<(f64, f64)> for Point {
    fn from((distance, elevation): (f64, f64)) -> Self {
        Self::new(distance, elevation)
    }
}

impl From<[f64; 2]> for Point {
    fn from([distance, elevation]: [f64; 2]) -> Self {
        Self::new(distance, elevation)
    }
}

impl std::fmt::Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dist={:.2}m elev={:.2}m", self.distance, self.elevation)
    }
}

/// Stretch of road with a constant gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    start: Point,
    end: Point,
    length: f64,
    delta: f64,
    gradient: f64,
    traveled: f64,
}

impl Segment {
    /// Build a segment between two samples.
    ///
    /// `length` is measured along the road, so the horizontal run is
    /// `sqrt(length² - delta²)`. Samples where the climb is not shorter than
    /// the distance covered get a flat gradient.
    pub fn new(start: Point, end: Point) -> Self {
        let length = end.distance - start.distance;
        let delta = end.elevation - start.elevation;
        let gradient = if delta == 0.0 {
            0.0
        } else if length <= 0.0 || delta.abs() >= length {
            tracing::warn!(
                "Degenerate segment from {} to {}, treating as flat",
                start,
                end
            );
            0.0
        } else {
            delta / (length * length - delta * delta).sqrt()
        };

        Self {
            start,
            end,
            length,
            delta,
            gradient,
            traveled: length,
        }
    }

    pub fn start(&self) -> Point {
        self.start
    }

    pub fn end(&self) -> Point {
        self.end
    }

    /// Length in meters.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Elevation change in meters.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Rise over run.
    pub fn gradient(&self) -> f64 {
        self.gradient
    }

    pub fn elevation_gain(&self) -> f64 {
        self.delta.max(0.0)
    }

    /// Distance in meters at which this segment ends.
    ///
    /// Inside a [`Lap`] this is measured from the lap start; segments handed
    /// out by a [`RouteCursor`] measure it from the start of the ride.
    pub fn traveled(&self) -> f64 {
        self.traveled
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}m at {:.2}%", self.length, self.gradient * 100.0)
    }
}

/// Segments ridden in order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lap {
    segments: Vec<Segment>,
    length_m: f64,
    elevation_gain: f64,
}

impl Lap {
    /// A lap with no segments.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a lap from one run of samples.
    pub fn from_points(points: &[Point]) -> Result<Self, RouteError> {
        Self::from_runs(&[points])
    }

    /// Build a lap from several runs of samples ridden back to back.
    ///
    /// Each run is collapsed on its own and the segments are concatenated.
    pub fn from_runs<R: AsRef<[Point]>>(runs: &[R]) -> Result<Self, RouteError> {
        let mut segments = Vec::new();
        for run in runs {
            segments.extend(collapse_run(run.as_ref())?);
        }

        let mut length_m = 0.0;
        for segment in &mut segments {
            length_m += segment.length;
            segment.traveled = length_m;
        }
        let elevation_gain = segments.iter().map(Segment::elevation_gain).sum();

        Ok(Self {
            segments,
            length_m,
            elevation_gain,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Lap length in kilometers.
    pub fn length(&self) -> f64 {
        self.length_m / 1000.0
    }

    /// Lap length in meters.
    pub fn length_m(&self) -> f64 {
        self.length_m
    }

    /// Total climbing in meters.
    pub fn elevation_gain(&self) -> f64 {
        self.elevation_gain
    }
}

/// Turn samples into segments.
///
/// Runs of samples at the same elevation become one flat segment that ends
/// at the last sample of the run. Zero-length segments are dropped.
fn collapse_run(points: &[Point]) -> Result<Vec<Segment>, RouteError> {
    let Some((&first, rest)) = points.split_first() else {
        return Ok(Vec::new());
    };

    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].distance < pair[0].distance {
            return Err(RouteError::NonMonotonicDistance {
                index: index + 1,
                previous: pair[0].distance,
                current: pair[1].distance,
            });
        }
    }

    let mut segments = Vec::new();
    let mut push = |start: Point, end: Point| {
        let segment = Segment::new(start, end);
        if segment.length > 0.0 {
            segments.push(segment);
        }
    };

    let mut start = first;
    let mut pending: Option<Point> = None;
    for &point in rest {
        if point.elevation == start.elevation {
            pending = Some(point);
            continue;
        }
        if let Some(flat_end) = pending.take() {
            push(start, flat_end);
            start = flat_end;
        }
        push(start, point);
        start = point;
    }
    if let Some(flat_end) = pending {
        push(start, flat_end);
    }

    Ok(segments)
}

/// A lap ridden forever, optionally after a one-off lead-in.
#[derive(Debug, Clone)]
pub struct Route {
    name: String,
    lead_in: Lap,
    lap: Lap,
    surfaces: SurfaceMix,
    lead_in_surfaces: Option<SurfaceMix>,
}

impl Route {
    /// Create a route. The primary lap must have at least one segment.
    pub fn new(
        name: impl Into<String>,
        lead_in: Option<Lap>,
        lap: Lap,
        surfaces: SurfaceMix,
    ) -> Result<Self, RouteError> {
        let name = name.into();
        if lap.is_empty() {
            return Err(RouteError::EmptyLap(name));
        }
        Ok(Self {
            name,
            lead_in: lead_in.unwrap_or_default(),
            lap,
            surfaces,
            lead_in_surfaces: None,
        })
    }

    /// Use a different surface mix while on the lead-in.
    pub fn with_lead_in_surfaces(mut self, surfaces: SurfaceMix) -> Self {
        self.lead_in_surfaces = Some(surfaces);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lead_in(&self) -> &Lap {
        &self.lead_in
    }

    pub fn lap(&self) -> &Lap {
        &self.lap
    }

    /// Surface mix of the primary lap.
    pub fn surfaces(&self) -> &SurfaceMix {
        &self.surfaces
    }

    /// Surface mix used while on the lead-in.
    pub fn lead_in_surfaces(&self) -> &SurfaceMix {
        self.lead_in_surfaces.as_ref().unwrap_or(&self.surfaces)
    }

    pub fn has_lead_in(&self) -> bool {
        self.lead_in.length_m() > 0.0
    }

    /// Start walking the route from the beginning.
    pub fn cursor(&self) -> RouteCursor<'_> {
        RouteCursor::new(self)
    }
}

/// Lap boundary crossed by a [`RouteCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapBoundary {
    /// Lead-in finished, primary lap starts
    LeadInComplete,
    /// Primary lap number `lap` (1-based) finished
    LapComplete { lap: u32 },
}

/// Endless iterator over a route's segments.
///
/// Crossing into the next lap queues a [`LapBoundary`], collected with
/// [`RouteCursor::drain_lap_events`].
#[derive(Debug)]
pub struct RouteCursor<'a> {
    route: &'a Route,
    in_lead_in: bool,
    index: usize,
    base: f64,
    laps_completed: u32,
    events: Vec<LapBoundary>,
}

impl<'a> RouteCursor<'a> {
    fn new(route: &'a Route) -> Self {
        Self {
            route,
            in_lead_in: route.has_lead_in(),
            index: 0,
            base: 0.0,
            laps_completed: 0,
            events: Vec::new(),
        }
    }

    fn active_lap(&self) -> &'a Lap {
        if self.in_lead_in {
            &self.route.lead_in
        } else {
            &self.route.lap
        }
    }

    pub fn in_lead_in(&self) -> bool {
        self.in_lead_in
    }

    /// Primary laps fully handed out so far.
    pub fn laps_completed(&self) -> u32 {
        self.laps_completed
    }

    /// Surface mix for the part of the route the cursor is on.
    pub fn surfaces(&self) -> &'a SurfaceMix {
        if self.in_lead_in {
            self.route.lead_in_surfaces()
        } else {
            self.route.surfaces()
        }
    }

    /// Take the lap boundaries crossed since the last call.
    pub fn drain_lap_events(&mut self) -> Vec<LapBoundary> {
        std::mem::take(&mut self.events)
    }

    fn wrap(&mut self) {
        self.base += self.active_lap().length_m();
        self.index = 0;
        if self.in_lead_in {
            self.in_lead_in = false;
            self.events.push(LapBoundary::LeadInComplete);
            tracing::debug!("Lead-in of '{}' complete", self.route.name);
        } else {
            self.laps_completed += 1;
            self.events.push(LapBoundary::LapComplete {
                lap: self.laps_completed,
            });
            tracing::debug!(
                "Lap {} of '{}' complete, wrapping",
                self.laps_completed,
                self.route.name
            );
        }
    }
}

impl Iterator for RouteCursor<'_> {
    type Item = Segment;

    fn next(&mut self) -> Option<Segment> {
        if self.index >= self.active_lap().segments.len() {
            self.wrap();
        }

        let mut segment = self.active_lap().segments.get(self.index)?.clone();
        self.index += 1;
        segment.traveled += self.base;
        Some(segment)
    }
}
