//! Unit tests for route building and traversal.

use ridecast::world::equipment::SurfaceMix;
use ridecast::world::route::{Lap, LapBoundary, Point, Route};

fn lap(samples: &[(f64, f64)]) -> Lap {
    let points: Vec<Point> = samples.iter().copied().map(Point::from).collect();
    Lap::from_points(&points).expect("Samples should be in distance order")
}

fn hill() -> Lap {
    lap(&[(0.0, 100.0), (250.0, 110.0), (500.0, 120.0), (750.0, 110.0), (1000.0, 100.0)])
}

#[test]
fn test_single_point_lead_in_is_ignored() {
    let route = Route::new("Hill", Some(lap(&[(0.0, 100.0)])), hill(), SurfaceMix::road())
        .expect("Route should build");
    assert!(!route.has_lead_in());

    let mut cursor = route.cursor();
    assert!(!cursor.in_lead_in());
    let first = cursor.next().expect("Cursor never ends");
    assert_eq!(first.traveled(), 250.0);
    assert!(cursor.drain_lap_events().is_empty());
}

#[test]
fn test_lead_in_reported_once_then_laps() {
    let lead_in = lap(&[(0.0, 90.0), (400.0, 100.0)]);
    let route = Route::new("Hill", Some(lead_in), hill(), SurfaceMix::road())
        .expect("Route should build");

    let mut cursor = route.cursor();
    let mut events = Vec::new();
    let mut traveled = Vec::new();
    // One lead-in segment, then three full laps of four segments.
    for _ in 0..13 {
        let segment = cursor.next().expect("Cursor never ends");
        traveled.push(segment.traveled());
        events.extend(cursor.drain_lap_events());
    }

    assert_eq!(
        events,
        vec![
            LapBoundary::LeadInComplete,
            LapBoundary::LapComplete { lap: 1 },
            LapBoundary::LapComplete { lap: 2 },
        ]
    );
    assert_eq!(cursor.laps_completed(), 2);
    assert_eq!(traveled[0], 400.0);
    assert_eq!(traveled[1], 650.0);
    assert_eq!(traveled[12], 3400.0);
    assert!(traveled.windows(2).all(|pair| pair[1] > pair[0]));
}

#[test]
fn test_noisy_samples_collapse() {
    let samples = [
        (0.0, 50.0),
        (5.0, 50.0),
        (10.0, 50.0),
        (10.0, 50.0),
        (15.0, 51.0),
        (20.0, 51.0),
        (25.0, 51.0),
        (30.0, 50.5),
        (30.0, 50.5),
        (35.0, 50.5),
    ];
    let lap = lap(&samples);

    assert!(lap.segments().iter().all(|s| s.length() > 0.0));
    let lengths: Vec<f64> = lap.segments().iter().map(|s| s.length()).collect();
    assert_eq!(lengths, vec![10.0, 5.0, 10.0, 5.0, 5.0]);
    assert_eq!(lap.length_m(), 35.0);
    assert_eq!(lap.elevation_gain(), 1.0);

    let last = lap.segments().last().expect("Lap has segments");
    assert_eq!(last.traveled(), 35.0);
    assert_eq!(last.gradient(), 0.0);
}

#[test]
fn test_climb_is_counted_per_lap() {
    let route = Route::new("Hill", None, hill(), SurfaceMix::road()).expect("Route should build");
    let gain: f64 = route
        .cursor()
        .take(8)
        .map(|segment| segment.elevation_gain())
        .sum();
    assert_eq!(gain, 2.0 * route.lap().elevation_gain());
    assert_eq!(route.lap().elevation_gain(), 20.0);
}
