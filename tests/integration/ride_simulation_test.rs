//! End-to-end rides: workout text parsed, route built, ride simulated.

use std::collections::BTreeMap;

use ridecast::ride::{Ride, RideStatus, RideSummary, TICKS_PER_SECOND};
use ridecast::workouts::parse_workout;
use ridecast::world::{Bike, Lap, Point, Rider, Route, SurfaceMix, SurfaceType, WheelSet};

fn rider() -> Rider {
    let mut rider = Rider::new(80.0, 178.0, 250);
    rider.set_bike(Bike::from_catalog("emonda").expect("Known bike"));
    rider.set_wheels(WheelSet::from_catalog("dt_swiss").expect("Known wheels"));
    rider
}

fn route(samples: &[(f64, f64)], surfaces: SurfaceMix) -> Route {
    let points: Vec<Point> = samples.iter().copied().map(Point::from).collect();
    let lap = Lap::from_points(&points).expect("Samples should be ordered");
    Route::new("Test Route", None, lap, surfaces).expect("Route should build")
}

fn flat() -> Route {
    route(&[(0.0, 0.0), (250.0, 0.0), (500.0, 0.0)], SurfaceMix::road())
}

fn ride(text: &[&str], route: &Route) -> RideSummary {
    let workout = parse_workout("Test", text).expect("Workout should parse");
    let mut ride = Ride::new(rider(), &workout.steps, route).expect("Ride should start");
    ride.run_to_completion().expect("Ride should finish")
}

#[test]
fn test_ride_covers_whole_workout() {
    let workout = parse_workout(
        "Mixed",
        &["2min from 50 to 90% FTP", "2x 1min @ 100% FTP, 30sec @ 50% FTP"],
    )
    .expect("Workout should parse");
    assert_eq!(workout.total_duration_seconds, 300);

    let route = flat();
    let mut ride = Ride::new(rider(), &workout.steps, &route).expect("Ride should start");
    assert_eq!(ride.status(), RideStatus::NotStarted);

    let ticks: Vec<_> = ride
        .by_ref()
        .collect::<Result<_, _>>()
        .expect("No tick should fail");

    assert_eq!(ticks.len() as u64, 300 * TICKS_PER_SECOND);
    assert_eq!(ride.status(), RideStatus::Finished);
    assert!(ticks
        .windows(2)
        .all(|pair| pair[1].distance_km >= pair[0].distance_km));
    assert!(ticks
        .windows(2)
        .all(|pair| pair[1].elapsed_seconds > pair[0].elapsed_seconds));

    let last = ticks.last().expect("Ride produced ticks");
    assert!((last.elapsed_seconds - 300.0).abs() < 1e-9);

    let summary = ride.summary().expect("Finished ride has a summary");
    assert_eq!(summary.distance_km, last.distance_km);
    assert!(summary.distance_km > 1.0);
}

#[test]
fn test_laps_match_distance() {
    let route = flat();
    let summary = ride(&["10min @ 90% FTP"], &route);

    let expected_laps = (summary.distance_km / route.lap().length()).floor() as usize;
    assert_eq!(summary.completed_laps(), expected_laps);
    assert!(expected_laps >= 5);

    for (position, lap) in summary.laps.iter().enumerate() {
        assert_eq!(lap.index, position + 1);
        assert!(!lap.lead_in);
        assert!((lap.elapsed_seconds + lap.remaining_seconds - 600.0).abs() < 1e-9);
    }
    assert!(summary
        .laps
        .windows(2)
        .all(|pair| pair[1].elapsed_seconds > pair[0].elapsed_seconds));
    assert!(summary.current_lap_fraction() < 1.0);
}

#[test]
fn test_zero_length_workout_rides_nothing() {
    let route = flat();
    let workout = parse_workout("Nothing", &["0sec @ 50% FTP"]).expect("Workout should parse");
    let mut ride = Ride::new(rider(), &workout.steps, &route).expect("Ride should start");

    assert!(ride.next().is_none());
    assert_eq!(ride.status(), RideStatus::Finished);

    let summary = ride.summary().expect("Finished ride has a summary");
    assert!(summary.laps.is_empty());
    assert_eq!(summary.distance_km, 0.0);
    assert_eq!(summary.elapsed_seconds, 0.0);
}

#[test]
fn test_climbing_route_is_slower() {
    let climb = route(&[(0.0, 0.0), (500.0, 25.0), (1000.0, 50.0)], SurfaceMix::road());
    let on_flat = ride(&["5min @ 80% FTP"], &flat());
    let on_climb = ride(&["5min @ 80% FTP"], &climb);

    assert!(on_climb.distance_km < on_flat.distance_km);
    assert!(on_climb.elevation_gain_m > 0.0);
    assert_eq!(on_flat.elevation_gain_m, 0.0);
}

#[test]
fn test_dirt_is_slower_than_road() {
    let dirt = SurfaceMix::new(BTreeMap::from([(SurfaceType::Dirt, 1.0)])).expect("Valid mix");
    let samples = [(0.0, 0.0), (250.0, 0.0), (500.0, 0.0)];

    let on_road = ride(&["5min @ 80% FTP"], &route(&samples, SurfaceMix::road()));
    let on_dirt = ride(&["5min @ 80% FTP"], &route(&samples, dirt));
    assert!(on_dirt.distance_km < on_road.distance_km);
}

#[test]
fn test_free_ride_holds_ftp() {
    let route = flat();
    let free = ride(&["5min free ride"], &route);
    let steady = ride(&["5min @ 100% FTP"], &route);
    assert!((free.distance_km - steady.distance_km).abs() < 1e-12);
}
