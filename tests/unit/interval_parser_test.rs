//! Unit tests for the interval text parser.

use ridecast::workouts::parser::{parse_interval, parse_workout};
use ridecast::workouts::types::{Interval, IntervalKind, WorkoutParseError, WorkoutStep};

const FTP: u16 = 250;

#[test]
fn test_parse_steady() {
    let interval = parse_interval("10min @ 75% FTP").expect("Should parse steady interval");

    match interval {
        Interval::Steady(steady) => {
            assert_eq!(steady.duration_seconds(), 600);
            assert!((steady.pct_ftp() - 0.75).abs() < 1e-12);
            assert_eq!(steady.cadence(), None);
        }
        other => panic!("Expected steady interval, got {other:?}"),
    }
}

#[test]
fn test_parse_set() {
    let interval =
        parse_interval("3x 1min @ 90% FTP, 1min @ 50% FTP").expect("Should parse set interval");

    assert_eq!(interval.duration_seconds(), 360);
    let Interval::Set(set) = &interval else {
        panic!("Expected set interval, got {interval:?}");
    };
    assert_eq!(set.reps(), 3);
    assert_eq!(set.children().len(), 2);

    let targets: Vec<f64> = set.children().iter().map(|c| c.target(FTP)).collect();
    assert_eq!(targets, vec![225.0, 125.0]);
}

#[test]
fn test_set_expands_to_repeated_children() {
    let interval = parse_interval("4x 30sec @ 120% FTP, 30sec @ 40% FTP, 1min free ride")
        .expect("Should parse set interval");
    let Interval::Set(set) = &interval else {
        panic!("Expected set interval, got {interval:?}");
    };

    let block: Vec<WorkoutStep> = set.children().iter().flat_map(Interval::expand).collect();
    let steps = interval.expand();

    assert_eq!(steps.len(), 4 * block.len());
    for (i, step) in steps.iter().enumerate() {
        assert_eq!(step, &block[i % block.len()]);
    }
}

#[test]
fn test_parse_ramp() {
    let interval = parse_interval("5min from 50 to 100% FTP").expect("Should parse ramp");
    assert_eq!(interval.kind(), IntervalKind::Ramp);

    let steps = interval.expand();
    assert_eq!(steps.len(), 20);
    assert!((steps[0].target(FTP) - 125.0).abs() < 1e-9);
    assert!((steps[19].target(FTP) - 250.0).abs() < 1e-9);
    assert!(steps
        .windows(2)
        .all(|w| w[1].target(FTP) > w[0].target(FTP)));
    assert_eq!(
        steps.iter().map(WorkoutStep::duration_seconds).sum::<u32>(),
        300
    );
}

#[test]
fn test_parse_ramp_with_cadence() {
    let interval =
        parse_interval("3min @ 90rpm, from 60 to 80% FTP").expect("Should parse ramp with cadence");
    match interval {
        Interval::Ramp(ramp) => {
            assert_eq!(ramp.cadence(), Some(90));
            assert_eq!(ramp.duration_seconds(), 180);
        }
        other => panic!("Expected ramp, got {other:?}"),
    }
}

#[test]
fn test_parse_ramp_down() {
    let interval = parse_interval("1min 15sec from 75% to 25% FTP").expect("Should parse ramp");
    let steps = interval.expand();
    assert_eq!(steps.len(), 5);
    assert!(steps[0].target(200) > steps[4].target(200));
}

#[test]
fn test_parse_free_ride_with_cadence() {
    let interval = parse_interval("10min @ 85rpm free ride").expect("Should parse free ride");
    match interval {
        Interval::FreeRide(free) => {
            assert_eq!(free.duration_seconds(), 600);
            assert_eq!(free.cadence(), Some(85));
        }
        other => panic!("Expected free ride, got {other:?}"),
    }
}

#[test]
fn test_parse_nested_set() {
    let interval = parse_interval("2x 3x 30sec @ 120% FTP").expect("Should parse nested set");
    assert_eq!(interval.duration_seconds(), 180);
    assert_eq!(interval.expand().len(), 6);
}

#[test]
fn test_bad_set_child_reports_offending_text() {
    let result = parse_interval("3x 1min @ 90% FTP, sprint!");
    match result {
        Err(WorkoutParseError::MalformedInterval { text, .. }) => assert_eq!(text, "sprint!"),
        other => panic!("Expected MalformedInterval, got {other:?}"),
    }
}

#[test]
fn test_missing_time_in_set_child() {
    let result = parse_interval("2x 1min @ 90% FTP, @ 50% FTP");
    assert!(matches!(result, Err(WorkoutParseError::MissingDuration(_))));
}

#[test]
fn test_parse_workout_totals() {
    let lines = [
        "10min from 25 to 75% FTP",
        "3x 5min @ 85% FTP, 2min @ 55% FTP",
        "5min free ride",
    ];
    let mut workout = parse_workout("Tempo Builder", &lines).expect("Should parse workout");

    assert_eq!(workout.name, "Tempo Builder");
    assert_eq!(workout.intervals.len(), 3);
    assert_eq!(workout.total_duration_seconds, 600 + 3 * 420 + 300);
    assert_eq!(
        workout
            .steps
            .iter()
            .map(WorkoutStep::duration_seconds)
            .sum::<u32>(),
        workout.total_duration_seconds
    );

    workout.calculate_estimates(FTP);
    let intensity = workout.estimated_if.expect("IF should be estimated");
    assert!(intensity > 0.5 && intensity < 0.9);
}
