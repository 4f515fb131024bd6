//! Scenario and profile files on disk.

use ridecast::ride::{Ride, RideStatus};
use ridecast::storage::{
    load_profile, load_scenario, save_profile, ConfigError, RiderProfile, Units,
};

const SCENARIO: &str = r#"
[rider]
name = "Sam"
ftp = 256
mass_kg = 90.0
height_cm = 180.0
bike = "emonda"
wheels = "dt_swiss"

[workout]
name = "Tempo"
description = "Short ramp into tempo"
intervals = ["2min from 25 to 75% FTP", "", "2x 1min @ 85% FTP, 30sec @ 55% FTP"]

[route]
name = "Hilly Loop"
surfaces = { brick = 0.05 }
lead_in = [[[0.0, 5.0], [300.0, 10.0]]]
lap = [[[0.0, 10.0], [450.0, 22.0], [900.0, 10.0]]]

[simulation]
max_segment_advance = 20
report_interval_seconds = 0
"#;

#[test]
fn test_scenario_file_rides_to_completion() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = dir.path().join("scenario.toml");
    std::fs::write(&path, SCENARIO).expect("Should write scenario");

    let scenario = load_scenario(&path).expect("Should load scenario");
    assert_eq!(scenario.simulation.report_interval_seconds, 0);

    let rider = scenario.rider.build_rider().expect("Should fit equipment");
    let workout = scenario
        .workout
        .build(scenario.rider.ftp)
        .expect("Should parse workout");
    assert_eq!(workout.total_duration_seconds, 120 + 180);
    assert_eq!(workout.description.as_deref(), Some("Short ramp into tempo"));

    let route = scenario.route.build().expect("Should build route");
    assert!(route.has_lead_in());

    let mut ride = Ride::with_options(
        rider,
        &workout.steps,
        &route,
        scenario.simulation.ride_options(),
    )
    .expect("Ride should start");
    let summary = ride.run_to_completion().expect("Ride should finish");

    assert_eq!(ride.status(), RideStatus::Finished);
    assert!((summary.elapsed_seconds - 300.0).abs() < 1e-9);
    assert!(summary.laps.first().map_or(true, |lap| lap.lead_in));
    assert!(summary.elevation_gain_m >= 5.0);
}

#[test]
fn test_missing_scenario_is_an_error() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let result = load_scenario(&dir.path().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::IoError(_))));
}

#[test]
fn test_scenario_with_invalid_rider_is_rejected() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = dir.path().join("scenario.toml");
    std::fs::write(&path, SCENARIO.replace("ftp = 256", "ftp = 20")).expect("Should write");

    assert!(matches!(
        load_scenario(&path),
        Err(ConfigError::InvalidProfile(_))
    ));
}

#[test]
fn test_malformed_scenario_is_a_parse_error() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = dir.path().join("scenario.toml");
    std::fs::write(&path, "[workout]\nname = 3\n").expect("Should write");

    assert!(matches!(load_scenario(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn test_profile_round_trip() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let path = dir.path().join("nested").join("profile.toml");

    let mut profile = RiderProfile::new("Robin".to_string());
    profile.set_ftp(280).expect("FTP in range");
    profile.bike = Some("canyon".to_string());
    profile.units = Units::Imperial;

    save_profile(&path, &profile).expect("Should save profile");
    let loaded = load_profile(&path).expect("Should load profile");
    assert_eq!(loaded, profile);
}

#[test]
fn test_missing_profile_uses_defaults() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let loaded = load_profile(&dir.path().join("profile.toml")).expect("Should fall back");
    assert_eq!(loaded, RiderProfile::default());
}
