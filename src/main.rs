//! Ridecast - Workout Estimation on Virtual Cycling Routes
//!
//! Main entry point. Takes an optional scenario file path, otherwise reads
//! `scenario.toml` from the data directory.

use std::path::PathBuf;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ridecast::ride::{Ride, TICKS_PER_SECOND};
use ridecast::storage::config::{get_scenario_path, load_scenario};

fn format_clock(seconds: f64) -> String {
    let whole = seconds.round() as u64;
    format!("{}m{}s", whole / 60, whole % 60)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Ridecast v{}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(get_scenario_path);
    let scenario = load_scenario(&path)
        .with_context(|| format!("Failed to load scenario {}", path.display()))?;
    let profile = &scenario.rider;

    let rider = profile
        .build_rider()
        .context("Failed to fit rider equipment")?;
    tracing::info!("Rider {}: {}", profile.name, rider);

    let workout = scenario
        .workout
        .build(rider.ftp())
        .with_context(|| format!("Failed to parse workout '{}'", scenario.workout.name))?;
    tracing::info!(
        "Workout '{}': {} intervals, {}",
        workout.name,
        workout.intervals.len(),
        format_clock(f64::from(workout.total_duration_seconds))
    );
    if let (Some(tss), Some(intensity)) = (workout.estimated_tss, workout.estimated_if) {
        tracing::info!("Estimated TSS {:.0}, IF {:.2}", tss, intensity);
    }

    let route = scenario
        .route
        .build()
        .with_context(|| format!("Failed to build route '{}'", scenario.route.name))?;
    tracing::info!(
        "Route '{}': {:.2}km lap with {:.0}m climbing{}",
        route.name(),
        route.lap().length(),
        route.lap().elevation_gain(),
        if route.has_lead_in() {
            format!(", {:.2}km lead-in", route.lead_in().length())
        } else {
            String::new()
        }
    );

    let report_every = u64::from(scenario.simulation.report_interval_seconds) * TICKS_PER_SECOND;
    let mut ride = Ride::with_options(
        rider,
        &workout.steps,
        &route,
        scenario.simulation.ride_options(),
    )?;

    for (index, tick) in ride.by_ref().enumerate() {
        let tick = tick?;
        if report_every > 0 && (index as u64 + 1) % report_every == 0 {
            let (speed, speed_unit) = profile.convert_speed(tick.velocity_mps * 3.6);
            let (distance, distance_unit) = profile.convert_distance(tick.distance_km);
            tracing::info!(
                "t={} v={:.2}{} d={:.2}{} climbed={:.0}m",
                format_clock(tick.elapsed_seconds),
                speed,
                speed_unit,
                distance,
                distance_unit,
                tick.elevation_gain_m
            );
        }
    }

    if let Some(summary) = ride.summary() {
        let (distance, unit) = profile.convert_distance(summary.distance_km);
        tracing::info!(
            "{} laps in {}: {:.2}{} and {:.0}m climbed",
            summary.completed_laps(),
            format_clock(summary.elapsed_seconds),
            distance,
            unit,
            summary.elevation_gain_m
        );
    }

    Ok(())
}
