//! Rider profile and ride scenario configuration.
//!
//! A scenario file describes everything one simulation needs:
//!
//! ```toml
//! [rider]
//! name = "Sam"
//! ftp = 256
//! mass_kg = 90.0
//! height_cm = 180.0
//! bike = "emonda"
//! wheels = "dt_swiss"
//!
//! [workout]
//! name = "Tempo"
//! intervals = ["10min from 25 to 75% FTP", "3x 5min @ 85% FTP, 2min @ 55% FTP"]
//!
//! [route]
//! name = "Hilly Loop"
//! surfaces = { brick = 0.05 }
//! lap = [[[0.0, 10.0], [450.0, 22.0], [900.0, 10.0]]]
//!
//! [simulation]
//! max_segment_advance = 20
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::ride::types::{RideOptions, DEFAULT_MAX_SEGMENT_ADVANCE};
use crate::workouts::parser::{parse_workout_with, ParseOptions};
use crate::workouts::types::{Workout, WorkoutParseError};
use crate::world::equipment::{Bike, EquipmentError, SurfaceMix, WheelSet};
use crate::world::physics::Rider;
use crate::world::route::{Lap, Point, Route, RouteError};

/// Unit system preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Metric units (km/h, kg, km)
    #[default]
    Metric,
    /// Imperial units (mph, lbs, miles)
    Imperial,
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Units::Metric => write!(f, "Metric"),
            Units::Imperial => write!(f, "Imperial"),
        }
    }
}

/// Rider body data, equipment choice and preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiderProfile {
    /// Display name
    pub name: String,
    /// Functional Threshold Power in watts (50-600)
    pub ftp: u16,
    /// Body mass in kilograms (30-200)
    pub mass_kg: f64,
    /// Height in centimeters (100-230)
    pub height_cm: f64,
    /// Bike catalog name
    pub bike: Option<String>,
    /// Wheel set catalog name
    pub wheels: Option<String>,
    /// Unit preference
    pub units: Units,
}

impl Default for RiderProfile {
    fn default() -> Self {
        Self {
            name: "Cyclist".to_string(),
            ftp: 200,
            mass_kg: 75.0,
            height_cm: 175.0,
            bike: None,
            wheels: None,
            units: Units::Metric,
        }
    }
}

impl RiderProfile {
    /// Create a new profile with the given name.
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Update FTP.
    pub fn set_ftp(&mut self, ftp: u16) -> Result<(), ConfigError> {
        if !Self::validate_ftp(ftp) {
            return Err(ConfigError::InvalidProfile(
                "FTP must be between 50 and 600 watts".to_string(),
            ));
        }
        self.ftp = ftp;
        Ok(())
    }

    /// Validate FTP value (50-600 watts).
    pub fn validate_ftp(ftp: u16) -> bool {
        (50..=600).contains(&ftp)
    }

    /// Validate mass value (30-200 kg).
    pub fn validate_mass(mass_kg: f64) -> bool {
        (30.0..=200.0).contains(&mass_kg)
    }

    /// Validate height value (100-230 cm).
    pub fn validate_height(height_cm: f64) -> bool {
        (100.0..=230.0).contains(&height_cm)
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !Self::validate_ftp(self.ftp) {
            return Err(ConfigError::InvalidProfile(format!(
                "FTP {} is outside 50-600 watts",
                self.ftp
            )));
        }
        if !Self::validate_mass(self.mass_kg) {
            return Err(ConfigError::InvalidProfile(format!(
                "Mass {} is outside 30-200 kg",
                self.mass_kg
            )));
        }
        if !Self::validate_height(self.height_cm) {
            return Err(ConfigError::InvalidProfile(format!(
                "Height {} is outside 100-230 cm",
                self.height_cm
            )));
        }
        Ok(())
    }

    /// Build a rider with the profile's equipment fitted.
    pub fn build_rider(&self) -> Result<Rider, EquipmentError> {
        let mut rider = Rider::new(self.mass_kg, self.height_cm, self.ftp);
        if let Some(name) = &self.bike {
            rider.set_bike(Bike::from_catalog(name)?);
        }
        if let Some(name) = &self.wheels {
            rider.set_wheels(WheelSet::from_catalog(name)?);
        }
        Ok(rider)
    }

    /// Convert mass to the preferred units.
    pub fn display_mass(&self) -> (f64, &'static str) {
        match self.units {
            Units::Metric => (self.mass_kg, "kg"),
            Units::Imperial => (self.mass_kg * 2.20462, "lbs"),
        }
    }

    /// Convert speed to the preferred units.
    pub fn convert_speed(&self, speed_kmh: f64) -> (f64, &'static str) {
        match self.units {
            Units::Metric => (speed_kmh, "km/h"),
            Units::Imperial => (speed_kmh * 0.621371, "mph"),
        }
    }

    /// Convert distance to the preferred units.
    pub fn convert_distance(&self, distance_km: f64) -> (f64, &'static str) {
        match self.units {
            Units::Metric => (distance_km, "km"),
            Units::Imperial => (distance_km * 0.621371, "mi"),
        }
    }
}

/// Workout text to ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// One interval per entry
    pub intervals: Vec<String>,
    /// Round steady targets to 5 W
    #[serde(default)]
    pub round_to_5: bool,
    /// Intervals are written in watts instead of %FTP
    #[serde(default)]
    pub watts: bool,
}

impl WorkoutConfig {
    /// Parse the intervals for a rider with the given FTP.
    pub fn build(&self, ftp: u16) -> Result<Workout, WorkoutParseError> {
        let options = ParseOptions {
            round_to_5: self.round_to_5,
            watts_ftp: self.watts.then_some(ftp),
        };
        let mut workout = parse_workout_with(&self.name, self.intervals.as_slice(), &options)?;
        workout.description = self.description.clone();
        workout.calculate_estimates(ftp);
        Ok(workout)
    }
}

/// A run of `[distance_m, elevation_m]` samples.
pub type SampleRun = Vec<[f64; 2]>;

/// Route samples and surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    /// Surface mix of the lap
    #[serde(default)]
    pub surfaces: SurfaceMix,
    /// Surface mix while on the lead-in, if it differs
    #[serde(default)]
    pub lead_in_surfaces: Option<SurfaceMix>,
    /// Lead-in sample runs, ridden once
    #[serde(default)]
    pub lead_in: Vec<SampleRun>,
    /// Lap sample runs, ridden repeatedly
    pub lap: Vec<SampleRun>,
}

fn to_points(runs: &[SampleRun]) -> Vec<Vec<Point>> {
    runs.iter()
        .map(|run| run.iter().copied().map(Point::from).collect())
        .collect()
}

impl RouteConfig {
    /// Turn the samples into a route.
    pub fn build(&self) -> Result<Route, RouteError> {
        let lap = Lap::from_runs(&to_points(&self.lap))?;
        let lead_in = if self.lead_in.is_empty() {
            None
        } else {
            Some(Lap::from_runs(&to_points(&self.lead_in))?)
        };

        let route = Route::new(self.name.clone(), lead_in, lap, self.surfaces.clone())?;
        Ok(match &self.lead_in_surfaces {
            Some(surfaces) => route.with_lead_in_surfaces(surfaces.clone()),
            None => route,
        })
    }
}

/// Simulation loop settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Segments the route may advance in one tick before aborting
    pub max_segment_advance: usize,
    /// How often to log progress, in simulated seconds (0 disables)
    pub report_interval_seconds: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_segment_advance: DEFAULT_MAX_SEGMENT_ADVANCE,
            report_interval_seconds: 60,
        }
    }
}

impl SimulationConfig {
    pub fn ride_options(&self) -> RideOptions {
        RideOptions {
            max_segment_advance: self.max_segment_advance,
        }
    }
}

/// Everything needed for one simulated ride.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub rider: RiderProfile,
    pub workout: WorkoutConfig,
    pub route: RouteConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "ridecast", "Ridecast")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the default scenario file path.
pub fn get_scenario_path() -> PathBuf {
    get_data_dir().join("scenario.toml")
}

/// Get the rider profile file path.
pub fn get_profile_path() -> PathBuf {
    get_data_dir().join("profile.toml")
}

/// Load a scenario file.
pub fn load_scenario(path: &Path) -> Result<ScenarioConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let scenario: ScenarioConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    scenario.rider.validate()?;

    tracing::debug!("Loaded scenario from {}", path.display());
    Ok(scenario)
}

/// Save a scenario file, creating parent directories.
pub fn save_scenario(path: &Path, scenario: &ScenarioConfig) -> Result<(), ConfigError> {
    write_toml(path, scenario)
}

/// Load the rider profile, falling back to defaults when none is saved.
pub fn load_profile(path: &Path) -> Result<RiderProfile, ConfigError> {
    if !path.exists() {
        return Ok(RiderProfile::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
    let profile: RiderProfile =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    profile.validate()?;
    Ok(profile)
}

/// Save the rider profile.
pub fn save_profile(path: &Path, profile: &RiderProfile) -> Result<(), ConfigError> {
    profile.validate()?;
    write_toml(path, profile)
}

fn write_toml<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(value).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),
}
