//! Storage module for configuration files.

pub mod config;

pub use config::{
    load_profile, load_scenario, save_profile, save_scenario, ConfigError, RiderProfile,
    RouteConfig, ScenarioConfig, SimulationConfig, Units, WorkoutConfig,
};
