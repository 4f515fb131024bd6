//! Integration tests for ridecast.

mod ride_simulation_test;
mod scenario_config_test;
