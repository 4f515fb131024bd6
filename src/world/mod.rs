//! Virtual world model
//!
//! Everything the simulated rider interacts with: equipment, the physics of
//! turning power into speed, and the routes being ridden.

pub mod equipment;
pub mod physics;
pub mod route;

pub use equipment::{
    Bike, CyclingObject, Equipment, EquipmentError, Slot, SurfaceMix, SurfaceType, WheelSet,
    WheelType,
};
pub use physics::Rider;
pub use route::{Lap, LapBoundary, Point, Route, RouteCursor, RouteError, Segment};
