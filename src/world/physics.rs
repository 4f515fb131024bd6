//! Rider physics for power-to-speed integration
//!
//! A [`Rider`] is a body plus optional bike and wheels. Each tick the power
//! the rider puts out is compared against the power needed to hold the
//! current speed, and the difference changes the rider's kinetic energy.

use crate::world::equipment::{
    Bike, CyclingObject, Equipment, EquipmentError, Slot, SurfaceMix, WheelSet, WheelType,
};

/// Physics constants
pub const GRAVITY: f64 = 9.8067; // m/s²
pub const AIR_DENSITY: f64 = 1.225; // kg/m³ at sea level

/// Drag coefficient of the rider's body
const RIDER_CD: f64 = 0.5;

/// A rider with optional equipment and a current velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct Rider {
    body_mass_kg: f64,
    height_cm: f64,
    ftp: u16,
    bike: Option<Bike>,
    wheels: Option<WheelSet>,
    velocity: f64,
}

impl Rider {
    /// Create a rider at rest with no equipment.
    pub fn new(body_mass_kg: f64, height_cm: f64, ftp: u16) -> Self {
        Self {
            body_mass_kg,
            height_cm,
            ftp,
            bike: None,
            wheels: None,
            velocity: 0.0,
        }
    }

    pub fn ftp(&self) -> u16 {
        self.ftp
    }

    pub fn height_cm(&self) -> f64 {
        self.height_cm
    }

    pub fn body_mass_kg(&self) -> f64 {
        self.body_mass_kg
    }

    /// Current speed in m/s.
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Start from a given speed instead of standing still.
    pub fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity.max(0.0);
        self
    }

    pub fn bike(&self) -> Option<&Bike> {
        self.bike.as_ref()
    }

    pub fn wheels(&self) -> Option<&WheelSet> {
        self.wheels.as_ref()
    }

    /// Fit a bike, returning the one it replaces.
    pub fn set_bike(&mut self, bike: Bike) -> Option<Bike> {
        self.bike.replace(bike)
    }

    /// Fit wheels, returning the ones they replace.
    pub fn set_wheels(&mut self, wheels: WheelSet) -> Option<WheelSet> {
        self.wheels.replace(wheels)
    }

    /// Fit equipment into a named slot.
    ///
    /// Fails with [`EquipmentError::TypeMismatch`] when the equipment does not
    /// belong in that slot. Returns whatever was in the slot before.
    pub fn attach(
        &mut self,
        slot: Slot,
        equipment: Equipment,
    ) -> Result<Option<Equipment>, EquipmentError> {
        let previous = match (slot, equipment) {
            (Slot::Bike, Equipment::Bike(bike)) => self.set_bike(bike).map(Equipment::Bike),
            (Slot::Wheels, Equipment::Wheels(wheels)) => {
                self.set_wheels(wheels).map(Equipment::Wheels)
            }
            (slot, other) => {
                return Err(EquipmentError::TypeMismatch {
                    slot,
                    found: other.slot(),
                })
            }
        };
        tracing::debug!("Fitted {} ({:.2} kg total)", slot, self.mass());
        Ok(previous)
    }

    /// Remove whatever is in a slot.
    pub fn detach(&mut self, slot: Slot) -> Option<Equipment> {
        match slot {
            Slot::Bike => self.bike.take().map(Equipment::Bike),
            Slot::Wheels => self.wheels.take().map(Equipment::Wheels),
        }
    }

    /// Frontal area in m², from height and total mass plus the bike.
    pub fn frontal_area(&self) -> f64 {
        let body = 0.0276 * (self.height_cm / 100.0).powf(0.725) * self.mass().powf(0.425);
        body + self.bike.map_or(0.0, |b| b.frontal_area())
    }

    /// Rolling resistance coefficient over a surface mix.
    ///
    /// Without wheels fitted the stock road tyre table is used.
    pub fn crr(&self, surfaces: &SurfaceMix) -> f64 {
        match &self.wheels {
            Some(wheels) => wheels.crr(surfaces),
            None => WheelType::Road.weighted_crr(surfaces),
        }
    }

    fn rolling_force(&self, gradient: f64, surfaces: &SurfaceMix) -> f64 {
        GRAVITY * gradient.atan().cos() * self.mass() * self.crr(surfaces)
    }

    fn gravity_force(&self, gradient: f64) -> f64 {
        GRAVITY * gradient.atan().sin() * self.mass()
    }

    fn drag_force(&self) -> f64 {
        self.cd() * self.frontal_area() * self.velocity * self.velocity * AIR_DENSITY / 2.0
    }

    /// Power in watts needed to hold the current velocity.
    ///
    /// `gradient` is rise over run; positive is uphill.
    pub fn sustaining_power(&self, gradient: f64, surfaces: &SurfaceMix) -> f64 {
        let forces =
            self.rolling_force(gradient, surfaces) + self.gravity_force(gradient) + self.drag_force();
        forces * self.velocity
    }

    /// Apply `watts` for `dt` seconds and return the new velocity.
    ///
    /// Surplus power over [`Self::sustaining_power`] goes into kinetic energy.
    /// When the deficit would take the kinetic energy below zero the rider
    /// simply stops.
    pub fn apply_watts(&mut self, watts: f64, gradient: f64, dt: f64, surfaces: &SurfaceMix) -> f64 {
        let needed = self.sustaining_power(gradient, surfaces);
        let v_squared =
            self.velocity * self.velocity + 2.0 * (watts - needed) * dt / self.mass();
        self.velocity = v_squared.max(0.0).sqrt();
        self.velocity
    }

    /// Bring the rider to a stop.
    pub fn reset(&mut self) -> &mut Self {
        self.velocity = 0.0;
        self
    }
}

impl CyclingObject for Rider {
    /// Body plus fitted equipment.
    fn mass(&self) -> f64 {
        self.body_mass_kg
            + self.bike.map_or(0.0, |b| b.mass())
            + self.wheels.map_or(0.0, |w| w.mass())
    }

    fn cd(&self) -> f64 {
        RIDER_CD + self.bike.map_or(0.0, |b| b.cd()) + self.wheels.map_or(0.0, |w| w.cd())
    }
}

impl std::fmt::Display for Rider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}kg ftp={}w", self.mass(), self.ftp)
    }
}
