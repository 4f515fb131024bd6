//! Bikes, wheel sets and road surfaces.
//!
//! Equipment is described by in-game style ratings (aero and weight, higher is
//! better) and turned into the mass and drag numbers the physics model adds to
//! the rider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while selecting or fitting equipment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EquipmentError {
    /// Equipment of one kind offered for another kind's slot
    #[error("Cannot fit {found} into the {slot} slot")]
    TypeMismatch { slot: Slot, found: Slot },

    /// Name not found in the catalog
    #[error("Unknown equipment: {0}")]
    UnknownEquipment(String),

    /// Surface proportions out of range
    #[error("Invalid surface mix: {0}")]
    InvalidSurfaceMix(String),
}

/// Anything that adds mass and drag to a rider.
pub trait CyclingObject {
    /// Mass in kilograms.
    fn mass(&self) -> f64;

    /// Drag coefficient contribution.
    fn cd(&self) -> f64;
}

/// Road surface types
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceType {
    #[default]
    Road,
    Brick,
    Wood,
    Cobbles,
    Dirt,
    Gravel,
    Snow,
    Grass,
}

impl std::fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SurfaceType::Road => "road",
            SurfaceType::Brick => "brick",
            SurfaceType::Wood => "wood",
            SurfaceType::Cobbles => "cobbles",
            SurfaceType::Dirt => "dirt",
            SurfaceType::Gravel => "gravel",
            SurfaceType::Snow => "snow",
            SurfaceType::Grass => "grass",
        };
        write!(f, "{}", name)
    }
}

/// Share of a route ridden on each surface.
///
/// Proportions are between 0 and 1 and sum to at most 1. Whatever is not
/// assigned counts as road.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<SurfaceType, f64>", into = "BTreeMap<SurfaceType, f64>")]
pub struct SurfaceMix {
    shares: BTreeMap<SurfaceType, f64>,
}

/// Slack allowed when checking that proportions sum to 1.
const MIX_TOLERANCE: f64 = 1e-9;

impl SurfaceMix {
    /// All road.
    pub fn road() -> Self {
        Self::default()
    }

    /// Build a mix from surface proportions.
    pub fn new(shares: BTreeMap<SurfaceType, f64>) -> Result<Self, EquipmentError> {
        for (surface, share) in &shares {
            if !share.is_finite() || *share < 0.0 || *share > 1.0 {
                return Err(EquipmentError::InvalidSurfaceMix(format!(
                    "{} share {} is outside 0..=1",
                    surface, share
                )));
            }
        }
        let total: f64 = shares.values().sum();
        if total > 1.0 + MIX_TOLERANCE {
            return Err(EquipmentError::InvalidSurfaceMix(format!(
                "shares add up to {:.3}",
                total
            )));
        }
        Ok(Self { shares })
    }

    /// Explicitly assigned surfaces, zero shares included.
    pub fn shares(&self) -> impl Iterator<Item = (SurfaceType, f64)> + '_ {
        self.shares.iter().map(|(s, p)| (*s, *p))
    }

    /// Proportion not assigned to any surface, attributed to road.
    pub fn remainder(&self) -> f64 {
        (1.0 - self.shares.values().sum::<f64>()).max(0.0)
    }
}

impl TryFrom<BTreeMap<SurfaceType, f64>> for SurfaceMix {
    type Error = EquipmentError;

    fn try_from(shares: BTreeMap<SurfaceType, f64>) -> Result<Self, Self::Error> {
        Self::new(shares)
    }
}

impl From<SurfaceMix> for BTreeMap<SurfaceType, f64> {
    fn from(mix: SurfaceMix) -> Self {
        mix.shares
    }
}

/// Tyre family, which decides the rolling resistance on each surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WheelType {
    #[default]
    Road,
    Gravel,
    Mtb,
}

impl WheelType {
    /// Coefficient of rolling resistance on a surface.
    pub fn crr(self, surface: SurfaceType) -> f64 {
        use SurfaceType::*;
        match (self, surface) {
            (WheelType::Road, Road) => 0.004,
            (WheelType::Road, Brick) => 0.0055,
            (WheelType::Road, Wood) => 0.0065,
            (WheelType::Road, Cobbles) => 0.0065,
            (WheelType::Road, Dirt) => 0.025,
            (WheelType::Road, Gravel) => 0.018,
            (WheelType::Road, Snow) => 0.025,
            (WheelType::Road, Grass) => 0.042,

            (WheelType::Gravel, Road | Brick | Wood | Cobbles) => 0.008,
            (WheelType::Gravel, Dirt) => 0.018,
            (WheelType::Gravel, Gravel) => 0.012,
            (WheelType::Gravel, Snow) => 0.018,
            (WheelType::Gravel, Grass) => 0.033,

            (WheelType::Mtb, Road | Brick | Wood | Cobbles) => 0.01,
            (WheelType::Mtb, Dirt | Snow) => 0.014,
            (WheelType::Mtb, Gravel) => 0.012,
            (WheelType::Mtb, Grass) => 0.018,
        }
    }

    /// Rolling resistance weighted by a surface mix.
    pub fn weighted_crr(self, mix: &SurfaceMix) -> f64 {
        let assigned: f64 = mix
            .shares()
            .filter(|(_, share)| *share != 0.0)
            .map(|(surface, share)| self.crr(surface) * share)
            .sum();
        assigned + self.crr(SurfaceType::Road) * mix.remainder()
    }
}

/// A bike frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bike {
    /// Aero rating
    pub aero: u8,
    /// Weight rating (higher is lighter)
    pub weight: u8,
}

impl Bike {
    /// Frontal area added by any bike, in m².
    pub const FRONTAL_AREA: f64 = 0.1647;

    pub fn new(aero: u8, weight: u8) -> Self {
        Self { aero, weight }
    }

    /// Look up a bike by catalog name.
    pub fn from_catalog(name: &str) -> Result<Self, EquipmentError> {
        BIKE_CATALOG
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| Self::new(entry.aero, entry.weight))
            .ok_or_else(|| EquipmentError::UnknownEquipment(name.to_string()))
    }

    pub fn frontal_area(&self) -> f64 {
        Self::FRONTAL_AREA
    }
}

impl CyclingObject for Bike {
    fn mass(&self) -> f64 {
        9.0 - f64::from(self.weight)
    }

    fn cd(&self) -> f64 {
        0.0874 - 0.008 * f64::from(self.aero)
    }
}

/// A pair of wheels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelSet {
    /// Aero rating
    pub aero: u8,
    /// Weight rating (higher is lighter)
    pub weight: u8,
    /// Tyre family
    #[serde(default)]
    pub wheel_type: WheelType,
}

impl WheelSet {
    pub fn new(aero: u8, weight: u8, wheel_type: WheelType) -> Self {
        Self {
            aero,
            weight,
            wheel_type,
        }
    }

    /// Road wheels with the given ratings.
    pub fn road(aero: u8, weight: u8) -> Self {
        Self::new(aero, weight, WheelType::Road)
    }

    /// Look up a wheel set by catalog name.
    pub fn from_catalog(name: &str) -> Result<Self, EquipmentError> {
        WHEEL_CATALOG
            .iter()
            .find(|entry| entry.name.eq_ignore_ascii_case(name))
            .map(|entry| Self::road(entry.aero, entry.weight))
            .ok_or_else(|| EquipmentError::UnknownEquipment(name.to_string()))
    }

    /// Effective rolling resistance over a surface mix.
    pub fn crr(&self, mix: &SurfaceMix) -> f64 {
        self.wheel_type.weighted_crr(mix)
    }
}

impl CyclingObject for WheelSet {
    fn mass(&self) -> f64 {
        2.2 - f64::from(self.weight) * 0.2
    }

    fn cd(&self) -> f64 {
        0.1801 - 0.0186 * f64::from(self.aero)
    }
}

/// Where a piece of equipment goes on the rider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Bike,
    Wheels,
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Slot::Bike => write!(f, "bike"),
            Slot::Wheels => write!(f, "wheels"),
        }
    }
}

/// Any attachable piece of equipment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Equipment {
    Bike(Bike),
    Wheels(WheelSet),
}

impl Equipment {
    /// The slot this equipment fits.
    pub fn slot(&self) -> Slot {
        match self {
            Equipment::Bike(_) => Slot::Bike,
            Equipment::Wheels(_) => Slot::Wheels,
        }
    }
}

impl CyclingObject for Equipment {
    fn mass(&self) -> f64 {
        match self {
            Equipment::Bike(b) => b.mass(),
            Equipment::Wheels(w) => w.mass(),
        }
    }

    fn cd(&self) -> f64 {
        match self {
            Equipment::Bike(b) => b.cd(),
            Equipment::Wheels(w) => w.cd(),
        }
    }
}

/// A named catalog entry.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub aero: u8,
    pub weight: u8,
}

impl CatalogEntry {
    const fn new(name: &'static str, aero: u8, weight: u8) -> Self {
        Self { name, aero, weight }
    }
}

/// Known frames.
pub const BIKE_CATALOG: &[CatalogEntry] = &[
    CatalogEntry::new("emonda", 2, 4),
    CatalogEntry::new("canyon", 2, 4),
    CatalogEntry::new("nuclear", 3, 3),
];

/// Known road wheel sets.
pub const WHEEL_CATALOG: &[CatalogEntry] = &[
    CatalogEntry::new("meilensteins", 3, 4),
    CatalogEntry::new("dt_swiss", 4, 3),
    CatalogEntry::new("cadex", 4, 3),
    CatalogEntry::new("enve", 4, 3),
];
