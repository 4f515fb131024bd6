//! Unit tests for rider physics and equipment.

use std::collections::BTreeMap;

use ridecast::world::equipment::{
    Bike, CyclingObject, Equipment, EquipmentError, Slot, SurfaceMix, SurfaceType, WheelSet,
};
use ridecast::world::physics::{Rider, AIR_DENSITY};

const DT: f64 = 0.1;

fn equipped_rider() -> Rider {
    let mut rider = Rider::new(90.0, 180.0, 256);
    rider.set_bike(Bike::from_catalog("emonda").expect("emonda is in the catalog"));
    rider.set_wheels(WheelSet::from_catalog("dt_swiss").expect("dt_swiss is in the catalog"));
    rider
}

#[test]
fn test_velocity_converges_to_sustained_speed() {
    let surfaces = SurfaceMix::road();
    let target_velocity = 10.0;
    let watts = equipped_rider()
        .with_velocity(target_velocity)
        .sustaining_power(0.0, &surfaces);

    for start in [0.0, 6.0, 14.0] {
        let mut rider = equipped_rider().with_velocity(start);
        for _ in 0..5000 {
            rider.apply_watts(watts, 0.0, DT, &surfaces);
        }
        assert!(
            (rider.velocity() - target_velocity).abs() < 1e-6,
            "Starting at {start} m/s settled at {} m/s",
            rider.velocity()
        );
    }
}

#[test]
fn test_sustaining_power_at_constant_speed_keeps_speed() {
    let surfaces = SurfaceMix::road();
    let mut rider = equipped_rider().with_velocity(8.0);
    let watts = rider.sustaining_power(0.03, &surfaces);
    let v = rider.apply_watts(watts, 0.03, DT, &surfaces);
    assert!((v - 8.0).abs() < 1e-12);
}

#[test]
fn test_drag_term() {
    let rider = equipped_rider().with_velocity(10.0);
    // Flat road with no rolling resistance leaves only drag.
    let expected = rider.cd() * rider.frontal_area() * 100.0 * AIR_DENSITY / 2.0 * 10.0;
    let rolling = 9.8067 * rider.mass() * rider.crr(&SurfaceMix::road()) * 10.0;
    let total = rider.sustaining_power(0.0, &SurfaceMix::road());
    assert!((total - (expected + rolling)).abs() < 1e-9);
}

#[test]
fn test_frontal_area_formula() {
    let mut rider = Rider::new(75.0, 180.0, 250);
    let body = 0.0276 * 1.8f64.powf(0.725) * 75.0f64.powf(0.425);
    assert!((rider.frontal_area() - body).abs() < 1e-12);

    rider.set_bike(Bike::new(2, 4));
    let body = 0.0276 * 1.8f64.powf(0.725) * 80.0f64.powf(0.425);
    assert!((rider.frontal_area() - (body + 0.1647)).abs() < 1e-12);
}

#[test]
fn test_attach_then_detach_is_reversible() {
    let mut rider = Rider::new(68.0, 172.0, 240);
    let (mass, cd) = (rider.mass(), rider.cd());

    rider
        .attach(Slot::Bike, Equipment::Bike(Bike::new(3, 3)))
        .expect("Bike fits the bike slot");
    assert!(rider.mass() > mass);
    assert!(rider.cd() > cd);

    let removed = rider.detach(Slot::Bike);
    assert_eq!(removed, Some(Equipment::Bike(Bike::new(3, 3))));
    assert_eq!(rider.mass(), mass);
    assert_eq!(rider.cd(), cd);
}

#[test]
fn test_attach_replaces_previous_component() {
    let mut rider = Rider::new(68.0, 172.0, 240);
    let light = Bike::new(2, 4);
    let heavy = Bike::new(2, 1);

    rider.attach(Slot::Bike, Equipment::Bike(heavy)).unwrap();
    let previous = rider.attach(Slot::Bike, Equipment::Bike(light)).unwrap();

    assert_eq!(previous, Some(Equipment::Bike(heavy)));
    assert!((rider.mass() - (68.0 + light.mass())).abs() < 1e-12);
}

#[test]
fn test_attach_wheels_as_bike_fails() {
    let mut rider = Rider::new(68.0, 172.0, 240);
    let result = rider.attach(Slot::Bike, Equipment::Wheels(WheelSet::road(4, 3)));
    assert!(matches!(
        result,
        Err(EquipmentError::TypeMismatch {
            slot: Slot::Bike,
            found: Slot::Wheels
        })
    ));
}

#[test]
fn test_rough_surface_slows_rider() {
    let dirt = SurfaceMix::new(BTreeMap::from([(SurfaceType::Dirt, 1.0)])).unwrap();
    let road = SurfaceMix::road();

    let mut on_road = equipped_rider();
    let mut on_dirt = equipped_rider();
    for _ in 0..600 {
        on_road.apply_watts(200.0, 0.0, DT, &road);
        on_dirt.apply_watts(200.0, 0.0, DT, &dirt);
    }
    assert!(on_dirt.velocity() < on_road.velocity());
}

#[test]
fn test_climb_without_power_stops_rider() {
    let mut rider = equipped_rider().with_velocity(3.0);
    for _ in 0..100 {
        rider.apply_watts(0.0, 0.1, DT, &SurfaceMix::road());
    }
    assert_eq!(rider.velocity(), 0.0);
}
