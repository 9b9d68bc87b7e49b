//! Test fixtures and helpers.
//!
//! Pre-built game states and entity configurations
//! for consistent testing.

use bulwark_core::components::FactionId;
use bulwark_core::entity::Entity;
use bulwark_core::math::{Fixed, Vec3Fixed};
use bulwark_core::simulation::{SimConfig, Simulation};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

/// Create a position on the ground plane.
#[must_use]
pub fn ground(x: f64, z: f64) -> Vec3Fixed {
    Vec3Fixed::new(fixed_f(x), Fixed::ZERO, fixed_f(z))
}

/// Create an elevated position.
#[must_use]
pub fn elevated(x: f64, y: f64, z: f64) -> Vec3Fixed {
    Vec3Fixed::new(fixed_f(x), fixed_f(y), fixed_f(z))
}

/// A symmetric two-faction skirmish: `per_side` archers per faction, lined
/// up `gap` units apart, plus one hall per faction behind the line.
///
/// Returns the simulation and the two halls.
#[must_use]
pub fn skirmish(per_side: u32, gap: f64) -> (Simulation, Entity, Entity) {
    let mut sim = Simulation::new(SimConfig::default()).expect("default schedule builds");

    for i in 0..per_side {
        let z = f64::from(i) * 2.0;
        sim.spawn_unit("archer", FactionId(1), ground(0.0, z));
        sim.spawn_unit("archer", FactionId(2), ground(gap, z));
    }
    let hall_a = sim.spawn_hall(FactionId(1), ground(-10.0, 0.0));
    let hall_b = sim.spawn_hall(FactionId(2), ground(gap + 10.0, 0.0));

    (sim, hall_a, hall_b)
}

/// Count live units belonging to `faction`.
#[must_use]
pub fn live_units(sim: &Simulation, faction: FactionId) -> usize {
    use bulwark_core::components::UnitTag;

    sim.world()
        .entities_with::<UnitTag>()
        .into_iter()
        .filter(|&e| sim.world().get::<FactionId>(e) == Some(&faction))
        .count()
}
