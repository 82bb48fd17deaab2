//! Property-based tests for the particle core.
//!
//! Invariants checked over random inputs:
//! - Pool accounting (live + free == capacity) under any acquire/release/update mix
//! - Symmetry of the rect and circle overlap predicates
//! - MTV antisymmetry for any two distinct rects
//! - Momentum conservation and no energy gain in impulse resolution
//! - Zone temperature stays put at each zone's target

use proptest::prelude::*;

use psim::simulation::collision::{circle_circle, get_mtv, rect_rect, Circle, Rect};
use psim::simulation::fluid::{zone_temperature, ThermalZones};
use psim::simulation::integrator::lifetime;
use psim::simulation::physics::{check_collision, elastic_collision, kinetic_energy, momentum};
use psim::simulation::system::ParticleSystem;
use psim::{NVec3, Particle};

// =============================================================================
// Helpers
// =============================================================================

#[derive(Debug, Clone)]
enum PoolOp {
    Acquire(f64), // lifetime
    Release(usize),
    Update(f64),
    Clear,
}

fn pool_op() -> impl Strategy<Value = PoolOp> {
    prop_oneof![
        4 => (0.05f64..2.0).prop_map(PoolOp::Acquire),
        2 => (0usize..16).prop_map(PoolOp::Release),
        2 => (0.0f64..0.5).prop_map(PoolOp::Update),
        1 => Just(PoolOp::Clear),
    ]
}

fn rect() -> impl Strategy<Value = Rect> {
    (-50.0f64..50.0, -50.0f64..50.0, 0.5f64..40.0, 0.5f64..40.0).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn circle() -> impl Strategy<Value = Circle> {
    (-50.0f64..50.0, -50.0f64..50.0, 0.0f64..20.0).prop_map(|(x, y, r)| Circle::new(x, y, r))
}

fn body(slot: usize, pos: NVec3, vel: NVec3, mass: f64) -> Particle {
    let mut p = Particle::new(slot);
    p.reset(slot as u64);
    p.pos = pos;
    p.vel = vel;
    p.mass = Some(mass);
    p.size = 10.0;
    p
}

// =============================================================================
// Pool properties
// =============================================================================

proptest! {
    #[test]
    fn pool_accounting_holds(
        capacity in 1usize..12,
        ops in prop::collection::vec(pool_op(), 1..80),
    ) {
        let mut sys = ParticleSystem::new(capacity, 7).unwrap().with_updater(lifetime());

        for op in ops {
            match op {
                PoolOp::Acquire(life) => sys.acquire().lifetime = life,
                PoolOp::Release(slot) => {
                    sys.release(slot);
                }
                PoolOp::Update(dt) => sys.update(dt),
                PoolOp::Clear => sys.clear(),
            }

            prop_assert!(sys.live_count() <= capacity);
            prop_assert_eq!(sys.live_count() + sys.free_count(), capacity);
            prop_assert_eq!(sys.particles().count(), sys.live_count());

            let mut slots: Vec<usize> = sys.live_slots().collect();
            slots.sort_unstable();
            slots.dedup();
            prop_assert_eq!(slots.len(), sys.live_count(), "a slot is live twice");
        }
    }
}

// =============================================================================
// Collision symmetry properties
// =============================================================================

proptest! {
    #[test]
    fn rect_rect_is_symmetric(a in rect(), b in rect()) {
        prop_assert_eq!(rect_rect(&a, &b), rect_rect(&b, &a));
    }

    #[test]
    fn circle_circle_is_symmetric(a in circle(), b in circle()) {
        prop_assert_eq!(circle_circle(&a, &b), circle_circle(&b, &a));
    }

    #[test]
    fn mtv_is_antisymmetric(a in rect(), b in rect()) {
        prop_assume!(a != b);

        match (get_mtv(&a, &b), get_mtv(&b, &a)) {
            (Some(ab), Some(ba)) => prop_assert_eq!(ab, -ba),
            (None, None) => {}
            other => prop_assert!(false, "one-sided mtv: {:?}", other),
        }
    }

    #[test]
    fn mtv_is_antisymmetric_with_shared_center_x(
        x in -50.0f64..50.0,
        y in -50.0f64..50.0,
        dy in 0.5f64..4.0,
        w in 0.5f64..4.0,
        h in 10.0f64..40.0,
    ) {
        // narrow and tall, so the push is always along X where the centers tie
        let a = Rect::new(x, y, w, h);
        let b = Rect::new(x, y + dy, w, h);
        let (ab, ba) = (get_mtv(&a, &b).unwrap(), get_mtv(&b, &a).unwrap());
        prop_assert_eq!(ab, -ba);
        prop_assert!(ab.x < 0.0);
    }
}

// =============================================================================
// Impulse resolution properties
// =============================================================================

proptest! {
    #[test]
    fn collision_conserves_momentum_without_gaining_energy(
        dist in 0.5f64..9.5,
        angle in 0.0f64..std::f64::consts::TAU,
        v1 in prop::array::uniform3(-20.0f64..20.0),
        v2 in prop::array::uniform3(-20.0f64..20.0),
        m1 in 0.1f64..10.0,
        m2 in 0.1f64..10.0,
        restitution in 0.0f64..=1.0,
    ) {
        let offset = NVec3::new(angle.cos(), angle.sin(), 0.0) * dist;
        let p1 = body(0, NVec3::zeros(), NVec3::from(v1), m1);
        let p2 = body(1, offset, NVec3::from(v2), m2);

        let contact = check_collision(&p1, &p2, 1.0);
        prop_assert!(contact.is_some());
        let contact = contact.unwrap();

        if let Some(v) = elastic_collision(&p1, &p2, &contact, restitution) {
            let mut q1 = p1.clone();
            let mut q2 = p2.clone();
            q1.vel = v.v1;
            q2.vel = v.v2;

            let p_before = momentum(&p1) + momentum(&p2);
            let p_after = momentum(&q1) + momentum(&q2);
            prop_assert!((p_before - p_after).norm() <= 1e-9 * (1.0 + p_before.norm()));

            let e_before = kinetic_energy(&p1) + kinetic_energy(&p2);
            let e_after = kinetic_energy(&q1) + kinetic_energy(&q2);
            prop_assert!(e_after <= e_before * (1.0 + 1e-9) + 1e-9,
                "energy gained: {} -> {}", e_before, e_after);
        }
    }
}

// =============================================================================
// Thermal zone properties
// =============================================================================

proptest! {
    #[test]
    fn zone_temperature_is_idempotent_at_target(
        hot_y in 0.9f64..=1.0,
        cold_y in 0.0f64..=0.1,
        mid_y in 0.2f64..=0.8,
        dt in 0.001f64..1.0,
    ) {
        let zones = ThermalZones::default();
        prop_assert_eq!(zone_temperature(hot_y, zones.hot_temperature, &zones, dt), zones.hot_temperature);
        prop_assert_eq!(zone_temperature(cold_y, zones.cold_temperature, &zones, dt), zones.cold_temperature);
        prop_assert_eq!(zone_temperature(mid_y, zones.neutral_temperature, &zones, dt), zones.neutral_temperature);
    }

    #[test]
    fn zone_temperature_stays_within_targets(
        y in 0.0f64..=1.0,
        current in 0.0f64..=1.0,
        dt in 0.001f64..1.0,
    ) {
        let zones = ThermalZones::default();
        let next = zone_temperature(y, current, &zones, dt);
        prop_assert!((0.0..=1.0).contains(&next), "left [0, 1]: {}", next);
    }
}
