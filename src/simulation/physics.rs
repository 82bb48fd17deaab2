//! Stateless per-particle physics primitives
//!
//! Pairwise attraction, collision detection and elastic response,
//! containment against boxes and spheres, and small kinematic utilities.
//! The updaters in [`crate::simulation::updaters`] are built out of these.
//!
//! Every division by a distance or a mass goes through a floor
//! ([`DIST_EPSILON`], [`MIN_MASS`] via `Particle::mass`, or a caller-supplied
//! `min_dist`) so degenerate inputs produce finite numbers.

use serde::Deserialize;

use crate::simulation::states::{NVec3, Particle, DIST_EPSILON};

/// Force between two particles plus the (floored) distance it was computed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attraction {
    pub force: NVec3,
    pub dist: f64,
}

/// Contact between two overlapping particles
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub dist: f64,
    pub overlap: f64,
    pub delta: NVec3, // p2 - p1
}

impl Contact {
    /// Unit normal pointing from p1 to p2
    #[inline]
    pub fn normal(&self) -> NVec3 {
        self.delta / self.dist.max(DIST_EPSILON)
    }
}

/// New velocities for both particles of a resolved collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityPair {
    pub v1: NVec3,
    pub v2: NVec3,
}

/// Axis-aligned containment box
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bounds3 {
    pub min: NVec3,
    pub max: NVec3,
}

impl Bounds3 {
    pub fn new(min: NVec3, max: NVec3) -> Self {
        Self { min, max }
    }

    /// Cube centered on the origin
    pub fn cube(half_extent: f64) -> Self {
        Self {
            min: NVec3::repeat(-half_extent),
            max: NVec3::repeat(half_extent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Sphere {
    pub center: NVec3,
    pub radius: f64,
}

// =========================================================================================
// Forces
// =========================================================================================

/// Inverse-square force on p1 along p1 -> p2
///
/// Positive `strength` attracts, negative repels. The distance is floored at
/// `min_dist` so coincident particles do not blow up.
pub fn attract(p1: &Particle, p2: &Particle, strength: f64, min_dist: f64) -> Attraction {
    let delta = p2.pos - p1.pos;
    let dist = delta.norm().max(min_dist).max(DIST_EPSILON);
    let magnitude = strength / (dist * dist);
    Attraction {
        force: delta * (magnitude / dist),
        dist,
    }
}

/// Constant-magnitude force on p1 along p1 -> p2
pub fn attract_linear(p1: &Particle, p2: &Particle, strength: f64, min_dist: f64) -> Attraction {
    let delta = p2.pos - p1.pos;
    let dist = delta.norm().max(min_dist).max(DIST_EPSILON);
    Attraction {
        force: delta * (strength / dist),
        dist,
    }
}

/// Add `force` to the particle's velocity: `dv = F / m * dt`
#[inline]
pub fn apply_force(p: &mut Particle, force: &NVec3, dt: f64) {
    let inv_m = p.inv_mass();
    p.vel += force * (inv_m * dt);
}

// =========================================================================================
// Particle / particle collisions
// =========================================================================================

/// Overlap test between two particles
///
/// Collide iff `0 < dist < (r1 + r2) * threshold`; coincident centers are
/// excluded because there is no normal to resolve along.
pub fn check_collision(p1: &Particle, p2: &Particle, threshold: f64) -> Option<Contact> {
    let delta = p2.pos - p1.pos;
    let dist = delta.norm();
    let min_dist = (p1.radius() + p2.radius()) * threshold;

    if dist >= min_dist || dist <= 0.0 {
        return None;
    }

    Some(Contact {
        dist,
        overlap: min_dist - dist,
        delta,
    })
}

/// Impulse resolution along the contact normal
///
/// `relVel = (v1 - v2) . n`; a negative value means the pair is already
/// separating and `None` is returned so the same pair is not resolved twice.
/// Otherwise `j = -(1 + e) relVel / (1/m1 + 1/m2)`, which conserves momentum
/// for any restitution.
pub fn elastic_collision(p1: &Particle, p2: &Particle, contact: &Contact, restitution: f64) -> Option<VelocityPair> {
    let n = contact.normal();
    let rel_vel = (p1.vel - p2.vel).dot(&n);

    if rel_vel < 0.0 {
        return None;
    }

    let inv_m1 = p1.inv_mass();
    let inv_m2 = p2.inv_mass();
    let j = -(1.0 + restitution) * rel_vel / (inv_m1 + inv_m2);

    Some(VelocityPair {
        v1: p1.vel + n * (j * inv_m1),
        v2: p2.vel - n * (j * inv_m2),
    })
}

/// Push both particles apart along the contact normal
///
/// The correction `overlap * separation_factor` is split by inverse mass, so
/// the heavier particle moves less.
pub fn separate(p1: &mut Particle, p2: &mut Particle, contact: &Contact, separation_factor: f64) {
    let n = contact.normal();
    let w1 = p1.inv_mass();
    let w2 = p2.inv_mass();
    let correction = contact.overlap * separation_factor / (w1 + w2);

    p1.pos -= n * (correction * w1);
    p2.pos += n * (correction * w2);
}

// =========================================================================================
// Containment
// =========================================================================================

/// Clamp-and-reflect against an axis-aligned box
///
/// Velocity on an axis is only reflected if it still points into the wall,
/// which keeps particles from sticking. Returns whether any axis collided.
pub fn bounds_collision(p: &mut Particle, bounds: &Bounds3, restitution: f64) -> bool {
    let r = p.radius();
    let mut hit = false;

    for axis in 0..3 {
        let lo = bounds.min[axis] + r;
        let hi = bounds.max[axis] - r;

        if p.pos[axis] < lo {
            p.pos[axis] = lo;
            if p.vel[axis] < 0.0 {
                p.vel[axis] = -p.vel[axis] * restitution;
            }
            hit = true;
        } else if p.pos[axis] > hi {
            p.pos[axis] = hi;
            if p.vel[axis] > 0.0 {
                p.vel[axis] = -p.vel[axis] * restitution;
            }
            hit = true;
        }
    }

    hit
}

/// Keep a particle inside (or outside) a sphere
///
/// Inside: once the center is further than `radius - r` from the sphere
/// center, the particle is clamped to that surface and, if still moving
/// outward, `v -= 2 (v . n) n * restitution`. Outside mirrors this for
/// particles that penetrate `radius + r`.
pub fn sphere_bounds_collision(p: &mut Particle, sphere: &Sphere, restitution: f64, inside: bool) -> bool {
    let r = p.radius();
    let offset = p.pos - sphere.center;
    let dist = offset.norm();

    let n = if dist > DIST_EPSILON {
        offset / dist
    } else {
        NVec3::x()
    };

    if inside {
        let limit = (sphere.radius - r).max(0.0);
        if dist <= limit {
            return false;
        }
        p.pos = sphere.center + n * limit;
        let vn = p.vel.dot(&n);
        if vn > 0.0 {
            p.vel -= n * (2.0 * vn * restitution);
        }
    } else {
        let limit = sphere.radius + r;
        if dist >= limit {
            return false;
        }
        p.pos = sphere.center + n * limit;
        let vn = p.vel.dot(&n);
        if vn < 0.0 {
            p.vel -= n * (2.0 * vn * restitution);
        }
    }

    true
}

// =========================================================================================
// Utilities
// =========================================================================================

#[inline]
pub fn kinetic_energy(p: &Particle) -> f64 {
    0.5 * p.mass() * p.vel.norm_squared()
}

#[inline]
pub fn momentum(p: &Particle) -> NVec3 {
    p.vel * p.mass()
}

#[inline]
pub fn speed(p: &Particle) -> f64 {
    p.vel.norm()
}

#[inline]
pub fn distance(p1: &Particle, p2: &Particle) -> f64 {
    (p2.pos - p1.pos).norm()
}

#[inline]
pub fn distance_squared(p1: &Particle, p2: &Particle) -> f64 {
    (p2.pos - p1.pos).norm_squared()
}

/// Scale velocity down to `max_speed` if it is faster
pub fn clamp_velocity(p: &mut Particle, max_speed: f64) {
    let s = p.vel.norm();
    if s > max_speed && s > 0.0 {
        p.vel *= max_speed / s;
    }
}
