//! Ready-made composable updaters
//!
//! Each constructor captures its configuration and returns an [`Updater`]
//! that touches one particle at a time. Behaviors are built by registering
//! several of them in order, e.g. forces first, then `max_speed`, then
//! `integrate`:
//!
//! ```
//! use psim::simulation::system::ParticleSystem;
//! use psim::simulation::updaters::{gravity, drag, max_speed};
//! use psim::simulation::integrator::{integrate, lifetime};
//!
//! let system = ParticleSystem::new(1000, 7).unwrap()
//!     .with_updater(gravity(0.0, 98.0, 0.0))
//!     .with_updater(drag(0.5))
//!     .with_updater(max_speed(300.0))
//!     .with_updater(integrate())
//!     .with_updater(lifetime());
//! assert_eq!(system.stage_count(), 5);
//! ```
//!
//! Pairwise particle collisions are a whole-system [`Pass`], see
//! [`ParticleCollisions`].

use rand::Rng;
use tracing::warn;

use crate::simulation::physics::{
    apply_force, attract, bounds_collision, check_collision, clamp_velocity, elastic_collision,
    separate, sphere_bounds_collision, Bounds3, Sphere,
};
use crate::simulation::states::{NVec3, Particle, DIST_EPSILON};
use crate::simulation::system::{FrameContext, Pass, SystemView, Updater};

/// Pin a closure to the updater signature so its lifetimes are inferred correctly
#[inline]
pub fn each<F>(f: F) -> F
where
    F: FnMut(&mut Particle, f64, &mut SystemView<'_>),
{
    f
}

/// Inverse-square attraction (or repulsion for negative strength) toward every other particle
///
/// Pairs further apart than `cutoff_distance` are skipped with a squared
/// distance check. Acceleration is scaled by the other particle's mass.
/// O(n^2) per frame.
pub fn mutual_attraction(strength: f64, cutoff_distance: f64, min_distance: f64) -> impl Updater + Send {
    let cutoff2 = cutoff_distance * cutoff_distance;
    each(move |p, dt, sys| {
        let mut total = NVec3::zeros();
        for other in sys.others() {
            if (other.pos - p.pos).norm_squared() > cutoff2 {
                continue;
            }
            let a = attract(p, other, strength * p.mass() * other.mass(), min_distance);
            total += a.force;
        }
        apply_force(p, &total, dt);
    })
}

pub fn bounds_3d(bounds: Bounds3, restitution: f64) -> impl Updater + Send {
    each(move |p, _dt, _sys| {
        bounds_collision(p, &bounds, restitution);
    })
}

pub fn sphere_bounds(sphere: Sphere, restitution: f64) -> impl Updater + Send {
    each(move |p, _dt, _sys| {
        sphere_bounds_collision(p, &sphere, restitution, true);
    })
}

/// Inverse-square pull toward a fixed point
pub fn attract_to_point(target: NVec3, strength: f64, min_dist: f64) -> impl Updater + Send {
    each(move |p, dt, _sys| {
        let delta = target - p.pos;
        let dist = delta.norm().max(min_dist).max(DIST_EPSILON);
        p.vel += delta * (strength / (dist * dist * dist) * dt);
    })
}

/// Constant acceleration, independent of mass
pub fn gravity(gx: f64, gy: f64, gz: f64) -> impl Updater + Send {
    let g = NVec3::new(gx, gy, gz);
    each(move |p, dt, _sys| {
        p.vel += g * dt;
    })
}

pub fn max_speed(v: f64) -> impl Updater + Send {
    each(move |p, _dt, _sys| clamp_velocity(p, v))
}

/// Linear damping, `coefficient` is the fraction of velocity lost per second
pub fn drag(coefficient: f64) -> impl Updater + Send {
    each(move |p, dt, _sys| {
        let k = (1.0 - coefficient * dt).max(0.0);
        p.vel *= k;
    })
}

/// Soft velocity push away from overlapping neighbours
///
/// Uses the collision test with `threshold` as the overlap multiplier.
pub fn separation(strength: f64, threshold: f64) -> impl Updater + Send {
    each(move |p, dt, sys| {
        let mut push = NVec3::zeros();
        for other in sys.others() {
            if let Some(c) = check_collision(p, other, threshold) {
                push -= c.normal() * c.overlap;
            }
        }
        p.vel += push * (strength * dt);
    })
}

/// Random jitter scaled by temperature
///
/// A particle's own `custom.temperature` takes precedence over the
/// configured one.
pub fn thermal(temperature: f64, scale: f64) -> impl Updater + Send {
    each(move |p, dt, sys| {
        let t = p.custom.temperature.unwrap_or(temperature);
        let amp = t * scale * dt;
        if amp == 0.0 {
            return;
        }
        p.vel += NVec3::new(
            sys.rng.random_range(-1.0..1.0),
            sys.rng.random_range(-1.0..1.0),
            sys.rng.random_range(-1.0..1.0),
        ) * amp;
    })
}

/// Tangential push around `center` in the XY plane (counter-clockwise for positive strength)
pub fn orbital(center: NVec3, strength: f64) -> impl Updater + Send {
    orbital_about(center, NVec3::z(), strength)
}

/// Tangential push around an arbitrary axis through `center`
pub fn orbital_about(center: NVec3, axis: NVec3, strength: f64) -> impl Updater + Send {
    let axis = axis.try_normalize(DIST_EPSILON).unwrap_or_else(NVec3::z);
    each(move |p, dt, _sys| {
        let radial = p.pos - center;
        let tangent = axis.cross(&radial);
        if let Some(t) = tangent.try_normalize(DIST_EPSILON) {
            p.vel += t * (strength * dt);
        }
    })
}

/// Spring toward `custom.target`, no-op for particles without a target
pub fn seek_target(strength: f64) -> impl Updater + Send {
    each(move |p, dt, _sys| {
        if let Some(target) = p.custom.target {
            p.vel += (target - p.pos) * (strength * dt);
        }
    })
}

// =========================================================================================
// Whole-system collision pass
// =========================================================================================

/// Pairwise elastic collisions plus positional separation
///
/// Runs once per frame over unique live pairs `i < j`, so each pair is
/// resolved at most once regardless of updater order. Above `pair_ceiling`
/// live particles the pass is skipped and a warning is logged once.
#[derive(Debug, Clone)]
pub struct ParticleCollisions {
    pub restitution: f64,
    pub threshold: f64,
    pub separation: f64,
    pub pair_ceiling: Option<usize>,
    over_ceiling: bool,
}

impl ParticleCollisions {
    pub fn new(restitution: f64, threshold: f64) -> Self {
        Self {
            restitution,
            threshold,
            separation: 0.5,
            pair_ceiling: None,
            over_ceiling: false,
        }
    }

    pub fn with_separation(mut self, factor: f64) -> Self {
        self.separation = factor;
        self
    }

    pub fn with_pair_ceiling(mut self, ceiling: usize) -> Self {
        self.pair_ceiling = Some(ceiling);
        self
    }
}

impl Default for ParticleCollisions {
    fn default() -> Self {
        Self::new(0.9, 1.0)
    }
}

impl Pass for ParticleCollisions {
    fn apply(&mut self, particles: &mut [Particle], _ctx: &mut FrameContext<'_>) {
        let live: Vec<usize> = (0..particles.len()).filter(|&i| particles[i].alive).collect();

        if exceeds_ceiling(self.pair_ceiling, live.len(), &mut self.over_ceiling, "particle collisions") {
            return;
        }

        for (a, &i) in live.iter().enumerate() {
            for &j in &live[a + 1..] {
                // i < j, so split at j to borrow both
                let (head, tail) = particles.split_at_mut(j);
                let p1 = &mut head[i];
                let p2 = &mut tail[0];

                let Some(contact) = check_collision(p1, p2, self.threshold) else {
                    continue;
                };
                if let Some(v) = elastic_collision(p1, p2, &contact, self.restitution) {
                    p1.vel = v.v1;
                    p2.vel = v.v2;
                }
                separate(p1, p2, &contact, self.separation);
            }
        }
    }
}

/// Shared ceiling check for pairwise passes, warns once per crossing
pub(crate) fn exceeds_ceiling(ceiling: Option<usize>, count: usize, over: &mut bool, what: &str) -> bool {
    let Some(limit) = ceiling else {
        return false;
    };
    if count > limit {
        if !*over {
            warn!(count, limit, "{what}: live particle count above ceiling, skipping pairwise pass");
            *over = true;
        }
        return true;
    }
    *over = false;
    false
}

/// Collision pass with default separation, see [`ParticleCollisions`]
pub fn particle_collisions(restitution: f64, threshold: f64) -> ParticleCollisions {
    ParticleCollisions::new(restitution, threshold)
}
