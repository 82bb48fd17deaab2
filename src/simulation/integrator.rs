//! Time integration
//!
//! Two ways to move particles forward:
//! - per-particle updaters (`integrate`, `lifetime`, `fade_out`) placed at the
//!   end of an updater chain, semi-implicit Euler
//! - a velocity-Verlet pass driven by an [`AccelSet`], for snapshot force
//!   terms that need both force evaluations of the step

use crate::simulation::forces::AccelSet;
use crate::simulation::states::{NVec3, Particle};
use crate::simulation::system::{FrameContext, Pass, Updater};
use crate::simulation::updaters::each;

/// Position update `x += v dt`, run after every velocity-changing updater
pub fn integrate() -> impl Updater + Send {
    each(|p, dt, _sys| {
        p.pos += p.vel * dt;
    })
}

/// Age the particle; the system reaps it once `age >= lifetime`
pub fn lifetime() -> impl Updater + Send {
    each(|p, dt, _sys| {
        p.age += dt;
    })
}

/// Linear opacity fade over the particle's lifetime, no-op for permanent particles
pub fn fade_out() -> impl Updater + Send {
    each(|p, _dt, _sys| {
        if p.lifetime.is_finite() && p.lifetime > 0.0 {
            p.opacity = (1.0 - p.age / p.lifetime).clamp(0.0, 1.0);
        }
    })
}

/// Advance every live particle by one velocity-Verlet step
/// Uses two force evaluations per step and updates positions and velocities
/// in place
pub fn verlet_step(particles: &mut [Particle], forces: &AccelSet, t: f64, dt: f64) {
    let n = particles.len();
    if n == 0 {
        return;
    }
    let half_dt = 0.5 * dt;

    // a_n from x_n at time t_n
    let mut a_old = vec![NVec3::zeros(); n];
    forces.accumulate_accels(t, particles, &mut a_old);

    // Kick: v_n+1/2 = v_n + (1/2 * dt) * a_n
    // Drift: x_n+1 = x_n + dt v_n+1/2
    for (p, a) in particles.iter_mut().zip(a_old.iter()) {
        if p.alive {
            p.vel += *a * half_dt;
            p.pos += p.vel * dt;
        }
    }

    // a_n+1 from x_n+1 at time t_n+1
    let mut a_new = vec![NVec3::zeros(); n];
    forces.accumulate_accels(t + dt, particles, &mut a_new);

    // Second kick: v_n+1 = v_n+1/2 + (dt/2) * a_n+1
    for (p, a) in particles.iter_mut().zip(a_new.iter()) {
        if p.alive {
            p.vel += *a * half_dt;
        }
    }
}

/// Whole-system pass that integrates with [`verlet_step`]
///
/// Replaces `integrate()` for particles driven by snapshot force terms;
/// do not register both.
pub struct VerletPass {
    pub forces: AccelSet,
}

impl VerletPass {
    pub fn new(forces: AccelSet) -> Self {
        Self { forces }
    }
}

impl Pass for VerletPass {
    fn apply(&mut self, particles: &mut [Particle], ctx: &mut FrameContext<'_>) {
        verlet_step(particles, &self.forces, ctx.time, ctx.dt);
    }
}
