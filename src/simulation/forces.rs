//! Snapshot force contributors
//!
//! An [`AccelSet`] sums acceleration terms over a frozen view of the pool
//! (read phase) into a caller-owned buffer, which an integrator then applies
//! (write phase). Terms never see partially-updated neighbours, unlike the
//! per-particle updaters.

use crate::simulation::collision::{apply_circle_separation, SeparationOptions};
use crate::simulation::states::{NVec2, NVec3, Particle, DIST_EPSILON};

/// Collection of acceleration terms (attraction, uniform fields, etc.)
/// Each term implements [`Acceleration`] and their contributions are summed
/// into a single acceleration vector per particle
pub struct AccelSet {
    terms: Vec<Box<dyn Acceleration + Send + Sync>>,
}

impl AccelSet {
    /// Create an empty acceleration set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add an acceleration term
    pub fn with(mut self, term: impl Acceleration + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Compute total accelerations at time `t` for every slot in `particles`
    /// - `out[i]` is set to the sum of contributions from all terms
    /// - dead slots stay zero
    pub fn accumulate_accels(&self, t: f64, particles: &[Particle], out: &mut [NVec3]) {
        for a in out.iter_mut() {
            *a = NVec3::zeros();
        }
        for term in &self.terms {
            term.acceleration(t, particles, out);
        }
    }
}

impl Default for AccelSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Acceleration source operating on a frozen particle slice
/// Implementations add their contribution into `out[i]` for each live particle
pub trait Acceleration {
    fn acceleration(&self, t: f64, particles: &[Particle], out: &mut [NVec3]);
}

/// Mass-weighted inverse-square attraction between every live pair
///
/// Each unordered pair is visited once and receives equal and opposite
/// forces, so total momentum is conserved. Pairs beyond `cutoff` are
/// skipped, distances are floored at `min_distance`.
pub struct PairwiseAttraction {
    pub strength: f64,
    pub cutoff: f64,
    pub min_distance: f64,
}

impl Acceleration for PairwiseAttraction {
    fn acceleration(&self, _t: f64, particles: &[Particle], out: &mut [NVec3]) {
        let n = particles.len();
        let cutoff2 = self.cutoff * self.cutoff;

        for i in 0..n {
            let pi = &particles[i];
            if !pi.alive {
                continue;
            }
            let mi = pi.mass();

            for j in (i + 1)..n {
                let pj = &particles[j];
                if !pj.alive {
                    continue;
                }

                // r points from i to j: i is pulled along +r, j along -r
                let r = pj.pos - pi.pos;
                let r2 = r.norm_squared();
                if r2 > cutoff2 {
                    continue;
                }

                let dist = r2.sqrt().max(self.min_distance).max(DIST_EPSILON);
                let coef = self.strength / (dist * dist * dist);

                out[i] += r * (coef * pj.mass());
                out[j] -= r * (coef * mi);
            }
        }
    }
}

/// Constant acceleration applied to every live particle
pub struct UniformField {
    pub g: NVec3,
}

impl Acceleration for UniformField {
    fn acceleration(&self, _t: f64, particles: &[Particle], out: &mut [NVec3]) {
        for (p, a) in particles.iter().zip(out.iter_mut()) {
            if p.alive {
                *a += self.g;
            }
        }
    }
}

/// Circle-overlap repulsion in the XY plane, divided by mass
pub struct CircleRepulsion {
    pub options: SeparationOptions,
}

impl Acceleration for CircleRepulsion {
    fn acceleration(&self, _t: f64, particles: &[Particle], out: &mut [NVec3]) {
        let mut forces = vec![NVec2::zeros(); particles.len()];
        apply_circle_separation(particles, &mut forces, &self.options);
        for ((p, f), a) in particles.iter().zip(forces.iter()).zip(out.iter_mut()) {
            if p.alive {
                let inv_m = p.inv_mass();
                a.x += f.x * inv_m;
                a.y += f.y * inv_m;
            }
        }
    }
}
