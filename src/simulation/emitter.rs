//! Particle emitters
//!
//! An emitter describes how freshly acquired particles are initialised
//! (position spread, velocity/size/lifetime ranges, color) and how many are
//! spawned per second. Fractional spawns carry over between frames.

use rand::Rng;
use rand_pcg::Pcg64;

use crate::simulation::states::{NVec3, Particle, Rgba, Shape};

#[derive(Debug, Clone)]
pub struct Emitter {
    pub rate: f64,      // particles per second, 0 = burst-only
    pub position: NVec3, // spawn center
    pub spread: NVec3,   // half-extent of the spawn box around `position`
    pub velocity_min: NVec3,
    pub velocity_max: NVec3,
    pub size_min: f64,
    pub size_max: f64,
    pub lifetime_min: f64,
    pub lifetime_max: f64,
    pub color: Rgba,
    pub opacity: f64,
    pub shape: Shape,
    pub mass: Option<f64>,
    pub temperature: Option<f64>,
    pub enabled: bool,
    pub carry: f64, // fractional spawns owed from earlier frames
}

impl Default for Emitter {
    fn default() -> Self {
        Self {
            rate: 0.0,
            position: NVec3::zeros(),
            spread: NVec3::zeros(),
            velocity_min: NVec3::zeros(),
            velocity_max: NVec3::zeros(),
            size_min: 1.0,
            size_max: 1.0,
            lifetime_min: f64::INFINITY,
            lifetime_max: f64::INFINITY,
            color: Rgba::WHITE,
            opacity: 1.0,
            shape: Shape::Circle,
            mass: None,
            temperature: None,
            enabled: true,
            carry: 0.0,
        }
    }
}

impl Emitter {
    /// Number of particles due this frame for continuous emission
    pub fn due(&mut self, dt: f64) -> usize {
        if !self.enabled || self.rate <= 0.0 || dt <= 0.0 {
            return 0;
        }
        self.carry += self.rate * dt;
        let whole = self.carry.floor();
        self.carry -= whole;
        whole as usize
    }

    /// Initialise a freshly acquired particle from this emitter's ranges
    pub fn spawn_into(&self, p: &mut Particle, rng: &mut Pcg64) {
        let jitter = NVec3::new(
            sample(rng, -self.spread.x, self.spread.x),
            sample(rng, -self.spread.y, self.spread.y),
            sample(rng, -self.spread.z, self.spread.z),
        );
        p.pos = self.position + jitter;
        p.vel = NVec3::new(
            sample(rng, self.velocity_min.x, self.velocity_max.x),
            sample(rng, self.velocity_min.y, self.velocity_max.y),
            sample(rng, self.velocity_min.z, self.velocity_max.z),
        );
        p.size = sample(rng, self.size_min, self.size_max);
        p.lifetime = sample(rng, self.lifetime_min, self.lifetime_max);
        p.color = self.color;
        p.opacity = self.opacity;
        p.shape = self.shape;
        p.mass = self.mass;
        p.custom.temperature = self.temperature;
    }
}

/// Uniform sample in `[lo, hi]`, tolerant of swapped, equal or infinite bounds
pub(crate) fn sample(rng: &mut Pcg64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if lo == hi || !(hi - lo).is_finite() {
        return lo;
    }
    rng.random_range(lo..=hi)
}
