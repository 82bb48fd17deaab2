//! Core state types for the particle simulation.
//!
//! Defines the pooled particle record and its small value types:
//! - `Particle` using `NVec3` for position/velocity
//! - `Rgba` / `Shape` visual attributes read by renderers
//! - `Custom` typed extension fields for simulation-specific scalars
//!
//! Mass and radius are optional per particle; use [`Particle::mass`] and
//! [`Particle::radius`] instead of reading the fields directly.

use std::str::FromStr;

use nalgebra::{Vector2, Vector3};
use serde::Deserialize;

use crate::error::PsimError;

pub type NVec2 = Vector2<f64>;
pub type NVec3 = Vector3<f64>;

/// Floor applied to every mass lookup so nothing ever divides by zero
pub const MIN_MASS: f64 = 1e-6;

/// Floor applied to distances before they are used as a divisor
pub const DIST_EPSILON: f64 = 1e-4;

/// Straight RGBA color, components in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "one")]
    pub a: f64,
}

fn one() -> f64 {
    1.0
}

impl Rgba {
    pub const WHITE: Rgba = Rgba { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Component-wise linear interpolation, `t` clamped to `[0, 1]`
    pub fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::WHITE
    }
}

/// Shape tag, only interpreted by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
    Glow,
}

impl FromStr for Shape {
    type Err = PsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "circle" => Ok(Shape::Circle),
            "square" => Ok(Shape::Square),
            "triangle" => Ok(Shape::Triangle),
            "star" => Ok(Shape::Star),
            "glow" => Ok(Shape::Glow),
            other => Err(PsimError::UnknownShape(other.to_string())),
        }
    }
}

/// Typed extension fields
///
/// Everything is optional; updaters that need a value fall back to a
/// default instead of failing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Custom {
    pub temperature: Option<f64>, // normalized 0 (cold) .. 1 (hot)
    pub target: Option<NVec3>,    // rest position for seek/morph behaviors
    pub drift_phase: Option<f64>, // per-particle phase offset for wobble
    pub mass: Option<f64>,        // mass override when `Particle::mass` is unset
    pub radius: Option<f64>,      // explicit collision radius, overrides size / 2
    pub density: Option<f64>,     // last density written by the fluid solver
    pub near_density: Option<f64>,
}

/// A pooled, mutable simulation entity
#[derive(Debug, Clone)]
pub struct Particle {
    pub id: u64,     // stable identity, assigned on acquire
    pub slot: usize, // pool index

    pub pos: NVec3,        // position
    pub vel: NVec3,        // velocity
    pub mass: Option<f64>, // mass, 1.0 when unset

    pub size: f64, // diameter
    pub color: Rgba,
    pub shape: Shape,
    pub opacity: f64,

    pub alive: bool,
    pub age: f64,      // seconds since acquire
    pub lifetime: f64, // seconds, INFINITY = permanent

    pub custom: Custom,
}

impl Particle {
    /// Fresh record for pool slot `slot`, not alive
    pub fn new(slot: usize) -> Self {
        Self {
            id: 0,
            slot,
            pos: NVec3::zeros(),
            vel: NVec3::zeros(),
            mass: None,
            size: 1.0,
            color: Rgba::WHITE,
            shape: Shape::Circle,
            opacity: 1.0,
            alive: false,
            age: 0.0,
            lifetime: f64::INFINITY,
            custom: Custom::default(),
        }
    }

    /// Reset every field to its default while keeping the slot
    pub fn reset(&mut self, id: u64) {
        let slot = self.slot;
        *self = Particle::new(slot);
        self.id = id;
        self.alive = true;
    }

    /// Effective mass: `mass`, then `custom.mass`, then 1, floored at [`MIN_MASS`]
    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass.or(self.custom.mass).unwrap_or(1.0).max(MIN_MASS)
    }

    #[inline]
    pub fn inv_mass(&self) -> f64 {
        1.0 / self.mass()
    }

    /// Collision radius: `custom.radius` or half the size
    #[inline]
    pub fn radius(&self) -> f64 {
        self.custom.radius.unwrap_or(self.size * 0.5)
    }

    /// True when the particle has outlived its lifetime
    #[inline]
    pub fn expired(&self) -> bool {
        self.age >= self.lifetime
    }

    pub fn with_pos(mut self, x: f64, y: f64, z: f64) -> Self {
        self.pos = NVec3::new(x, y, z);
        self
    }

    pub fn with_vel(mut self, vx: f64, vy: f64, vz: f64) -> Self {
        self.vel = NVec3::new(vx, vy, vz);
        self
    }

    pub fn with_size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }
}

impl Default for Particle {
    fn default() -> Self {
        let mut p = Particle::new(0);
        p.alive = true;
        p
    }
}
