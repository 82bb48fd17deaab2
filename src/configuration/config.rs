//! Configuration types for loading particle scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! scenario. A scenario consists of:
//!
//! - [`SystemConfig`]   – pool capacity, seed and frame timing
//! - [`EmitterConfig`]  – named emitters (continuous rate and/or a burst)
//! - [`ParticleConfig`] – explicitly placed particles
//! - [`StageConfig`]    – the ordered updater / pass pipeline
//! - [`CameraConfig`]   – projector settings for the draw list
//!
//! # YAML format
//! A small fountain matching these types:
//!
//! ```yaml
//! system:
//!   max_particles: 2000
//!   seed: 42
//!   dt: 0.016
//!   frames: 600
//!
//! emitters:
//!   fountain:
//!     rate: 200.0
//!     burst: 50
//!     position: [0.0, 200.0, 0.0]
//!     spread: [5.0, 0.0, 5.0]
//!     velocity_min: [-40.0, -320.0, -40.0]
//!     velocity_max: [40.0, -260.0, 40.0]
//!     size_min: 2.0
//!     size_max: 5.0
//!     lifetime_min: 2.0
//!     lifetime_max: 3.5
//!     shape: "glow"
//!     color: { r: 0.4, g: 0.7, b: 1.0 }
//!
//! stages:
//!   - type: gravity
//!     g: [0.0, 300.0, 0.0]
//!   - type: drag
//!     coefficient: 0.2
//!   - type: integrate
//!   - type: lifetime
//!   - type: fade_out
//!
//! camera:
//!   perspective: 800.0
//!   auto_rotate: 0.2
//! ```
//!
//! [`crate::simulation::scenario::Scenario`] maps this into the runtime
//! system, rejecting invalid values once at load time.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::simulation::collision::SeparationOptions;
use crate::simulation::fluid::{Domain, GasConfig, LiquidConfig, NeighborSearch, ThermalZones};
use crate::simulation::states::{NVec3, Rgba};

/// Pool and frame settings
#[derive(Deserialize, Debug, Clone)]
pub struct SystemConfig {
    pub max_particles: usize, // pool capacity, must be > 0
    #[serde(default = "default_seed")]
    pub seed: u64, // deterministic seed to make runs reproducible
    #[serde(default = "default_dt")]
    pub dt: f64, // fixed frame step in seconds
    #[serde(default = "default_max_dt")]
    pub max_dt: f64, // clamp applied to dt by the driver
    #[serde(default = "default_frames")]
    pub frames: u64, // frames to run headless
}

fn default_seed() -> u64 {
    42
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

fn default_max_dt() -> f64 {
    1.0 / 30.0
}

fn default_frames() -> u64 {
    600
}

fn default_shape() -> String {
    "circle".to_string()
}

fn default_size() -> f64 {
    1.0
}

fn default_restitution() -> f64 {
    0.9
}

fn default_threshold() -> f64 {
    1.0
}

fn default_separation() -> f64 {
    0.5
}

fn default_blend() -> f64 {
    0.5
}

/// Emitter spawn ranges; lifetimes default to permanent
#[derive(Deserialize, Debug, Clone)]
pub struct EmitterConfig {
    #[serde(default)]
    pub rate: f64, // particles per second
    #[serde(default)]
    pub burst: usize, // particles spawned once when the scenario is built
    pub position: NVec3,
    #[serde(default)]
    pub spread: Option<NVec3>,
    #[serde(default)]
    pub velocity_min: Option<NVec3>,
    #[serde(default)]
    pub velocity_max: Option<NVec3>,
    #[serde(default = "default_size")]
    pub size_min: f64,
    #[serde(default = "default_size")]
    pub size_max: f64,
    pub lifetime_min: Option<f64>,
    pub lifetime_max: Option<f64>,
    #[serde(default)]
    pub color: Rgba,
    #[serde(default = "one")]
    pub opacity: f64,
    #[serde(default = "default_shape")]
    pub shape: String,
    pub mass: Option<f64>,
    pub temperature: Option<f64>,
}

fn one() -> f64 {
    1.0
}

/// One explicitly placed particle
#[derive(Deserialize, Debug, Clone)]
pub struct ParticleConfig {
    pub x: Vec<f64>, // position, 2 or 3 components
    #[serde(default)]
    pub v: Vec<f64>, // velocity, 2 or 3 components
    #[serde(default = "default_size")]
    pub size: f64,
    pub mass: Option<f64>,
    #[serde(default = "default_shape")]
    pub shape: String,
    #[serde(default)]
    pub color: Rgba,
    pub lifetime: Option<f64>,
    pub temperature: Option<f64>,
    pub target: Option<NVec3>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FluidModeConfig {
    Liquid,
    Gas,
    Blend,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct AttractionConfig {
    pub strength: f64,
    pub cutoff: f64,
    #[serde(default = "one")]
    pub min_distance: f64,
}

/// One pipeline entry, applied in file order
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageConfig {
    Integrate,
    Lifetime,
    FadeOut,
    Gravity {
        g: NVec3,
    },
    Drag {
        coefficient: f64,
    },
    MaxSpeed {
        max: f64,
    },
    MutualAttraction {
        strength: f64,
        cutoff: f64,
        #[serde(default = "one")]
        min_distance: f64,
    },
    Bounds3d {
        min: NVec3,
        max: NVec3,
        #[serde(default = "default_restitution")]
        restitution: f64,
    },
    SphereBounds {
        center: NVec3,
        radius: f64,
        #[serde(default = "default_restitution")]
        restitution: f64,
    },
    AttractToPoint {
        target: NVec3,
        strength: f64,
        #[serde(default = "one")]
        min_distance: f64,
    },
    Separation {
        strength: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
    },
    Thermal {
        temperature: f64,
        scale: f64,
    },
    Orbital {
        center: NVec3,
        strength: f64,
        axis: Option<NVec3>,
    },
    SeekTarget {
        strength: f64,
    },
    Collisions {
        #[serde(default = "default_restitution")]
        restitution: f64,
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default = "default_separation")]
        separation: f64,
        pair_ceiling: Option<usize>,
    },
    Fluid {
        mode: FluidModeConfig,
        #[serde(default = "default_blend")]
        blend: f64, // only used by `blend`, 0 = liquid, 1 = gas
        #[serde(default)]
        liquid: LiquidConfig,
        #[serde(default)]
        gas: GasConfig,
        #[serde(default)]
        search: NeighborSearch,
        thermal: Option<ThermalZones>,
        domain: Option<Domain>,
        pair_ceiling: Option<usize>,
    },
    Verlet {
        attraction: Option<AttractionConfig>,
        gravity: Option<NVec3>,
        repulsion: Option<SeparationOptions>,
    },
}

/// Projector settings
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CameraConfig {
    pub perspective: f64,
    pub rotation_x: f64,
    pub rotation_y: f64,
    pub inertia: bool,
    pub friction: f64,
    pub auto_rotate: f64, // yaw speed, rad/s
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            perspective: 800.0,
            rotation_x: 0.0,
            rotation_y: 0.0,
            inertia: true,
            friction: 0.95,
            auto_rotate: 0.0,
        }
    }
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub system: SystemConfig,
    #[serde(default)]
    pub emitters: BTreeMap<String, EmitterConfig>,
    #[serde(default)]
    pub particles: Vec<ParticleConfig>,
    #[serde(default)]
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub camera: CameraConfig,
}

impl ScenarioConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(serde_yaml::from_reader(reader)?)
    }
}
