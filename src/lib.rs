pub mod error;
pub mod simulation;
pub mod configuration;
pub mod visualization;
pub mod benchmark;

pub use error::{PsimError, Result};

pub use simulation::states::{Custom, NVec2, NVec3, Particle, Rgba, Shape};
pub use simulation::system::{clamp_dt, FrameContext, Pass, ParticleSystem, Stage, SystemStats, SystemView, Updater};
pub use simulation::emitter::Emitter;
pub use simulation::forces::{AccelSet, Acceleration, CircleRepulsion, PairwiseAttraction, UniformField};
pub use simulation::integrator::{fade_out, integrate, lifetime, verlet_step, VerletPass};
pub use simulation::updaters::ParticleCollisions;
pub use simulation::fluid::{FluidMode, FluidSolver, NeighborSearch};
pub use simulation::scenario::{RunSettings, Scenario};

pub use configuration::config::{CameraConfig, EmitterConfig, ParticleConfig, ScenarioConfig, StageConfig, SystemConfig};

pub use visualization::camera::{Camera3D, Projection};
pub use visualization::render::{extract, Sprite};

pub use benchmark::benchmark::{bench_collisions, bench_fluid, bench_fluid_curve};
