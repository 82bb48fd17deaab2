//! Build fully-initialized particle scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - the particle system with its stage pipeline and emitters
//! - explicitly placed particles and emitter bursts already spawned
//! - the camera used to extract the draw list
//! - frame timing settings for the driver
//!
//! All validation happens here, once; nothing on the frame path can fail.

use tracing::{debug, info};

use crate::configuration::config::{
    CameraConfig, EmitterConfig, FluidModeConfig, ParticleConfig, ScenarioConfig, StageConfig,
};
use crate::error::{PsimError, Result};
use crate::simulation::emitter::Emitter;
use crate::simulation::fluid::{FluidMode, FluidSolver};
use crate::simulation::forces::{AccelSet, CircleRepulsion, PairwiseAttraction, UniformField};
use crate::simulation::integrator::{fade_out, integrate, lifetime, VerletPass};
use crate::simulation::physics::{Bounds3, Sphere};
use crate::simulation::states::{NVec3, Shape};
use crate::simulation::system::ParticleSystem;
use crate::simulation::updaters::{
    attract_to_point, bounds_3d, drag, gravity, max_speed, mutual_attraction, orbital_about,
    particle_collisions, seek_target, separation, sphere_bounds, thermal,
};
use crate::visualization::camera::Camera3D;

/// Frame timing for whoever drives the system
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub dt: f64,
    pub max_dt: f64,
    pub frames: u64,
}

/// Runtime bundle constructed from a [`ScenarioConfig`]
pub struct Scenario {
    pub system: ParticleSystem,
    pub camera: Camera3D,
    pub run: RunSettings,
}

impl Scenario {
    pub fn build(cfg: ScenarioConfig) -> Result<Self> {
        let s_cfg = &cfg.system;
        positive("system.dt", s_cfg.dt)?;
        positive("system.max_dt", s_cfg.max_dt)?;

        let mut system = ParticleSystem::new(s_cfg.max_particles, s_cfg.seed)?;

        // Stages: file order is pipeline order
        for stage in &cfg.stages {
            add_stage(&mut system, stage)?;
        }

        // Emitters: register, then fire their bursts
        for (name, e_cfg) in &cfg.emitters {
            let emitter = build_emitter(e_cfg)?;
            system.add_emitter(name.clone(), emitter);
            if e_cfg.burst > 0 {
                system.emit(name, e_cfg.burst)?;
            }
        }

        // Particles: map `ParticleConfig` -> pooled `Particle`
        for p_cfg in &cfg.particles {
            spawn_particle(&mut system, p_cfg)?;
        }

        let camera = build_camera(&cfg.camera)?;

        let run = RunSettings {
            dt: s_cfg.dt,
            max_dt: s_cfg.max_dt,
            frames: s_cfg.frames,
        };

        info!(
            capacity = system.capacity(),
            live = system.live_count(),
            stages = system.stage_count(),
            emitters = cfg.emitters.len(),
            "scenario built"
        );

        Ok(Self {
            system,
            camera,
            run,
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PsimError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(PsimError::InvalidParameter { name, value })
    }
}

fn vec3_from(components: &[f64]) -> NVec3 {
    NVec3::new(
        components.first().copied().unwrap_or(0.0),
        components.get(1).copied().unwrap_or(0.0),
        components.get(2).copied().unwrap_or(0.0),
    )
}

fn add_stage(system: &mut ParticleSystem, stage: &StageConfig) -> Result<()> {
    debug!(?stage, "adding stage");
    match stage {
        StageConfig::Integrate => system.add_updater(integrate()),
        StageConfig::Lifetime => system.add_updater(lifetime()),
        StageConfig::FadeOut => system.add_updater(fade_out()),
        StageConfig::Gravity { g } => system.add_updater(gravity(g.x, g.y, g.z)),
        StageConfig::Drag { coefficient } => {
            non_negative("drag.coefficient", *coefficient)?;
            system.add_updater(drag(*coefficient));
        }
        StageConfig::MaxSpeed { max } => {
            positive("max_speed.max", *max)?;
            system.add_updater(max_speed(*max));
        }
        StageConfig::MutualAttraction {
            strength,
            cutoff,
            min_distance,
        } => {
            positive("mutual_attraction.cutoff", *cutoff)?;
            positive("mutual_attraction.min_distance", *min_distance)?;
            system.add_updater(mutual_attraction(*strength, *cutoff, *min_distance));
        }
        StageConfig::Bounds3d {
            min,
            max,
            restitution,
        } => {
            non_negative("bounds3d.restitution", *restitution)?;
            system.add_updater(bounds_3d(Bounds3::new(*min, *max), *restitution));
        }
        StageConfig::SphereBounds {
            center,
            radius,
            restitution,
        } => {
            positive("sphere_bounds.radius", *radius)?;
            non_negative("sphere_bounds.restitution", *restitution)?;
            let sphere = Sphere {
                center: *center,
                radius: *radius,
            };
            system.add_updater(sphere_bounds(sphere, *restitution));
        }
        StageConfig::AttractToPoint {
            target,
            strength,
            min_distance,
        } => {
            positive("attract_to_point.min_distance", *min_distance)?;
            system.add_updater(attract_to_point(*target, *strength, *min_distance));
        }
        StageConfig::Separation {
            strength,
            threshold,
        } => system.add_updater(separation(*strength, *threshold)),
        StageConfig::Thermal { temperature, scale } => {
            system.add_updater(thermal(*temperature, *scale))
        }
        StageConfig::Orbital {
            center,
            strength,
            axis,
        } => {
            let axis = axis.unwrap_or_else(NVec3::z);
            system.add_updater(orbital_about(*center, axis, *strength));
        }
        StageConfig::SeekTarget { strength } => system.add_updater(seek_target(*strength)),
        StageConfig::Collisions {
            restitution,
            threshold,
            separation,
            pair_ceiling,
        } => {
            non_negative("collisions.restitution", *restitution)?;
            let mut pass = particle_collisions(*restitution, *threshold).with_separation(*separation);
            if let Some(ceiling) = pair_ceiling {
                pass = pass.with_pair_ceiling(*ceiling);
            }
            system.add_pass(pass);
        }
        StageConfig::Fluid {
            mode,
            blend,
            liquid,
            gas,
            search,
            thermal,
            domain,
            pair_ceiling,
        } => {
            positive("fluid.liquid.smoothing_radius", liquid.smoothing_radius)?;
            positive("fluid.gas.interaction_radius", gas.interaction_radius)?;
            let mode = match mode {
                FluidModeConfig::Liquid => FluidMode::Liquid,
                FluidModeConfig::Gas => FluidMode::Gas,
                FluidModeConfig::Blend => FluidMode::Blend(blend.clamp(0.0, 1.0)),
            };
            let mut solver = FluidSolver::new(mode)
                .with_liquid(*liquid)
                .with_gas(*gas)
                .with_search(*search);
            if let (Some(zones), Some(domain)) = (thermal, domain) {
                positive("fluid.domain.height", domain.height)?;
                solver = solver.with_thermal(*zones, *domain);
            }
            if let Some(ceiling) = pair_ceiling {
                solver = solver.with_pair_ceiling(*ceiling);
            }
            system.add_pass(solver);
        }
        StageConfig::Verlet {
            attraction,
            gravity,
            repulsion,
        } => {
            let mut forces = AccelSet::new();
            if let Some(a) = attraction {
                positive("verlet.attraction.min_distance", a.min_distance)?;
                forces = forces.with(PairwiseAttraction {
                    strength: a.strength,
                    cutoff: a.cutoff,
                    min_distance: a.min_distance,
                });
            }
            if let Some(g) = gravity {
                forces = forces.with(UniformField { g: *g });
            }
            if let Some(options) = repulsion {
                forces = forces.with(CircleRepulsion { options: *options });
            }
            system.add_pass(VerletPass::new(forces));
        }
    }
    Ok(())
}

fn build_emitter(cfg: &EmitterConfig) -> Result<Emitter> {
    non_negative("emitter.rate", cfg.rate)?;
    positive("emitter.size_min", cfg.size_min)?;
    positive("emitter.size_max", cfg.size_max)?;

    let lifetime_min = cfg.lifetime_min.unwrap_or(f64::INFINITY);
    let lifetime_max = cfg.lifetime_max.unwrap_or(lifetime_min);
    if lifetime_min <= 0.0 || lifetime_max <= 0.0 {
        return Err(PsimError::InvalidParameter {
            name: "emitter.lifetime",
            value: lifetime_min.min(lifetime_max),
        });
    }

    let velocity_min = cfg.velocity_min.unwrap_or_else(NVec3::zeros);
    Ok(Emitter {
        rate: cfg.rate,
        position: cfg.position,
        spread: cfg.spread.unwrap_or_else(NVec3::zeros),
        velocity_min,
        velocity_max: cfg.velocity_max.unwrap_or(velocity_min),
        size_min: cfg.size_min,
        size_max: cfg.size_max,
        lifetime_min,
        lifetime_max,
        color: cfg.color,
        opacity: cfg.opacity,
        shape: cfg.shape.parse::<Shape>()?,
        mass: cfg.mass,
        temperature: cfg.temperature,
        ..Emitter::default()
    })
}

fn spawn_particle(system: &mut ParticleSystem, cfg: &ParticleConfig) -> Result<()> {
    positive("particle.size", cfg.size)?;
    if let Some(m) = cfg.mass {
        positive("particle.mass", m)?;
    }
    let shape = cfg.shape.parse::<Shape>()?;

    let p = system.acquire();
    p.pos = vec3_from(&cfg.x);
    p.vel = vec3_from(&cfg.v);
    p.size = cfg.size;
    p.mass = cfg.mass;
    p.shape = shape;
    p.color = cfg.color;
    p.lifetime = cfg.lifetime.unwrap_or(f64::INFINITY);
    p.custom.temperature = cfg.temperature;
    p.custom.target = cfg.target;
    Ok(())
}

fn build_camera(cfg: &CameraConfig) -> Result<Camera3D> {
    positive("camera.perspective", cfg.perspective)?;
    if !(0.0..=1.0).contains(&cfg.friction) {
        return Err(PsimError::InvalidParameter {
            name: "camera.friction",
            value: cfg.friction,
        });
    }
    Ok(Camera3D::new(cfg.perspective)
        .with_rotation(cfg.rotation_x, cfg.rotation_y)
        .with_inertia(cfg.inertia, cfg.friction)
        .with_auto_rotate(cfg.auto_rotate))
}
