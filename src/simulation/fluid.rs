//! Fluid / gas force solver
//!
//! Computes one 2D force per particle per frame, in one of two modes:
//! - liquid: double-density SPH-lite (density, near-density, pressure,
//!   near-pressure and viscosity from neighbours inside `smoothing_radius`)
//! - gas: short-range repulsion, velocity diffusion, drag, random turbulence
//!   and temperature-driven buoyancy
//!
//! Results are arrays parallel to the input slice; dead particles get a zero
//! force and are ignored as neighbours. [`blend_forces`] cross-fades the two
//! modes. [`zone_temperature`] integrates per-particle temperature through
//! hot/neutral/cold vertical zones.
//!
//! +Y points down (screen space), so buoyant particles get a negative Y force.

use rand::Rng;
use rand_pcg::Pcg64;
use serde::Deserialize;

use crate::simulation::grid::SpatialGrid;
use crate::simulation::states::{NVec2, Particle, DIST_EPSILON};
use crate::simulation::system::{FrameContext, Pass};
use crate::simulation::updaters::exceeds_ceiling;

/// How neighbours are found; both produce the same neighbour sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborSearch {
    #[default]
    Direct, // all pairs, O(n^2)
    Grid, // uniform hash grid keyed by the cutoff radius
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LiquidConfig {
    pub smoothing_radius: f64,
    pub rest_density: f64,
    pub pressure_stiffness: f64,
    pub near_pressure_stiffness: f64,
    pub viscosity: f64,
}

impl Default for LiquidConfig {
    fn default() -> Self {
        Self {
            smoothing_radius: 30.0,
            rest_density: 2.0,
            pressure_stiffness: 120.0,
            near_pressure_stiffness: 240.0,
            viscosity: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GasConfig {
    pub interaction_radius: f64,
    pub pressure: f64,
    pub diffusion: f64,
    pub drag: f64,
    pub turbulence: f64,
    pub buoyancy: f64,
    pub neutral_temperature: f64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            interaction_radius: 25.0,
            pressure: 60.0,
            diffusion: 0.5,
            drag: 0.8,
            turbulence: 20.0,
            buoyancy: 150.0,
            neutral_temperature: 0.5,
        }
    }
}

/// Vertical thermal zones, `normalized_y` 0 = top, 1 = bottom
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ThermalZones {
    pub heat_zone: f64, // y >= heat_zone is the hot bottom
    pub cool_zone: f64, // y <= cool_zone is the cold top
    pub transition_width: f64,
    pub hot_temperature: f64,
    pub cold_temperature: f64,
    pub neutral_temperature: f64,
    pub base_rate: f64, // 1/s
    pub heat_multiplier: f64,
    pub cool_multiplier: f64,
    pub neutral_multiplier: f64,
}

impl Default for ThermalZones {
    fn default() -> Self {
        Self {
            heat_zone: 0.9,
            cool_zone: 0.1,
            transition_width: 0.05,
            hot_temperature: 1.0,
            cold_temperature: 0.0,
            neutral_temperature: 0.5,
            base_rate: 1.0,
            heat_multiplier: 3.0,
            cool_multiplier: 2.0,
            neutral_multiplier: 0.2,
        }
    }
}

/// Liquid solver output, parallel to the input particles
#[derive(Debug, Clone, Default)]
pub struct LiquidForces {
    pub forces: Vec<NVec2>,
    pub densities: Vec<f64>,
    pub near_densities: Vec<f64>,
}

// =========================================================================================
// Neighbour iteration
// =========================================================================================

/// Visit every live `j != i` within `radius` of particle `i`, with distance
fn for_each_neighbor(
    particles: &[Particle],
    grid: Option<&SpatialGrid>,
    i: usize,
    radius: f64,
    mut f: impl FnMut(usize, f64),
) {
    let pi = particles[i].pos.xy();
    let r2 = radius * radius;
    let mut visit = |j: usize| {
        if j == i || !particles[j].alive {
            return;
        }
        let d2 = (particles[j].pos.xy() - pi).norm_squared();
        if d2 < r2 {
            f(j, d2.sqrt());
        }
    };
    match grid {
        Some(g) => g.for_each_candidate(pi, &mut visit),
        None => (0..particles.len()).for_each(&mut visit),
    }
}

fn build_grid(particles: &[Particle], search: NeighborSearch, radius: f64) -> Option<SpatialGrid> {
    match search {
        NeighborSearch::Direct => None,
        NeighborSearch::Grid => Some(SpatialGrid::build(particles, radius)),
    }
}

// =========================================================================================
// Liquid
// =========================================================================================

/// SPH-lite liquid forces
///
/// With `q = 1 - r/h` for each neighbour: density `sum q^2`, near-density
/// `sum q^3`, pressure `k (density - rest)`, near pressure
/// `k_near * near_density`. Each pair pushes along the line between centers by
/// the averaged pressures weighted by `q` and `q^2`, and viscosity pulls
/// velocities together by `viscosity * q`. Pair terms are antisymmetric so
/// the net force over the system is zero.
pub fn compute_liquid_forces(particles: &[Particle], cfg: &LiquidConfig, search: NeighborSearch) -> LiquidForces {
    let n = particles.len();
    let h = cfg.smoothing_radius.max(DIST_EPSILON);
    let grid = build_grid(particles, search, h);

    let mut densities = vec![0.0; n];
    let mut near_densities = vec![0.0; n];

    for i in 0..n {
        if !particles[i].alive {
            continue;
        }
        let (mut d, mut nd) = (0.0, 0.0);
        for_each_neighbor(particles, grid.as_ref(), i, h, |_, r| {
            let q = 1.0 - r / h;
            d += q * q;
            nd += q * q * q;
        });
        densities[i] = d;
        near_densities[i] = nd;
    }

    let pressure: Vec<f64> = densities
        .iter()
        .map(|d| cfg.pressure_stiffness * (d - cfg.rest_density))
        .collect();
    let near_pressure: Vec<f64> = near_densities
        .iter()
        .map(|nd| cfg.near_pressure_stiffness * nd)
        .collect();

    let mut forces = vec![NVec2::zeros(); n];
    for i in 0..n {
        if !particles[i].alive {
            continue;
        }
        let pi = particles[i].pos.xy();
        let vi = particles[i].vel.xy();
        let mut f = NVec2::zeros();
        for_each_neighbor(particles, grid.as_ref(), i, h, |j, r| {
            let q = 1.0 - r / h;
            let dir = (pi - particles[j].pos.xy()) / r.max(DIST_EPSILON);
            let p_term = 0.5 * (pressure[i] + pressure[j]) * q;
            let near_term = 0.5 * (near_pressure[i] + near_pressure[j]) * q * q;
            f += dir * (p_term + near_term);
            f += (particles[j].vel.xy() - vi) * (cfg.viscosity * q);
        });
        forces[i] = f;
    }

    LiquidForces {
        forces,
        densities,
        near_densities,
    }
}

// =========================================================================================
// Gas
// =========================================================================================

/// Vertical buoyancy force for a temperature; hotter than neutral rises (negative Y)
#[inline]
pub fn compute_thermal_buoyancy(temperature: f64, cfg: &GasConfig) -> f64 {
    -(temperature - cfg.neutral_temperature) * cfg.buoyancy
}

/// Gas forces: repulsion + diffusion from neighbours, drag, turbulence, buoyancy
///
/// Particles without a temperature are treated as neutral. Turbulence draws
/// from `rng` only when it is non-zero.
pub fn compute_gas_forces(particles: &[Particle], cfg: &GasConfig, search: NeighborSearch, rng: &mut Pcg64) -> Vec<NVec2> {
    let n = particles.len();
    let radius = cfg.interaction_radius.max(DIST_EPSILON);
    let grid = build_grid(particles, search, radius);

    let mut forces = vec![NVec2::zeros(); n];
    for i in 0..n {
        let p = &particles[i];
        if !p.alive {
            continue;
        }
        let pi = p.pos.xy();
        let vi = p.vel.xy();
        let mut f = NVec2::zeros();

        for_each_neighbor(particles, grid.as_ref(), i, radius, |j, r| {
            let q = 1.0 - r / radius;
            let dir = (pi - particles[j].pos.xy()) / r.max(DIST_EPSILON);
            f += dir * (cfg.pressure * q);
            f += (particles[j].vel.xy() - vi) * (cfg.diffusion * q);
        });

        f -= vi * cfg.drag;

        if cfg.turbulence != 0.0 {
            f += NVec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0)) * cfg.turbulence;
        }

        let t = p.custom.temperature.unwrap_or(cfg.neutral_temperature);
        f.y += compute_thermal_buoyancy(t, cfg);

        forces[i] = f;
    }
    forces
}

/// Element-wise `a * (1 - t) + b * t`, `t` clamped to `[0, 1]`
///
/// The output has the length of the shorter input.
pub fn blend_forces(a: &[NVec2], b: &[NVec2], t: f64) -> Vec<NVec2> {
    let t = t.clamp(0.0, 1.0);
    a.iter()
        .zip(b.iter())
        .map(|(fa, fb)| fa * (1.0 - t) + fb * t)
        .collect()
}

// =========================================================================================
// Thermal zones
// =========================================================================================

fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if edge1 <= edge0 {
        return if x >= edge1 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Next-frame temperature for a particle at `normalized_y`
///
/// Each zone pulls toward its own target with rate
/// `base_rate * multiplier`, integrated exactly over `dt`
/// (`T + (target - T)(1 - e^(-rate dt))`). Zone weights ramp smoothly over
/// `transition_width` below the heat line and above the cool line, so the
/// heating rate never jumps as a particle crosses a boundary. A particle
/// already at its zone's target stays there.
pub fn zone_temperature(normalized_y: f64, current: f64, zones: &ThermalZones, dt: f64) -> f64 {
    let y = normalized_y.clamp(0.0, 1.0);
    let width = zones.transition_width.max(0.0);

    let mut w_hot = smoothstep(zones.heat_zone - width, zones.heat_zone, y);
    let mut w_cold = 1.0 - smoothstep(zones.cool_zone, zones.cool_zone + width, y);
    let total = w_hot + w_cold;
    if total > 1.0 {
        w_hot /= total;
        w_cold /= total;
    }
    let w_mid = (1.0 - w_hot - w_cold).max(0.0);

    let approach = |target: f64, multiplier: f64| {
        let k = 1.0 - (-zones.base_rate * multiplier * dt).exp();
        (target - current) * k
    };

    current
        + w_hot * approach(zones.hot_temperature, zones.heat_multiplier)
        + w_cold * approach(zones.cold_temperature, zones.cool_multiplier)
        + w_mid * approach(zones.neutral_temperature, zones.neutral_multiplier)
}

// =========================================================================================
// Solver pass
// =========================================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FluidMode {
    Liquid,
    Gas,
    Blend(f64), // 0 = liquid, 1 = gas
}

/// Vertical extent used to normalise Y for the thermal zones
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Domain {
    pub top: f64,
    pub height: f64,
}

impl Domain {
    #[inline]
    pub fn normalize_y(&self, y: f64) -> f64 {
        ((y - self.top) / self.height.max(DIST_EPSILON)).clamp(0.0, 1.0)
    }
}

/// Whole-system fluid pass
///
/// Updates temperatures through the thermal zones (if set), computes the
/// mode's force array and adds it to velocity in the same frame. Liquid
/// densities are written back into `custom.density`.
#[derive(Debug, Clone)]
pub struct FluidSolver {
    pub mode: FluidMode,
    pub liquid: LiquidConfig,
    pub gas: GasConfig,
    pub thermal: Option<(ThermalZones, Domain)>,
    pub search: NeighborSearch,
    pub pair_ceiling: Option<usize>,
    over_ceiling: bool,
}

impl FluidSolver {
    pub fn new(mode: FluidMode) -> Self {
        Self {
            mode,
            liquid: LiquidConfig::default(),
            gas: GasConfig::default(),
            thermal: None,
            search: NeighborSearch::Direct,
            pair_ceiling: None,
            over_ceiling: false,
        }
    }

    pub fn with_liquid(mut self, cfg: LiquidConfig) -> Self {
        self.liquid = cfg;
        self
    }

    pub fn with_gas(mut self, cfg: GasConfig) -> Self {
        self.gas = cfg;
        self
    }

    pub fn with_thermal(mut self, zones: ThermalZones, domain: Domain) -> Self {
        self.thermal = Some((zones, domain));
        self
    }

    pub fn with_search(mut self, search: NeighborSearch) -> Self {
        self.search = search;
        self
    }

    pub fn with_pair_ceiling(mut self, ceiling: usize) -> Self {
        self.pair_ceiling = Some(ceiling);
        self
    }

    /// Forces for the current mode, parallel to `particles`
    pub fn compute(&self, particles: &[Particle], rng: &mut Pcg64) -> (Vec<NVec2>, Option<LiquidForces>) {
        match self.mode {
            FluidMode::Liquid => {
                let liquid = compute_liquid_forces(particles, &self.liquid, self.search);
                (liquid.forces.clone(), Some(liquid))
            }
            FluidMode::Gas => (compute_gas_forces(particles, &self.gas, self.search, rng), None),
            FluidMode::Blend(t) => {
                let liquid = compute_liquid_forces(particles, &self.liquid, self.search);
                let gas = compute_gas_forces(particles, &self.gas, self.search, rng);
                (blend_forces(&liquid.forces, &gas, t), Some(liquid))
            }
        }
    }
}

impl Pass for FluidSolver {
    fn apply(&mut self, particles: &mut [Particle], ctx: &mut FrameContext<'_>) {
        let dt = ctx.dt;

        if let Some((zones, domain)) = &self.thermal {
            for p in particles.iter_mut().filter(|p| p.alive) {
                let current = p.custom.temperature.unwrap_or(zones.neutral_temperature);
                let ny = domain.normalize_y(p.pos.y);
                p.custom.temperature = Some(zone_temperature(ny, current, zones, dt));
            }
        }

        let live = particles.iter().filter(|p| p.alive).count();
        if exceeds_ceiling(self.pair_ceiling, live, &mut self.over_ceiling, "fluid solver") {
            return;
        }

        let (forces, liquid) = self.compute(particles, &mut *ctx.rng);

        for (i, p) in particles.iter_mut().enumerate() {
            if !p.alive {
                continue;
            }
            p.vel.x += forces[i].x * dt;
            p.vel.y += forces[i].y * dt;
            if let Some(l) = &liquid {
                p.custom.density = Some(l.densities[i]);
                p.custom.near_density = Some(l.near_densities[i]);
            }
        }
    }
}
