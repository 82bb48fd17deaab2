use std::time::Instant;

use rand_pcg::Pcg64;

use crate::simulation::fluid::{compute_gas_forces, compute_liquid_forces, GasConfig, LiquidConfig, NeighborSearch};
use crate::simulation::states::{NVec3, Particle};
use crate::simulation::system::{FrameContext, Pass};
use crate::simulation::updaters::ParticleCollisions;

/// Helper to build a deterministic 2D blob of `n` live particles
/// Spacing keeps roughly a dozen neighbours inside the default smoothing radius
fn make_particles(n: usize) -> Vec<Particle> {
    let side = (n as f64).sqrt().ceil() as usize;
    (0..n)
        .map(|i| {
            let i_f = i as f64;
            let mut p = Particle::new(i);
            p.reset(i as u64);
            p.pos = NVec3::new(
                (i % side) as f64 * 8.0 + (i_f * 0.37).sin(),
                (i / side) as f64 * 8.0 + (i_f * 0.13).cos(),
                0.0,
            );
            p.vel = NVec3::new((i_f * 0.07).sin() * 10.0, (i_f * 0.11).cos() * 10.0, 0.0);
            p.size = 4.0;
            p
        })
        .collect()
}

fn time_liquid(particles: &[Particle], cfg: &LiquidConfig, search: NeighborSearch, reps: usize) -> f64 {
    // warm-up
    let _ = compute_liquid_forces(particles, cfg, search);

    let t0 = Instant::now();
    for _ in 0..reps {
        let _ = compute_liquid_forces(particles, cfg, search);
    }
    t0.elapsed().as_secs_f64() * 1000.0 / reps as f64
}

/// Direct scan vs spatial grid for both fluid force models
pub fn bench_fluid() {
    let ns = [200, 400, 800, 1600, 3200];
    let liquid = LiquidConfig::default();
    let gas = GasConfig::default();

    for n in ns {
        let particles = make_particles(n);
        let reps = if n <= 800 { 5 } else { 1 };

        let ms_direct = time_liquid(&particles, &liquid, NeighborSearch::Direct, reps);
        let ms_grid = time_liquid(&particles, &liquid, NeighborSearch::Grid, reps);

        let mut rng = Pcg64::new(42, 0x0a02_bdbf_7bb3_c0a7);
        let t0 = Instant::now();
        let _ = compute_gas_forces(&particles, &gas, NeighborSearch::Direct, &mut rng);
        let ms_gas_direct = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        let _ = compute_gas_forces(&particles, &gas, NeighborSearch::Grid, &mut rng);
        let ms_gas_grid = t1.elapsed().as_secs_f64() * 1000.0;

        println!(
            "N = {n:5}, liquid direct = {ms_direct:9.3} ms, grid = {ms_grid:9.3} ms | gas direct = {ms_gas_direct:9.3} ms, grid = {ms_gas_grid:9.3} ms"
        );
    }
}

/// All-pairs collision pass cost per frame
pub fn bench_collisions() {
    let ns = [200, 400, 800, 1600];
    let steps = 3;

    for n in ns {
        let mut particles = make_particles(n);
        let mut pass = ParticleCollisions::default();
        let mut rng = Pcg64::new(42, 0x0a02_bdbf_7bb3_c0a7);

        let t0 = Instant::now();
        for _ in 0..steps {
            let mut ctx = FrameContext {
                dt: 1.0 / 60.0,
                time: 0.0,
                rng: &mut rng,
            };
            pass.apply(&mut particles, &mut ctx);
        }
        let per_step = t0.elapsed().as_secs_f64() * 1000.0 / steps as f64;

        println!("N = {n:5}, collision pass = {per_step:9.3} ms");
    }
}

/// Liquid force cost for a range of n
/// Paste output directly into a spreadsheet to graph
pub fn bench_fluid_curve() {
    println!("N,direct_ms,grid_ms");

    let liquid = LiquidConfig::default();

    // Steps of 200 to give smoother graph
    for n in (200..=6400).step_by(200) {
        // Large n: only 1 rep to avoid minutes of runtime
        let reps = if n <= 1000 { 3 } else { 1 };
        let particles = make_particles(n);

        let ms_direct = time_liquid(&particles, &liquid, NeighborSearch::Direct, reps);
        let ms_grid = time_liquid(&particles, &liquid, NeighborSearch::Grid, reps);

        println!("{},{:.6},{:.6}", n, ms_direct, ms_grid);
    }
}
