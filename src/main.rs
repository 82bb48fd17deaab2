use psim::{bench_collisions, bench_fluid, bench_fluid_curve};
use psim::{clamp_dt, extract, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short, default_value = "fountain.yaml")]
    file_name: String,

    /// Override the frame count from the scenario file
    #[arg(long)]
    frames: Option<u64>,

    /// Run the solver benchmarks instead of a scenario
    #[arg(long)]
    bench: bool,

    /// Print the benchmark curve as CSV (with --bench)
    #[arg(long)]
    curve: bool,
}

// load here to keep main clean
fn load_scenario_from_yaml(file_name: &str) -> Result<ScenarioConfig> {
    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("scenarios")
        .join(file_name);
    ScenarioConfig::from_path(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    if args.bench {
        if args.curve {
            bench_fluid_curve();
        } else {
            bench_fluid();
            bench_collisions();
        }
        return Ok(());
    }

    let scenario_cfg = load_scenario_from_yaml(&args.file_name)?;
    let Scenario {
        mut system,
        mut camera,
        run,
    } = Scenario::build(scenario_cfg).context("invalid scenario")?;

    let frames = args.frames.unwrap_or(run.frames);
    let dt = clamp_dt(run.dt, run.max_dt);
    // roughly once per simulated second
    let report_every = ((1.0 / dt).round() as u64).max(1);

    for _ in 0..frames {
        system.update(dt);
        camera.update(dt);

        if system.frame() % report_every == 0 {
            let stats = system.stats();
            info!(
                frame = stats.frame,
                time = stats.time,
                live = stats.live,
                free = stats.free,
                evicted = stats.evicted,
                kinetic_energy = stats.kinetic_energy,
                "frame"
            );
        }
    }

    let sprites = extract(&system, &camera);
    let nearest = sprites.last().map(|s| s.depth);
    info!(
        sprites = sprites.len(),
        culled = system.particles().count() - sprites.len(),
        ?nearest,
        "draw list"
    );

    Ok(())
}
