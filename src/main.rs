use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use protozoa::{physics::IntegrationMethod, SimulationConfig, SimulationState};

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless protozoa simulation runner")]
struct Cli {
    /// Path to the scenario YAML file (built-in defaults when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the block nonce used as seed
    #[arg(long, allow_negative_numbers = true)]
    seed: Option<i64>,

    /// Override tick count
    #[arg(long)]
    ticks: Option<u64>,

    /// Override the fixed time step in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Integration method: euler or verlet
    #[arg(long)]
    method: Option<IntegrationMethod>,

    /// Print the final state as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SimulationConfig::from_yaml(path)
            .with_context(|| format!("loading scenario {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(ticks) = cli.ticks {
        config.ticks = ticks;
    }
    if let Some(dt) = cli.dt {
        config.dt = dt;
    }
    if let Some(method) = cli.method {
        config.physics.method = method;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .context("invalid logging level")?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut state = SimulationState::from_config(&config).context("building simulation")?;
    state.initialize_verlet();
    info!(
        scenario = %config.name,
        seed = state.seed(),
        entities = state.entities().len(),
        "starting run"
    );

    let mut collisions = 0;
    for _ in 0..config.ticks {
        let summary = state.tick(config.dt)?;
        collisions += summary.collisions;
    }

    info!(
        ticks = state.current_tick(),
        active = state.active_count(),
        total_energy = state.total_energy(),
        collisions,
        "run complete"
    );

    if cli.json {
        println!("{}", state.snapshot().to_json()?);
    } else {
        println!(
            "Scenario '{}' completed for {} ticks. Active entities: {}/{}",
            config.name,
            state.current_tick(),
            state.active_count(),
            state.entities().len()
        );
    }
    Ok(())
}
