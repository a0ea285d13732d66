//! Shipyard CLI
//!
//! Renders benchmark workloads against graph-query and identifier
//! normalization backends:
//! - `scenarios` lists the built-in catalogue
//! - `render` runs a scenario with a dry-run transport
//! - `histogram` / `traffic` inspect the replayed traffic model

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shipyard_cli::config::{environment_name, DataPaths, EnvironmentConfig, Knobs};
use shipyard_cli::driver::{load_schedule, run, DryRunTransport, RunOptions};
use shipyard_cli::scenario::{catalogue, Scenario};
use shipyard_traffic::{sample, SamplerConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(author, version, about = "Shipyard: graph and normalization workload generator")]
struct Cli {
    /// JSON file with per-environment targets (defaults to the built-in table)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Environment name (defaults to `$ENVIRONMENT`, then `local`)
    #[arg(long, global = true)]
    environment: Option<String>,
    /// Directory holding the sample databases
    #[arg(long, global = true, default_value = "data")]
    data_dir: PathBuf,
    /// Seed for traffic-size draws
    #[arg(long, global = true, default_value_t = 0)]
    seed: u64,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in scenarios.
    Scenarios,

    /// Prepare request bodies for a scenario without sending them.
    Render {
        /// Scenario name, e.g. `floating-object.neo4j` or `3hop.dgraph`
        scenario: String,
        /// Number of iterations
        #[arg(short = 'n', long, default_value_t = 1)]
        iterations: u64,
        /// Write one file per request instead of printing to stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Minimum path depth for chain scenarios
        #[arg(long, default_value_t = shipyard_cli::driver::DEFAULT_MIN_DEPTH)]
        min_depth: i64,
    },

    /// Print the traffic histogram built from the traffic database.
    Histogram,

    /// Draw batch sizes from the traffic histogram.
    Traffic {
        #[arg(long, default_value_t = 10)]
        draws: usize,
    },
}

fn options(cli: &Cli) -> Result<RunOptions> {
    let environments = match &cli.config {
        Some(path) => EnvironmentConfig::from_path(path)?,
        None => EnvironmentConfig::builtin(),
    };
    let name = cli.environment.clone().unwrap_or_else(environment_name);
    let targets = environments.select(&name)?.clone();
    let knobs = Knobs::from_env().context("reading environment knobs")?;

    let mut options = RunOptions::new(targets, DataPaths::under(&cli.data_dir), knobs);
    options.seed = cli.seed;
    Ok(options)
}

fn cmd_scenarios() {
    for scenario in catalogue() {
        println!("{:<40} {}", scenario.name().bold(), scenario.workload.describe());
    }
}

async fn cmd_render(
    mut options: RunOptions,
    name: &str,
    iterations: u64,
    out: Option<PathBuf>,
    min_depth: i64,
) -> Result<()> {
    let scenario: Scenario = name.parse()?;
    options.min_depth = min_depth;

    let transport = match &out {
        Some(dir) => DryRunTransport::to_dir(dir),
        None => DryRunTransport::stdout(),
    };
    let report = run(scenario, &options, iterations, &transport)
        .await
        .with_context(|| format!("running scenario `{name}`"))?;

    eprintln!(
        "{} {} iterations={} failed={} bytes={}",
        "ok".green().bold(),
        name,
        report.iterations,
        report.failed_iterations,
        report.bytes_sent
    );
    if let Some(dir) = out {
        eprintln!("{} {}", "wrote".green().bold(), dir.display().to_string().bold());
    }
    Ok(())
}

async fn cmd_histogram(options: RunOptions) -> Result<()> {
    let schedule = load_schedule(&options)
        .await
        .with_context(|| format!("loading {}", options.paths.traffic.display()))?;
    let histogram = schedule.histogram();
    println!(
        "{} observations",
        histogram.observations().to_string().bold()
    );
    for ((bin, p), c) in histogram.iter().zip(histogram.cumulative()) {
        println!("[{:>5}, {:>5})  p={p:.4}  cdf={c:.4}", bin.lower, bin.upper);
    }
    Ok(())
}

async fn cmd_traffic(options: RunOptions, draws: usize) -> Result<()> {
    let schedule = load_schedule(&options)
        .await
        .with_context(|| format!("loading {}", options.paths.traffic.display()))?;
    let config = SamplerConfig {
        cap: options.traffic_cap,
    };
    let mut rng = StdRng::seed_from_u64(options.seed);
    for _ in 0..draws {
        println!("{}", sample(schedule.histogram(), &config, &mut rng));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Commands::Scenarios => cmd_scenarios(),
        Commands::Render {
            scenario,
            iterations,
            out,
            min_depth,
        } => cmd_render(options(&cli)?, scenario, *iterations, out.clone(), *min_depth).await?,
        Commands::Histogram => cmd_histogram(options(&cli)?).await?,
        Commands::Traffic { draws } => cmd_traffic(options(&cli)?, *draws).await?,
    }
    Ok(())
}
