use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Semaphore;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sg_engine::calculate::ExpectedCurve;
use sg_engine::config::AppConfig;
use sg_engine::grouping::ModelRunSummary;
use sg_engine::ingest::discover_tournaments;
use sg_engine::models::{ModelKey, ShotType};
use sg_engine::pipeline::PipelineReport;
use sg_engine::run::{Engine, RunOptions, RunSummary};
use sg_engine::storage::{JsonlModelStore, ModelStore};

#[derive(Parser)]
#[command(name = "sg-engine")]
#[command(about = "Shot classification and expected-strokes modeling for PGA shot telemetry")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./sg-engine.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate raw shots for a tournament
    Process {
        #[arg(long)]
        tournament: String,

        /// Also export the shot table to Parquet
        #[arg(long)]
        parquet: bool,
    },

    /// Build grouped expected-strokes models from annotated shots
    Model {
        #[arg(long)]
        tournament: String,

        /// Rebuild models that are already stored
        #[arg(long)]
        force: bool,

        /// Also export model rows to Parquet
        #[arg(long)]
        parquet: bool,
    },

    /// Process and model tournaments (all discovered ones when none are named)
    Run {
        #[arg(long)]
        tournament: Vec<String>,

        #[arg(long)]
        force: bool,

        /// Tournaments processed concurrently
        #[arg(long, default_value = "4")]
        workers: usize,

        #[arg(long)]
        parquet: bool,
    },

    /// Print a stored expected-strokes curve
    Curve {
        #[arg(long)]
        tournament: String,

        /// Grouping name, e.g. Round or YearHole
        #[arg(long)]
        grouped_by: String,

        /// Grouping value, e.g. "2020 4"
        #[arg(long)]
        detail: String,

        /// TEE, APP, ARG, LNG_PUTT or SHT_PUTT
        #[arg(long)]
        shot_type: String,

        /// Only this surface
        #[arg(long)]
        surface: Option<String>,

        /// Also print the expected strokes at this distance (inches)
        #[arg(long)]
        at: Option<f64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {:?}", cli.config))?;
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting sg-engine v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::new(&config);

    match cli.command {
        Commands::Process {
            tournament,
            parquet,
        } => {
            let options = RunOptions {
                force: false,
                parquet,
            };
            let outcome = engine
                .process(&tournament, options)
                .with_context(|| format!("Processing {} failed", tournament))?;

            println!("\n=== Process Results: {} ===", tournament);
            println!("Seasons:          {}", outcome.seasons);
            print_pipeline(&outcome.report);
            print_errors(&outcome.raw_errors);
        }

        Commands::Model {
            tournament,
            force,
            parquet,
        } => {
            let mut store = JsonlModelStore::new(engine.storage().clone());
            let summary = engine
                .model_stored(&tournament, &mut store, RunOptions { force, parquet })
                .with_context(|| format!("Modeling {} failed", tournament))?;

            println!("\n=== Model Results: {} ===", tournament);
            print_models(&summary);
        }

        Commands::Run {
            tournament,
            force,
            workers,
            parquet,
        } => {
            let tournaments = if tournament.is_empty() {
                discover_tournaments(engine.storage())?
            } else {
                tournament
            };
            if tournaments.is_empty() {
                println!("No tournaments found under {:?}", engine.storage().raw_dir());
                return Ok(());
            }

            let options = RunOptions { force, parquet };
            let failed = run_all(engine, tournaments, workers, options).await?;
            if failed > 0 {
                bail!("{} tournament(s) failed", failed);
            }
        }

        Commands::Curve {
            tournament,
            grouped_by,
            detail,
            shot_type,
            surface,
            at,
        } => {
            let shot_type: ShotType = shot_type.parse().map_err(anyhow::Error::msg)?;
            let key = ModelKey::new(&tournament, &grouped_by, &detail);
            let store = JsonlModelStore::new(engine.storage().clone());
            let Some(model) = store.load(&key)? else {
                bail!("No stored model for {}", key);
            };

            let rows = model.shot_types.get(&shot_type).cloned().unwrap_or_default();
            println!("=== {} {} ({}) ===", key, shot_type, model.id);
            println!(
                "{:<10} {:<24} {:>12} {:>10} {:>10} {:>8}",
                "Surface", "Bin", "Distance", "Mean", "Expected", "Shots"
            );
            for row in rows
                .iter()
                .filter(|r| surface.as_deref().map_or(true, |s| r.surface == s))
            {
                println!(
                    "{:<10} {:<24} {:>12.1} {:>10.3} {:>10.3} {:>8}",
                    row.surface,
                    row.distance_bin,
                    row.distance,
                    row.shots_remaining,
                    row.expected_strokes,
                    row.sample_count
                );
            }

            if let (Some(distance), Some(surface)) = (at, surface.as_deref()) {
                match ExpectedCurve::from_model(&model, shot_type, surface)
                    .and_then(|c| c.expected_at(distance))
                {
                    Some(expected) => println!("\nExpected at {}: {:.3}", distance, expected),
                    None => println!("\nNo curve for {} on {}", shot_type, surface),
                }
            }
        }
    }

    Ok(())
}

/// Run tournaments on blocking workers, bounded by `workers`. Returns the failure count.
async fn run_all(
    engine: Engine,
    tournaments: Vec<String>,
    workers: usize,
    options: RunOptions,
) -> Result<usize> {
    let engine = Arc::new(engine);
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::with_capacity(tournaments.len());

    for tournament in tournaments {
        let permit = semaphore.clone().acquire_owned().await?;
        let engine = engine.clone();
        let name = tournament.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let mut store = JsonlModelStore::new(engine.storage().clone());
            engine.run(&tournament, &mut store, options)
        });
        handles.push((name, handle));
    }

    let mut failed = 0;
    for (name, handle) in handles {
        match handle.await {
            Ok(Ok(summary)) => print_run(&summary),
            Ok(Err(e)) => {
                error!("{}: {}", name, e);
                println!("\n=== {}: FAILED ===\n  {}", name, e);
                failed += 1;
            }
            Err(e) => {
                error!("{}: worker panicked: {}", name, e);
                failed += 1;
            }
        }
    }
    Ok(failed)
}

fn print_run(summary: &RunSummary) {
    println!("\n=== Run Results: {} ===", summary.tournament);
    println!("Run ID:           {}", summary.run_id);
    println!("Seasons:          {}", summary.seasons);
    print_pipeline(&summary.pipeline);
    print_models(&summary.models);
    println!("Duration:         {}ms", summary.duration_ms);
    print_errors(&summary.raw_errors);
}

fn print_pipeline(report: &PipelineReport) {
    println!("Holes processed:  {}", report.holes_processed);
    println!("Holes empty:      {}", report.holes_empty);
    println!("Holes untracked:  {}", report.holes_not_tracked);
    println!("Holes rejected:   {}", report.holes_rejected);
    println!("Unfinished:       {}", report.players_unfinished);
    println!("Shots:            {}", report.shots);
    print_errors(&report.errors);
}

fn print_models(summary: &ModelRunSummary) {
    println!("Models computed:  {}", summary.computed);
    println!("Models skipped:   {}", summary.skipped_persisted);
    println!("Models failed:    {}", summary.failed);
    println!("Models persisted: {}", summary.persisted);
    println!("Unknown shots:    {}", summary.unknown_excluded);
    print_errors(&summary.errors);
}

fn print_errors(errors: &[String]) {
    if !errors.is_empty() {
        println!("\nErrors:");
        for err in errors {
            println!("  - {}", err);
        }
    }
}
