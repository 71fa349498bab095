use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;

use lcr_bench::config::{ResolvedOutputs, SimulationConfig};
use lcr_bench::logging::init_logging;
use lcr_bench::runner::SimulationRunner;
use lcr_core::TrialCount;

/// Seat-advantage simulator for Left-Center-Right.
#[derive(Debug, Parser)]
#[command(
    name = "lcr-bench",
    author,
    version,
    about = "Estimate per-seat win ratios for Left-Center-Right"
)]
struct Cli {
    /// Number of players at the table (at least 2).
    #[arg(value_name = "PLAYERS")]
    players: Option<usize>,

    /// Number of games to simulate; fractions are truncated and `1e5` is accepted.
    #[arg(value_name = "TRIALS")]
    trials: Option<TrialCount>,

    /// Path to a YAML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Seed the dice for a reproducible run.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Spread trials over this many threads.
    #[arg(long, value_name = "COUNT")]
    workers: Option<usize>,

    /// Print the results table.
    #[arg(long)]
    print: bool,

    /// Render the win-ratio plot.
    #[arg(long)]
    graph: bool,

    /// Save the results table and Markdown summary.
    #[arg(long)]
    save: bool,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match (&cli.config, cli.players, cli.trials) {
        (Some(path), _, _) => SimulationConfig::from_path(path)?,
        (None, Some(players), Some(trials)) => SimulationConfig::from_counts(players, trials),
        (None, _, _) => bail!("PLAYERS and TRIALS are required unless --config is given"),
    };

    if cli.config.is_some() {
        if let Some(players) = cli.players {
            config.game.players = players;
        }
        if let Some(trials) = cli.trials {
            config.trials.count = trials;
        }
    }

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(seed) = cli.seed {
        config.trials.seed = Some(seed);
    }

    if let Some(workers) = cli.workers {
        config.trials.workers = workers;
    }

    config.report.print |= cli.print;
    config.report.graph |= cli.graph;
    config.report.save |= cli.save;

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let players = config.game.players;
    let trials = config.trials.count;
    let workers = config.trials.workers;

    println!(
        "Loaded configuration '{run_id}' with {players} players ({trials} trials, {workers} worker{})",
        if workers == 1 { "" } else { "s" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let print_table = config.report.print;
    let runner = SimulationRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    if print_table {
        print!("{}", summary.table());
    }

    println!(
        "Simulation complete for '{run_id}': {} trials, seed {}",
        summary.trials, summary.seed
    );
    if let Some(favourite) = summary.analytics.favourite {
        println!(
            "Most winning seat: {favourite} (chi-squared p = {:.4})",
            summary.analytics.uniformity_p_value
        );
    }
    if let Some(path) = summary.table_path.as_ref() {
        println!("Results table: {}", path.display());
    }
    if let Some(path) = summary.summary_path.as_ref() {
        println!("Summary: {}", path.display());
    }
    if let Some(path) = summary.trials_path.as_ref() {
        println!("Trial log: {}", path.display());
    }
    if let Some(path) = summary.plot_path.as_ref() {
        println!("Win ratio plot: {}", path.display());
    }
    if let Some(path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", path.display());
    }

    Ok(())
}
