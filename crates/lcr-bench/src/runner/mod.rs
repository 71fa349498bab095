mod rows;

use std::fs;
use std::path::PathBuf;

use lcr_core::{RandomDie, SimulationError, TrialPlan, WinRatioDistribution};
use thiserror::Error;
use tracing::{Level, event, info, warn};

use crate::analytics::{AnalyticsError, AnalyticsSummary};
use crate::config::{ResolvedOutputs, SimulationConfig, ValidationError};

use rows::TrialLog;

/// Primary entry point for running a configured batch of games.
pub struct SimulationRunner {
    config: SimulationConfig,
    outputs: ResolvedOutputs,
    plan: TrialPlan,
    logging_enabled: bool,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub players: usize,
    pub trials: u64,
    /// Seed the dice were drawn from; generated when the configuration had none.
    pub seed: u64,
    pub workers: usize,
    pub distribution: WinRatioDistribution,
    pub analytics: AnalyticsSummary,
    pub table_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub trials_path: Option<PathBuf>,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn table(&self) -> String {
        self.analytics.render_table()
    }
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: SimulationConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let plan = config.plan()?;
        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            plan,
        })
    }

    /// Play every trial, then write whichever reports the configuration asks for.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let seed = self.config.trials.seed.unwrap_or_else(rand::random);
        let workers = self.config.trials.workers;
        let run_id = self.config.run_id.as_str();

        info!(
            target: "lcr_bench::run",
            run_id,
            players = self.plan.setup().players().get(),
            trials = self.plan.trials().get(),
            seed,
            workers,
            "starting simulation"
        );

        let needs_dir = self.outputs.record_trials || self.config.report.save;
        if needs_dir {
            fs::create_dir_all(&self.outputs.dir)?;
        }

        let (distribution, trials_path) = if workers > 1 {
            (self.plan.run_parallel(seed, workers)?, None)
        } else {
            self.run_sequential(seed)?
        };

        let analytics = AnalyticsSummary::from_distribution(
            run_id,
            seed,
            *self.plan.setup().rules(),
            &distribution,
        )?;

        let (table_path, summary_path) = if self.config.report.save {
            let table_path = self.outputs.table_txt();
            let summary_path = self.outputs.summary_md();
            analytics.write_table(&table_path)?;
            analytics.write_markdown(&summary_path)?;
            analytics.write_json(&distribution, self.outputs.summary_json())?;
            (Some(table_path), Some(summary_path))
        } else {
            (None, None)
        };

        let plot_path = if self.config.report.graph {
            match analytics.render_plot(self.outputs.plot_png()) {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(target: "lcr_bench::run", error = %err, "plot rendering failed");
                    eprintln!("WARN: {}", err);
                    None
                }
            }
        } else {
            None
        };

        info!(
            target: "lcr_bench::run",
            run_id,
            favourite = ?analytics.favourite,
            p_value = analytics.uniformity_p_value,
            "simulation complete"
        );

        Ok(RunSummary {
            run_id: self.config.run_id.clone(),
            players: self.plan.setup().players().get(),
            trials: self.plan.trials().get(),
            seed,
            workers,
            distribution,
            analytics,
            table_path,
            summary_path,
            trials_path,
            plot_path,
            telemetry_path: self
                .logging_enabled
                .then(|| self.outputs.telemetry_jsonl()),
        })
    }

    fn run_sequential(
        &self,
        seed: u64,
    ) -> Result<(WinRatioDistribution, Option<PathBuf>), RunnerError> {
        let run_id = self.config.run_id.as_str();
        let mut die = RandomDie::seeded(seed);
        let mut log = if self.outputs.record_trials {
            Some(TrialLog::create(&self.outputs.trials_jsonl())?)
        } else {
            None
        };

        let distribution = self.plan.run_with(&mut die, |record| {
            if self.logging_enabled && tracing::enabled!(Level::DEBUG) {
                event!(
                    target: "lcr_bench::trial",
                    Level::DEBUG,
                    run_id,
                    trial = record.trial,
                    winner = record.outcome.winner.index(),
                    rounds = record.outcome.rounds,
                    rolls = record.outcome.rolls
                );
            }
            if let Some(log) = log.as_mut() {
                log.write(run_id, seed, record)?;
            }
            Ok::<(), RunnerError>(())
        })?;

        let trials_path = match log {
            Some(log) => {
                let rows = log.finish()?;
                info!(target: "lcr_bench::run", run_id, rows, "trial log written");
                Some(self.outputs.trials_jsonl())
            }
            None => None,
        };

        Ok((distribution, trials_path))
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize trial row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}
