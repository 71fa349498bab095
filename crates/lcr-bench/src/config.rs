use lcr_core::{GameRules, GameSetup, TrialCount, TrialPlan};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_OUTPUT_DIR: &str = "output/{run_id}";
const DEFAULT_WORKERS: usize = 1;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root simulation configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub run_id: String,
    pub game: GameConfig,
    pub trials: TrialsConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: SimulationConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Configuration for a plain `PLAYERS TRIALS` invocation with default rules.
    pub fn from_counts(players: usize, trials: TrialCount) -> Self {
        Self {
            run_id: artifact_stem(players, trials.get()),
            game: GameConfig {
                players,
                rules: GameRules::default(),
            },
            trials: TrialsConfig {
                count: trials,
                seed: None,
                workers: DEFAULT_WORKERS,
            },
            outputs: OutputsConfig::default(),
            report: ReportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.game.setup()?;
        self.trials.validate(&self.outputs)?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    pub fn plan(&self) -> Result<TrialPlan, ValidationError> {
        Ok(TrialPlan::new(self.game.setup()?, self.trials.count))
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let dir = resolve_template(&self.run_id, &self.outputs.dir);
        let plots_dir = self
            .outputs
            .plots_dir
            .as_deref()
            .map(|template| resolve_template(&self.run_id, template))
            .unwrap_or_else(|| dir.clone());
        ResolvedOutputs {
            stem: artifact_stem(self.game.players, self.trials.count.get()),
            dir,
            plots_dir,
            record_trials: self.outputs.record_trials,
        }
    }
}

/// Table size and rules.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GameConfig {
    pub players: usize,
    #[serde(flatten)]
    pub rules: GameRules,
}

impl GameConfig {
    pub fn setup(&self) -> Result<GameSetup, ValidationError> {
        GameSetup::new(self.players, self.rules).map_err(|err| ValidationError::InvalidField {
            field: "game".to_string(),
            message: err.to_string(),
        })
    }
}

/// How many games to play and how to seed them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TrialsConfig {
    pub count: TrialCount,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl TrialsConfig {
    fn validate(&self, outputs: &OutputsConfig) -> Result<(), ValidationError> {
        if self.workers == 0 {
            return Err(ValidationError::InvalidField {
                field: "trials.workers".to_string(),
                message: "worker count must be at least 1".to_string(),
            });
        }

        if self.workers > 1 && outputs.record_trials {
            return Err(ValidationError::InvalidField {
                field: "outputs.record_trials".to_string(),
                message: "per-trial rows are only recorded with a single worker".to_string(),
            });
        }

        Ok(())
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default)]
    pub plots_dir: Option<String>,
    #[serde(default)]
    pub record_trials: bool,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            plots_dir: None,
            record_trials: false,
        }
    }
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        let plots = self.plots_dir.as_ref();
        for (label, value) in [("outputs.dir", Some(&self.dir)), ("outputs.plots_dir", plots)] {
            let Some(value) = value else {
                continue;
            };

            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

fn default_output_dir() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Which presentation artifacts to produce.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ReportConfig {
    /// Print the results table to stdout.
    #[serde(default)]
    pub print: bool,
    /// Render the win-ratio plot.
    #[serde(default)]
    pub graph: bool,
    /// Write the results table and Markdown summary to the output directory.
    #[serde(default)]
    pub save: bool,
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// File stem shared by every artifact of a run, e.g. `p-6-t-10000`.
pub fn artifact_stem(players: usize, trials: u64) -> String {
    format!("p-{players}-t-{trials}")
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub stem: String,
    pub dir: PathBuf,
    pub plots_dir: PathBuf,
    pub record_trials: bool,
}

impl ResolvedOutputs {
    pub fn table_txt(&self) -> PathBuf {
        self.dir.join(format!("{}.txt", self.stem))
    }

    pub fn summary_md(&self) -> PathBuf {
        self.dir.join(format!("{}.md", self.stem))
    }

    pub fn summary_json(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.stem))
    }

    pub fn trials_jsonl(&self) -> PathBuf {
        self.dir.join(format!("{}.trials.jsonl", self.stem))
    }

    pub fn plot_png(&self) -> PathBuf {
        self.plots_dir.join(format!("{}.png", self.stem))
    }

    pub fn telemetry_jsonl(&self) -> PathBuf {
        self.dir.join("telemetry.jsonl")
    }
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}
