use std::fs;
use std::path::{Path, PathBuf};

use lcr_core::{AppInfo, GameLengthStats, GameRules, WinRatioDistribution};
use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use thiserror::Error;

const CONFIDENCE_LEVEL: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("statistics error: {0}")]
    Stats(String),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Per-seat line of the results table.
#[derive(Debug, Clone, Serialize)]
pub struct SeatReport {
    pub seat: usize,
    pub wins: u64,
    pub ratio: f64,
    pub ci95: (f64, f64),
    /// Ratio minus the fair share `1 / players`.
    pub edge: f64,
}

/// Everything the presentation layer needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub players: usize,
    pub trials: u64,
    pub seed: u64,
    pub rules: GameRules,
    pub seats: Vec<SeatReport>,
    pub favourite: Option<usize>,
    pub chi_square: f64,
    /// Probability of a spread at least this uneven if every seat were equally likely to win.
    pub uniformity_p_value: f64,
    pub game_length: GameLengthStats,
}

impl AnalyticsSummary {
    pub fn from_distribution(
        run_id: &str,
        seed: u64,
        rules: GameRules,
        distribution: &WinRatioDistribution,
    ) -> Result<Self, AnalyticsError> {
        let players = distribution.seats().len();
        let trials = distribution.trials();
        let z = Normal::new(0.0, 1.0)
            .map_err(|e| AnalyticsError::Stats(e.to_string()))?
            .inverse_cdf(1.0 - (1.0 - CONFIDENCE_LEVEL) / 2.0);
        let fair_share = 1.0 / players as f64;

        let seats = distribution
            .seats()
            .iter()
            .zip(distribution.ratios())
            .zip(distribution.wins())
            .map(|((&seat, &ratio), &wins)| SeatReport {
                seat,
                wins,
                ratio,
                ci95: wilson_interval(wins, trials, z),
                edge: ratio - fair_share,
            })
            .collect();

        let (chi_square, uniformity_p_value) = uniformity_test(distribution.wins(), trials)?;

        Ok(Self {
            run_id: run_id.to_string(),
            players,
            trials,
            seed,
            rules,
            seats,
            favourite: distribution.favourite().map(|seat| seat.index()),
            chi_square,
            uniformity_p_value,
            game_length: *distribution.game_length(),
        })
    }

    /// Fixed-width table of seats and win ratios.
    pub fn render_table(&self) -> String {
        let mut out = String::new();
        let rule = format!(
            "{:-<4}  {:-<8}  {:-<9}  {:-<17}  {:-<8}\n",
            "", "", "", "", ""
        );
        out.push_str(&rule);
        out.push_str(&format!(
            "{:>4}  {:>8}  {:>9}  {:>17}  {:>8}\n",
            "seat", "wins", "win ratio", "95% CI", "edge"
        ));
        out.push_str(&rule);
        for seat in &self.seats {
            out.push_str(&format!(
                "{:>4}  {:>8}  {:>9.4}  [{:>6.4}, {:>6.4}]  {:>+8.4}\n",
                seat.seat, seat.wins, seat.ratio, seat.ci95.0, seat.ci95.1, seat.edge
            ));
        }
        out.push_str(&rule);
        out
    }

    pub fn write_table(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.render_table()).map_err(|e| AnalyticsError::Io {
            context: "writing results table",
            source: e,
        })
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Win Ratio Summary\n\n");
        rows.push_str(&format!(
            "Run `{}` generated by {} v{}\n\n",
            self.run_id,
            AppInfo::name(),
            AppInfo::version()
        ));
        rows.push_str(&format!(
            "- Players: {}\n- Trials: {}\n- Seed: {}\n- Starting stake: {}\n- Max rolls per turn: {}\n\n",
            self.players,
            self.trials,
            self.seed,
            self.rules.starting_stake,
            self.rules.max_rolls_per_turn
        ));
        rows.push_str("| Seat | Wins | Win % | 95% CI | Edge vs fair |\n");
        rows.push_str("|------|------|-------|--------|--------------|\n");

        for seat in &self.seats {
            let marker = if self.favourite == Some(seat.seat) {
                " *"
            } else {
                ""
            };
            rows.push_str(&format!(
                "| {seat}{marker} | {wins} | {win:.2}% | [{low:.2}%, {high:.2}%] | {edge:+.2} pp |\n",
                seat = seat.seat,
                wins = seat.wins,
                win = seat.ratio * 100.0,
                low = seat.ci95.0 * 100.0,
                high = seat.ci95.1 * 100.0,
                edge = seat.edge * 100.0,
            ));
        }

        rows.push_str(&format!(
            "\nChi-squared vs equal odds: {:.3} (p = {:.4})\n",
            self.chi_square, self.uniformity_p_value
        ));
        rows.push_str(&format!(
            "\nGame length: {:.2} rounds on average (max {}), {:.2} rolls, {:.2} units forfeited\n",
            self.game_length.mean_rounds,
            self.game_length.max_rounds,
            self.game_length.mean_rolls,
            self.game_length.mean_forfeited
        ));

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    /// Writes this summary together with the raw distribution as pretty JSON.
    pub fn write_json(
        &self,
        distribution: &WinRatioDistribution,
        path: impl AsRef<Path>,
    ) -> Result<(), AnalyticsError> {
        #[derive(Serialize)]
        struct Report<'a> {
            summary: &'a AnalyticsSummary,
            distribution: &'a WinRatioDistribution,
        }

        let json = serde_json::to_string_pretty(&Report {
            summary: self,
            distribution,
        })
        .map_err(|e| AnalyticsError::Stats(e.to_string()))?;
        fs::write(path.as_ref(), json).map_err(|e| AnalyticsError::Io {
            context: "writing summary json",
            source: e,
        })
    }

    pub fn render_plot(&self, output_path: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let output_path = output_path.as_ref().to_path_buf();
        if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let points: Vec<(f64, f64)> = self
            .seats
            .iter()
            .map(|seat| (seat.seat as f64, seat.ratio))
            .collect();
        let players = self.players;
        let fair_share = 1.0 / players as f64;
        let caption = format!("Win ratio by seat ({} players, {} trials)", players, self.trials);

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let y_max = points
                .iter()
                .map(|(_, ratio)| *ratio)
                .fold(fair_share, f64::max);
            let margin = (y_max * 0.1).max(0.02);
            let x_max = players.saturating_sub(1) as f64;

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(caption, ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(-0.5f64..(x_max + 0.5), 0.0f64..(y_max + margin))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Win ratio")
                .x_desc("Seat")
                .x_labels(players.min(20))
                .x_label_formatter(&|x| format!("{:.0}", x))
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(-0.5, fair_share), (x_max + 0.5, fair_share)],
                    BLACK.mix(0.4).stroke_width(1),
                )))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(std::iter::once(PathElement::new(
                    points.clone(),
                    BLUE.stroke_width(2),
                )))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(
                    points
                        .iter()
                        .map(|&(x, y)| Circle::new((x, y), 4, BLUE.filled())),
                )
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

/// Wilson score interval for `wins` successes out of `trials`.
fn wilson_interval(wins: u64, trials: u64, z: f64) -> (f64, f64) {
    if trials == 0 {
        return (0.0, 0.0);
    }
    let n = trials as f64;
    let p = wins as f64 / n;
    let z2 = z * z;
    let denom = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denom;
    let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    ((centre - half).max(0.0), (centre + half).min(1.0))
}

/// Pearson chi-squared statistic against equal odds and its p-value.
fn uniformity_test(wins: &[u64], trials: u64) -> Result<(f64, f64), AnalyticsError> {
    if wins.len() < 2 || trials == 0 {
        return Ok((0.0, 1.0));
    }
    let expected = trials as f64 / wins.len() as f64;
    let statistic: f64 = wins
        .iter()
        .map(|&observed| (observed as f64 - expected).powi(2) / expected)
        .sum();
    let dist = ChiSquared::new((wins.len() - 1) as f64)
        .map_err(|e| AnalyticsError::Stats(e.to_string()))?;
    let p = (1.0 - dist.cdf(statistic)).clamp(0.0, 1.0);
    Ok((statistic, p))
}
