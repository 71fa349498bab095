use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::game::engine::{GameError, GameOutcome, play_game};
use crate::game::rules::{GameSetup, SetupError};
use crate::model::die::{DieSource, RandomDie};
use crate::sim::tally::{WinRatioDistribution, WinTally};

/// Number of games to simulate. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TrialCount(u64);

impl TrialCount {
    pub fn new(trials: u64) -> Result<Self, SetupError> {
        if trials == 0 {
            return Err(SetupError::NoTrials);
        }
        Ok(TrialCount(trials))
    }

    /// Truncates a fractional count toward zero, so `2.9` runs two trials.
    pub fn from_f64(trials: f64) -> Result<Self, SetupError> {
        if !trials.is_finite() || trials < 0.0 || trials > u64::MAX as f64 {
            return Err(SetupError::InvalidTrialCount(trials.to_string()));
        }
        Self::new(trials.trunc() as u64)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrialCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrialCount {
    type Err = SetupError;

    /// Accepts integers as well as decimal or exponent forms such as `1e5`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().replace('_', "");
        if let Ok(whole) = trimmed.parse::<u64>() {
            return Self::new(whole);
        }
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| SetupError::InvalidTrialCount(s.to_string()))?;
        Self::from_f64(value)
    }
}

impl<'de> Deserialize<'de> for TrialCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Whole(u64),
            Fractional(f64),
            Text(String),
        }

        let parsed = match Raw::deserialize(deserializer)? {
            Raw::Whole(value) => TrialCount::new(value),
            Raw::Fractional(value) => TrialCount::from_f64(value),
            Raw::Text(text) => text.parse(),
        };
        parsed.map_err(serde::de::Error::custom)
    }
}

/// One finished trial, handed to observers as the run progresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrialRecord {
    pub trial: u64,
    #[serde(flatten)]
    pub outcome: GameOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    #[error("invalid simulation setup: {0}")]
    Setup(#[from] SetupError),
    #[error("trial {trial} failed: {source}")]
    Trial {
        trial: u64,
        #[source]
        source: GameError,
    },
    #[error("worker count must be at least 1")]
    NoWorkers,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// A fixed table size and rule set, replayed for a number of trials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialPlan {
    setup: GameSetup,
    trials: TrialCount,
}

impl TrialPlan {
    pub fn new(setup: GameSetup, trials: TrialCount) -> Self {
        Self { setup, trials }
    }

    /// Default rules for `players` seats.
    pub fn standard(players: usize, trials: u64) -> Result<Self, SetupError> {
        Ok(Self::new(
            GameSetup::standard(players)?,
            TrialCount::new(trials)?,
        ))
    }

    pub fn setup(&self) -> &GameSetup {
        &self.setup
    }

    pub fn trials(&self) -> TrialCount {
        self.trials
    }

    pub fn run<D: DieSource + ?Sized>(
        &self,
        die: &mut D,
    ) -> Result<WinRatioDistribution, SimulationError> {
        self.run_with(die, |_| Ok::<(), SimulationError>(()))
    }

    /// Runs every trial in order, calling `on_trial` after each game. The
    /// first failing game or observer aborts the run.
    pub fn run_with<D, F, E>(&self, die: &mut D, on_trial: F) -> Result<WinRatioDistribution, E>
    where
        D: DieSource + ?Sized,
        F: FnMut(&TrialRecord) -> Result<(), E>,
        E: From<SimulationError>,
    {
        debug!(
            players = self.setup.players().get(),
            trials = self.trials.get(),
            "starting trials"
        );
        let tally = self.run_batch(0, self.trials.get(), die, on_trial)?;
        let distribution = tally.finalize();
        debug!(
            trials = distribution.trials(),
            ratios = ?distribution.ratios(),
            "trials complete"
        );
        Ok(distribution)
    }

    pub(crate) fn run_batch<D, F, E>(
        &self,
        first_trial: u64,
        count: u64,
        die: &mut D,
        mut on_trial: F,
    ) -> Result<WinTally, E>
    where
        D: DieSource + ?Sized,
        F: FnMut(&TrialRecord) -> Result<(), E>,
        E: From<SimulationError>,
    {
        let mut tally = WinTally::new(self.setup.players());
        for trial in first_trial..first_trial + count {
            let outcome = play_game(&self.setup, die)
                .map_err(|source| SimulationError::Trial { trial, source })?;
            tally.record(&outcome);
            on_trial(&TrialRecord { trial, outcome })?;
        }
        Ok(tally)
    }
}

/// Runs `trials` default-rule games for `players` seats with an
/// entropy-seeded die.
pub fn simulate(players: usize, trials: u64) -> Result<WinRatioDistribution, SimulationError> {
    let plan = TrialPlan::standard(players, trials)?;
    plan.run(&mut RandomDie::from_entropy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::GameRules;
    use crate::model::die::{DieFace, FixedDie};

    fn fixed(face: u8) -> FixedDie {
        FixedDie::new(DieFace::new(face).expect("face"))
    }

    #[test]
    fn trial_count_truncates_fractions() {
        assert_eq!(TrialCount::from_f64(2.9).map(TrialCount::get), Ok(2));
        assert_eq!(TrialCount::from_f64(0.5), Err(SetupError::NoTrials));
        assert!(matches!(
            TrialCount::from_f64(f64::NAN),
            Err(SetupError::InvalidTrialCount(_))
        ));
        assert!(TrialCount::from_f64(-3.0).is_err());
    }

    #[test]
    fn trial_count_parses_exponent_notation() {
        assert_eq!("1e4".parse::<TrialCount>().map(TrialCount::get), Ok(10_000));
        assert_eq!("1_000".parse::<TrialCount>().map(TrialCount::get), Ok(1_000));
        assert_eq!("12.7".parse::<TrialCount>().map(TrialCount::get), Ok(12));
        assert!("many".parse::<TrialCount>().is_err());
        assert_eq!("0".parse::<TrialCount>(), Err(SetupError::NoTrials));
    }

    #[test]
    fn trial_count_deserializes_numbers_and_strings() {
        let whole: TrialCount = serde_json::from_str("25").expect("whole");
        let fractional: TrialCount = serde_json::from_str("25.8").expect("fractional");
        let text: TrialCount = serde_json::from_str("\"2.5e1\"").expect("text");
        assert_eq!((whole.get(), fractional.get(), text.get()), (25, 25, 25));
        assert!(serde_json::from_str::<TrialCount>("0").is_err());
    }

    #[test]
    fn always_center_gives_every_trial_to_second_seat() {
        let plan = TrialPlan::standard(2, 5).expect("plan");
        let dist = plan.run(&mut fixed(2)).expect("run");
        assert_eq!(dist.seats(), &[0, 1]);
        assert_eq!(dist.ratios(), &[0.0, 1.0]);
        assert_eq!(dist.trials(), 5);
    }

    #[test]
    fn always_left_gives_every_trial_to_second_seat() {
        let plan = TrialPlan::standard(2, 5).expect("plan");
        let dist = plan.run(&mut fixed(1)).expect("run");
        assert_eq!(dist.ratios(), &[0.0, 1.0]);
    }

    #[test]
    fn observer_sees_every_trial_in_order() {
        let plan = TrialPlan::standard(2, 4).expect("plan");
        let mut seen = Vec::new();
        plan.run_with(&mut fixed(2), |record| {
            seen.push((record.trial, record.outcome.winner.index()));
            Ok::<(), SimulationError>(())
        })
        .expect("run");
        assert_eq!(seen, vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn observer_error_aborts_run() {
        #[derive(Debug, PartialEq)]
        enum Stop {
            Observer,
            Sim(SimulationError),
        }
        impl From<SimulationError> for Stop {
            fn from(err: SimulationError) -> Self {
                Stop::Sim(err)
            }
        }

        let plan = TrialPlan::standard(2, 10).expect("plan");
        let mut calls = 0;
        let result = plan.run_with(&mut fixed(2), |_| {
            calls += 1;
            if calls == 3 { Err(Stop::Observer) } else { Ok(()) }
        });
        assert_eq!(result, Err(Stop::Observer));
        assert_eq!(calls, 3);
    }

    #[test]
    fn failing_game_aborts_with_trial_index() {
        let rules = GameRules {
            max_rounds: Some(2),
            ..GameRules::default()
        };
        let setup = GameSetup::new(3, rules).expect("setup");
        let plan = TrialPlan::new(setup, TrialCount::new(3).expect("trials"));
        let err = plan.run(&mut fixed(6)).expect_err("dots never finish");
        assert_eq!(
            err,
            SimulationError::Trial {
                trial: 0,
                source: GameError::RoundLimitExceeded { limit: 2 },
            }
        );
    }

    #[test]
    fn simulate_rejects_bad_inputs() {
        assert_eq!(
            simulate(1, 10),
            Err(SimulationError::Setup(SetupError::TooFewPlayers {
                players: 1,
                min: 2
            }))
        );
        assert_eq!(
            simulate(3, 0),
            Err(SimulationError::Setup(SetupError::NoTrials))
        );
    }

    #[test]
    fn simulate_single_trial_has_one_winner() {
        let dist = simulate(5, 1).expect("run");
        assert_eq!(dist.seats(), &[0, 1, 2, 3, 4]);
        assert_eq!(dist.ratios().iter().filter(|&&r| r == 1.0).count(), 1);
        assert_eq!(dist.ratios().iter().filter(|&&r| r == 0.0).count(), 4);
    }
}
