use serde::Serialize;

use crate::game::engine::GameOutcome;
use crate::model::seat::{PlayerCount, Seat};

/// Running win counters for one batch of trials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinTally {
    wins: Vec<u64>,
    trials: u64,
    total_rounds: u64,
    max_rounds: u64,
    total_rolls: u64,
    total_forfeited: u64,
}

impl WinTally {
    pub fn new(players: PlayerCount) -> Self {
        Self {
            wins: vec![0; players.get()],
            trials: 0,
            total_rounds: 0,
            max_rounds: 0,
            total_rolls: 0,
            total_forfeited: 0,
        }
    }

    pub fn record(&mut self, outcome: &GameOutcome) {
        self.wins[outcome.winner.index()] += 1;
        self.trials += 1;
        self.total_rounds += outcome.rounds;
        self.max_rounds = self.max_rounds.max(outcome.rounds);
        self.total_rolls += outcome.rolls;
        self.total_forfeited += outcome.forfeited;
    }

    /// Folds another batch for the same table size into this one.
    pub fn merge(&mut self, other: &WinTally) {
        debug_assert_eq!(self.wins.len(), other.wins.len());
        for (mine, theirs) in self.wins.iter_mut().zip(&other.wins) {
            *mine += theirs;
        }
        self.trials += other.trials;
        self.total_rounds += other.total_rounds;
        self.max_rounds = self.max_rounds.max(other.max_rounds);
        self.total_rolls += other.total_rolls;
        self.total_forfeited += other.total_forfeited;
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn wins(&self, seat: Seat) -> u64 {
        self.wins[seat.index()]
    }

    /// Divides every counter by the number of recorded trials.
    pub fn finalize(self) -> WinRatioDistribution {
        let trials = self.trials;
        let per_trial = |total: u64| {
            if trials == 0 {
                0.0
            } else {
                total as f64 / trials as f64
            }
        };

        let ratios = self.wins.iter().map(|&w| per_trial(w)).collect();
        let game_length = GameLengthStats {
            mean_rounds: per_trial(self.total_rounds),
            max_rounds: self.max_rounds,
            mean_rolls: per_trial(self.total_rolls),
            mean_forfeited: per_trial(self.total_forfeited),
        };

        WinRatioDistribution {
            seats: (0..self.wins.len()).collect(),
            ratios,
            wins: self.wins,
            trials,
            game_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameLengthStats {
    pub mean_rounds: f64,
    pub max_rounds: u64,
    pub mean_rolls: f64,
    /// Units paid into the centre pot per game, averaged over all trials.
    pub mean_forfeited: f64,
}

/// Estimated probability of each starting seat winning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinRatioDistribution {
    seats: Vec<usize>,
    ratios: Vec<f64>,
    wins: Vec<u64>,
    trials: u64,
    game_length: GameLengthStats,
}

impl WinRatioDistribution {
    /// Seat indices, always `0..N`.
    pub fn seats(&self) -> &[usize] {
        &self.seats
    }

    /// Win ratio per seat, aligned with [`seats`](Self::seats).
    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    pub fn wins(&self) -> &[u64] {
        &self.wins
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }

    pub fn game_length(&self) -> &GameLengthStats {
        &self.game_length
    }

    pub fn ratio(&self, seat: Seat) -> Option<f64> {
        self.ratios.get(seat.index()).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Seat, f64)> + '_ {
        self.ratios
            .iter()
            .enumerate()
            .map(|(index, &ratio)| (Seat::new(index), ratio))
    }

    pub fn total(&self) -> f64 {
        self.ratios.iter().sum()
    }

    /// Seat with the highest ratio; ties go to the lower index.
    pub fn favourite(&self) -> Option<Seat> {
        self.iter()
            .fold(None, |best: Option<(Seat, f64)>, (seat, ratio)| match best {
                Some((_, top)) if top >= ratio => best,
                _ => Some((seat, ratio)),
            })
            .map(|(seat, _)| seat)
    }

    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.seats, self.ratios)
    }
}
