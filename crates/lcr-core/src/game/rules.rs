use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::seat::PlayerCount;

pub const DEFAULT_STARTING_STAKE: u32 = 3;
pub const DEFAULT_MAX_ROLLS_PER_TURN: u32 = 3;

/// Numeric parameters of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRules {
    #[serde(default = "default_starting_stake")]
    pub starting_stake: u32,
    #[serde(default = "default_max_rolls_per_turn")]
    pub max_rolls_per_turn: u32,
    /// Optional cap on full rounds. `None` lets a game run until it ends.
    #[serde(default)]
    pub max_rounds: Option<u64>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            starting_stake: DEFAULT_STARTING_STAKE,
            max_rolls_per_turn: DEFAULT_MAX_ROLLS_PER_TURN,
            max_rounds: None,
        }
    }
}

impl GameRules {
    pub fn validate(&self) -> Result<(), SetupError> {
        if self.starting_stake == 0 {
            return Err(SetupError::ZeroStartingStake);
        }
        if self.max_rolls_per_turn == 0 {
            return Err(SetupError::ZeroRollsPerTurn);
        }
        if self.max_rounds == Some(0) {
            return Err(SetupError::ZeroRoundLimit);
        }
        Ok(())
    }

    /// Rolls a seat takes given the stake it holds when its turn begins.
    pub fn rolls_for(&self, stake: u32) -> u32 {
        self.max_rolls_per_turn.min(stake)
    }
}

fn default_starting_stake() -> u32 {
    DEFAULT_STARTING_STAKE
}

fn default_max_rolls_per_turn() -> u32 {
    DEFAULT_MAX_ROLLS_PER_TURN
}

/// Validated player count and rules; the only way to start a [`Game`](super::engine::Game).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSetup {
    players: PlayerCount,
    rules: GameRules,
}

impl GameSetup {
    pub fn new(players: usize, rules: GameRules) -> Result<Self, SetupError> {
        let players = PlayerCount::new(players)?;
        Self::with_count(players, rules)
    }

    pub fn with_count(players: PlayerCount, rules: GameRules) -> Result<Self, SetupError> {
        rules.validate()?;
        let setup = Self { players, rules };
        check_total_stake(setup.total_stake())?;
        Ok(setup)
    }

    pub fn standard(players: usize) -> Result<Self, SetupError> {
        Self::new(players, GameRules::default())
    }

    pub fn players(&self) -> PlayerCount {
        self.players
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Stake in play at the start of every game.
    pub fn total_stake(&self) -> u64 {
        u64::from(self.rules.starting_stake) * self.players.get() as u64
    }
}

/// One seat can end up holding every unit on the table, so the table total
/// has to fit in a single seat's stake.
pub(crate) fn check_total_stake(total: u64) -> Result<(), SetupError> {
    if total > u64::from(u32::MAX) {
        return Err(SetupError::StakeOverflow {
            total,
            max: u32::MAX,
        });
    }
    Ok(())
}

/// Rejected game or trial parameters, caught before anything is simulated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("a game needs at least {min} players, got {players}")]
    TooFewPlayers { players: usize, min: usize },
    #[error("starting stake must be greater than zero")]
    ZeroStartingStake,
    #[error("table holds {total} units in total, more than one seat can hold ({max})")]
    StakeOverflow { total: u64, max: u32 },
    #[error("max rolls per turn must be greater than zero")]
    ZeroRollsPerTurn,
    #[error("round limit must be greater than zero when set")]
    ZeroRoundLimit,
    #[error("at least one trial is required")]
    NoTrials,
    #[error("trial count {0} is not a finite non-negative number")]
    InvalidTrialCount(String),
}
