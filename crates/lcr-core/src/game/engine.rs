use serde::Serialize;
use thiserror::Error;
use tracing::{error, trace};

use crate::game::rules::{GameRules, GameSetup, SetupError, check_total_stake};
use crate::model::die::{DieSource, RollOutcome};
use crate::model::seat::Seat;
use crate::model::stakes::StakeRing;

/// Whether a game can continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Two or more seats still hold stake.
    Active,
    /// Exactly one seat holds stake.
    Terminal(Seat),
    /// No seat holds stake. Unreachable under the transfer rules.
    Exhausted,
}

/// What happened during a single seat's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnSummary {
    pub seat: Seat,
    pub stake_at_start: u32,
    pub rolls: u32,
    pub passed_left: u32,
    pub forfeited: u32,
    pub passed_right: u32,
}

impl TurnSummary {
    pub fn skipped(&self) -> bool {
        self.rolls == 0
    }
}

/// Result of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GameOutcome {
    pub winner: Seat,
    /// Rounds started, including the one in which the game ended.
    pub rounds: u64,
    /// Turns taken by funded seats.
    pub turns: u64,
    pub rolls: u64,
    /// Units paid into the centre pot.
    pub forfeited: u64,
    /// Stake held by the winner when the game ended.
    pub final_stake: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("no seat holds stake after a turn in round {round}; stake was lost outside the centre pot")]
    NoSurvivors { round: u64 },
    #[error("game did not finish within {limit} rounds")]
    RoundLimitExceeded { limit: u64 },
}

/// A single game in progress.
#[derive(Debug, Clone)]
pub struct Game {
    setup: GameSetup,
    ring: StakeRing,
    rounds: u64,
    turns: u64,
    rolls: u64,
    forfeited: u64,
}

impl Game {
    pub fn new(setup: GameSetup) -> Self {
        let ring = StakeRing::new(setup.players(), setup.rules().starting_stake);
        Self::from_parts(setup, ring)
    }

    /// Continues from arbitrary holdings. The player count is taken from `ring`.
    pub fn resume(rules: GameRules, ring: StakeRing) -> Result<Self, SetupError> {
        check_total_stake(ring.total())?;
        let setup = GameSetup::with_count(ring.players(), rules)?;
        Ok(Self::from_parts(setup, ring))
    }

    fn from_parts(setup: GameSetup, ring: StakeRing) -> Self {
        Self {
            setup,
            ring,
            rounds: 0,
            turns: 0,
            rolls: 0,
            forfeited: 0,
        }
    }

    pub fn setup(&self) -> &GameSetup {
        &self.setup
    }

    pub fn stakes(&self) -> &StakeRing {
        &self.ring
    }

    pub fn rounds(&self) -> u64 {
        self.rounds
    }

    pub fn status(&self) -> GameStatus {
        let mut funded = self.ring.funded_seats();
        match (funded.next(), funded.next()) {
            (None, _) => GameStatus::Exhausted,
            (Some(seat), None) => GameStatus::Terminal(seat),
            (Some(_), Some(_)) => GameStatus::Active,
        }
    }

    /// Plays one turn for `seat`. The number of rolls is fixed by the stake
    /// held when the turn starts; a seat with no stake does not roll.
    ///
    /// Panics if `seat` is not at this table.
    pub fn take_turn<D: DieSource + ?Sized>(&mut self, seat: Seat, die: &mut D) -> TurnSummary {
        let stake_at_start = self.ring.stake(seat);
        let rolls = self.setup.rules().rolls_for(stake_at_start);
        let mut summary = TurnSummary {
            seat,
            stake_at_start,
            rolls,
            ..TurnSummary::default()
        };
        if rolls == 0 {
            return summary;
        }

        self.turns += 1;
        for _ in 0..rolls {
            let outcome = die.roll().outcome();
            self.ring.apply(seat, outcome);
            match outcome {
                RollOutcome::Left => summary.passed_left += 1,
                RollOutcome::Center => summary.forfeited += 1,
                RollOutcome::Right => summary.passed_right += 1,
                RollOutcome::Dot => {}
            }
        }
        self.rolls += u64::from(rolls);
        self.forfeited += u64::from(summary.forfeited);
        summary
    }

    /// Runs rounds until one seat is left holding stake.
    ///
    /// The game is checked after every seat's turn, so a round can end early.
    pub fn play<D: DieSource + ?Sized>(&mut self, die: &mut D) -> Result<GameOutcome, GameError> {
        let players = self.setup.players();
        loop {
            if let Some(limit) = self.setup.rules().max_rounds
                && self.rounds >= limit
            {
                return Err(GameError::RoundLimitExceeded { limit });
            }
            self.rounds += 1;

            for seat in players.seats() {
                self.take_turn(seat, die);
                match self.status() {
                    GameStatus::Active => {}
                    GameStatus::Terminal(winner) => {
                        let outcome = self.outcome(winner);
                        trace!(
                            winner = winner.index(),
                            rounds = outcome.rounds,
                            rolls = outcome.rolls,
                            forfeited = outcome.forfeited,
                            "game finished"
                        );
                        return Ok(outcome);
                    }
                    GameStatus::Exhausted => {
                        error!(round = self.rounds, stakes = ?self.ring.as_slice(), "no seat holds stake");
                        return Err(GameError::NoSurvivors { round: self.rounds });
                    }
                }
            }
        }
    }

    fn outcome(&self, winner: Seat) -> GameOutcome {
        GameOutcome {
            winner,
            rounds: self.rounds,
            turns: self.turns,
            rolls: self.rolls,
            forfeited: self.forfeited,
            final_stake: self.ring.stake(winner),
        }
    }
}

/// Plays a fresh game to completion.
pub fn play_game<D: DieSource + ?Sized>(
    setup: &GameSetup,
    die: &mut D,
) -> Result<GameOutcome, GameError> {
    Game::new(*setup).play(die)
}
