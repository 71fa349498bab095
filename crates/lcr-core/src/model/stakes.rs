use serde::Serialize;

use crate::model::die::RollOutcome;
use crate::model::seat::{PlayerCount, Seat};

/// Stake held by every seat, arranged as a ring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeRing {
    #[serde(skip)]
    players: PlayerCount,
    stakes: Vec<u32>,
}

impl StakeRing {
    pub fn new(players: PlayerCount, starting_stake: u32) -> Self {
        Self {
            players,
            stakes: vec![starting_stake; players.get()],
        }
    }

    /// Builds a ring from explicit holdings. Returns `None` for fewer than two seats.
    pub fn from_stakes(stakes: Vec<u32>) -> Option<Self> {
        let players = PlayerCount::new(stakes.len()).ok()?;
        Some(Self { players, stakes })
    }

    pub fn players(&self) -> PlayerCount {
        self.players
    }

    pub fn stake(&self, seat: Seat) -> u32 {
        self.stakes[seat.index()]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.stakes
    }

    pub fn total(&self) -> u64 {
        self.stakes.iter().map(|&s| u64::from(s)).sum()
    }

    pub fn funded_seats(&self) -> impl Iterator<Item = Seat> + '_ {
        self.stakes
            .iter()
            .enumerate()
            .filter(|(_, stake)| **stake > 0)
            .map(|(index, _)| Seat::new(index))
    }

    pub fn funded_count(&self) -> usize {
        self.stakes.iter().filter(|&&s| s > 0).count()
    }

    /// Applies one roll made by `seat` and returns the seat that received the
    /// unit, if any. `seat` must hold stake; a turn never rolls more dice
    /// than the roller held when it began.
    pub fn apply(&mut self, seat: Seat, outcome: RollOutcome) -> Option<Seat> {
        if !outcome.moves_stake() {
            return None;
        }
        debug_assert!(
            self.stakes[seat.index()] > 0,
            "{seat} rolled with no stake: {:?}",
            self.stakes
        );

        let players = self.players;
        self.stakes[seat.index()] -= 1;
        let recipient = match outcome {
            RollOutcome::Left => Some(seat.left(players)),
            RollOutcome::Right => Some(seat.right(players)),
            RollOutcome::Center | RollOutcome::Dot => None,
        };
        if let Some(target) = recipient {
            self.stakes[target.index()] += 1;
        }
        recipient
    }
}
