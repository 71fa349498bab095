use core::fmt;
use serde::{Deserialize, Serialize};

use crate::game::rules::SetupError;

/// Position around the table, counted from zero.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Seat(usize);

impl Seat {
    pub const fn new(index: usize) -> Self {
        Seat(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Neighbour one index down; seat 0 wraps to the last seat.
    pub const fn left(self, players: PlayerCount) -> Seat {
        let n = players.get();
        Seat((self.0 + n - 1) % n)
    }

    /// Neighbour one index up; the last seat wraps to seat 0.
    pub const fn right(self, players: PlayerCount) -> Seat {
        Seat((self.0 + 1) % players.get())
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

/// Number of seats in a game. Always at least [`PlayerCount::MIN`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PlayerCount(usize);

impl PlayerCount {
    pub const MIN: usize = 2;

    pub fn new(players: usize) -> Result<Self, SetupError> {
        if players < Self::MIN {
            return Err(SetupError::TooFewPlayers {
                players,
                min: Self::MIN,
            });
        }
        Ok(PlayerCount(players))
    }

    pub const fn get(self) -> usize {
        self.0
    }

    pub fn seats(self) -> impl Iterator<Item = Seat> {
        (0..self.0).map(Seat)
    }
}

impl TryFrom<usize> for PlayerCount {
    type Error = SetupError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        PlayerCount::new(value)
    }
}

impl<'de> Deserialize<'de> for PlayerCount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = usize::deserialize(deserializer)?;
        PlayerCount::new(raw).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for PlayerCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlayerCount, Seat};
    use crate::game::rules::SetupError;

    fn players(n: usize) -> PlayerCount {
        PlayerCount::new(n).expect("valid player count")
    }

    #[test]
    fn left_wraps_from_first_seat() {
        assert_eq!(Seat::new(0).left(players(5)), Seat::new(4));
        assert_eq!(Seat::new(3).left(players(5)), Seat::new(2));
    }

    #[test]
    fn right_wraps_from_last_seat() {
        assert_eq!(Seat::new(4).right(players(5)), Seat::new(0));
        assert_eq!(Seat::new(1).right(players(5)), Seat::new(2));
    }

    #[test]
    fn two_players_share_a_single_neighbour() {
        let n = players(2);
        assert_eq!(Seat::new(0).left(n), Seat::new(1));
        assert_eq!(Seat::new(0).right(n), Seat::new(1));
        assert_eq!(Seat::new(1).left(n), Seat::new(0));
    }

    #[test]
    fn rejects_single_player() {
        assert_eq!(
            PlayerCount::new(1),
            Err(SetupError::TooFewPlayers { players: 1, min: 2 })
        );
        assert!(PlayerCount::try_from(0usize).is_err());
    }

    #[test]
    fn seats_are_contiguous() {
        let seats: Vec<usize> = players(4).seats().map(Seat::index).collect();
        assert_eq!(seats, vec![0, 1, 2, 3]);
    }

    #[test]
    fn deserialize_enforces_minimum() {
        let ok: PlayerCount = serde_json::from_str("3").expect("three players");
        assert_eq!(ok.get(), 3);
        assert!(serde_json::from_str::<PlayerCount>("1").is_err());
    }
}
