use core::fmt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Face of a standard six-sided die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DieFace(u8);

impl DieFace {
    pub const SIDES: u8 = 6;

    pub const fn new(value: u8) -> Option<Self> {
        if value >= 1 && value <= Self::SIDES {
            Some(DieFace(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn outcome(self) -> RollOutcome {
        RollOutcome::from_face(self)
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Effect a rolled face has on the roller's stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollOutcome {
    /// Pass one unit to the seat one index down.
    Left,
    /// Forfeit one unit to the centre pot.
    Center,
    /// Pass one unit to the seat one index up.
    Right,
    /// No effect.
    Dot,
}

impl RollOutcome {
    pub const fn from_face(face: DieFace) -> Self {
        match face.value() {
            1 => RollOutcome::Left,
            2 => RollOutcome::Center,
            3 => RollOutcome::Right,
            _ => RollOutcome::Dot,
        }
    }

    pub const fn moves_stake(self) -> bool {
        !matches!(self, RollOutcome::Dot)
    }
}

/// Source of die rolls consumed by the engine.
pub trait DieSource {
    fn roll(&mut self) -> DieFace;
}

impl<D: DieSource + ?Sized> DieSource for &mut D {
    fn roll(&mut self) -> DieFace {
        (**self).roll()
    }
}

impl<D: DieSource + ?Sized> DieSource for Box<D> {
    fn roll(&mut self) -> DieFace {
        (**self).roll()
    }
}

/// Uniform die backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomDie<R> {
    rng: R,
}

impl<R: Rng> RandomDie<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomDie<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> DieSource for RandomDie<R> {
    fn roll(&mut self) -> DieFace {
        DieFace(self.rng.gen_range(1..=DieFace::SIDES))
    }
}

/// Die that always lands on the same face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDie(DieFace);

impl FixedDie {
    pub const fn new(face: DieFace) -> Self {
        FixedDie(face)
    }
}

impl DieSource for FixedDie {
    fn roll(&mut self) -> DieFace {
        self.0
    }
}

/// Die that replays a face sequence, starting over once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedDie {
    faces: Vec<DieFace>,
    cursor: usize,
}

impl ScriptedDie {
    /// Returns `None` when `faces` is empty.
    pub fn new(faces: Vec<DieFace>) -> Option<Self> {
        if faces.is_empty() {
            return None;
        }
        Some(Self { faces, cursor: 0 })
    }

    /// Builds a script from raw values, rejecting anything outside 1..=6.
    pub fn from_values(values: &[u8]) -> Option<Self> {
        let faces = values
            .iter()
            .map(|&v| DieFace::new(v))
            .collect::<Option<Vec<_>>>()?;
        Self::new(faces)
    }

    pub fn rolls_made(&self) -> usize {
        self.cursor
    }
}

impl DieSource for ScriptedDie {
    fn roll(&mut self) -> DieFace {
        let face = self.faces[self.cursor % self.faces.len()];
        self.cursor += 1;
        face
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_rejects_out_of_range_values() {
        assert!(DieFace::new(0).is_none());
        assert!(DieFace::new(7).is_none());
        assert_eq!(DieFace::new(6).map(DieFace::value), Some(6));
    }

    #[test]
    fn faces_map_to_outcomes() {
        let outcomes: Vec<RollOutcome> = (1..=6)
            .filter_map(DieFace::new)
            .map(DieFace::outcome)
            .collect();
        assert_eq!(
            outcomes,
            vec![
                RollOutcome::Left,
                RollOutcome::Center,
                RollOutcome::Right,
                RollOutcome::Dot,
                RollOutcome::Dot,
                RollOutcome::Dot,
            ]
        );
    }

    #[test]
    fn random_die_covers_every_face() {
        let mut die = RandomDie::seeded(7);
        let mut seen = [0u32; 6];
        for _ in 0..6_000 {
            let face = die.roll();
            seen[usize::from(face.value()) - 1] += 1;
        }
        assert!(seen.iter().all(|&count| count > 800), "counts: {seen:?}");
    }

    #[test]
    fn seeded_dice_are_reproducible() {
        let mut a = RandomDie::seeded(99);
        let mut b = RandomDie::seeded(99);
        for _ in 0..64 {
            assert_eq!(a.roll(), b.roll());
        }
    }

    #[test]
    fn scripted_die_cycles() {
        let mut die = ScriptedDie::from_values(&[1, 4]).expect("valid script");
        let rolled: Vec<u8> = (0..5).map(|_| die.roll().value()).collect();
        assert_eq!(rolled, vec![1, 4, 1, 4, 1]);
        assert_eq!(die.rolls_made(), 5);
    }

    #[test]
    fn scripted_die_rejects_bad_scripts() {
        assert!(ScriptedDie::from_values(&[]).is_none());
        assert!(ScriptedDie::from_values(&[2, 9]).is_none());
    }

    #[test]
    fn boxed_sources_forward_rolls() {
        let face = DieFace::new(3).expect("face");
        let mut die: Box<dyn DieSource> = Box::new(FixedDie::new(face));
        assert_eq!(die.roll(), face);
    }
}
