#![deny(warnings)]
pub mod game;
pub mod model;
pub mod sim;

pub use game::engine::{Game, GameError, GameOutcome, GameStatus, TurnSummary, play_game};
pub use game::rules::{GameRules, GameSetup, SetupError};
pub use model::die::{DieFace, DieSource, FixedDie, RandomDie, RollOutcome, ScriptedDie};
pub use model::seat::{PlayerCount, Seat};
pub use model::stakes::StakeRing;
pub use sim::tally::{GameLengthStats, WinRatioDistribution, WinTally};
pub use sim::trials::{SimulationError, TrialCount, TrialPlan, TrialRecord, simulate};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "lcr-sim"
    }

    pub const fn description() -> &'static str {
        "Left-Center-Right seat advantage simulator"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::AppInfo;

    #[test]
    fn exposes_static_metadata() {
        assert_eq!(AppInfo::name(), "lcr-sim");
        assert!(AppInfo::description().contains("Left-Center-Right"));
        assert!(!AppInfo::version().is_empty());
    }
}
