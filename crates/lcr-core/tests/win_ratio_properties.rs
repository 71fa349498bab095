use lcr_core::{
    DieFace, DieSource, FixedDie, Game, GameRules, GameSetup, GameStatus, RandomDie, Seat,
    SetupError, SimulationError, StakeRing, TrialCount, TrialPlan, simulate,
};

/// Die wrapper that remembers the faces rolled since the last clear.
struct Recording<D> {
    inner: D,
    faces: Vec<DieFace>,
}

impl<D: DieSource> DieSource for Recording<D> {
    fn roll(&mut self) -> DieFace {
        let face = self.inner.roll();
        self.faces.push(face);
        face
    }
}

fn fixed(face: u8) -> FixedDie {
    FixedDie::new(DieFace::new(face).expect("face"))
}

#[test]
fn winner_is_always_a_valid_seat() {
    let mut die = RandomDie::seeded(20240611);
    for players in 2..=12 {
        let plan = TrialPlan::standard(players, 40).expect("plan");
        plan.run_with(&mut die, |record| {
            assert!(record.outcome.winner.index() < players);
            Ok::<(), SimulationError>(())
        })
        .expect("run");
    }
}

#[test]
fn every_roll_conserves_or_forfeits_exactly_one_unit() {
    let setup = GameSetup::standard(5).expect("setup");
    let mut game = Game::new(setup);
    let mut die = Recording {
        inner: RandomDie::seeded(77),
        faces: Vec::new(),
    };

    while game.status() == GameStatus::Active {
        for seat in setup.players().seats() {
            let before = game.stakes().total();
            die.faces.clear();
            let turn = game.take_turn(seat, &mut die);
            let after = game.stakes().total();

            let centres = die
                .faces
                .iter()
                .filter(|face| face.value() == 2)
                .count() as u64;
            assert_eq!(before - after, centres, "turn {turn:?}");
            assert_eq!(u64::from(turn.forfeited), centres);
            if game.status() != GameStatus::Active {
                break;
            }
        }
    }
}

#[test]
fn single_roll_conservation_on_the_ring() {
    let mut ring = StakeRing::from_stakes(vec![3, 3, 3, 3]).expect("ring");
    for face in 1..=6u8 {
        let outcome = DieFace::new(face).expect("face").outcome();
        let before = ring.total();
        ring.apply(Seat::new(1), outcome);
        let expected = if face == 2 { before - 1 } else { before };
        assert_eq!(ring.total(), expected, "face {face}");
    }
}

#[test]
fn finished_game_has_exactly_one_funded_seat() {
    let mut die = RandomDie::seeded(3);
    for players in [2, 3, 6, 10] {
        let mut game = Game::new(GameSetup::standard(players).expect("setup"));
        let outcome = game.play(&mut die).expect("game ends");
        assert_eq!(game.stakes().funded_count(), 1);
        assert!(game.stakes().stake(outcome.winner) > 0);
        assert_eq!(game.status(), GameStatus::Terminal(outcome.winner));
    }
}

#[test]
fn ratios_sum_to_one_with_contiguous_seats() {
    let mut die = RandomDie::seeded(8);
    for (players, trials) in [(2, 1), (3, 17), (6, 250), (9, 999)] {
        let dist = TrialPlan::standard(players, trials)
            .expect("plan")
            .run(&mut die)
            .expect("run");
        let expected: Vec<usize> = (0..players).collect();
        assert_eq!(dist.seats(), expected.as_slice());
        assert_eq!(dist.ratios().len(), players);
        assert!(dist.ratios().iter().all(|r| (0.0..=1.0).contains(r)));
        assert!((dist.total() - 1.0).abs() <= 1e-9, "sum {}", dist.total());
    }
}

#[test]
fn fixed_center_die_reproduces_second_seat_sweep() {
    let rules = GameRules {
        starting_stake: 3,
        max_rolls_per_turn: 3,
        max_rounds: None,
    };
    let setup = GameSetup::new(2, rules).expect("setup");
    let plan = TrialPlan::new(setup, TrialCount::new(5).expect("trials"));
    let (seats, ratios) = plan.run(&mut fixed(2)).expect("run").into_parts();
    assert_eq!(seats, vec![0, 1]);
    assert_eq!(ratios, vec![0.0, 1.0]);
}

#[test]
fn fixed_left_die_moves_all_stake_to_second_seat() {
    let setup = GameSetup::standard(2).expect("setup");
    let mut game = Game::new(setup);
    let outcome = game.play(&mut fixed(1)).expect("game ends");
    assert_eq!(outcome.winner, Seat::new(1));
    assert_eq!(game.stakes().as_slice(), &[0, 6]);

    let dist = TrialPlan::new(setup, TrialCount::new(5).expect("trials"))
        .run(&mut fixed(1))
        .expect("run");
    assert_eq!(dist.ratios(), &[0.0, 1.0]);
}

#[test]
fn one_player_never_reaches_the_engine() {
    assert!(matches!(
        GameSetup::standard(1),
        Err(SetupError::TooFewPlayers { players: 1, .. })
    ));
    assert!(matches!(
        simulate(1, 100),
        Err(SimulationError::Setup(SetupError::TooFewPlayers { .. }))
    ));
}

#[test]
fn one_trial_yields_a_single_certain_winner() {
    let dist = TrialPlan::standard(4, 1)
        .expect("plan")
        .run(&mut RandomDie::seeded(1))
        .expect("run");
    let ones = dist.ratios().iter().filter(|&&r| r == 1.0).count();
    let zeros = dist.ratios().iter().filter(|&&r| r == 0.0).count();
    assert_eq!((ones, zeros), (1, 3));
}

#[test]
fn seeded_runs_are_deterministic() {
    let plan = TrialPlan::standard(5, 300).expect("plan");
    let a = plan.run(&mut RandomDie::seeded(42)).expect("first");
    let b = plan.run(&mut RandomDie::seeded(42)).expect("second");
    assert_eq!(a, b);
}
