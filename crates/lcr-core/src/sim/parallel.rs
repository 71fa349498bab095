use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;
use tracing::debug;

use crate::model::die::RandomDie;
use crate::sim::tally::{WinRatioDistribution, WinTally};
use crate::sim::trials::{SimulationError, TrialPlan};

/// A contiguous slice of trials with its own die seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Chunk {
    first_trial: u64,
    count: u64,
    seed: u64,
}

fn split(trials: u64, workers: usize, seed: u64) -> Vec<Chunk> {
    let workers = (workers as u64).min(trials).max(1);
    let base = trials / workers;
    let extra = trials % workers;
    let mut seeds = StdRng::seed_from_u64(seed);

    let mut chunks = Vec::with_capacity(workers as usize);
    let mut first_trial = 0;
    for index in 0..workers {
        let count = base + u64::from(index < extra);
        chunks.push(Chunk {
            first_trial,
            count,
            seed: seeds.next_u64(),
        });
        first_trial += count;
    }
    chunks
}

impl TrialPlan {
    /// Runs the plan across `workers` threads. Each thread plays a contiguous
    /// share of the trials with a die seeded from `seed`; the per-thread
    /// tallies are summed. The result depends only on `seed` and `workers`.
    pub fn run_parallel(
        &self,
        seed: u64,
        workers: usize,
    ) -> Result<WinRatioDistribution, SimulationError> {
        if workers == 0 {
            return Err(SimulationError::NoWorkers);
        }

        let chunks = split(self.trials().get(), workers, seed);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(chunks.len())
            .build()
            .map_err(|err| SimulationError::WorkerPool(err.to_string()))?;

        debug!(
            players = self.setup().players().get(),
            trials = self.trials().get(),
            workers = chunks.len(),
            "starting parallel trials"
        );

        let tallies: Vec<WinTally> = pool.install(|| {
            chunks
                .par_iter()
                .map(|chunk| {
                    let mut die = RandomDie::seeded(chunk.seed);
                    self.run_batch(chunk.first_trial, chunk.count, &mut die, |_| {
                        Ok::<(), SimulationError>(())
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut merged = WinTally::new(self.setup().players());
        for tally in &tallies {
            merged.merge(tally);
        }
        Ok(merged.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_covers_every_trial_once() {
        let chunks = split(10, 3, 1);
        let counts: Vec<u64> = chunks.iter().map(|c| c.count).collect();
        let starts: Vec<u64> = chunks.iter().map(|c| c.first_trial).collect();
        assert_eq!(counts, vec![4, 3, 3]);
        assert_eq!(starts, vec![0, 4, 7]);
    }

    #[test]
    fn split_never_creates_empty_chunks() {
        let chunks = split(2, 8, 1);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.count == 1));
    }

    #[test]
    fn parallel_runs_are_reproducible() {
        let plan = TrialPlan::standard(4, 400).expect("plan");
        let a = plan.run_parallel(11, 4).expect("first");
        let b = plan.run_parallel(11, 4).expect("second");
        assert_eq!(a, b);
        assert_eq!(a.trials(), 400);
        assert!((a.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn single_worker_matches_sequential_run() {
        let plan = TrialPlan::standard(3, 200).expect("plan");
        let parallel = plan.run_parallel(5, 1).expect("parallel");

        let chunk_seed = StdRng::seed_from_u64(5).next_u64();
        let sequential = plan.run(&mut RandomDie::seeded(chunk_seed)).expect("sequential");
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let plan = TrialPlan::standard(3, 10).expect("plan");
        assert_eq!(plan.run_parallel(1, 0), Err(SimulationError::NoWorkers));
    }
}
