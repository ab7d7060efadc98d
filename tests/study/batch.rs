use std::sync::Mutex;

use tuner::prelude::*;

/// Records the history length each proposal was made against.
struct SnapshotSampler {
    inner: RandomSampler,
    seen: Mutex<Vec<usize>>,
}

impl Sampler for SnapshotSampler {
    fn suggest(
        &self,
        space: &SearchSpace,
        direction: Direction,
        history: &[TrialRecord],
    ) -> Configuration {
        self.seen.lock().unwrap().push(history.len());
        self.inner.suggest(space, direction, history)
    }
}

#[test]
fn test_batch_members_share_one_snapshot() {
    let sampler = std::sync::Arc::new(SnapshotSampler {
        inner: RandomSampler::with_seed(3),
        seen: Mutex::new(Vec::new()),
    });

    struct Shared(std::sync::Arc<SnapshotSampler>);
    impl Sampler for Shared {
        fn suggest(
            &self,
            space: &SearchSpace,
            direction: Direction,
            history: &[TrialRecord],
        ) -> Configuration {
            self.0.suggest(space, direction, history)
        }
    }

    let study = Study::builder()
        .space(SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap())
        .sampler(Shared(std::sync::Arc::clone(&sampler)))
        .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default()))
        .build()
        .unwrap();

    study.run_batched(10, 4).unwrap();

    assert_eq!(study.n_trials(), 10);
    let seen = sampler.seen.lock().unwrap().clone();
    assert_eq!(seen, vec![0, 0, 0, 0, 4, 4, 4, 4, 8, 8]);
}

#[test]
fn test_batch_ids_are_unique_and_ordered() {
    let study = Study::builder()
        .space(SearchSpace::builder().int("k", 1, 9).build().unwrap())
        .sampler(RandomSampler::with_seed(6))
        .objective(|c: &Configuration| Ok::<_, Error>(c.int("k").unwrap_or_default() as f64))
        .build()
        .unwrap();
    study.run_batched(7, 3).unwrap();
    let ids: Vec<u64> = study.trials().iter().map(TrialRecord::id).collect();
    assert_eq!(ids, (0..7).collect::<Vec<u64>>());
}
