use tuner::prelude::*;

#[test]
fn test_enqueued_configurations_run_first() {
    let space = SearchSpace::builder().float("x", 0.0, 10.0).build().unwrap();
    let study = Study::builder()
        .space(space)
        .sampler(RandomSampler::with_seed(2))
        .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default()))
        .build()
        .unwrap();

    for x in [1.0, 2.0] {
        let config = study.space().configuration().float("x", x).build().unwrap();
        study.enqueue(config);
    }
    assert_eq!(study.n_enqueued(), 2);

    study.run(4).unwrap();
    assert_eq!(study.n_enqueued(), 0);
    let trials = study.trials();
    assert_eq!(trials[0].configuration().float("x"), Some(1.0));
    assert_eq!(trials[1].configuration().float("x"), Some(2.0));
    assert_eq!(trials.len(), 4);
}

#[test]
fn test_enqueued_configurations_fill_a_batch() {
    let space = SearchSpace::builder().int("n", 0, 100).build().unwrap();
    let study = Study::builder()
        .space(space)
        .objective(|c: &Configuration| Ok::<_, Error>(c.int("n").unwrap_or_default() as f64))
        .build()
        .unwrap();
    let fixed = study.space().configuration().int("n", 42).build().unwrap();
    study.enqueue(fixed.clone());

    study.run_batched(3, 3).unwrap();
    assert_eq!(study.trials()[0].configuration(), &fixed);
}
