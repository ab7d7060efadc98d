use tuner::prelude::*;

#[test]
fn test_gp_finds_quadratic_minimum() {
    let space = SearchSpace::builder()
        .float("x", -5.0, 5.0)
        .float("y", -5.0, 5.0)
        .build()
        .unwrap();
    let study = Study::builder()
        .minimize()
        .space(space)
        .sampler(GpSampler::builder().seed(42).n_startup_trials(8).n_candidates(500).build())
        .objective(|c: &Configuration| {
            let x = c.float("x").unwrap_or_default();
            let y = c.float("y").unwrap_or_default();
            Ok::<_, Error>((x - 1.0).powi(2) + (y + 2.0).powi(2))
        })
        .build()
        .unwrap();
    study.run(30).unwrap();

    let best = study.best_value().unwrap();
    assert!(best < 1.0, "GP best {best} should be near 0");
}

#[test]
fn test_gp_startup_is_random_and_valid() {
    let space = SearchSpace::builder()
        .log_float("alpha", 1e-3, 1e3)
        .categorical("kernel", ["linear", "rbf"])
        .build()
        .unwrap();
    let sampler = GpSampler::with_seed(1);
    for _ in 0..20 {
        let config = sampler.suggest(&space, Direction::Maximize, &[]);
        space.validate(&config).unwrap();
    }
}

#[test]
fn test_gp_survives_constant_objective() {
    let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();
    let study = Study::builder()
        .maximize()
        .space(space)
        .sampler(GpSampler::builder().seed(5).n_startup_trials(3).build())
        .objective(|_: &Configuration| Ok::<_, Error>(0.5))
        .build()
        .unwrap();
    study.run(15).unwrap();
    assert_eq!(study.n_complete(), 15);
}

#[test]
fn test_gp_same_seed_same_history() {
    let run = || {
        let space = SearchSpace::builder().float("x", -2.0, 2.0).build().unwrap();
        let study = Study::builder()
            .space(space)
            .sampler(GpSampler::builder().seed(17).n_startup_trials(4).n_candidates(200).build())
            .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default().powi(2)))
            .build()
            .unwrap();
        study.run(12).unwrap();
        study
            .trials()
            .iter()
            .map(|t| t.configuration().float("x").unwrap())
            .collect::<Vec<f64>>()
    };
    assert_eq!(run(), run());
}
