use tuner::prelude::*;
use tuner::{Evaluation, TpeSampler};

fn quadratic_study(sampler: TpeSampler) -> Study {
    let space = SearchSpace::builder().float("x", -10.0, 10.0).build().unwrap();
    Study::builder()
        .minimize()
        .space(space)
        .sampler(sampler)
        .objective(|c: &Configuration| {
            let x = c.float("x").unwrap_or_default();
            Ok::<_, Error>((x - 3.0).powi(2))
        })
        .build()
        .unwrap()
}

#[test]
fn test_tpe_beats_its_startup_phase() {
    let sampler = TpeSampler::builder()
        .seed(42)
        .n_startup_trials(10)
        .build()
        .unwrap();
    let study = quadratic_study(sampler);
    study.run(60).unwrap();

    let trials = study.trials();
    let startup_best = trials[..10]
        .iter()
        .filter_map(TrialRecord::value)
        .fold(f64::INFINITY, f64::min);
    let best = study.best_value().unwrap();
    assert!(best <= startup_best);
    assert!(best < 0.5, "best value {best} should approach 0");
}

#[test]
fn test_tpe_same_seed_same_history() {
    let run = |seed| {
        let study = quadratic_study(TpeSampler::builder().seed(seed).build().unwrap());
        study.run(25).unwrap();
        study
            .trials()
            .iter()
            .map(|t| t.configuration().float("x").unwrap())
            .collect::<Vec<f64>>()
    };
    assert_eq!(run(11), run(11));
}

#[test]
fn test_tpe_maximize_moves_toward_high_values() {
    let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();
    let study = Study::builder()
        .maximize()
        .space(space)
        .sampler(TpeSampler::builder().seed(3).n_startup_trials(8).build().unwrap())
        .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default()))
        .build()
        .unwrap();
    study.run(40).unwrap();

    let late: Vec<f64> = study.trials()[30..]
        .iter()
        .filter_map(TrialRecord::value)
        .collect();
    let late_mean = late.iter().sum::<f64>() / late.len() as f64;
    assert!(late_mean > 0.5, "late proposals averaged {late_mean}");
}

#[test]
fn test_tpe_conditional_proposals_are_valid() {
    let space = SearchSpace::builder()
        .categorical("kernel", ["linear", "poly"])
        .add(Hyperparameter::int("degree", 2, 5).active_when(Condition::equals("kernel", "poly")))
        .build()
        .unwrap();
    let study = Study::builder()
        .minimize()
        .space(space)
        .sampler(TpeSampler::builder().seed(1).n_startup_trials(5).build().unwrap())
        .objective(|c: &Configuration| {
            Ok::<_, Error>(c.int("degree").map_or(1.0, |d| (d as f64 - 3.0).abs()))
        })
        .build()
        .unwrap();
    study.run(30).unwrap();
    assert_eq!(study.n_failed(), 0);
    for t in study.trials() {
        if t.configuration().choice("kernel") == Some("linear") {
            assert!(!t.configuration().contains("degree"));
        }
    }
}

#[test]
fn test_tpe_ignores_failed_trials() {
    let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();
    let sampler = TpeSampler::builder().seed(9).n_startup_trials(2).build().unwrap();
    let history: Vec<TrialRecord> = (0u32..20)
        .map(|i| {
            let config = space.configuration().float("x", f64::from(i) / 20.0).build().unwrap();
            if i % 2 == 0 {
                TrialRecord::complete(i.into(), config, Evaluation::from_value(f64::from(i)))
            } else {
                TrialRecord::failed(i.into(), config, FailureCause::Timeout)
            }
        })
        .collect();
    for _ in 0..10 {
        let config = sampler.suggest(&space, Direction::Minimize, &history);
        space.validate(&config).unwrap();
    }
}

#[test]
fn test_tpe_builder_rejects_bad_gamma() {
    assert!(matches!(
        TpeSampler::builder().gamma(1.5).build(),
        Err(Error::InvalidGamma(_))
    ));
}
