use core::time::Duration;

use tuner::prelude::*;

fn space() -> SearchSpace {
    SearchSpace::builder()
        .float("x", -4.0, 4.0)
        .int("n", 0, 5)
        .build()
        .unwrap()
}

fn objective(c: &Configuration) -> tuner::Result<f64> {
    let x = c.float("x").unwrap_or_default();
    let n = c.int("n").unwrap_or_default() as f64;
    Ok(x * x + n)
}

#[test]
fn test_run_records_every_trial_in_order() {
    let study = Study::builder()
        .space(space())
        .sampler(RandomSampler::with_seed(1))
        .objective(objective)
        .build()
        .unwrap();
    study.run(15).unwrap();

    let trials = study.trials();
    assert_eq!(trials.len(), 15);
    for (i, t) in trials.iter().enumerate() {
        assert_eq!(t.id(), i as u64);
        assert!(t.is_complete());
        study.space().validate(t.configuration()).unwrap();
    }
}

#[test]
fn test_best_so_far_is_monotone() {
    let study = Study::builder()
        .minimize()
        .space(space())
        .sampler(TpeSampler::builder().seed(4).build().unwrap())
        .objective(objective)
        .build()
        .unwrap();

    let mut previous = f64::INFINITY;
    for _ in 0..20 {
        study.run(1).unwrap();
        let best = study.best_value().unwrap();
        assert!(best <= previous, "best went from {previous} to {best}");
        previous = best;
    }
}

#[test]
fn test_failed_trials_do_not_stop_the_run() {
    let study = Study::builder()
        .space(space())
        .sampler(RandomSampler::with_seed(2))
        .objective(|c: &Configuration| {
            let x = c.float("x").unwrap_or_default();
            if x < 0.0 { Err("negative") } else { Ok(x) }
        })
        .build()
        .unwrap();
    study.run(30).unwrap();

    assert_eq!(study.n_trials(), 30);
    assert!(study.n_failed() > 0);
    assert!(study.n_complete() > 0);
    for t in study.trials() {
        if !t.is_complete() {
            assert!(matches!(t.failure(), Some(FailureCause::Objective(_))));
            assert_eq!(t.value(), None);
        }
    }
}

#[test]
fn test_timeout_marks_slow_trials_failed() {
    let study = Study::builder()
        .space(space())
        .objective(|_: &Configuration| {
            std::thread::sleep(Duration::from_millis(20));
            Ok::<_, Error>(1.0)
        })
        .timeout(Duration::from_millis(1))
        .build()
        .unwrap();

    assert!(matches!(study.run(2), Err(Error::NoCompletedTrials)));
    for t in study.trials() {
        assert_eq!(t.failure(), Some(&FailureCause::Timeout));
        assert!(t.duration() >= Duration::from_millis(20));
    }
}

#[test]
fn test_non_finite_values_fail_the_trial() {
    let study = Study::builder()
        .space(space())
        .objective(|_: &Configuration| Ok::<_, Error>(f64::NAN))
        .build()
        .unwrap();
    assert!(study.run(3).is_err());
    assert_eq!(study.n_failed(), 3);
}

#[test]
fn test_summary_mentions_direction_and_best() {
    let study = Study::builder()
        .maximize()
        .space(space())
        .sampler(RandomSampler::with_seed(8))
        .objective(objective)
        .build()
        .unwrap();
    study.run(5).unwrap();
    let summary = study.to_string();
    assert!(summary.contains("Maximize"));
    assert!(summary.contains("5 trials"));
    assert!(summary.contains("Best value"));
}
