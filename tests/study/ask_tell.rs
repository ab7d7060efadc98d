use tuner::prelude::*;

fn study() -> Study {
    Study::builder()
        .minimize()
        .space(
            SearchSpace::builder()
                .categorical("kernel", ["linear", "poly"])
                .add(
                    Hyperparameter::int("degree", 2, 5)
                        .active_when(Condition::equals("kernel", "poly")),
                )
                .build()
                .unwrap(),
        )
        .sampler(RandomSampler::with_seed(10))
        .objective(|_: &Configuration| Ok::<_, Error>(0.0))
        .build()
        .unwrap()
}

#[test]
fn test_ask_returns_valid_configurations_with_fresh_ids() {
    let study = study();
    let a = study.ask();
    let b = study.ask();
    assert_ne!(a.id(), b.id());
    assert!(study.space().is_valid(a.configuration()));
    assert!(study.space().is_valid(b.configuration()));
    study.tell(b, Ok::<_, Error>(1.0));
    study.tell(a, Ok::<_, Error>(2.0));
    assert_eq!(study.n_complete(), 2);
}

#[test]
fn test_tell_error_records_failure() {
    let study = study();
    let trial = study.ask();
    study.tell(trial, Err::<f64, _>("diverged"));
    let record = &study.trials()[0];
    assert_eq!(record.state(), TrialState::Failed);
    assert_eq!(
        record.failure(),
        Some(&FailureCause::Objective("diverged".into()))
    );
}

#[test]
fn test_invalid_enqueued_configuration_is_recorded_failed() {
    let study = study();
    let leaky = study
        .space()
        .configuration()
        .choice("kernel", "linear")
        .int("degree", 3)
        .build()
        .unwrap();
    study.enqueue(leaky);
    study.run(3).unwrap();

    let first = &study.trials()[0];
    assert!(matches!(
        first.failure(),
        Some(FailureCause::InvalidConfiguration(_))
    ));
    assert_eq!(study.n_trials(), 3);
}
