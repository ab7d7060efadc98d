use tuner::prelude::*;

fn study(direction: Direction) -> Study {
    Study::builder()
        .direction(direction)
        .space(SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap())
        .objective(|_: &Configuration| Ok::<_, Error>(0.0))
        .build()
        .unwrap()
}

fn tell_all(study: &Study, values: &[f64]) {
    for &v in values {
        let trial = study.ask();
        study.tell(trial, Ok::<_, Error>(v));
    }
}

#[test]
fn test_best_trial_minimize() {
    let study = study(Direction::Minimize);
    tell_all(&study, &[3.0, 1.0, 2.0]);
    assert_eq!(study.best_trial().unwrap().id(), 1);
}

#[test]
fn test_best_trial_maximize() {
    let study = study(Direction::Maximize);
    tell_all(&study, &[3.0, 1.0, 4.0, 2.0]);
    let best = study.best_trial().unwrap();
    assert_eq!(best.id(), 2);
    assert!((study.best_value().unwrap() - 4.0).abs() < f64::EPSILON);
}

#[test]
fn test_best_trial_tie_prefers_earliest() {
    let study = study(Direction::Maximize);
    tell_all(&study, &[0.5, 0.9, 0.9, 0.9]);
    assert_eq!(study.best_trial().unwrap().id(), 1);
}

#[test]
fn test_best_trial_empty_history() {
    let study = study(Direction::Minimize);
    assert!(matches!(study.best_trial(), Err(Error::NoCompletedTrials)));
    assert!(matches!(study.best_value(), Err(Error::NoCompletedTrials)));
}

#[test]
fn test_top_trials() {
    let study = study(Direction::Minimize);
    tell_all(&study, &[5.0, 2.0, 4.0, 1.0, 3.0]);
    let top: Vec<u64> = study.top_trials(3).iter().map(TrialRecord::id).collect();
    assert_eq!(top, vec![3, 1, 4]);
    assert_eq!(study.top_trials(10).len(), 5);
}
