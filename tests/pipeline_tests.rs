#[path = "../benches/datasets.rs"]
mod datasets;

use nalgebra::{DMatrix, DVector};
use tuner::pipeline::{
    KNeighbors, Kernel, KernelRidge, Pipeline, PipelineFactory, RegistryFactory, Ridge,
    SelectKBest, StageRegistry, StandardScaler, Step, Task,
};
use tuner::prelude::*;

fn reversed(x: &DMatrix<f64>, y: &DVector<f64>) -> (DMatrix<f64>, DVector<f64>) {
    let rows: Vec<usize> = (0..x.nrows()).rev().collect();
    (x.select_rows(&rows), y.select_rows(&rows))
}

#[test]
fn test_validation_row_order_does_not_change_the_score() {
    let data = datasets::binary_blobs(80, 4, 1.5, 3);
    let folds = Resampler::k_fold(4, 9).split(data.n_samples()).unwrap();
    let fold = &folds[0];
    let (x_train, y_train) = data.select(&fold.train);
    let (x_val, y_val) = data.select(&fold.validation);

    let mut pipeline = Pipeline::new("knn", KNeighbors::new(5, Task::Classification))
        .with_stage("scale", StandardScaler::new());
    pipeline.fit(&x_train, &y_train).unwrap();

    let (x_rev, y_rev) = reversed(&x_val, &y_val);
    let a = pipeline.evaluate(&x_val, &y_val).unwrap();
    let b = pipeline.evaluate(&x_rev, &y_rev).unwrap();
    assert!((a - b).abs() < 1e-12);
}

#[test]
fn test_scoring_never_changes_fitted_state() {
    let data = datasets::linear_regression(60, 3, 0.1, 4);
    let folds = Resampler::k_fold(3, 1).split(data.n_samples()).unwrap();
    let (x_train, y_train) = data.select(&folds[0].train);
    let (x_val, y_val) = data.select(&folds[0].validation);

    let mut pipeline = Pipeline::new("ridge", Ridge::regressor(0.1))
        .with_stage("scale", StandardScaler::new());
    pipeline.fit(&x_train, &y_train).unwrap();
    let before = pipeline.evaluate(&x_val, &y_val).unwrap();

    // Scoring wildly different rows must not move anything fitted.
    let shifted = x_val.map(|v| v * 100.0 + 50.0);
    let _ = pipeline.evaluate(&shifted, &y_val).unwrap();
    let after = pipeline.evaluate(&x_val, &y_val).unwrap();
    assert!((before - after).abs() < 1e-12);
}

#[test]
fn test_scaler_statistics_come_from_training_rows_only() {
    let x = DMatrix::from_row_slice(4, 1, &[0.0, 2.0, 100.0, 200.0]);
    let y = DVector::from_vec(vec![0.0, 1.0, 0.0, 1.0]);
    let train = [0, 1];

    let mut scaler = StandardScaler::new();
    tuner::pipeline::Transformer::fit(&mut scaler, &x.select_rows(&train), &y.select_rows(&train))
        .unwrap();
    let mean = scaler.mean().unwrap();
    assert!((mean[0] - 1.0).abs() < 1e-12);
}

#[test]
fn test_ridge_recovers_linear_signal() {
    let data = datasets::linear_regression(120, 3, 0.01, 5);
    let mut pipeline = Pipeline::new("ridge", Ridge::regressor(1e-3));
    pipeline.fit(data.features(), data.labels()).unwrap();
    assert!(pipeline.evaluate(data.features(), data.labels()).unwrap() > 0.99);
}

#[test]
fn test_kernel_ridge_classifies_blobs() {
    let data = datasets::binary_blobs(60, 2, 1.5, 6);
    let mut pipeline = Pipeline::new(
        "kernel_ridge",
        KernelRidge::new(0.1, Kernel::Rbf { gamma: 0.5 }, Task::Classification),
    )
    .with_stage("scale", StandardScaler::new());
    pipeline.fit(data.features(), data.labels()).unwrap();
    assert!(pipeline.evaluate(data.features(), data.labels()).unwrap() > 0.95);
}

#[test]
fn test_select_k_best_keeps_informative_features() {
    let data = datasets::binary_blobs(80, 6, 1.5, 7);
    let mut select = SelectKBest::new(2);
    tuner::pipeline::Transformer::fit(&mut select, data.features(), data.labels()).unwrap();
    assert_eq!(select.selected(), Some(&[0, 1][..]));
}

#[test]
fn test_registry_factory_builds_chosen_stages() {
    let space = SearchSpace::builder()
        .categorical("scaler", ["standard_scaler", "min_max_scaler", "passthrough"])
        .categorical("model", ["ridge", "knn"])
        .add(Hyperparameter::float("alpha", 0.01, 10.0).log_scale().active_when(Condition::equals("model", "ridge")))
        .add(Hyperparameter::int("n_neighbors", 1, 9).active_when(Condition::equals("model", "knn")))
        .build()
        .unwrap();
    let factory = RegistryFactory::new(
        StageRegistry::with_defaults(Task::Classification),
        Step::choice("model"),
    )
    .transformer("scale", Step::choice("scaler"));

    let config = space
        .configuration()
        .choice("scaler", "min_max_scaler")
        .choice("model", "knn")
        .int("n_neighbors", 3)
        .build()
        .unwrap();
    space.validate(&config).unwrap();

    let pipeline = factory.build(&config).unwrap();
    assert_eq!(pipeline.stage_names(), vec!["scale", "model"]);
    assert_eq!(pipeline.task(), Task::Classification);
}

#[test]
fn test_unknown_stage_tag_is_an_error() {
    let factory = RegistryFactory::new(StageRegistry::new(), Step::fixed("svm"));
    assert!(matches!(
        factory.build(&Configuration::empty()),
        Err(Error::UnknownStage(tag)) if tag == "svm"
    ));
}

#[test]
fn test_synthetic_datasets_are_seeded_and_bounded() {
    let a = datasets::binary_blobs(50, 3, 2.0, 21);
    let b = datasets::binary_blobs(50, 3, 2.0, 21);
    let c = datasets::binary_blobs(50, 3, 2.0, 22);
    assert_eq!(a.features(), b.features());
    assert_ne!(a.features(), c.features());
    assert!(a.features().iter().all(|v| v.abs() <= 3.0));
    for (i, row) in a.features().row_iter().enumerate() {
        // Labels alternate and the informative features sit on the label's side.
        assert_eq!(a.labels()[i], (i % 2) as f64);
        let side = if i % 2 == 0 { -1.0 } else { 1.0 };
        assert!(row[0] * side >= 1.0 && row[1] * side >= 1.0);
    }

    let r = datasets::linear_regression(40, 3, 0.0, 5);
    assert_eq!(r.features(), datasets::linear_regression(40, 3, 0.0, 5).features());
    for (i, row) in r.features().row_iter().enumerate() {
        let y = 3.0 * row[0] - 2.0 * row[1] + 0.5 * row[2];
        assert!((r.labels()[i] - y).abs() < 1e-12);
    }
}
