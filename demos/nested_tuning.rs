//! Nested tuning of a scaler + ridge/kNN pipeline on a synthetic dataset.
//!
//! Each trial is scored by inner cross-validation inside every fold of a
//! fixed outer partition, so the reported value never touches rows the
//! pipeline was fitted on. The second half re-runs the whole search once per
//! outer fold to estimate how well the tuned pipeline generalizes.
//!
//! Run with: `cargo run --example nested_tuning`

use std::sync::Arc;

use tuner::pipeline::{RegistryFactory, StageRegistry, Step, Task};
use tuner::prelude::*;

fn blobs(n: usize, seed: u64) -> tuner::Result<Dataset> {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let center = if i % 2 == 0 { -1.0 } else { 1.0 };
        rows.push(vec![
            center + rng.f64() * 2.0 - 1.0,
            center + rng.f64() * 2.0 - 1.0,
            rng.f64() * 4.0 - 2.0,
            rng.f64() * 4.0 - 2.0,
        ]);
        labels.push(f64::from(u8::from(i % 2 == 1)));
    }
    Dataset::from_rows(&rows, labels)
}

fn main() -> tuner::Result<()> {
    let data = blobs(120, 3)?;

    let space = SearchSpace::builder()
        .categorical("scaler", ["standard_scaler", "min_max_scaler", "passthrough"])
        .categorical("model", ["ridge", "knn"])
        .add(
            Hyperparameter::float("alpha", 1e-3, 10.0)
                .log_scale()
                .active_when(Condition::equals("model", "ridge")),
        )
        .add(
            Hyperparameter::int("n_neighbors", 1, 25)
                .active_when(Condition::equals("model", "knn")),
        )
        .build()?;

    let factory = RegistryFactory::new(
        StageRegistry::with_defaults(Task::Classification),
        Step::choice("model"),
    )
    .transformer("scale", Step::choice("scaler"));

    let evaluator = Arc::new(
        NestedEvaluator::builder()
            .dataset(data)
            .factory(factory)
            .outer(Resampler::k_fold(5, 11))
            .inner(Resampler::k_fold(3, 11))
            .build()?,
    );

    let study = Study::builder()
        .maximize()
        .space(space.clone())
        .sampler(TpeSampler::builder().seed(42).build()?)
        .shared_objective(Arc::clone(&evaluator) as Arc<dyn Objective>)
        .build()?;

    study.run(30)?;
    println!("{study}");

    for trial in study.top_trials(3) {
        println!(
            "  #{:<3} value={:.4} folds={:?}",
            trial.id(),
            trial.value().unwrap_or(f64::NAN),
            trial.fold_scores()
        );
    }

    let report = evaluator.estimate_generalization(
        &space,
        |fold| TpeSampler::with_seed(100 + fold as u64),
        15,
    )?;
    println!(
        "\nGeneralization estimate: {:.4} ± {:.4} over {} outer folds",
        report.mean,
        report.std,
        report.folds.len()
    );
    for fold in &report.folds {
        if let Some(config) = &fold.best_configuration {
            println!("  fold {}: {:.4} with {config}", fold.outer_fold_id, fold.outer_score);
        }
    }

    Ok(())
}
