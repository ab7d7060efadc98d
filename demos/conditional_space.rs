//! A conditional search space driven through ask-and-tell.
//!
//! `degree` only exists for the polynomial kernel and `gamma` only for the
//! RBF kernel; sampled configurations never carry an inactive value. The
//! loop evaluates each proposal by hand and reports the result back with
//! `tell`, then exports the history as CSV.
//!
//! Run with: `cargo run --example conditional_space`

use tuner::pipeline::{Kernel, KernelRidge, Pipeline, Task};
use tuner::prelude::*;

fn kernel(config: &Configuration) -> Option<Kernel> {
    match config.choice("kernel")? {
        "linear" => Some(Kernel::Linear),
        "poly" => Some(Kernel::Poly {
            degree: u32::try_from(config.int("degree")?).ok()?,
            gamma: 1.0,
            coef0: 1.0,
        }),
        _ => Some(Kernel::Rbf {
            gamma: config.float("gamma")?,
        }),
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // y = sin(3x) on [-1, 1]; only the RBF kernel fits it well.
    let rows: Vec<Vec<f64>> = (0..80).map(|i| vec![f64::from(i) / 40.0 - 1.0]).collect();
    let labels = rows.iter().map(|r| (3.0 * r[0]).sin()).collect();
    let data = Dataset::from_rows(&rows, labels)?;
    let folds = Resampler::k_fold(4, 0).split(data.n_samples())?;

    let space = SearchSpace::builder()
        .categorical("kernel", ["linear", "poly", "rbf"])
        .log_float("alpha", 1e-4, 1.0)
        .add(Hyperparameter::int("degree", 2, 5).active_when(Condition::equals("kernel", "poly")))
        .add(
            Hyperparameter::float("gamma", 0.1, 50.0)
                .log_scale()
                .active_when(Condition::equals("kernel", "rbf")),
        )
        .build()?;

    let study = Study::builder()
        .maximize()
        .space(space)
        .sampler(GpSampler::with_seed(9))
        .objective(|_: &Configuration| Err::<f64, _>("use ask/tell"))
        .build()?;

    for _ in 0..25 {
        let trial = study.ask();
        let config = trial.configuration().clone();
        let result = kernel(&config)
            .ok_or("incomplete configuration")
            .and_then(|kernel| {
                let alpha = config.float("alpha").unwrap_or(1.0);
                let mut scores = Vec::with_capacity(folds.len());
                for fold in &folds {
                    let (x_train, y_train) = data.select(&fold.train);
                    let (x_val, y_val) = data.select(&fold.validation);
                    let mut pipeline =
                        Pipeline::new("kernel_ridge", KernelRidge::new(alpha, kernel, Task::Regression));
                    pipeline.fit(&x_train, &y_train).map_err(|_| "fit failed")?;
                    scores.push(pipeline.evaluate(&x_val, &y_val).map_err(|_| "score failed")?);
                }
                Ok(scores.iter().sum::<f64>() / scores.len() as f64)
            });
        study.tell(trial, result);
    }

    println!("{study}");
    let mut csv = Vec::new();
    study.to_csv(&mut csv)?;
    print!("{}", String::from_utf8_lossy(&csv));
    Ok(())
}
