use tuner::prelude::*;

#[test]
fn test_random_sampler_uniform_float_distribution() {
    let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();
    let sampler = RandomSampler::with_seed(42);

    let n_samples = 1000;
    let mut samples: Vec<f64> = (0..n_samples)
        .map(|_| {
            let config = sampler.suggest(&space, Direction::Minimize, &[]);
            config.float("x").unwrap()
        })
        .collect();

    for &s in &samples {
        assert!((0.0..=1.0).contains(&s), "sample {s} out of range [0, 1]");
    }

    samples.sort_by(f64::total_cmp);
    let q1 = samples[n_samples / 4];
    let q2 = samples[n_samples / 2];
    let q3 = samples[3 * n_samples / 4];
    assert!((q1 - 0.25).abs() < 0.1, "Q1 {q1} should be close to 0.25");
    assert!((q2 - 0.5).abs() < 0.1, "Q2 {q2} should be close to 0.5");
    assert!((q3 - 0.75).abs() < 0.1, "Q3 {q3} should be close to 0.75");
}

#[test]
fn test_random_sampler_log_scale_is_uniform_in_log_space() {
    let space = SearchSpace::builder().log_float("c", 0.1, 10.0).build().unwrap();
    let sampler = RandomSampler::with_seed(7);

    let n_samples = 2000;
    let logs: Vec<f64> = (0..n_samples)
        .map(|_| {
            let c = sampler
                .suggest(&space, Direction::Minimize, &[])
                .float("c")
                .unwrap();
            assert!((0.1..=10.0).contains(&c), "sample {c} out of range");
            c.ln()
        })
        .collect();

    // ln(0.1)..ln(10) is symmetric around 0: half the mass below 1.0.
    let below_one = logs.iter().filter(|&&l| l < 0.0).count() as f64 / n_samples as f64;
    assert!((below_one - 0.5).abs() < 0.05, "share below 1.0 was {below_one}");

    // Each of four equal-width log bins holds about a quarter.
    let width = (10.0f64.ln() - 0.1f64.ln()) / 4.0;
    let mut bins = [0usize; 4];
    for l in &logs {
        let b = (((l - 0.1f64.ln()) / width) as usize).min(3);
        bins[b] += 1;
    }
    for (i, &count) in bins.iter().enumerate() {
        let share = count as f64 / n_samples as f64;
        assert!((share - 0.25).abs() < 0.05, "bin {i} share {share}");
    }
}

#[test]
fn test_random_sampler_uniform_int_distribution() {
    let space = SearchSpace::builder().int("n", 1, 10).build().unwrap();
    let sampler = RandomSampler::with_seed(123);

    let n_samples = 5000;
    let mut counts = [0u32; 10];
    for _ in 0..n_samples {
        let n = sampler
            .suggest(&space, Direction::Minimize, &[])
            .int("n")
            .unwrap();
        assert!((1..=10).contains(&n), "sample {n} out of range [1, 10]");
        counts[(n - 1) as usize] += 1;
    }

    let expected = f64::from(n_samples) / 10.0;
    for (i, &count) in counts.iter().enumerate() {
        let dev = (f64::from(count) - expected).abs() / expected;
        assert!(dev < 0.2, "value {} drawn {count} times", i + 1);
    }
}

#[test]
fn test_random_sampler_same_seed_same_proposals() {
    let space = SearchSpace::builder()
        .float("x", -5.0, 5.0)
        .categorical("kind", ["a", "b", "c"])
        .build()
        .unwrap();
    let a = RandomSampler::with_seed(99);
    let b = RandomSampler::with_seed(99);
    for _ in 0..20 {
        assert_eq!(
            a.suggest(&space, Direction::Minimize, &[]),
            b.suggest(&space, Direction::Minimize, &[])
        );
    }
}

#[test]
fn test_random_sampler_respects_conditions() {
    let space = SearchSpace::builder()
        .categorical("kernel", ["linear", "poly", "rbf"])
        .add(Hyperparameter::int("degree", 2, 5).active_when(Condition::equals("kernel", "poly")))
        .add(
            Hyperparameter::float("gamma", 1e-3, 1.0)
                .log_scale()
                .active_when(Condition::one_of("kernel", ["poly", "rbf"])),
        )
        .build()
        .unwrap();
    let sampler = RandomSampler::with_seed(5);

    let mut seen_linear = false;
    for _ in 0..200 {
        let config = sampler.suggest(&space, Direction::Maximize, &[]);
        space.validate(&config).unwrap();
        match config.choice("kernel").unwrap() {
            "linear" => {
                seen_linear = true;
                assert!(!config.contains("degree"));
                assert!(!config.contains("gamma"));
            }
            "poly" => assert!(config.contains("degree") && config.contains("gamma")),
            _ => assert!(!config.contains("degree") && config.contains("gamma")),
        }
    }
    assert!(seen_linear);
}
