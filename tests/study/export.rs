use tuner::prelude::*;

fn run_study() -> Study {
    let space = SearchSpace::builder()
        .log_float("alpha", 0.1, 10.0)
        .categorical("scaler", ["standard", "min_max"])
        .build()
        .unwrap();
    let study = Study::builder()
        .space(space)
        .sampler(RandomSampler::with_seed(12))
        .objective(|c: &Configuration| Ok::<_, Error>(c.float("alpha").unwrap_or_default()))
        .build()
        .unwrap();
    study.run(5).unwrap();
    study
}

#[test]
fn test_to_csv_has_one_row_per_trial() {
    let study = run_study();
    let mut buf = Vec::new();
    study.to_csv(&mut buf).unwrap();
    let csv = String::from_utf8(buf).unwrap();

    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(
        lines[0],
        "trial_id,outer_fold_id,state,value,duration_s,n_failed_folds,alpha,scaler,failure"
    );
    for (i, line) in lines[1..].iter().enumerate() {
        let cells: Vec<&str> = line.split(',').collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], i.to_string());
        assert_eq!(cells[2], "Complete");
        assert!(cells[7] == "standard" || cells[7] == "min_max");
        let alpha: f64 = cells[6].parse().unwrap();
        assert!((0.1..=10.0).contains(&alpha));
    }
}

#[test]
fn test_export_csv_writes_file() {
    let study = run_study();
    let path = std::env::temp_dir().join(format!("tuner_export_{}.csv", std::process::id()));
    study.export_csv(&path).unwrap();
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.starts_with("trial_id,"));
    std::fs::remove_file(&path).unwrap();
}
