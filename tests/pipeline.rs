mod common;

use std::fs;

use predict_diabetes::config::OutputFormat;
use predict_diabetes::io::read_csv;
use predict_diabetes::{run_pipeline, DiabetesRecord, ModelArtifact, PipelineError};

use common::{height_missing, pipeline_config};

#[test]
fn end_to_end_run_scores_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = pipeline_config(dir.path());
    config.output.dir = Some(dir.path().join("out"));

    let report = run_pipeline(&config).unwrap();

    assert_eq!(report.test_rows, 30);
    assert_eq!(report.train_rows, 70);
    assert!((0.0..=1.0).contains(&report.accuracy));
    assert!((0.0..=1.0).contains(&report.train_auc));
    assert!((0.0..=1.0).contains(&report.test_auc));
    assert_eq!(&report.features[..3], &["age", "height", "weight"]);
    assert_eq!(
        &report.features[report.features.len() - 2..],
        &["ethnicity_Caucasian", "ethnicity_Hispanic"]
    );

    let artifact = ModelArtifact::load(&config.model_path).unwrap();
    assert_eq!(artifact.features, report.features);
    assert_eq!(artifact.model.n_features(), report.features.len());

    let train = read_csv(dir.path().join("out/train.csv"), &[]).unwrap();
    let test = read_csv(dir.path().join("out/test.csv"), &[]).unwrap();
    assert_eq!(train.get_column_names(), test.get_column_names());
    assert!(test.get_column_names().contains(&"predictions"));
    assert!(!test.get_column_names().contains(&"ethnicity"));

    for table in [&train, &test] {
        let proba = table.column("predictions").unwrap().f64().unwrap();
        for p in proba.into_iter() {
            assert!((0.0..=1.0).contains(&p.unwrap()));
        }
        assert_eq!(table.column("height").unwrap().null_count(), 0);
        assert_eq!(table.column("weight").unwrap().null_count(), 0);
    }

    // Mean filling keeps the train mean, and test gaps get the train value.
    let fill = artifact.preprocessor.fill_value("height").unwrap();
    let train_mean = train.column("height").unwrap().mean().unwrap();
    assert!((fill - train_mean).abs() < 1e-6);

    let ids = test.column("encounter_id").unwrap().i64().unwrap();
    let heights = test.column("height").unwrap().f64().unwrap();
    let mut filled = 0;
    for (id, height) in ids.into_iter().zip(heights.into_iter()) {
        if height_missing((id.unwrap() - 1000) as usize) {
            assert!((height.unwrap() - fill).abs() < 1e-6);
            filled += 1;
        }
    }
    assert!(filled <= 10);
}

#[test]
fn persisted_model_scores_a_raw_row() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path());
    run_pipeline(&config).unwrap();

    let artifact = ModelArtifact::load(&config.model_path).unwrap();
    let row: DiabetesRecord = serde_json::from_str(
        r#"{"age": 45, "gender": "F", "ethnicity": "Caucasian", "height": 165, "weight": 70,
            "aids": 0, "cirrhosis": 0, "hepatic_failure": 0, "immunosuppression": 0,
            "leukemia": 0, "lymphoma": 0, "solid_tumor_with_metastasis": 0}"#,
    )
    .unwrap();
    let labels = artifact.predict_records(&[row]).unwrap();
    assert_eq!(labels.len(), 1);
    assert!(labels[0] == 0 || labels[0] == 1);
}

#[test]
fn parquet_output_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = pipeline_config(dir.path());
    config.output.dir = Some(dir.path().join("out"));
    config.output.format = OutputFormat::Parquet;

    run_pipeline(&config).unwrap();

    for name in ["train.parquet", "test.parquet"] {
        let path = dir.path().join("out").join(name);
        let size = fs::metadata(&path).unwrap().len();
        assert!(size > 0, "{name} is empty");
    }
}

#[test]
fn same_seed_same_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = pipeline_config(dir.path());
    let first = run_pipeline(&config).unwrap();
    let second = run_pipeline(&config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_input_is_reported_with_its_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = pipeline_config(dir.path());
    config.data_path = dir.path().join("absent.csv");

    match run_pipeline(&config).unwrap_err() {
        PipelineError::Open { path, .. } => assert_eq!(path, config.data_path),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.model_path.exists());
}

#[test]
fn invalid_test_size_fails_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = pipeline_config(dir.path());
    config.data_path = dir.path().join("absent.csv");
    config.split.test_size = 0.0;

    assert!(matches!(
        run_pipeline(&config),
        Err(PipelineError::InvalidConfig { .. })
    ));
}

#[test]
fn single_class_target_does_not_produce_a_model() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = pipeline_config(dir.path());
    let csv = fs::read_to_string(&config.data_path).unwrap();
    let negatives: String = csv
        .lines()
        .map(|line| match line.strip_suffix(",1") {
            Some(rest) => format!("{rest},0\n"),
            None => format!("{line}\n"),
        })
        .collect();
    config.data_path = dir.path().join("negatives.csv");
    fs::write(&config.data_path, negatives).unwrap();

    assert!(run_pipeline(&config).is_err());
    assert!(!config.model_path.exists());
}
