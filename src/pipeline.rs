use std::time::Instant;

use serde::Serialize;
use sysinfo::{get_current_pid, ProcessExt, System, SystemExt};
use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::evaluate::{add_prediction_probabilities, evaluate_model};
use crate::io::{read_csv, write_table};
use crate::metrics::compute_roc_auc;
use crate::model::ModelArtifact;
use crate::preprocess::preprocess_data;
use crate::split::split_data;
use crate::train::train_model;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub features: Vec<String>,
    pub accuracy: f64,
    pub train_auc: f64,
    pub test_auc: f64,
}

/// Resident memory of this process in bytes, if the platform reports it.
fn monitor_memory() -> Option<u64> {
    let pid = get_current_pid().ok()?;
    let mut sys = System::new();
    sys.refresh_process(pid);
    sys.process(pid).map(|process| process.memory())
}

/// Load, split, preprocess, train, evaluate, persist.
pub fn run_pipeline(config: &PipelineConfig) -> Result<PipelineReport> {
    config.validate()?;
    let start_time = Instant::now();

    let df = read_csv(&config.data_path, &config.null_values)?;
    info!(path = %config.data_path.display(), rows = df.height(), "loaded dataset");

    let (train, test) = split_data(&df, &config.split)?;
    let (mut train, mut test, preprocessor) = preprocess_data(&train, &test, &config.preprocess)?;

    let trained = train_model(&train, &test, &config.features, &config.train)?;
    let accuracy = evaluate_model(&trained.model, &trained.x_test, &trained.y_test)?;

    let prediction_column = &config.output.prediction_column;
    add_prediction_probabilities(
        &trained.model,
        &trained.x_train,
        &trained.x_test,
        &mut train,
        &mut test,
        prediction_column,
    )?;
    let auc = compute_roc_auc(
        &trained.y_train,
        &trained.y_test,
        &train,
        &test,
        prediction_column,
    )?;

    if let Some(dir) = &config.output.dir {
        let ext = config.output.format.extension();
        write_table(dir.join(format!("train.{ext}")), &mut train, config.output.format)?;
        write_table(dir.join(format!("test.{ext}")), &mut test, config.output.format)?;
        debug!(dir = %dir.display(), "wrote scored tables");
    }

    let report = PipelineReport {
        train_rows: train.height(),
        test_rows: test.height(),
        features: trained.features.clone(),
        accuracy,
        train_auc: auc.train,
        test_auc: auc.test,
    };

    let artifact = ModelArtifact {
        features: trained.features,
        preprocessor,
        model: trained.model,
    };
    artifact.save(&config.model_path)?;
    info!(path = %config.model_path.display(), "saved model");

    info!(elapsed = ?start_time.elapsed(), memory_bytes = ?monitor_memory(), "pipeline finished");
    Ok(report)
}
