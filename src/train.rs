use polars::prelude::{DataFrame, DataType};
use smartcore::linalg::basic::matrix::DenseMatrix;
use tracing::{debug, info};

use crate::config::{FeatureConfig, TrainConfig};
use crate::error::{PipelineError, Result};
use crate::model::DiabetesModel;

/// A fitted model together with the exact matrices it was fitted and will
/// be scored on.
#[derive(Debug)]
pub struct TrainedModel {
    pub model: DiabetesModel,
    pub features: Vec<String>,
    pub x_train: DenseMatrix<f64>,
    pub x_test: DenseMatrix<f64>,
    pub y_train: Vec<i32>,
    pub y_test: Vec<i32>,
}

/// Configured numeric and flag columns, followed by every column of `df`
/// carrying the one-hot prefix.
pub fn select_features(df: &DataFrame, config: &FeatureConfig) -> Vec<String> {
    let mut features: Vec<String> = config
        .numeric
        .iter()
        .chain(config.flags.iter())
        .cloned()
        .collect();
    if !config.one_hot_prefix.is_empty() {
        features.extend(
            df.get_column_names()
                .into_iter()
                .filter(|name| name.starts_with(&config.one_hot_prefix))
                .map(str::to_owned),
        );
    }
    features
}

/// Copies the named columns into a column-major matrix readable by
/// smartcore. Every cell must be present.
pub fn convert_features_to_matrix(df: &DataFrame, features: &[String]) -> Result<DenseMatrix<f64>> {
    let nrows = df.height();
    let ncols = features.len();
    let mut values: Vec<f64> = Vec::with_capacity(nrows * ncols);

    for name in features {
        let series = df.column(name)?.cast(&DataType::Float64)?;
        for value in series.f64()?.into_iter() {
            let value = value.ok_or_else(|| PipelineError::missing_value(name.as_str()))?;
            values.push(value);
        }
    }

    Ok(DenseMatrix::new(nrows, ncols, values, true)?)
}

/// Reads the binary target column. Missing or non-binary labels are errors.
pub fn target_vector(df: &DataFrame, target: &str) -> Result<Vec<i32>> {
    let series = df.column(target)?.cast(&DataType::Int32)?;
    series
        .i32()?
        .into_iter()
        .map(|label| match label {
            Some(label @ (0 | 1)) => Ok(label),
            Some(label) => Err(PipelineError::InvalidLabel {
                column: target.to_string(),
                label,
            }),
            None => Err(PipelineError::missing_value(target)),
        })
        .collect()
}

pub fn feature_and_target(
    df: &DataFrame,
    features: &[String],
    target: &str,
) -> Result<(DenseMatrix<f64>, Vec<i32>)> {
    Ok((convert_features_to_matrix(df, features)?, target_vector(df, target)?))
}

/// Selects the feature set from the preprocessed train table and fits the
/// classifier on it. Test uses the same feature list, so its one-hot columns
/// must already be reconciled with train's.
pub fn train_model(
    train: &DataFrame,
    test: &DataFrame,
    features: &FeatureConfig,
    config: &TrainConfig,
) -> Result<TrainedModel> {
    let selected = select_features(train, features);
    debug!(features = ?selected, "selected features");

    let (x_train, y_train) = feature_and_target(train, &selected, &features.target)?;
    let (x_test, y_test) = feature_and_target(test, &selected, &features.target)?;

    let model = DiabetesModel::fit(&x_train, &y_train, config.alpha)?;
    info!(
        rows = y_train.len(),
        features = selected.len(),
        "fitted logistic regression"
    );

    Ok(TrainedModel {
        model,
        features: selected,
        x_train,
        x_test,
        y_train,
        y_test,
    })
}
