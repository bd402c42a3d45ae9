use polars::prelude::{DataFrame, NamedFrom, Series};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::metrics::accuracy;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::model::DiabetesModel;

/// Fraction of test rows whose predicted label equals the true label.
pub fn evaluate_model(
    model: &DiabetesModel,
    x_test: &DenseMatrix<f64>,
    y_test: &Vec<i32>,
) -> Result<f64> {
    if y_test.is_empty() {
        return Err(PipelineError::EmptyTable { what: "test set" });
    }
    let predictions = model.predict(x_test)?;
    let acc = accuracy(y_test, &predictions);
    info!("Model accuracy: {:.3}", acc);
    Ok(acc)
}

/// Appends the positive-class probability of every row as `column`.
pub fn add_prediction_probabilities(
    model: &DiabetesModel,
    x_train: &DenseMatrix<f64>,
    x_test: &DenseMatrix<f64>,
    train: &mut DataFrame,
    test: &mut DataFrame,
    column: &str,
) -> Result<()> {
    train.with_column(Series::new(column, model.predict_proba(x_train)?))?;
    test.with_column(Series::new(column, model.predict_proba(x_test)?))?;
    Ok(())
}
