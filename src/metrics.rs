//! Ranking quality of predicted probabilities.

use std::cmp::Ordering;

use polars::prelude::DataFrame;
use tracing::info;

use crate::error::{PipelineError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AucScores {
    pub train: f64,
    pub test: f64,
}

/// Area under the ROC curve.
///
/// Scores are sorted in descending order and the curve is integrated with
/// the trapezoid rule, one point per distinct score, so tied scores count as
/// half-ordered. Undefined unless both classes are present.
pub fn roc_auc_score(y_true: &[i32], scores: &[f64]) -> Result<f64> {
    if y_true.len() != scores.len() {
        return Err(PipelineError::metric_undefined(format!(
            "{} labels but {} scores",
            y_true.len(),
            scores.len()
        )));
    }
    if let Some(label) = y_true.iter().find(|&&label| label != 0 && label != 1) {
        return Err(PipelineError::metric_undefined(format!(
            "label {label} is not binary"
        )));
    }
    if scores.iter().any(|s| s.is_nan()) {
        return Err(PipelineError::metric_undefined("scores contain NaN"));
    }

    let n_pos = y_true.iter().filter(|&&label| label == 1).count() as f64;
    let n_neg = y_true.len() as f64 - n_pos;
    if n_pos == 0.0 || n_neg == 0.0 {
        return Err(PipelineError::metric_undefined(
            "only one class present in labels",
        ));
    }

    let mut pairs: Vec<(f64, bool)> = scores
        .iter()
        .zip(y_true)
        .map(|(&score, &label)| (score, label == 1))
        .collect();
    pairs.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let (mut tp, mut fp) = (0.0, 0.0);
    let (mut tpr_prev, mut fpr_prev) = (0.0, 0.0);
    let mut auc = 0.0;

    let mut i = 0;
    while i < pairs.len() {
        let score = pairs[i].0;
        while i < pairs.len() && pairs[i].0 == score {
            if pairs[i].1 {
                tp += 1.0;
            } else {
                fp += 1.0;
            }
            i += 1;
        }

        let tpr = tp / n_pos;
        let fpr = fp / n_neg;
        auc += (fpr - fpr_prev) * (tpr + tpr_prev) / 2.0;
        tpr_prev = tpr;
        fpr_prev = fpr;
    }

    Ok(auc.clamp(0.0, 1.0))
}

fn probabilities(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    df.column(column)?
        .f64()?
        .into_iter()
        .map(|p| p.ok_or_else(|| PipelineError::missing_value(column)))
        .collect()
}

/// AUC of both subsets, reading the scores from the probability column
/// previously appended to each table.
pub fn compute_roc_auc(
    y_train: &[i32],
    y_test: &[i32],
    train: &DataFrame,
    test: &DataFrame,
    column: &str,
) -> Result<AucScores> {
    let train_auc = roc_auc_score(y_train, &probabilities(train, column)?)?;
    let test_auc = roc_auc_score(y_test, &probabilities(test, column)?)?;

    info!("Train ROC-AUC: {:.3}", train_auc);
    info!("Test  ROC-AUC: {:.3}", test_auc);

    Ok(AucScores {
        train: train_auc,
        test: test_auc,
    })
}
