//! Cleaning and encoding steps.
//!
//! The order matters: rows with missing demographics are dropped first, so
//! the fill means and the category levels are computed on the rows that
//! survive. Everything learned from the train subset lives in
//! [`FittedPreprocessor`], which is applied unchanged to the test subset and
//! persisted with the model so a served row is encoded the same way.

use std::collections::BTreeSet;

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PreprocessConfig;
use crate::error::{PipelineError, Result};

/// Drops rows with a missing value in any of `columns`. Missing values
/// elsewhere are kept.
pub fn drop_missing_demographics(df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
    Ok(df.drop_nulls(Some(columns))?)
}

/// Replaces missing values of each `(column, value)` pair with `value`.
pub fn fill_missing_with_mean(df: &DataFrame, fill_values: &[(String, f64)]) -> Result<DataFrame> {
    if fill_values.is_empty() {
        return Ok(df.clone());
    }
    let exprs: Vec<Expr> = fill_values
        .iter()
        .map(|(column, value)| col(column).fill_null(lit(*value)))
        .collect();

    Ok(df.clone().lazy().with_columns(exprs).collect()?)
}

pub fn dummy_column_name(column: &str, level: &str) -> String {
    format!("{column}_{level}")
}

/// Replaces `column` with one `Int32` indicator column per entry of `levels`,
/// appended at the end of the table. Values outside `levels` encode as all
/// zeros.
pub fn encode_one_hot(df: &DataFrame, column: &str, levels: &[String]) -> Result<DataFrame> {
    let source = df.column(column)?.cast(&DataType::Utf8)?;
    let values = source.utf8()?;

    let mut encoded = df.drop(column)?;
    for level in levels {
        let indicator: Vec<i32> = values
            .into_iter()
            .map(|value| i32::from(value == Some(level.as_str())))
            .collect();
        encoded.with_column(Series::new(&dummy_column_name(column, level), indicator))?;
    }
    Ok(encoded)
}

/// True for any value beginning with "M" or "m".
pub fn is_male(value: Option<&str>) -> bool {
    value.map_or(false, |v| v.to_uppercase().starts_with('M'))
}

fn encode_gender_lazy(column: Series) -> PolarsResult<Option<Series>> {
    let utf8 = column.cast(&DataType::Utf8)?;
    let encoded: Vec<i32> = utf8
        .utf8()?
        .into_iter()
        .map(|value| i32::from(is_male(value)))
        .collect();
    Ok(Some(Series::new(column.name(), encoded)))
}

/// Encodes `column` as 1 for male, 0 otherwise.
pub fn encode_gender_binary(df: &DataFrame, column: &str) -> Result<DataFrame> {
    Ok(df
        .clone()
        .lazy()
        .with_column(
            col(column).apply(encode_gender_lazy, GetOutput::from_type(DataType::Int32)),
        )
        .collect()?)
}

/// Preprocessing state learned from the train subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedPreprocessor {
    demographic_columns: Vec<String>,
    fill_values: Vec<(String, f64)>,
    categorical_column: String,
    /// Sorted train levels with the first (reference) level removed.
    levels: Vec<String>,
    gender_column: String,
}

impl FittedPreprocessor {
    /// Learns fill means and category levels from a raw train table.
    pub fn fit(train: &DataFrame, config: &PreprocessConfig) -> Result<Self> {
        let train = drop_missing_demographics(train, &config.demographic_columns)?;

        let mut fill_values = Vec::with_capacity(config.mean_fill_columns.len());
        for column in &config.mean_fill_columns {
            let Ok(series) = train.column(column) else {
                debug!(column = %column, "fill column not in train table, skipping");
                continue;
            };
            let mean = series.mean().ok_or_else(|| PipelineError::EmptyColumn {
                column: column.clone(),
            })?;
            fill_values.push((column.clone(), mean));
        }

        let source = train.column(&config.categorical_column)?.cast(&DataType::Utf8)?;
        let distinct: BTreeSet<&str> = source.utf8()?.into_iter().flatten().collect();
        let levels: Vec<String> = distinct.into_iter().skip(1).map(str::to_owned).collect();

        debug!(?fill_values, "fitted preprocessor");
        Ok(Self {
            demographic_columns: config.demographic_columns.clone(),
            fill_values,
            categorical_column: config.categorical_column.clone(),
            levels,
            gender_column: config.gender_column.clone(),
        })
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let df = drop_missing_demographics(df, &self.demographic_columns)?;
        let df = fill_missing_with_mean(&df, &self.fill_values)?;
        let df = encode_one_hot(&df, &self.categorical_column, &self.levels)?;
        encode_gender_binary(&df, &self.gender_column)
    }

    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| *value)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }

    pub fn one_hot_columns(&self) -> Vec<String> {
        self.levels
            .iter()
            .map(|level| dummy_column_name(&self.categorical_column, level))
            .collect()
    }
}

/// Fits on `train`, then applies the same state to both subsets.
pub fn preprocess_data(
    train: &DataFrame,
    test: &DataFrame,
    config: &PreprocessConfig,
) -> Result<(DataFrame, DataFrame, FittedPreprocessor)> {
    let fitted = FittedPreprocessor::fit(train, config)?;
    let train = fitted.transform(train)?;
    let test = fitted.transform(test)?;
    debug!(
        train = train.height(),
        test = test.height(),
        levels = ?fitted.levels(),
        one_hot = ?fitted.one_hot_columns(),
        "preprocessed train and test"
    );
    Ok((train, test, fitted))
}
