use std::path::PathBuf;

use polars::prelude::PolarsError;
use smartcore::error::Failed;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised anywhere between loading the CSV and scoring a served row.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table error: {0}")]
    Polars(#[from] PolarsError),

    #[error("model error: {0}")]
    Model(#[from] Failed),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("column {column:?} has missing values")]
    MissingValue { column: String },

    #[error("column {column:?} has no observed values to compute a mean")]
    EmptyColumn { column: String },

    #[error("label {label} in column {column:?} is not binary (expected 0 or 1)")]
    InvalidLabel { column: String, label: i32 },

    #[error("invalid split: {message}")]
    InvalidSplit { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("row rejected: {reason}")]
    RowRejected { reason: String },

    #[error("{what} is empty")]
    EmptyTable { what: &'static str },

    #[error("metric undefined: {message}")]
    MetricUndefined { message: String },
}

impl PipelineError {
    pub fn missing_value(column: impl Into<String>) -> Self {
        Self::MissingValue {
            column: column.into(),
        }
    }

    pub fn invalid_split(message: impl Into<String>) -> Self {
        Self::InvalidSplit {
            message: message.into(),
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn metric_undefined(message: impl Into<String>) -> Self {
        Self::MetricUndefined {
            message: message.into(),
        }
    }
}
