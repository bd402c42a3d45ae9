//! Diabetes mellitus prediction: a linear tabular pipeline from CSV to a
//! fitted logistic regression, plus a small HTTP endpoint serving it.
//!
//! - `io` / `split` - load the table and split it into train and test
//! - `preprocess` - drop, fill and encode, fitted on train only
//! - `train` / `evaluate` / `metrics` - fit, accuracy, ROC AUC
//! - `model` - the persisted artifact scored by `serve`
//! - `client` - posts a JSON row to the endpoint

pub mod client;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod io;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod records;
pub mod serve;
pub mod split;
pub mod train;

pub use config::{ClientConfig, PipelineConfig, ServeConfig};
pub use error::{PipelineError, Result};
pub use model::{DiabetesModel, ModelArtifact};
pub use pipeline::{run_pipeline, PipelineReport};
pub use records::DiabetesRecord;
