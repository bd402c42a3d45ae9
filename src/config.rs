//! Configuration passed explicitly into every stage of the pipeline.
//!
//! Every field has a default; a JSON file can override any subset of them
//! and CLI flags override the file.

use std::fs::File;
use std::io::BufReader;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};
use crate::records::{
    AGE, COMORBIDITY_FLAGS, DIABETES_MELLITUS, ETHNICITY, GENDER, HEIGHT, WEIGHT,
};

pub const DEFAULT_MODEL_PATH: &str = "diabetes_model.json";
pub const DEFAULT_PREDICTION_COLUMN: &str = "predictions";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows that go to the test subset, in (0, 1).
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Rows missing any of these are dropped.
    pub demographic_columns: Vec<String>,
    /// Filled with the train mean.
    pub mean_fill_columns: Vec<String>,
    /// One-hot encoded with the first level dropped.
    pub categorical_column: String,
    /// Encoded as 1 when the value starts with "M".
    pub gender_column: String,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            demographic_columns: vec![AGE.into(), GENDER.into(), ETHNICITY.into()],
            mean_fill_columns: vec![HEIGHT.into(), WEIGHT.into()],
            categorical_column: ETHNICITY.into(),
            gender_column: GENDER.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub numeric: Vec<String>,
    pub flags: Vec<String>,
    /// Every column whose name starts with this prefix is appended, in
    /// table order.
    pub one_hot_prefix: String,
    pub target: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            numeric: vec![AGE.into(), HEIGHT.into(), WEIGHT.into()],
            flags: COMORBIDITY_FLAGS.iter().map(|f| f.to_string()).collect(),
            one_hot_prefix: format!("{ETHNICITY}_"),
            target: DIABETES_MELLITUS.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// L2 penalty handed to the solver; 0 fits the plain maximum-likelihood
    /// model.
    pub alpha: f64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self { alpha: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Parquet => "parquet",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Scored train/test tables are written here when set.
    pub dir: Option<PathBuf>,
    pub format: OutputFormat,
    pub prediction_column: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: OutputFormat::Csv,
            prediction_column: DEFAULT_PREDICTION_COLUMN.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub data_path: PathBuf,
    /// Cell values read as missing, in addition to empty cells.
    pub null_values: Vec<String>,
    pub model_path: PathBuf,
    pub split: SplitConfig,
    pub preprocess: PreprocessConfig,
    pub features: FeatureConfig,
    pub train: TrainConfig,
    pub output: OutputConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/sample_diabetes_mellitus_data.csv"),
            null_values: vec!["NA".into()],
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            split: SplitConfig::default(),
            preprocess: PreprocessConfig::default(),
            features: FeatureConfig::default(),
            train: TrainConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PipelineError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let test_size = self.split.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(PipelineError::invalid_config(format!(
                "test_size must be in (0, 1), got {test_size}"
            )));
        }
        if self.train.alpha < 0.0 {
            return Err(PipelineError::invalid_config("alpha must be non-negative"));
        }
        if self.features.numeric.is_empty()
            && self.features.flags.is_empty()
            && self.features.one_hot_prefix.is_empty()
        {
            return Err(PipelineError::invalid_config("feature set is empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServeConfig {
    pub bind_address: SocketAddr,
    pub model_path: PathBuf,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8000)),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub url: String,
    pub file: PathBuf,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000/predict".into(),
            file: PathBuf::from("sample_json.json"),
            timeout: Duration::from_secs(10),
        }
    }
}
