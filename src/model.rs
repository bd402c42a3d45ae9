use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use smartcore::numbers::realnum::RealNumber;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::io::create_file;
use crate::preprocess::FittedPreprocessor;
use crate::records::DiabetesRecord;
use crate::train::convert_features_to_matrix;

pub type Classifier = LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>;

/// Binary logistic regression over a fixed-order feature vector.
#[derive(Debug, Serialize, Deserialize)]
pub struct DiabetesModel {
    classifier: Classifier,
}

impl DiabetesModel {
    /// Maximum-likelihood fit with smartcore's L-BFGS solver (at most 1000
    /// iterations). `alpha` is an L2 penalty; zero leaves the likelihood
    /// unpenalised.
    pub fn fit(x: &DenseMatrix<f64>, y: &Vec<i32>, alpha: f64) -> Result<Self> {
        let params = LogisticRegressionParameters::default().with_alpha(alpha);
        let classifier = LogisticRegression::fit(x, y, params)?;
        Ok(Self { classifier })
    }

    pub fn n_features(&self) -> usize {
        self.classifier.coefficients().shape().1
    }

    pub fn predict(&self, x: &DenseMatrix<f64>) -> Result<Vec<i32>> {
        self.check_width(x)?;
        Ok(self.classifier.predict(x)?)
    }

    /// Probability of the second (positive) class for every row of `x`.
    pub fn predict_proba(&self, x: &DenseMatrix<f64>) -> Result<Vec<f64>> {
        self.check_width(x)?;
        let (n_rows, n_cols) = x.shape();
        let coefficients = self.classifier.coefficients();
        let intercept = *self.classifier.intercept().get((0, 0));

        Ok((0..n_rows)
            .map(|row| {
                let z = (0..n_cols)
                    .map(|col| x.get((row, col)) * coefficients.get((0, col)))
                    .sum::<f64>()
                    + intercept;
                z.sigmoid()
            })
            .collect())
    }

    fn check_width(&self, x: &DenseMatrix<f64>) -> Result<()> {
        let expected = self.n_features();
        let got = x.shape().1;
        if got != expected {
            return Err(PipelineError::invalid_config(format!(
                "model expects {expected} features, got {got}"
            )));
        }
        Ok(())
    }
}

/// Everything the server needs to score a raw row: the fitted preprocessing
/// state, the feature order and the classifier.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub features: Vec<String>,
    pub preprocessor: FittedPreprocessor,
    pub model: DiabetesModel,
}

impl ModelArtifact {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(create_file(path)?);
        serde_json::to_writer(writer, self)?;
        debug!(path = %path.display(), features = self.features.len(), "saved model");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| PipelineError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Encodes raw rows with the stored preprocessing state and predicts a
    /// label for each. A row the preprocessing would drop is rejected rather
    /// than silently skipped.
    pub fn predict_records(&self, records: &[DiabetesRecord]) -> Result<Vec<i32>> {
        let df = DiabetesRecord::to_frame(records)?;
        let encoded = self.preprocessor.transform(&df)?;
        if encoded.height() != records.len() {
            return Err(PipelineError::RowRejected {
                reason: "missing demographic field".into(),
            });
        }
        let x = convert_features_to_matrix(&encoded, &self.features)?;
        self.model.predict(&x)
    }
}
