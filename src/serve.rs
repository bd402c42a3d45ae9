//! HTTP endpoint serving single-row predictions.
//!
//! The model artifact is read from disk on every request; nothing is cached
//! between requests.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServeConfig;
use crate::error::PipelineError;
use crate::model::ModelArtifact;
use crate::records::DiabetesRecord;

/// Multipart field carrying the JSON row.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Clone)]
pub struct AppState {
    model_path: Arc<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub prediction: Vec<i32>,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("invalid upload: {0}")]
    Upload(String),

    #[error("invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("model unavailable: {0}")]
    ModelUnavailable(PipelineError),

    #[error("{0}")]
    Rejected(PipelineError),

    #[error("model prediction failed: {0}")]
    Prediction(PipelineError),
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Upload(err.body_text())
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::RowRejected { .. }
            | PipelineError::MissingValue { .. }
            | PipelineError::InvalidLabel { .. } => ApiError::Rejected(err),
            PipelineError::Open { .. } | PipelineError::Io(_) | PipelineError::Json(_) => {
                ApiError::ModelUnavailable(err)
            }
            _ => ApiError::Prediction(err),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Upload(_) | ApiError::Payload(_) => StatusCode::BAD_REQUEST,
            ApiError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ModelUnavailable(_) | ApiError::Prediction(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "prediction request failed");
        }

        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(ApiError::Upload(format!(
        "missing multipart field {UPLOAD_FIELD:?}"
    )))
}

async fn predict_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>, ApiError> {
    let payload = read_upload(&mut multipart).await?;
    let record: DiabetesRecord = serde_json::from_slice(&payload)?;

    let bytes = tokio::fs::read(state.model_path.as_path())
        .await
        .map_err(|source| {
            ApiError::ModelUnavailable(PipelineError::Open {
                path: state.model_path.to_path_buf(),
                source,
            })
        })?;
    let artifact = ModelArtifact::from_slice(&bytes).map_err(ApiError::ModelUnavailable)?;

    let prediction = artifact.predict_records(&[record])?;
    Ok(Json(PredictionResponse { prediction }))
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(config: &ServeConfig) -> Router {
    let state = AppState {
        model_path: Arc::new(config.model_path.clone()),
    };

    Router::new()
        .route("/predict", post(predict_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Binds and serves until Ctrl-C.
pub async fn serve(config: ServeConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.bind_address).await?;
    info!(
        address = %listener.local_addr()?,
        model = %config.model_path.display(),
        "serving predictions"
    );

    axum::serve(listener, router(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_errors_map_to_statuses() {
        let rejected: ApiError = PipelineError::RowRejected {
            reason: "missing demographic field".into(),
        }
        .into();
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let missing: ApiError = PipelineError::Open {
            path: PathBuf::from("absent.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        }
        .into();
        assert_eq!(missing.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(missing, ApiError::ModelUnavailable(_)));

        let upload = ApiError::Upload("bad".into());
        assert_eq!(upload.status(), StatusCode::BAD_REQUEST);
    }
}
