use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;
use crate::serve::UPLOAD_FIELD;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Posts the configured JSON file to the prediction endpoint as multipart
/// form data and returns the decoded response body.
pub async fn post_file(config: &ClientConfig) -> Result<Value, ClientError> {
    let bytes = tokio::fs::read(&config.file).await.map_err(|e| {
        ClientError::Unexpected(format!("cannot read {}: {e}", config.file.display()))
    })?;
    let file_name = config
        .file
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("payload.json")
        .to_string();

    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str("application/json")
        .map_err(|e| ClientError::Unexpected(e.to_string()))?;
    let form = Form::new().part(UPLOAD_FIELD, part);

    let client = reqwest::Client::builder()
        .timeout(config.timeout)
        .build()
        .map_err(|e| ClientError::Unexpected(e.to_string()))?;

    debug!(url = %config.url, timeout = ?config.timeout, "posting prediction request");
    let response = client
        .post(&config.url)
        .multipart(form)
        .send()
        .await
        .map_err(ClientError::Transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Http { status, body });
    }

    response.json::<Value>().await.map_err(|e| {
        if e.is_decode() {
            ClientError::Unexpected(e.to_string())
        } else {
            ClientError::Transport(e)
        }
    })
}
