//! Wire types of the remote dubbing API

use reqwest::{Response, StatusCode};
use serde::Deserialize;

use crate::domain::model::{DubbingJob, DubbingStatus};
use crate::error::DubForgeError;

/// Answer to `POST /v1/dubbing`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDubbingResponse {
    pub dubbing_id: String,
    #[serde(default)]
    pub expected_duration_sec: Option<f64>,
}

/// Answer to `GET /v1/dubbing/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct DubbingResource {
    #[serde(default)]
    pub dubbing_id: Option<String>,
    pub status: DubbingStatus,
    #[serde(default)]
    pub target_languages: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub expected_duration_sec: Option<f64>,
}

impl DubbingResource {
    /// Convert to a job, falling back to the requested id when none is echoed
    pub fn into_job(self, requested_id: &str) -> DubbingJob {
        DubbingJob {
            id: self
                .dubbing_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| requested_id.to_string()),
            status: self.status,
            target_languages: self.target_languages,
            error: self.error.filter(|e| !e.is_empty()),
            expected_duration_sec: self.expected_duration_sec,
        }
    }
}

/// Error envelope on non-2xx answers: `{"detail": {"status": .., "message": ..}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub detail: ErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Message of an error body: the envelope's `detail.message` when present,
/// otherwise the raw body.
pub fn error_message(body: &str) -> String {
    let from_envelope = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.detail.message)
        .filter(|message| !message.trim().is_empty());

    match from_envelope {
        Some(message) => message,
        None if body.trim().is_empty() => "empty response body".to_string(),
        None => body.trim().to_string(),
    }
}

/// Map a status code and body to the error taxonomy
pub fn map_error_status(context: &str, status: StatusCode, body: &str) -> DubForgeError {
    match status {
        StatusCode::UNAUTHORIZED => DubForgeError::InvalidApiKey,
        StatusCode::NOT_FOUND => DubForgeError::DubbingNotFound {
            context: context.to_string(),
        },
        _ => DubForgeError::Api {
            context: context.to_string(),
            status: status.as_u16(),
            message: error_message(body),
        },
    }
}

/// Consume a non-2xx response and map it to an error
pub async fn map_error_response(context: &str, response: Response) -> DubForgeError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    map_error_status(context, status, &body)
}
