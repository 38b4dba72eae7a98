//! Wire types for the submission API

use crate::types::ExtractedPhishingEmail;
use serde::{Deserialize, Serialize};

/// Crate version reported to the API
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed `User-Agent` for every request
pub const USER_AGENT: &str = concat!("phish-relay/", env!("CARGO_PKG_VERSION"));

/// Platform reported in `client_info`
pub const CLIENT_PLATFORM: &str = "Email Intake Relay";

pub const SUBMISSIONS_PATH: &str = "/api/v1/submissions";
pub const HEALTH_PATH: &str = "/api/v1/health";

/// Body of `POST /api/v1/submissions`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: String,
    pub metadata: SubmissionMetadata,
    pub client_info: ClientInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SubmissionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientInfo {
    pub platform: String,
    pub app_version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            platform: CLIENT_PLATFORM.to_string(),
            app_version: CLIENT_VERSION.to_string(),
        }
    }
}

impl From<&ExtractedPhishingEmail> for SubmissionPayload {
    fn from(email: &ExtractedPhishingEmail) -> Self {
        let non_empty = |v: &Vec<String>| (!v.is_empty()).then(|| v.clone());

        Self {
            kind: "email".to_string(),
            content: email.content.clone(),
            metadata: SubmissionMetadata {
                from: Some(email.from.clone()),
                to: email.to.clone(),
                subject: Some(email.subject.clone()),
                date: email.date.clone(),
                attachments: non_empty(&email.attachment_names),
                urls: non_empty(&email.urls),
            },
            client_info: ClientInfo::default(),
        }
    }
}

/// Response envelope shared by success and error responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    pub data: Option<SubmissionData>,
    pub message: Option<String>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionData {
    pub submission_id: Option<String>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub anonymization_status: Option<String>,
    pub estimated_processing_time: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Vec<ApiErrorDetail>,
    pub request_id: Option<String>,
    pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub field: Option<String>,
    pub error: Option<String>,
}

/// Body of `GET /api/v1/health`
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: Option<String>,
}

impl HealthResponse {
    #[must_use]
    pub fn is_up(&self) -> bool {
        matches!(self.status.as_deref(), Some("healthy" | "degraded"))
    }
}
