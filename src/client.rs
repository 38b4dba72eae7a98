//! Client for the submission API
//!
//! Every public entry point resolves to a [`ProcessingResult`]; failures are
//! classified by [`ErrorCode`] and only transient ones are retried.

use crate::api::{
    ApiEnvelope, HEALTH_PATH, HealthResponse, SUBMISSIONS_PATH, SubmissionPayload, USER_AGENT,
};
use crate::config::Config;
use crate::error::{ConfigError, SubmitError, ValidationError};
use crate::types::{ErrorCode, ExtractedPhishingEmail, ProcessingResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Minimum content length after trimming
pub const MIN_CONTENT_CHARS: usize = 10;
/// Largest serialized payload the API accepts
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
pub const MAX_ADDRESS_CHARS: usize = 320;
pub const MAX_SUBJECT_CHARS: usize = 500;

/// Submission id reported when the API accepted without returning one
pub const UNKNOWN_SUBMISSION_ID: &str = "unknown";

/// Exponential backoff between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given zero-based attempt: `base * 2^attempt`
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Delays slept between `max_retries + 1` attempts, none after the last
    #[must_use]
    pub fn schedule(&self, max_retries: u32) -> Vec<Duration> {
        (0..max_retries).map(|attempt| self.delay_for(attempt)).collect()
    }
}

/// An accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub submission_id: String,
}

pub struct SubmissionClient {
    http: Client,
    config: Config,
    retry: RetryPolicy,
}

impl SubmissionClient {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            config: config.clone(),
            retry: RetryPolicy {
                base_delay: config.retry_base_delay,
            },
        })
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Submit once
    pub async fn submit(&self, email: &ExtractedPhishingEmail) -> ProcessingResult {
        match self.try_submit(email).await {
            Ok(receipt) => ProcessingResult::accepted(receipt.submission_id),
            Err(e) => {
                let code = e.code();
                error!(code = %code, error = %e, "API submission failed");
                ProcessingResult::failed(e.to_string(), code)
            }
        }
    }

    /// Submit once, keeping the typed failure
    pub async fn try_submit(
        &self,
        email: &ExtractedPhishingEmail,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let payload = SubmissionPayload::from(email);
        let body = validate_payload(&payload)?;

        let response = self
            .http
            .post(self.config.endpoint(SUBMISSIONS_PATH))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), len = bytes.len(), "API responded");

        interpret_response(status, &bytes)
    }

    /// Submit, retrying transient failures with exponential backoff
    ///
    /// Makes at most `max_retries + 1` attempts. Validation failures and
    /// rate limiting are returned immediately.
    pub async fn submit_with_retry(
        &self,
        email: &ExtractedPhishingEmail,
        max_retries: u32,
    ) -> ProcessingResult {
        let mut last_failure = None;
        let mut delays = self.retry.schedule(max_retries).into_iter();

        for attempt in 0..=max_retries {
            let result = self.submit(email).await;

            if result.success {
                return result;
            }
            if result
                .error_code
                .as_ref()
                .is_some_and(|code| !code.is_retryable())
            {
                return result;
            }

            if let Some(delay) = delays.next() {
                warn!(attempt = attempt + 1, delay = ?delay, "Retrying submission");
                sleep(delay).await;
            }
            last_failure = Some(result);
        }

        last_failure.unwrap_or_else(|| {
            ProcessingResult::failed("Max retries exceeded", ErrorCode::MaxRetries)
        })
    }

    /// Whether the API reports itself healthy or degraded
    pub async fn check_health(&self) -> bool {
        let response = match self.http.get(self.config.endpoint(HEALTH_PATH)).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(error = %e, "Health check failed");
                return false;
            }
        };

        if !response.status().is_success() {
            debug!(status = response.status().as_u16(), "Health check returned error status");
            return false;
        }

        let up = response
            .json::<HealthResponse>()
            .await
            .is_ok_and(|health| health.is_up());
        info!(up, "Health check");
        up
    }
}

/// Check a payload against the API's limits and serialize it
pub fn validate_payload(payload: &SubmissionPayload) -> Result<Vec<u8>, ValidationError> {
    let content = payload.content.trim();
    if content.is_empty() {
        return Err(ValidationError::ContentBlank);
    }
    if content.chars().count() < MIN_CONTENT_CHARS {
        return Err(ValidationError::ContentTooShort {
            min: MIN_CONTENT_CHARS,
        });
    }

    let body =
        serde_json::to_vec(payload).map_err(|e| ValidationError::Unserializable(e.to_string()))?;
    if body.len() > MAX_PAYLOAD_BYTES {
        return Err(ValidationError::PayloadTooLarge {
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    let metadata = &payload.metadata;
    let limits = [
        ("From address", metadata.from.as_deref(), MAX_ADDRESS_CHARS),
        ("To address", metadata.to.as_deref(), MAX_ADDRESS_CHARS),
        ("Subject", metadata.subject.as_deref(), MAX_SUBJECT_CHARS),
    ];
    for (field, value, limit) in limits {
        if value.is_some_and(|v| v.chars().count() > limit) {
            return Err(ValidationError::FieldTooLong { field, limit });
        }
    }

    Ok(body)
}

fn interpret_response(status: StatusCode, body: &[u8]) -> Result<SubmissionReceipt, SubmitError> {
    if status.is_success() {
        let envelope: ApiEnvelope = serde_json::from_slice(body)?;

        if let Some(submission_id) = envelope
            .data
            .filter(|_| envelope.success)
            .and_then(|data| data.submission_id)
        {
            return Ok(SubmissionReceipt { submission_id });
        }

        // Accepted but not in the expected shape; do not retry
        warn!(
            status = status.as_u16(),
            success = envelope.success,
            "API returned OK status but unexpected response structure"
        );
        return Ok(SubmissionReceipt {
            submission_id: UNKNOWN_SUBMISSION_ID.to_string(),
        });
    }

    match serde_json::from_slice::<ApiEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
    {
        Some(err) => Err(SubmitError::Api {
            code: err.code,
            message: err.message,
        }),
        None => {
            warn!(status = status.as_u16(), "Unexpected error response structure");
            Err(SubmitError::Http {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            })
        }
    }
}
