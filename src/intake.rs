//! Intake of forwarded messages
//!
//! Applies the size ceiling and the per-sender hourly cap, then runs the
//! decode, recover and submit pipeline. Senders never get a reply; outcomes
//! are only logged.

use crate::client::SubmissionClient;
use crate::config::Config;
use crate::error::{ConfigError, IntakeError};
use crate::parser::decode_email;
use crate::recovery::extract_phishing_email;
use crate::types::ProcessingResult;
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{error, info, warn};

/// Per-sender sliding one hour window of successful submissions
pub struct RateLimiter {
    limit_per_hour: u32,
    submissions: Mutex<HashMap<String, SenderHistory>>,
}

struct SenderHistory {
    timestamps: Vec<DateTime<Utc>>,
    last_seen: DateTime<Utc>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(limit_per_hour: u32) -> Self {
        Self {
            limit_per_hour,
            submissions: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_limited(&self, sender: &str) -> bool {
        self.is_limited_at(sender, Utc::now())
    }

    /// Whether `sender` has used up its allowance as of `now`
    pub fn is_limited_at(&self, sender: &str, now: DateTime<Utc>) -> bool {
        let window_start = now - Duration::hours(1);
        let mut submissions = self.submissions.lock();

        let Some(history) = submissions.get_mut(&sender_key(sender)) else {
            return false;
        };
        history.timestamps.retain(|t| *t > window_start);

        history.timestamps.len() >= self.limit_per_hour as usize
    }

    pub fn record(&self, sender: &str) {
        self.record_at(sender, Utc::now());
    }

    /// Count a successful submission and drop senders idle for two hours
    pub fn record_at(&self, sender: &str, now: DateTime<Utc>) {
        let mut submissions = self.submissions.lock();

        let history = submissions
            .entry(sender_key(sender))
            .or_insert_with(|| SenderHistory {
                timestamps: Vec::new(),
                last_seen: now,
            });
        history.timestamps.push(now);
        history.last_seen = now;

        let idle_cutoff = now - Duration::hours(2);
        submissions.retain(|_, h| h.last_seen >= idle_cutoff);
    }

    /// Check the allowance and claim a slot in one step
    ///
    /// Returns `false` without claiming when `sender` is already at the cap.
    /// A claimed slot counts like a recorded submission until it is
    /// released with [`RateLimiter::release_at`].
    pub fn try_reserve_at(&self, sender: &str, now: DateTime<Utc>) -> bool {
        let window_start = now - Duration::hours(1);
        let mut submissions = self.submissions.lock();

        let history = submissions
            .entry(sender_key(sender))
            .or_insert_with(|| SenderHistory {
                timestamps: Vec::new(),
                last_seen: now,
            });
        history.timestamps.retain(|t| *t > window_start);

        if history.timestamps.len() >= self.limit_per_hour as usize {
            return false;
        }
        history.timestamps.push(now);
        history.last_seen = now;

        let idle_cutoff = now - Duration::hours(2);
        submissions.retain(|_, h| h.last_seen >= idle_cutoff);
        true
    }

    /// Give back a slot claimed at `at` by [`RateLimiter::try_reserve_at`]
    pub fn release_at(&self, sender: &str, at: DateTime<Utc>) {
        let key = sender_key(sender);
        let mut submissions = self.submissions.lock();

        let Some(history) = submissions.get_mut(&key) else {
            return;
        };
        if let Some(pos) = history.timestamps.iter().rposition(|t| *t == at) {
            history.timestamps.remove(pos);
        }
        if history.timestamps.is_empty() {
            submissions.remove(&key);
        }
    }

    /// Number of senders currently tracked
    pub fn tracked_senders(&self) -> usize {
        self.submissions.lock().len()
    }
}

fn sender_key(sender: &str) -> String {
    sender.trim().to_lowercase()
}

/// Entry point for one inbound message at a time
///
/// Holds no per-message state, so a single `Intake` can serve many
/// messages concurrently.
pub struct Intake {
    config: Config,
    client: SubmissionClient,
    limiter: RateLimiter,
}

impl Intake {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let client = SubmissionClient::new(&config)?;
        let limiter = RateLimiter::new(config.rate_limit_per_hour);

        Ok(Self {
            config,
            client,
            limiter,
        })
    }

    #[must_use]
    pub const fn client(&self) -> &SubmissionClient {
        &self.client
    }

    #[must_use]
    pub const fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Process one raw message forwarded by `sender`
    pub async fn handle(&self, sender: &str, raw: &[u8]) -> Result<ProcessingResult, IntakeError> {
        let started = Instant::now();
        info!(sender, size = raw.len(), "Received email");

        let max = self.config.max_email_size_bytes();
        if raw.len() as u64 > max {
            error!(size = raw.len(), max, "Email too large");
            return Err(IntakeError::TooLarge {
                size: raw.len(),
                max,
            });
        }

        let reserved_at = Utc::now();
        if !self.limiter.try_reserve_at(sender, reserved_at) {
            warn!(sender, "Rate limit exceeded");
            return Err(IntakeError::RateLimited {
                sender: sender.to_string(),
            });
        }

        let outcome = self.process(sender, raw).await;

        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &outcome {
            Ok(result) if result.success => {
                info!(
                    submission_id = result.submission_id.as_deref().unwrap_or(""),
                    elapsed_ms,
                    "Submission successful"
                );
            }
            Ok(result) => {
                error!(
                    error = result.error.as_deref().unwrap_or(""),
                    code = %result.error_code.as_ref().map(ToString::to_string).unwrap_or_default(),
                    elapsed_ms,
                    "Submission failed"
                );
                self.limiter.release_at(sender, reserved_at);
            }
            Err(_) => self.limiter.release_at(sender, reserved_at),
        }

        outcome
    }

    async fn process(&self, sender: &str, raw: &[u8]) -> Result<ProcessingResult, IntakeError> {
        let decoded = decode_email(raw).inspect_err(|e| {
            error!(sender, error = %e, "Failed to decode email");
        })?;
        info!(
            subject = decoded.subject.as_deref().unwrap_or(""),
            from = decoded.from.as_ref().map_or("", |a| a.address.as_str()),
            attachments = decoded.attachments.len(),
            "Parsed email"
        );

        let phishing = extract_phishing_email(&decoded);
        info!(
            is_forwarded = phishing.is_forwarded,
            from = %phishing.from,
            subject = %phishing.subject,
            url_count = phishing.urls.len(),
            attachment_count = phishing.attachment_names.len(),
            "Extracted phishing email"
        );

        Ok(self
            .client
            .submit_with_retry(&phishing, self.config.max_retries)
            .await)
    }
}
