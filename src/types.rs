//! Core types flowing through the recovery and submission pipeline

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A decoded email as produced by [`crate::decode_email`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecodedEmail {
    /// Sender address
    pub from: Option<Address>,

    /// Primary recipients
    pub to: Vec<Address>,

    /// CC recipients
    pub cc: Vec<Address>,

    /// BCC recipients (if available)
    pub bcc: Vec<Address>,

    /// Decoded subject line
    pub subject: Option<String>,

    /// Date header, verbatim
    pub date: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// Plain text body
    pub text: Option<String>,

    /// Attachments in document order
    pub attachments: Vec<Attachment>,
}

impl DecodedEmail {
    /// Body content, preferring HTML over plain text
    #[must_use]
    pub fn body(&self) -> &str {
        self.html
            .as_deref()
            .filter(|h| !h.is_empty())
            .or_else(|| self.text.as_deref().filter(|t| !t.is_empty()))
            .unwrap_or("")
    }

    /// Filenames of all attachments that have one
    #[must_use]
    pub fn attachment_names(&self) -> Vec<String> {
        self.attachments
            .iter()
            .filter_map(|a| a.filename.clone())
            .collect()
    }

    /// True when nothing about the message could be recovered
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.from.is_none()
            && self.to.is_empty()
            && self.cc.is_empty()
            && self.bcc.is_empty()
            && self.subject.is_none()
            && self.date.is_none()
            && self.body().trim().is_empty()
            && self.attachments.is_empty()
    }

    /// Attachments that carry a complete forwarded message
    pub fn message_attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.attachments.iter().filter(|a| a.is_message())
    }
}

/// Email address with optional display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    /// Display name (e.g., "John Doe")
    pub name: Option<String>,

    /// Email address (e.g., "john@example.com")
    pub address: String,
}

impl Address {
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.filter(|n| !n.trim().is_empty()),
            address: address.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::extracted::format_address(
            self.name.as_deref(),
            &self.address,
        ))
    }
}

/// A MIME leaf that was sent as an attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub filename: Option<String>,
    pub mime_type: String,
    pub content: Vec<u8>,
}

impl Attachment {
    /// Whether this attachment is itself an RFC 822 message
    #[must_use]
    pub fn is_message(&self) -> bool {
        let mime = self.mime_type.to_ascii_lowercase();
        mime == "message/rfc822"
            || mime == "message/rfc2822"
            || self
                .filename
                .as_ref()
                .is_some_and(|f| f.to_lowercase().ends_with(".eml"))
    }
}

/// The original phishing email recovered from a forwarded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedPhishingEmail {
    /// Original sender, "Unknown" when unrecoverable
    pub from: String,

    /// Original subject, "No Subject" when absent
    pub subject: String,

    pub date: Option<String>,

    pub to: Option<String>,

    /// Full recovered message text or HTML
    pub content: String,

    /// Unique URLs in first-occurrence order
    pub urls: Vec<String>,

    pub attachment_names: Vec<String>,

    /// Whether a forwarded structure was found
    pub is_forwarded: bool,

    /// Address of whoever forwarded the message
    pub forwarded_by: Option<String>,
}

/// Outcome of a submission as seen by callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl ProcessingResult {
    pub fn accepted(submission_id: impl Into<String>) -> Self {
        Self {
            success: true,
            submission_id: Some(submission_id.into()),
            error: None,
            error_code: None,
        }
    }

    pub fn failed(error: impl Into<String>, code: ErrorCode) -> Self {
        Self {
            success: false,
            submission_id: None,
            error: Some(error.into()),
            error_code: Some(code),
        }
    }
}

/// Failure classification of a submission
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// `VALIDATION_ERROR`
    Validation,
    /// `RATE_LIMIT_EXCEEDED`
    RateLimitExceeded,
    /// `HTTP_<status>`
    Http(u16),
    /// Code passed through from the API
    Server(String),
    /// `NETWORK_ERROR`
    Network,
    /// `MAX_RETRIES`
    MaxRetries,
}

impl ErrorCode {
    /// Map a code sent by the API, keeping well-known codes typed
    #[must_use]
    pub fn from_server(code: &str) -> Self {
        match code {
            "VALIDATION_ERROR" => Self::Validation,
            "RATE_LIMIT_EXCEEDED" => Self::RateLimitExceeded,
            other => Self::Server(other.to_string()),
        }
    }

    /// Whether a failure with this code may succeed on a later attempt
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Validation | Self::RateLimitExceeded)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => f.write_str("VALIDATION_ERROR"),
            Self::RateLimitExceeded => f.write_str("RATE_LIMIT_EXCEEDED"),
            Self::Http(status) => write!(f, "HTTP_{status}"),
            Self::Server(code) => f.write_str(code),
            Self::Network => f.write_str("NETWORK_ERROR"),
            Self::MaxRetries => f.write_str("MAX_RETRIES"),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
