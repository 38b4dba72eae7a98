// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::significant_drop_tightening)]

//! Forwarded Phishing Email Relay
//!
//! Recovers the original phishing email from a message an end user forwarded,
//! whatever convention their mail client used, and relays it together with the
//! URLs and attachment names found in it to a classification API.
//!
//! # Pipeline
//!
//! - [`decode_email`] turns raw bytes into a [`DecodedEmail`]
//! - [`extract_phishing_email`] recovers the inner message, from an attached
//!   `.eml` first, then from an inline forward, else the email as is
//! - [`SubmissionClient`] validates, posts and retries
//! - [`Intake`] ties the steps together behind a size ceiling and a per-sender
//!   rate limit
//!
//! # Example
//!
//! ```rust
//! use phish_relay::{decode_email, extract_phishing_email};
//!
//! let raw = b"From: user@example.com\r\n\
//!             Subject: Fwd: Invoice\r\n\
//!             \r\n\
//!             ---------- Forwarded message ---------\r\n\
//!             From: billing@evil.example\r\n\
//!             Subject: Pay now\r\n\
//!             \r\n\
//!             Click http://evil.example/pay now";
//! let email = decode_email(raw).unwrap();
//! let phishing = extract_phishing_email(&email);
//!
//! assert!(phishing.is_forwarded);
//! assert_eq!(phishing.from, "billing@evil.example");
//! assert_eq!(phishing.urls, vec!["http://evil.example/pay"]);
//! ```

mod api;
mod client;
mod config;
mod error;
mod extracted;
mod forward;
mod intake;
mod parser;
mod recovery;
mod types;

pub use api::{
    ApiEnvelope, ApiError, ApiErrorDetail, CLIENT_PLATFORM, CLIENT_VERSION, ClientInfo,
    HealthResponse, SubmissionData, SubmissionMetadata, SubmissionPayload, USER_AGENT,
};
pub use client::{
    MAX_ADDRESS_CHARS, MAX_PAYLOAD_BYTES, MAX_SUBJECT_CHARS, MIN_CONTENT_CHARS, RetryPolicy,
    SubmissionClient, SubmissionReceipt, UNKNOWN_SUBMISSION_ID, validate_payload,
};
pub use config::*;
pub use error::{ConfigError, DecodeError, IntakeError, Result, SubmitError, ValidationError};
pub use extracted::*;
pub use forward::{ForwardStyle, ForwardedMessage, detect_forwarded_message, extract_header_value};
pub use intake::{Intake, RateLimiter};
pub use parser::decode_email;
pub use recovery::extract_phishing_email;
pub use types::*;
