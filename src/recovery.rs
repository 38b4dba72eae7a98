//! Recovery of the original phishing email from a forwarded message
//!
//! Two strategies are tried in order. A forwarded message attached as its own
//! `.eml`/`message/rfc822` part is decoded and used directly. Otherwise the
//! outer body is searched for an inline forward. When neither applies, the
//! outer email itself is what gets submitted.

use crate::error::Result;
use crate::extracted::{extract_urls, is_html, strip_html};
use crate::forward::detect_forwarded_message;
use crate::parser::decode_email;
use crate::types::{Attachment, DecodedEmail, ExtractedPhishingEmail};
use tracing::{debug, error};

const UNKNOWN_SENDER: &str = "Unknown";
const NO_SUBJECT: &str = "No Subject";

/// Extract the original phishing email from a decoded forwarded message
///
/// Never fails: a corrupt attachment falls back to inline recovery, and an
/// email without any forwarded structure is returned as is.
#[must_use]
pub fn extract_phishing_email(outer: &DecodedEmail) -> ExtractedPhishingEmail {
    if let Some(attachment) = outer.message_attachments().next() {
        match extract_from_attachment(attachment, outer) {
            Ok(extracted) => return extracted,
            Err(e) => {
                error!(
                    filename = attachment.filename.as_deref().unwrap_or(""),
                    error = %e,
                    "Failed to decode forwarded attachment, falling back to inline"
                );
            }
        }
    }

    extract_from_inline(outer)
}

fn extract_from_attachment(
    attachment: &Attachment,
    outer: &DecodedEmail,
) -> Result<ExtractedPhishingEmail> {
    let inner = decode_email(&attachment.content)?;
    debug!(
        filename = attachment.filename.as_deref().unwrap_or(""),
        "Recovered forwarded email from attachment"
    );

    Ok(ExtractedPhishingEmail {
        from: inner
            .from
            .as_ref()
            .map_or_else(|| UNKNOWN_SENDER.to_string(), ToString::to_string),
        subject: inner.subject.clone().unwrap_or_else(|| NO_SUBJECT.to_string()),
        date: inner.date.clone(),
        to: inner.to.first().map(ToString::to_string),
        content: full_content(&inner),
        urls: extract_urls(inner.body()),
        attachment_names: inner.attachment_names(),
        is_forwarded: true,
        forwarded_by: outer.from.as_ref().map(|a| a.address.clone()),
    })
}

fn extract_from_inline(outer: &DecodedEmail) -> ExtractedPhishingEmail {
    let body = outer.body();
    let plain = if is_html(body) {
        strip_html(body)
    } else {
        body.to_string()
    };

    if let Some(forwarded) = detect_forwarded_message(&plain) {
        debug!(style = ?forwarded.style, "Recovered inline forwarded email");

        return ExtractedPhishingEmail {
            from: forwarded
                .from
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            subject: forwarded
                .subject
                .or_else(|| outer.subject.clone())
                .unwrap_or_else(|| NO_SUBJECT.to_string()),
            date: forwarded.date,
            to: forwarded.to,
            urls: extract_urls(&forwarded.content),
            content: forwarded.content,
            attachment_names: outer.attachment_names(),
            is_forwarded: true,
            forwarded_by: outer.from.as_ref().map(|a| a.address.clone()),
        };
    }

    debug!("No forwarded structure found, using the email as is");

    ExtractedPhishingEmail {
        from: outer
            .from
            .as_ref()
            .map_or_else(|| UNKNOWN_SENDER.to_string(), ToString::to_string),
        subject: outer
            .subject
            .clone()
            .unwrap_or_else(|| NO_SUBJECT.to_string()),
        date: outer.date.clone(),
        to: outer.to.first().map(ToString::to_string),
        content: body.to_string(),
        urls: extract_urls(body),
        attachment_names: outer.attachment_names(),
        is_forwarded: false,
        forwarded_by: None,
    }
}

/// Synthetic header block followed by the body
fn full_content(email: &DecodedEmail) -> String {
    let mut lines = Vec::new();

    if let Some(from) = &email.from {
        lines.push(format!("From: {from}"));
    }
    if !email.to.is_empty() {
        let to: Vec<String> = email.to.iter().map(ToString::to_string).collect();
        lines.push(format!("To: {}", to.join(", ")));
    }
    if let Some(subject) = &email.subject {
        lines.push(format!("Subject: {subject}"));
    }
    if let Some(date) = &email.date {
        lines.push(format!("Date: {date}"));
    }

    lines.push(String::new());
    lines.push(email.body().to_string());

    lines.join("\n")
}
