//! Raw message decoding on top of mailparse

use crate::error::{DecodeError, Result};
use crate::types::{Address, Attachment, DecodedEmail};
use mailparse::{DispositionType, MailAddr, MailHeader, ParsedMail};
use tracing::debug;

/// Decode raw message bytes into a [`DecodedEmail`]
pub fn decode_email(raw: &[u8]) -> Result<DecodedEmail> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| DecodeError::Structure(e.to_string()))?;

    if !parsed.headers.iter().any(is_valid_header) {
        return Err(DecodeError::NoHeaders);
    }

    let from = extract_addresses(&parsed.headers, "from").into_iter().next();
    let to = extract_addresses(&parsed.headers, "to");
    let cc = extract_addresses(&parsed.headers, "cc");
    let bcc = extract_addresses(&parsed.headers, "bcc");
    let subject = header_value(&parsed.headers, "subject");
    let date = header_value(&parsed.headers, "date");

    let mut parts = MimeParts::default();
    collect_parts(&parsed, &mut parts);

    debug!(
        subject = subject.as_deref().unwrap_or(""),
        attachments = parts.attachments.len(),
        has_html = parts.html.is_some(),
        has_text = parts.text.is_some(),
        "Decoded email"
    );

    let email = DecodedEmail {
        from,
        to,
        cc,
        bcc,
        subject,
        date,
        html: parts.html,
        text: parts.text,
        attachments: parts.attachments,
    };

    if email.is_blank() {
        return Err(DecodeError::Empty);
    }

    Ok(email)
}

/// RFC 5322 field names are printable ASCII without colon or space
///
/// A bare token with no value is how mailparse reads a line without a colon,
/// so a field only counts when it also carries a value.
fn is_valid_header(header: &MailHeader) -> bool {
    let key = header.get_key();
    !key.is_empty()
        && key.bytes().all(|b| (b'!'..=b'~').contains(&b) && b != b':')
        && !header.get_value().trim().is_empty()
}

fn find_header<'a, 'b>(headers: &'a [MailHeader<'b>], name: &str) -> Option<&'a MailHeader<'b>> {
    headers
        .iter()
        .find(|h| h.get_key().eq_ignore_ascii_case(name))
}

fn header_value(headers: &[MailHeader], name: &str) -> Option<String> {
    find_header(headers, name)
        .map(|h| h.get_value().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn extract_addresses(headers: &[MailHeader], name: &str) -> Vec<Address> {
    let Some(header) = find_header(headers, name) else {
        return Vec::new();
    };

    match mailparse::addrparse_header(header) {
        Ok(list) => list
            .iter()
            .flat_map(|addr| match addr {
                MailAddr::Single(info) => vec![info.clone()],
                MailAddr::Group(group) => group.addrs.clone(),
            })
            .map(|info| Address::new(info.display_name, info.addr))
            .collect(),
        Err(e) => {
            debug!(header = name, error = %e, "Unparseable address header");
            Vec::new()
        }
    }
}

#[derive(Default)]
struct MimeParts {
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

fn collect_parts(part: &ParsedMail, out: &mut MimeParts) {
    if !part.subparts.is_empty() {
        for sub in &part.subparts {
            collect_parts(sub, out);
        }
        return;
    }

    let mime_type = part.ctype.mimetype.to_lowercase();
    let disposition = part.get_content_disposition();
    let filename = disposition
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned();

    let is_attachment = matches!(disposition.disposition, DispositionType::Attachment)
        || filename.is_some()
        || mime_type == "message/rfc822"
        || mime_type == "message/rfc2822";

    if is_attachment {
        match part.get_body_raw() {
            Ok(content) => out.attachments.push(Attachment {
                filename,
                mime_type: if mime_type.is_empty() {
                    "application/octet-stream".to_string()
                } else {
                    mime_type
                },
                content,
            }),
            Err(e) => debug!(error = %e, "Skipping undecodable attachment"),
        }
        return;
    }

    let Ok(body) = part.get_body() else {
        return;
    };

    if mime_type == "text/html" {
        if out.html.is_none() {
            out.html = Some(body);
        }
    } else if out.text.is_none() && (mime_type.starts_with("text/") || mime_type.is_empty()) {
        out.text = Some(body);
    }
}
