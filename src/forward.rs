//! Detection of inline forwarded messages
//!
//! Mail clients mark an inline forward in a handful of ways. Each known
//! convention is a strategy: a matcher that locates the forwarded
//! block and a parser that splits it into pseudo-headers and body. Strategies
//! are tried in order and the first match wins.

use crate::extracted::{normalize_line_endings, sanitize_text};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

static GMAIL_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)-{5,}\s*Forwarded message\s*-{5,}(.+)").unwrap());

static APPLE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)Begin forwarded message:\s*(.+)").unwrap());

static GENERIC_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)From:\s*.+?\n[\s\S]*?Subject:\s*.+?\n").unwrap());

static GMAIL_BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Subject:[^\n]*\n{2,}([\s\S]+)").unwrap());

static GENERIC_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)(?:^(?:From|Subject|Date|To)\s*:[^\n]*\n)+\n+([\s\S]+)").unwrap()
});

static FROM_HEADER: LazyLock<Regex> = LazyLock::new(|| header_pattern("From"));
static TO_HEADER: LazyLock<Regex> = LazyLock::new(|| header_pattern("To"));
static SUBJECT_HEADER: LazyLock<Regex> = LazyLock::new(|| header_pattern("Subject"));
static DATE_HEADER: LazyLock<Regex> = LazyLock::new(|| header_pattern("Date"));

/// Which forwarding convention was recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardStyle {
    /// `---------- Forwarded message ---------`
    Gmail,
    /// `Begin forwarded message:`
    AppleOutlook,
    /// Bare `From:` ... `Subject:` header block
    Generic,
}

/// A forwarded message split out of a larger body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardedMessage {
    pub style: ForwardStyle,
    pub from: Option<String>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub date: Option<String>,
    /// Sanitized body of the forwarded message
    pub content: String,
}

/// A forwarding convention: where the block starts and how to split it
struct ForwardStrategy {
    style: ForwardStyle,
    locate: fn(&str) -> Option<&str>,
    split: fn(&str) -> String,
}

static STRATEGIES: [ForwardStrategy; 3] = [
    ForwardStrategy {
        style: ForwardStyle::Gmail,
        locate: locate_gmail,
        split: gmail_body,
    },
    ForwardStrategy {
        style: ForwardStyle::AppleOutlook,
        locate: locate_apple,
        split: apple_body,
    },
    ForwardStrategy {
        style: ForwardStyle::Generic,
        locate: locate_generic,
        split: generic_body,
    },
];

/// Find a forwarded message inside plain text
///
/// Returns `None` when no known convention matches; that is an ordinary
/// outcome, not an error.
#[must_use]
pub fn detect_forwarded_message(text: &str) -> Option<ForwardedMessage> {
    if text.is_empty() {
        return None;
    }

    let text = normalize_line_endings(text);

    STRATEGIES.iter().find_map(|strategy| {
        let block = (strategy.locate)(text.as_str())?;
        debug!(style = ?strategy.style, "Forward marker matched");

        Some(ForwardedMessage {
            style: strategy.style,
            from: first_header_value(&FROM_HEADER, block),
            to: first_header_value(&TO_HEADER, block),
            subject: first_header_value(&SUBJECT_HEADER, block),
            date: first_header_value(&DATE_HEADER, block),
            content: (strategy.split)(block),
        })
    })
}

/// Line-anchored `Name: value` pattern; the name is escaped so this always compiles
fn header_pattern(header_name: &str) -> Regex {
    // Horizontal whitespace only, so an empty value never borrows the next line
    Regex::new(&format!(
        r"(?imR)^{}[ \t]*:[ \t]*(.+?)$",
        regex::escape(header_name)
    ))
    .unwrap()
}

fn first_header_value(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// First value of a line-anchored `Name: value` header in free text
///
/// Only the first line of a folded value is returned.
#[must_use]
pub fn extract_header_value(text: &str, header_name: &str) -> Option<String> {
    let known = match header_name.to_ascii_lowercase().as_str() {
        "from" => Some(&*FROM_HEADER),
        "to" => Some(&*TO_HEADER),
        "subject" => Some(&*SUBJECT_HEADER),
        "date" => Some(&*DATE_HEADER),
        _ => None,
    };

    match known {
        Some(re) => first_header_value(re, text),
        None => first_header_value(&header_pattern(header_name), text),
    }
}

fn locate_gmail(text: &str) -> Option<&str> {
    GMAIL_MARKER
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

fn locate_apple(text: &str) -> Option<&str> {
    APPLE_MARKER
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

fn locate_generic(text: &str) -> Option<&str> {
    GENERIC_MARKER.is_match(text).then_some(text)
}

fn gmail_body(block: &str) -> String {
    GMAIL_BODY
        .captures(block)
        .and_then(|cap| cap.get(1))
        .map_or_else(|| sanitize_text(block), |m| sanitize_text(m.as_str()))
}

fn apple_body(block: &str) -> String {
    let lines: Vec<&str> = block.split('\n').collect();

    // Headers end at the first blank line after at least one header line
    let body_start = lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim().is_empty())
        .map(|(i, _)| i + 1);

    body_start.map_or_else(String::new, |start| {
        sanitize_text(&lines[start..].join("\n"))
    })
}

fn generic_body(block: &str) -> String {
    GENERIC_BODY
        .captures(block)
        .and_then(|cap| cap.get(1))
        .map_or_else(|| sanitize_text(block), |m| sanitize_text(m.as_str()))
}
