//! Signal extraction from decoded email text

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

// Regex patterns
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());

static URL_TRAILING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,;:!?)\]]+$").unwrap());

static SCRIPT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());

static STYLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());

static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

static HTML_DETECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<[a-z][^>]*>").unwrap());

static EXCESS_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Extract unique `http`/`https` URLs in order of first occurrence
///
/// Trailing sentence punctuation is dropped. URLs are otherwise kept
/// exactly as written.
#[must_use]
pub fn extract_urls(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for cap in URL_REGEX.find_iter(text) {
        let url = URL_TRAILING_PUNCT.replace(cap.as_str(), "").into_owned();
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }

    urls
}

/// Format an address as `name <address>`, or bare `address` without a name
#[must_use]
pub fn format_address(name: Option<&str>, address: &str) -> String {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => format!("{name} <{address}>"),
        None => address.to_string(),
    }
}

/// Whether a body looks like HTML
#[must_use]
pub fn is_html(content: &str) -> bool {
    HTML_DETECT_REGEX.is_match(content)
}

/// Strip HTML down to text
///
/// Drops script and style blocks with their content, removes every tag and
/// decodes the handful of entities mail clients commonly emit. Anything else
/// passes through as is.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let without_scripts = SCRIPT_REGEX.replace_all(html, "");
    let without_styles = STYLE_REGEX.replace_all(&without_scripts, "");
    let text = TAG_REGEX.replace_all(&without_styles, "");

    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Normalize line endings to `\n`
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

const fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}'..='\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Clean recovered text for submission
///
/// Idempotent: control characters are removed before blank lines are
/// collapsed, so a second pass finds nothing to change.
#[must_use]
pub fn sanitize_text(text: &str) -> String {
    let normalized = normalize_line_endings(text);
    let cleaned: String = normalized
        .chars()
        .filter(|c| !is_stripped_control(*c))
        .collect();

    EXCESS_NEWLINES
        .replace_all(&cleaned, "\n\n")
        .trim()
        .to_string()
}
