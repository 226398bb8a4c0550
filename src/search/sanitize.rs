use once_cell::sync::Lazy;
use regex::Regex;

static SCRIPT_STYLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<(?:script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("valid regex")
});

static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<[a-zA-Z/!?][^>]*>").expect("valid regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\s\p{Cc}]+").expect("valid regex")
});

/// Reduce free text from a form field to a single plain line.
///
/// Drops `<script>`/`<style>` blocks with their content, strips remaining
/// tags, folds control characters and whitespace runs into one space and
/// trims. A lone `<` that does not open a tag is kept.
pub fn sanitize_text_field(input: &str) -> String {
    let mut text = SCRIPT_STYLE.replace_all(input, "").into_owned();
    // removing one tag can join the halves of another, e.g. "<<b>i>"
    while TAG.is_match(&text) {
        text = TAG.replace_all(&text, "").into_owned();
    }

    WHITESPACE
        .replace_all(&text, " ")
        .trim()
        .to_string()
}

/// Cache key for a sanitized query: the prefix followed by the blake3 hex digest.
pub fn cache_key(prefix: &str, sanitized_query: &str) -> String {
    format!("{}{}", prefix, blake3::hash(sanitized_query.as_bytes()).to_hex())
}
