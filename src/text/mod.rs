//! Transcript text normalization
//!
//! Turns raw concatenated recognizer output into clean sentences. The
//! transformation is a pure function: deterministic, no configuration, and
//! idempotent on already-normalized text.

/// Normalize raw transcript text into sentences.
///
/// Rules:
/// - `". "` is collapsed to `"."` so mid-text sentence ends split cleanly
/// - the text is split on `.`; fragments are trimmed, empties dropped
/// - each fragment gets its first character uppercased (single-character
///   fragments are fully uppercased)
/// - fragments not already ending in `.`, `!`, or `?` get a trailing `.`
/// - fragments are joined with single spaces
///
/// Empty input is returned unchanged.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let collapsed = text.replace(". ", ".");

    let mut sentences: Vec<String> = Vec::new();
    for part in collapsed.split('.') {
        let cleaned = part.trim();
        if cleaned.is_empty() {
            continue;
        }

        let mut sentence = capitalize_first(cleaned);
        if !sentence.ends_with(['.', '!', '?']) {
            sentence.push('.');
        }
        sentences.push(sentence);
    }

    sentences.join(" ")
}

/// Uppercase the first character; fully uppercase single-character input
fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => {
            let rest = chars.as_str();
            if rest.is_empty() {
                s.to_uppercase()
            } else {
                first.to_uppercase().collect::<String>() + rest
            }
        }
    }
}
