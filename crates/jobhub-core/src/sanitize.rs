//! Helpers for writing untrusted values into logs.
//!
//! Worker-supplied strings may contain newlines or terminal escapes; they are
//! stripped before logging so a crafted error message cannot forge log lines.

/// Remove control characters, replacing line breaks and tabs with a space.
pub fn strip_control_chars(input: &str) -> String {
    input
        .chars()
        .filter_map(|c| match c {
            '\n' | '\r' | '\t' => Some(' '),
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Shorten an identifier for logging, keeping the first `keep` characters.
pub fn truncate_identifier(input: &str, keep: usize) -> String {
    let cleaned = strip_control_chars(input);
    if cleaned.chars().count() <= keep {
        return cleaned;
    }
    let prefix: String = cleaned.chars().take(keep).collect();
    format!("{prefix}…")
}

/// Sanitize free text for logging and cap its length.
pub fn for_log(input: &str, max_chars: usize) -> String {
    let cleaned = strip_control_chars(input);
    if cleaned.chars().count() <= max_chars {
        return cleaned;
    }
    let mut capped: String = cleaned.chars().take(max_chars).collect();
    capped.push('…');
    capped
}
