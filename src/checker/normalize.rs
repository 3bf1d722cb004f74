//! Phone number normalization.

/// Normalize one raw line into a canonical digits-only number.
///
/// Strips every non-digit character, then rewrites a leading national "0"
/// into the "62" country code. Never fails; too-short results are filtered
/// out by the batch verifier, not here.
pub fn normalize(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.strip_prefix('0') {
        Some(rest) => format!("62{rest}"),
        None => digits,
    }
}
