//! Case-id tokens as reported by test frameworks.
//!
//! A token is a decimal case id optionally preceded by a single ASCII letter
//! (TestRail shows cases as `C123`). Tokens always resolve to the bare number.

/// Check that a token is a well-formed case id: optional letter prefix + decimal digits.
///
/// Blank tokens are never well-formed; callers that want to skip them must
/// check [`is_blank`] first.
pub fn validate_case_id(token: &str) -> bool {
    let digits = match token.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => &token[c.len_utf8()..],
        Some(_) => token,
        None => return false,
    };
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Resolve a well-formed token to its numeric case id.
///
/// Returns `None` for malformed tokens and for ids that overflow `i64`.
pub fn extract_case_id(token: &str) -> Option<i64> {
    if !validate_case_id(token) {
        return None;
    }
    token
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .parse::<i64>()
        .ok()
}

/// Blank tokens carry no case id and are skipped rather than rejected.
pub fn is_blank(token: &str) -> bool {
    token.trim().is_empty()
}
