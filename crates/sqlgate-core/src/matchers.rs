//! Security reason matching against engine rejection messages.
//!
//! Reasons are plain substrings today. Swapping to structured error codes
//! only touches this module.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReasonMatch {
    /// Every expected reason appears in the message.
    All,
    /// Some, not all. Worth a manual look.
    Partial {
        found: Vec<String>,
        missing: Vec<String>,
    },
    /// Nothing expected appears (or nothing was expected).
    None,
}

/// Case-insensitive containment of `needle` in `haystack`.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn match_error_reasons(message: &str, expected: &[String]) -> ReasonMatch {
    let (found, missing): (Vec<String>, Vec<String>) = expected
        .iter()
        .cloned()
        .partition(|reason| contains_ignore_case(message, reason));

    match (found.is_empty(), missing.is_empty()) {
        (true, _) => ReasonMatch::None,
        (false, true) => ReasonMatch::All,
        (false, false) => ReasonMatch::Partial { found, missing },
    }
}
