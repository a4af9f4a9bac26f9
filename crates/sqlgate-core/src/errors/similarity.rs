/// Closest candidate to `needle` by normalized Levenshtein similarity, if any
/// candidate clears `min_score`.
pub fn closest_match<'a, I>(needle: &str, candidates: I, min_score: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = needle.to_lowercase();
    candidates
        .into_iter()
        .map(|c| (c, strsim::normalized_levenshtein(&needle, &c.to_lowercase())))
        .filter(|(_, score)| *score >= min_score)
        .max_by(|a, b| a.1.total_cmp(&b.1))
}

/// " (did you mean 'x'?)" or an empty string.
pub fn did_you_mean<'a, I>(needle: &str, candidates: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    match closest_match(needle, candidates, 0.6) {
        Some((hit, _)) => format!(" (did you mean '{}'?)", hit),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggests_near_field_name() {
        let fields = ["question", "expected_sql", "expected_error_contains"];
        let (hit, _) = closest_match("expected_error_contain", fields, 0.6).unwrap();
        assert_eq!(hit, "expected_error_contains");
    }

    #[test]
    fn no_suggestion_for_unrelated_text() {
        let fields = ["question", "should_pass"];
        assert_eq!(did_you_mean("zzzzzzzzzzzzzz", fields), "");
    }
}
