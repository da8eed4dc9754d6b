//! Text helpers shared by the pipeline stages.

use unicode_normalization::UnicodeNormalization;

/// Normalize CRLF and lone CR line endings to LF.
#[must_use]
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Collapse every run of Unicode whitespace into a single space and trim the ends.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Comparison key used for requirement deduplication.
///
/// NFKC-normalizes, collapses whitespace and lower-cases, so `"Support  login"` and
/// `"support login"` share a key.
#[must_use]
pub fn dedup_key(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    collapse_whitespace(&normalized).to_lowercase()
}

/// Longest prefix of `text` that is at most `max_bytes` long and ends on a char boundary.
#[must_use]
pub fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dedup_key_ignores_case_and_spacing() {
        assert_eq!(dedup_key("Support login"), dedup_key("support  login"));
        assert_eq!(dedup_key("  Support\tLOGIN \n"), "support login");
        assert_ne!(dedup_key("Support login"), dedup_key("Support logout"));
    }

    #[test]
    fn test_dedup_key_applies_nfkc() {
        // Fullwidth letters fold to ASCII under NFKC.
        assert_eq!(dedup_key("ＳＳＯ login"), dedup_key("sso login"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo";
        assert_eq!(truncate_at_char_boundary(text, 2), "h");
        assert_eq!(truncate_at_char_boundary(text, 3), "hé");
        assert_eq!(truncate_at_char_boundary(text, 100), text);
        assert_eq!(truncate_at_char_boundary(text, 0), "");
    }

    #[test]
    fn test_line_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    proptest! {
        #[test]
        fn prop_truncate_never_exceeds_budget(text in "\\PC{0,64}", max in 0usize..80) {
            let cut = truncate_at_char_boundary(&text, max);
            prop_assert!(cut.len() <= max);
            prop_assert!(text.starts_with(cut));
        }

        #[test]
        fn prop_dedup_key_is_idempotent(text in "\\PC{0,40}") {
            let once = dedup_key(&text);
            prop_assert_eq!(dedup_key(&once), once.clone());
        }
    }
}
