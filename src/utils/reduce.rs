//! Lossy size reduction applied before chunking.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

use super::tokens::estimate_tokens;

/// Full-line `#` comments, the default comment style.
static HASH_COMMENT_LINE: Lazy<Regex> = Lazy::new(|| build_comment_regex(&["#".to_string()]));

/// Build a regex matching whole lines (newline included) that start with one
/// of `prefixes` after optional horizontal whitespace.
fn build_comment_regex(prefixes: &[String]) -> Regex {
    let alternatives: Vec<String> = prefixes
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .map(regex::escape)
        .collect();
    Regex::new(&format!(r"(?m)^[ \t]*(?:{})[^\n]*(?:\n|$)", alternatives.join("|")))
        .expect("valid comment line regex")
}

/// Remove every line that is nothing but a comment.
///
/// Inline trailing comments are left alone; only lines whose first
/// non-whitespace characters are a comment prefix are dropped.
pub fn strip_comment_lines<'a>(text: &'a str, prefixes: &[String]) -> Cow<'a, str> {
    if prefixes.iter().all(|p| p.trim().is_empty()) {
        return Cow::Borrowed(text);
    }
    if prefixes.len() == 1 && prefixes[0].trim() == "#" {
        return HASH_COMMENT_LINE.replace_all(text, "");
    }
    build_comment_regex(prefixes).replace_all(text, "")
}

/// Strip comment lines only when `text` is estimated above `cap`.
///
/// Best effort: the result may still exceed the cap.
pub fn reduce_for_cap<'a>(text: &'a str, cap: usize, prefixes: &[String]) -> Cow<'a, str> {
    let before = estimate_tokens(text);
    if before <= cap {
        return Cow::Borrowed(text);
    }

    let reduced = strip_comment_lines(text, prefixes);
    if let Cow::Owned(ref stripped) = reduced {
        tracing::debug!(before, after = estimate_tokens(stripped), cap, "stripped comment lines");
    }
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> Vec<String> {
        vec!["#".to_string()]
    }

    #[test]
    fn test_under_cap_is_untouched() {
        let code = "print('Hello, world!')";
        let reduced = reduce_for_cap(code, 7000, &hash());
        assert!(matches!(reduced, Cow::Borrowed(_)));
        assert_eq!(reduced, code);
    }

    #[test]
    fn test_inline_comment_survives_over_cap() {
        let code = "print('Hello, world!') # Inline comment";
        let reduced = reduce_for_cap(code, 1, &hash());
        assert_eq!(reduced, code);
    }

    #[test]
    fn test_full_line_comments_removed_over_cap() {
        let code = "# header\ndef f():\n    # explain\n    return 1\n";
        let reduced = reduce_for_cap(code, 1, &hash());
        assert_eq!(reduced, "def f():\n    return 1\n");
    }

    #[test]
    fn test_trailing_comment_without_newline() {
        let code = "x = 1\n  # done";
        assert_eq!(strip_comment_lines(code, &hash()), "x = 1\n");
    }

    #[test]
    fn test_custom_prefixes() {
        let prefixes = vec!["//".to_string(), "--".to_string()];
        let code = "// a\nlet x = 1; // keep\n-- sql\nselect 1;\n";
        assert_eq!(strip_comment_lines(code, &prefixes), "let x = 1; // keep\nselect 1;\n");
    }

    #[test]
    fn test_empty_prefix_list_is_noop() {
        let code = "# stays\n";
        assert_eq!(strip_comment_lines(code, &[]), code);
    }
}
