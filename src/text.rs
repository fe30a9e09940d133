//! Text search and rewriting helpers.
//!
//! Offsets are byte offsets into the UTF-8 input and always fall on a char
//! boundary. "Not found" is `None`.

use regex::Regex;
use std::sync::LazyLock;

/// Runs of two or more whitespace characters.
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}").unwrap());

/// Offset of the `n`th (1-indexed) non-overlapping occurrence of `key`,
/// scanning left to right.
///
/// Returns `None` when `n` is 0, `key` is empty, or there are fewer than `n`
/// occurrences.
pub fn index_n(s: &str, key: &str, n: usize) -> Option<usize> {
    if n == 0 || key.is_empty() {
        return None;
    }
    s.match_indices(key).nth(n - 1).map(|(idx, _)| idx)
}

/// Offset of the `n`th (1-indexed) non-overlapping occurrence of `key`,
/// counting from the end of `s`.
pub fn last_index_n(s: &str, key: &str, n: usize) -> Option<usize> {
    if n == 0 || key.is_empty() {
        return None;
    }
    s.rmatch_indices(key).nth(n - 1).map(|(idx, _)| idx)
}

/// Start offset of the last match among the first `n` matches of `pattern`.
///
/// This is the `n`th match only when at least `n` exist; with fewer, the
/// final match found is returned instead. `n == 0` finds nothing.
pub fn index_nth(s: &str, pattern: &str, n: usize) -> Result<Option<usize>, regex::Error> {
    Ok(index_nth_with_count(s, pattern, n)?.map(|(_, idx)| idx))
}

/// Like [`index_nth`], also reporting how many matches (at most `n`) were
/// found: `(count, start_of_last)`.
pub fn index_nth_with_count(
    s: &str,
    pattern: &str,
    n: usize,
) -> Result<Option<(usize, usize)>, regex::Error> {
    let re = Regex::new(pattern)?;
    let found = re
        .find_iter(s)
        .take(n)
        .enumerate()
        .last()
        .map(|(i, m)| (i + 1, m.start()));
    Ok(found)
}

/// Replace every run of two or more whitespace characters with one `\n`.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s, "\n").into_owned()
}

/// Escape `&`, `<` and `>` as XML entities.
pub fn escape_xml(s: &str) -> String {
    // `&` goes first so the entities added below are not escaped again
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_n_basic() {
        assert_eq!(index_n("aXaXaX", "X", 1), Some(1));
        assert_eq!(index_n("aXaXaX", "X", 2), Some(3));
        assert_eq!(index_n("aXaXaX", "X", 3), Some(5));
    }

    #[test]
    fn test_index_n_too_few_occurrences() {
        assert_eq!(index_n("aXaXaX", "X", 4), None);
        assert_eq!(index_n("abc", "X", 1), None);
        assert_eq!(index_n("", "X", 1), None);
    }

    #[test]
    fn test_index_n_zero_and_empty_key() {
        assert_eq!(index_n("aXaXaX", "X", 0), None);
        assert_eq!(index_n("aXaXaX", "", 1), None);
    }

    #[test]
    fn test_index_n_non_overlapping() {
        // "aa" occurs at 0 and 2 when matches may not overlap
        assert_eq!(index_n("aaaa", "aa", 1), Some(0));
        assert_eq!(index_n("aaaa", "aa", 2), Some(2));
        assert_eq!(index_n("aaaa", "aa", 3), None);
    }

    #[test]
    fn test_index_n_multibyte() {
        // 'é' is two bytes
        assert_eq!(index_n("é-é-é", "é", 2), Some(3));
    }

    #[test]
    fn test_last_index_n() {
        assert_eq!(last_index_n("aXaXaX", "X", 1), Some(5));
        assert_eq!(last_index_n("aXaXaX", "X", 2), Some(3));
        assert_eq!(last_index_n("aXaXaX", "X", 3), Some(1));
        assert_eq!(last_index_n("aXaXaX", "X", 4), None);
        assert_eq!(last_index_n("aXaXaX", "X", 0), None);
    }

    #[test]
    fn test_last_index_n_match_at_start() {
        assert_eq!(last_index_n("XaX", "X", 2), Some(0));
    }

    #[test]
    fn test_index_nth_returns_nth_when_enough_matches() {
        assert_eq!(index_nth("a1b22c333", r"\d+", 1).unwrap(), Some(1));
        assert_eq!(index_nth("a1b22c333", r"\d+", 2).unwrap(), Some(3));
        assert_eq!(index_nth("a1b22c333", r"\d+", 3).unwrap(), Some(6));
    }

    #[test]
    fn test_index_nth_returns_last_when_fewer_matches() {
        // Only three matches exist; asking for the 5th yields the 3rd
        assert_eq!(index_nth("a1b22c333", r"\d+", 5).unwrap(), Some(6));
    }

    #[test]
    fn test_index_nth_no_match_or_zero() {
        assert_eq!(index_nth("abc", r"\d", 1).unwrap(), None);
        assert_eq!(index_nth("a1", r"\d", 0).unwrap(), None);
    }

    #[test]
    fn test_index_nth_invalid_pattern() {
        assert!(index_nth("abc", "(", 1).is_err());
    }

    #[test]
    fn test_index_nth_with_count() {
        assert_eq!(
            index_nth_with_count("x.x.x", r"x", 2).unwrap(),
            Some((2, 2))
        );
        assert_eq!(
            index_nth_with_count("x.x.x", r"x", 10).unwrap(),
            Some((3, 4))
        );
        assert_eq!(index_nth_with_count("...", r"x", 10).unwrap(), None);
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("a  b"), "a\nb");
        assert_eq!(collapse_whitespace("a \n\t b"), "a\nb");
        assert_eq!(collapse_whitespace("a b\nc"), "a b\nc");
        assert_eq!(collapse_whitespace("line1\r\n\r\nline2"), "line1\nline2");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_xml("<tag attr=\"x\">"), "&lt;tag attr=\"x\"&gt;");
        assert_eq!(escape_xml("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_escape_xml_reversible() {
        let original = "if a<b & b>c then <&>";
        let escaped = escape_xml(original);
        let restored = escaped
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_escape_xml_safe_text_unchanged() {
        let safe = "plain text with no specials";
        assert_eq!(escape_xml(safe), safe);
        assert_eq!(escape_xml(&escape_xml(safe)), safe);
    }
}
