//! Path separator normalization between Windows (`\`) and Linux (`/`) styles.

/// Replace every backslash with a forward slash.
pub fn to_linux(path: &str) -> String {
    path.chars()
        .map(|c| if c == '\\' { '/' } else { c })
        .collect()
}

/// Replace every forward slash with a backslash.
pub fn to_windows(path: &str) -> String {
    path.chars()
        .map(|c| if c == '/' { '\\' } else { c })
        .collect()
}

/// Collapse escaped `\\` pairs into single backslashes.
///
/// Strings without any backslash are returned unchanged.
pub fn collapse_double_backslashes(path: &str) -> String {
    if path.contains('\\') {
        path.replace(r"\\", r"\")
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_linux() {
        assert_eq!(to_linux(r"a\b\c"), "a/b/c");
        assert_eq!(to_linux(r"C:\Users\me\file.txt"), "C:/Users/me/file.txt");
        assert_eq!(to_linux("already/linux"), "already/linux");
    }

    #[test]
    fn test_to_windows() {
        assert_eq!(to_windows("a/b/c"), r"a\b\c");
        assert_eq!(to_windows(r"already\win"), r"already\win");
    }

    #[test]
    fn test_round_trip_single_style() {
        let win = r"a\b\c";
        assert_eq!(to_windows(&to_linux(win)), win);
        let linux = "/var/log/app.log";
        assert_eq!(to_linux(&to_windows(linux)), linux);
    }

    #[test]
    fn test_mixed_separators_not_reversible() {
        let mixed = r"a\b/c";
        assert_eq!(to_linux(mixed), "a/b/c");
        assert_eq!(to_windows(mixed), r"a\b\c");
    }

    #[test]
    fn test_collapse_double_backslashes() {
        assert_eq!(collapse_double_backslashes(r"C:\\dir\\file"), r"C:\dir\file");
        assert_eq!(collapse_double_backslashes(r"C:\dir"), r"C:\dir");
        assert_eq!(collapse_double_backslashes("no/backslash"), "no/backslash");
        assert_eq!(collapse_double_backslashes(r"a\\\\b"), r"a\\b");
    }
}
