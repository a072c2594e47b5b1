//! Export functionality: attachment extraction and plain-text dumps.

pub mod attachment;
pub mod text;

/// Sanitize a string for use in filenames.
///
/// Replaces path separators and other invalid characters with `_` and
/// truncates to `max_len` characters.
pub fn sanitize_filename_part(s: &str, max_len: usize) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    let result: String = trimmed.chars().take(max_len).collect();

    if result.is_empty() {
        "unnamed".to_string()
    } else {
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_separators() {
        assert_eq!(sanitize_filename_part("a/b\\c:d", 100), "a_b_c_d");
    }

    #[test]
    fn test_sanitize_truncates() {
        assert_eq!(sanitize_filename_part("abcdefgh", 4), "abcd");
    }

    #[test]
    fn test_sanitize_empty_becomes_unnamed() {
        assert_eq!(sanitize_filename_part("", 10), "unnamed");
        assert_eq!(sanitize_filename_part("...", 10), "unnamed");
    }
}
