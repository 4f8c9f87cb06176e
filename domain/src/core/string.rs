//! String utilities for the domain layer.

/// Take the first `max_chars` characters of a string (UTF-8 safe).
///
/// Used to bound the text handed to similarity comparisons. Unlike a byte
/// slice, this never splits a multi-byte character.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string to a maximum byte length with ellipsis (UTF-8 safe).
///
/// Used for log previews of item summaries and content.
pub fn preview(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_input() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("", 10), "");
    }

    #[test]
    fn test_truncate_chars_exact_boundary() {
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello!", 5), "hello");
    }

    #[test]
    fn test_truncate_chars_multibyte() {
        // 4 characters, 12 bytes: counts characters, not bytes
        assert_eq!(truncate_chars("日本語テ", 3), "日本語");
    }

    #[test]
    fn test_preview_ascii() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("hello world", 8), "hello...");
    }

    #[test]
    fn test_preview_multibyte() {
        assert_eq!(preview("日本語テスト", 30), "日本語テスト");
        assert_eq!(preview("日本語テスト文字列", 15), "日本語テ...");
    }
}
