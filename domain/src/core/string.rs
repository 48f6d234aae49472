//! String utilities for the domain layer.

/// Truncate to at most `max_chars` characters, appending `...` when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Lowercased alphanumeric words of `text`, in order.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_ascii() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("日本語テスト", 6), "日本語テスト");
        assert_eq!(truncate("日本語テスト文字列", 6), "日本語...");
    }

    #[test]
    fn test_words() {
        assert_eq!(
            words("Fix the build, then DEPLOY it!"),
            vec!["fix", "the", "build", "then", "deploy", "it"]
        );
        assert!(words("  ,, ").is_empty());
    }
}
