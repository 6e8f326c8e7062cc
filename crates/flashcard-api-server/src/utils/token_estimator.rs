//! Approximate token counting for LLM budget checks.
//!
//! Exact tokenization is not needed here: the estimate only has to keep a
//! chunk inside the model's context window with a safety margin. A fixed
//! characters-per-token ratio is monotonic in text length, which is all the
//! chunker relies on. The ratio is a config knob, not a constant.

use unicode_segmentation::UnicodeSegmentation;

/// Estimate tokens from text using a characters-per-token ratio.
/// Counts graphemes, not bytes, so multi-byte scripts don't inflate the count.
pub fn estimate_tokens(text: &str, chars_per_token: f64) -> usize {
    if text.is_empty() {
        return 0;
    }

    let char_count = text.graphemes(true).count();

    (char_count as f64 / chars_per_token).ceil() as usize
}

/// Check if adding text would exceed a token limit.
pub fn would_exceed_limit(
    current_tokens: usize,
    new_text: &str,
    max_tokens: usize,
    chars_per_token: f64,
) -> bool {
    current_tokens + estimate_tokens(new_text, chars_per_token) > max_tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_string() {
        assert_eq!(estimate_tokens("", 4.0), 0);
    }

    #[test]
    fn test_fixed_ratio() {
        // 3000 chars at 4 chars/token = 750 tokens
        let text = "A".repeat(3000);
        assert_eq!(estimate_tokens(&text, 4.0), 750);
    }

    #[test]
    fn test_rounds_up() {
        // 5 chars at 4 chars/token = 1.25 -> 2
        assert_eq!(estimate_tokens("hello", 4.0), 2);
    }

    #[test]
    fn test_monotonic_in_length() {
        let short = estimate_tokens("short text", 4.0);
        let long = estimate_tokens("short text plus some more words", 4.0);
        assert!(long >= short);
    }

    #[test]
    fn test_graphemes_not_bytes() {
        // 4 graphemes, 12 bytes
        let text = "日本語だ";
        assert_eq!(estimate_tokens(text, 4.0), 1);
    }

    #[test]
    fn test_would_exceed() {
        let text = "word ".repeat(400); // 2000 chars = 500 tokens at 4.0
        assert!(would_exceed_limit(1000, &text, 1400, 4.0));
        assert!(!would_exceed_limit(1000, &text, 1600, 4.0));
    }
}
