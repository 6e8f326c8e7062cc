use std::collections::HashMap;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::Regex;

static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Lines this short that repeat across a document are almost always page
/// headers/footers left behind by upstream extraction.
const REPEATED_LINE_MAX_LEN: usize = 60;
const REPEATED_LINE_THRESHOLD: usize = 3;

/// Normalize whitespace and remove obvious repeated headers/footers.
pub fn normalize_text(text: &str) -> String {
    let s = text.replace("\r\n", "\n").replace('\r', "\n");
    let s = s.replace('\u{a0}', " ");
    let s = SPACES.replace_all(&s, " ");
    let s = BLANK_RUNS.replace_all(&s, "\n\n");

    let lines: Vec<&str> = s.split('\n').map(|ln| ln.trim()).collect();

    let mut freq: HashMap<&str, usize> = HashMap::new();
    for ln in &lines {
        if !ln.is_empty() && ln.len() <= REPEATED_LINE_MAX_LEN {
            *freq.entry(ln).or_insert(0) += 1;
        }
    }

    let has_repeats = freq.values().any(|&count| count >= REPEATED_LINE_THRESHOLD);
    let kept: Vec<&str> = if has_repeats {
        lines
            .into_iter()
            .filter(|ln| freq.get(ln).map_or(true, |&count| count < REPEATED_LINE_THRESHOLD))
            .collect()
    } else {
        lines
    };

    kept.join("\n").trim().to_string()
}

/// Decode uploaded bytes, UTF-8 first with a Windows-1252 fallback.
pub fn decode_text(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return (text.to_string(), UTF_8);
    }

    let (decoded, _, _) = WINDOWS_1252.decode(bytes);
    (decoded.into_owned(), WINDOWS_1252)
}
