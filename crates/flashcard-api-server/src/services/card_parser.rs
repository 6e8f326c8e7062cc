//! Parsing of model output into front/back pairs.
//!
//! The model is asked for TSV but smaller instruct models drift, so parsing
//! falls through a strict-to-permissive chain: TSV lines, `Q: ... A: ...` on
//! one line, `Q:` / `A:` on consecutive lines, numbered pairs, and finally a
//! JSON list of {question, answer} objects.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static Q_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*q(?:uestion)?[:\-]\s*").unwrap());
static A_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*a(?:nswer)?[:\-]\s*").unwrap());
static NUM_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*[-•*]?\s*(?:\d+[).\-:]|-|•|\*)\s*").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip bullets and Q:/A: markers, collapse whitespace.
fn clean_piece(s: &str) -> String {
    let s = NUM_PREFIX.replace(s.trim(), "");
    let s = Q_PREFIX.replace(&s, "");
    let s = A_PREFIX.replace(&s, "");
    WHITESPACE.replace_all(&s, " ").trim().to_string()
}

fn parse_tsv_lines(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || !line.contains('\t') {
            continue;
        }
        if let Some((q, a)) = line.split_once('\t') {
            let q = clean_piece(q);
            let a = clean_piece(a);
            if !q.is_empty() && !a.is_empty() {
                out.push((q, a));
            }
        }
    }
    out
}

fn parse_q_a_one_line(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if !(lower.starts_with("q:") || lower.starts_with("question:")) {
            continue;
        }
        for marker in [" A:", " Answer:", " a:", " answer:"] {
            if let Some(pos) = line.find(marker) {
                let q = clean_piece(&line[..pos]);
                let a = clean_piece(&line[pos + marker.len()..]);
                if !q.is_empty() && !a.is_empty() {
                    out.push((q, a));
                }
                break;
            }
        }
    }
    out
}

fn parse_q_a_two_lines(text: &str) -> Vec<(String, String)> {
    let lines: Vec<&str> = text
        .lines()
        .map(|ln| ln.trim())
        .filter(|ln| !ln.is_empty())
        .collect();

    let mut out = Vec::new();
    let mut i = 0;
    while i + 1 < lines.len() {
        if Q_PREFIX.is_match(lines[i]) && A_PREFIX.is_match(lines[i + 1]) {
            let q = clean_piece(lines[i]);
            let a = clean_piece(lines[i + 1]);
            if !q.is_empty() && !a.is_empty() {
                out.push((q, a));
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    out
}

fn parse_numbered_pairs(text: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let line = NUM_PREFIX.replace(line, "");
        for sep in [" - ", " — ", " : ", " – "] {
            if let Some((q, a)) = line.split_once(sep) {
                let q = clean_piece(q);
                let a = clean_piece(a);
                if !q.is_empty() && !a.is_empty() {
                    out.push((q, a));
                }
                break;
            }
        }
    }
    out
}

fn parse_json_list(text: &str) -> Vec<(String, String)> {
    let data: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => {
            // models often wrap the list in prose; try the bracketed slice
            let (start, end) = match (text.find('['), text.rfind(']')) {
                (Some(start), Some(end)) if end > start => (start, end),
                _ => return Vec::new(),
            };
            match serde_json::from_str(&text[start..=end]) {
                Ok(value) => value,
                Err(_) => return Vec::new(),
            }
        }
    };

    let Value::Array(items) = data else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for item in items {
        let Value::Object(map) = item else { continue };
        let q = map
            .get("question")
            .and_then(Value::as_str)
            .map(clean_piece)
            .unwrap_or_default();
        let a = map
            .get("answer")
            .and_then(Value::as_str)
            .map(clean_piece)
            .unwrap_or_default();
        if !q.is_empty() && !a.is_empty() {
            out.push((q, a));
        }
    }
    out
}

/// Try strict -> permissive parsers; the first that yields cards wins.
pub fn parse_cards(text: &str) -> Vec<(String, String)> {
    let parsers = [
        parse_tsv_lines,
        parse_q_a_one_line,
        parse_q_a_two_lines,
        parse_numbered_pairs,
        parse_json_list,
    ];

    for parser in parsers {
        let cards = parser(text);
        if !cards.is_empty() {
            return cards;
        }
    }
    Vec::new()
}
