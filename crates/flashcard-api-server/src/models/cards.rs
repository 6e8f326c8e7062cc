use serde::{Deserialize, Serialize};

// Anki balks at absurdly long sides, and they are usually a sign the model
// dumped a whole paragraph instead of an answer.
pub const MAX_FRONT_CHARS: usize = 600;
pub const MAX_BACK_CHARS: usize = 1500;

/// One generated flashcard. Cards have no identity beyond their position in
/// the session's ordered list; `source_chunk` records which chunk produced
/// this card so edits can be traced back.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Card {
    pub front: String,
    pub back: String,
    #[serde(default)]
    pub source_chunk: usize,
}

/// Basic sanity checks before export. Mirrors what a reviewer would reject
/// by hand: blank sides and sides far too long to study from.
pub fn validate_cards(cards: &[Card]) -> Result<(), String> {
    if cards
        .iter()
        .any(|card| card.front.trim().is_empty() || card.back.trim().is_empty())
    {
        return Err("found empty card sides. fill or delete them before exporting".to_string());
    }
    if cards.iter().any(|card| card.front.chars().count() > MAX_FRONT_CHARS) {
        return Err(format!(
            "some fronts are too long (>{} chars). try editing or regenerating",
            MAX_FRONT_CHARS
        ));
    }
    if cards.iter().any(|card| card.back.chars().count() > MAX_BACK_CHARS) {
        return Err(format!(
            "some backs are very long (>{} chars). consider trimming",
            MAX_BACK_CHARS
        ));
    }
    Ok(())
}

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub text: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub session_id: String,
    #[serde(default)]
    pub cards_per_chunk: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CardUpsertRequest {
    pub front: String,
    pub back: String,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub session_id: String,
    pub char_count: usize,
    pub token_estimate: usize,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub session_id: String,
    pub filename: String,
    pub char_count: usize,
    pub token_estimate: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailureInfo {
    pub chunk_index: usize,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub session_id: String,
    pub cards: Vec<Card>,
    pub chunk_count: usize,
    pub failed_chunks: Vec<ChunkFailureInfo>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct CardsResponse {
    pub session_id: String,
    pub cards: Vec<Card>,
}

#[derive(Debug, Serialize)]
pub struct CardCreatedResponse {
    pub index: usize,
    pub card: Card,
}

#[derive(Debug, Serialize)]
pub struct ExportNotice {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(front: &str, back: &str) -> Card {
        Card {
            front: front.to_string(),
            back: back.to_string(),
            source_chunk: 0,
        }
    }

    #[test]
    fn accepts_reasonable_cards() {
        let cards = vec![card("What is RAG?", "Retrieval-Augmented Generation")];
        assert!(validate_cards(&cards).is_ok());
    }

    #[test]
    fn rejects_empty_sides() {
        let cards = vec![card("question", "  ")];
        assert!(validate_cards(&cards).unwrap_err().contains("empty"));
    }

    #[test]
    fn rejects_overlong_front() {
        let cards = vec![card(&"q".repeat(601), "short answer")];
        assert!(validate_cards(&cards).unwrap_err().contains("too long"));
    }

    #[test]
    fn rejects_overlong_back() {
        let cards = vec![card("short question", &"a".repeat(1501))];
        assert!(validate_cards(&cards).unwrap_err().contains("very long"));
    }

    #[test]
    fn empty_list_is_valid() {
        // the empty case is a no-op at the export layer, not a validation error
        assert!(validate_cards(&[]).is_ok());
    }
}
