use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::token_estimator::estimate_tokens;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChunkingConfigError {
    #[error("chunk size must be positive (got {0} tokens)")]
    NonPositiveChunkSize(usize),

    #[error("overlap ({overlap} tokens) must be smaller than chunk size ({chunk_size} tokens)")]
    OverlapTooLarge { overlap: usize, chunk_size: usize },

    #[error("chars per token must be positive (got {0})")]
    NonPositiveRatio(f64),
}

/// Chunking knobs, validated once at entry. An invalid combination is
/// rejected before any chunk is produced, so the chunker itself never has
/// to handle a zero-length advance.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChunkingConfig {
    pub chunk_size_tokens: usize,
    pub overlap_tokens: usize,
    pub chars_per_token: f64,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ChunkingConfigError> {
        if self.chunk_size_tokens == 0 {
            return Err(ChunkingConfigError::NonPositiveChunkSize(self.chunk_size_tokens));
        }
        if !(self.chars_per_token > 0.0) {
            return Err(ChunkingConfigError::NonPositiveRatio(self.chars_per_token));
        }
        if self.overlap_tokens >= self.chunk_size_tokens {
            return Err(ChunkingConfigError::OverlapTooLarge {
                overlap: self.overlap_tokens,
                chunk_size: self.chunk_size_tokens,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
    /// Char offset into the source text (inclusive)
    pub start_pos: usize,
    /// Char offset into the source text (exclusive)
    pub end_pos: usize,
    pub token_estimate: usize,
}

/// Splits text into overlapping windows sized by the token budget.
///
/// Token budgets are mapped to char budgets through the configured ratio,
/// then windows are cut over char offsets: each chunk after the first starts
/// `overlap` tokens worth of chars before the previous chunk's end, so
/// consecutive chunks share a context region while the non-overlapping spans
/// cover the source exactly.
#[derive(Debug)]
pub struct TextChunker {
    config: ChunkingConfig,
}

impl TextChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, ChunkingConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Window length in chars for one chunk.
    fn window_chars(&self) -> usize {
        let window = (self.config.chunk_size_tokens as f64 * self.config.chars_per_token) as usize;
        window.max(1)
    }

    /// Chars to advance between chunk starts. Overlap < chunk size is
    /// enforced at construction; the floor to 1 guards degenerate ratios.
    fn step_chars(&self) -> usize {
        let overlap = (self.config.overlap_tokens as f64 * self.config.chars_per_token) as usize;
        self.window_chars().saturating_sub(overlap).max(1)
    }

    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total_len = chars.len();

        let mut chunks = Vec::new();
        if total_len == 0 {
            return chunks;
        }

        let window = self.window_chars();
        let step = self.step_chars();

        let mut start = 0;
        let mut index = 0;

        loop {
            let end = std::cmp::min(start + window, total_len);
            let content: String = chars[start..end].iter().collect();
            let token_estimate = estimate_tokens(&content, self.config.chars_per_token);

            chunks.push(Chunk {
                index,
                content,
                start_pos: start,
                end_pos: end,
                token_estimate,
            });

            if end >= total_len {
                break;
            }

            start += step;
            index += 1;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size_tokens: chunk_size,
            overlap_tokens: overlap,
            chars_per_token: 4.0,
        }
    }

    /// Rebuild the source from chunk 0 plus each later chunk's suffix past
    /// the previous chunk's end offset.
    fn reconstruct(text: &str, chunks: &[Chunk]) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut rebuilt = String::new();
        if let Some(first) = chunks.first() {
            rebuilt.push_str(&first.content);
        }
        for pair in chunks.windows(2) {
            let suffix: String = chars[pair[0].end_pos..pair[1].end_pos].iter().collect();
            rebuilt.push_str(&suffix);
        }
        rebuilt
    }

    #[test]
    fn empty_input_produces_no_chunks() {
        let chunker = TextChunker::new(config(1200, 150)).unwrap();
        assert!(chunker.chunk("").is_empty());
    }

    #[test]
    fn short_input_produces_single_chunk() {
        let chunker = TextChunker::new(config(1200, 150)).unwrap();
        // 3000 chars = 750 tokens, under the 1200 budget
        let text = "A".repeat(3000);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
        assert_eq!(chunks[0].start_pos, 0);
        assert_eq!(chunks[0].end_pos, 3000);
        assert_eq!(chunks[0].token_estimate, 750);
    }

    #[test]
    fn input_shorter_than_overlap_produces_single_chunk() {
        let chunker = TextChunker::new(config(1200, 150)).unwrap();
        let text = "tiny";
        let chunks = chunker.chunk(text);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text);
    }

    #[test]
    fn windows_advance_by_chunk_minus_overlap() {
        let chunker = TextChunker::new(config(1200, 150)).unwrap();
        // 6000 chars: window 4800 chars, step 4800 - 600 = 4200
        let text = "A".repeat(6000);
        let chunks = chunker.chunk(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_pos, 0);
        assert_eq!(chunks[0].end_pos, 4800);
        assert_eq!(chunks[1].start_pos, 4200);
        assert_eq!(chunks[1].end_pos, 6000);
        // overlap region is 600 chars
        assert_eq!(chunks[0].end_pos - chunks[1].start_pos, 600);
    }

    #[test]
    fn every_chunk_respects_the_token_budget() {
        let chunker = TextChunker::new(config(100, 20)).unwrap();
        let text = "word ".repeat(500);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.token_estimate <= 100,
                "chunk {} estimated {} tokens",
                chunk.index,
                chunk.token_estimate
            );
        }
    }

    #[test]
    fn chunks_cover_the_text_without_gaps_or_drops() {
        let texts = [
            "A".repeat(6000),
            "The quick brown fox jumps over the lazy dog. ".repeat(200),
            "日本語のテキストでも同じように動くはず。".repeat(120),
            "x".to_string(),
        ];
        let configs = [config(1200, 150), config(100, 20), config(50, 49), config(10, 0)];

        for text in &texts {
            for cfg in &configs {
                let chunker = TextChunker::new(cfg.clone()).unwrap();
                let chunks = chunker.chunk(text);
                assert_eq!(&reconstruct(text, &chunks), text);
                // chunks come out in source order
                for pair in chunks.windows(2) {
                    assert!(pair[1].start_pos > pair[0].start_pos);
                    assert_eq!(pair[1].index, pair[0].index + 1);
                }
            }
        }
    }

    #[test]
    fn consecutive_chunks_share_the_overlap_region() {
        let chunker = TextChunker::new(config(100, 25)).unwrap();
        let text: String = ('a'..='z').cycle().take(2000).collect();
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let shared = pair[0].end_pos.saturating_sub(pair[1].start_pos);
            assert_eq!(shared, 100); // 25 tokens * 4 chars
            let tail: String = pair[0].content.chars().skip(pair[0].content.chars().count() - shared).collect();
            let head: String = pair[1].content.chars().take(shared).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn overlap_equal_to_chunk_size_is_rejected() {
        let err = TextChunker::new(config(100, 100)).unwrap_err();
        assert!(matches!(err, ChunkingConfigError::OverlapTooLarge { .. }));
    }

    #[test]
    fn overlap_larger_than_chunk_size_is_rejected() {
        let err = TextChunker::new(config(100, 150)).unwrap_err();
        assert!(matches!(err, ChunkingConfigError::OverlapTooLarge { .. }));
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let err = TextChunker::new(config(0, 0)).unwrap_err();
        assert!(matches!(err, ChunkingConfigError::NonPositiveChunkSize(0)));
    }

    #[test]
    fn non_positive_ratio_is_rejected() {
        let cfg = ChunkingConfig {
            chunk_size_tokens: 100,
            overlap_tokens: 10,
            chars_per_token: 0.0,
        };
        assert!(matches!(
            cfg.validate().unwrap_err(),
            ChunkingConfigError::NonPositiveRatio(_)
        ));
    }
}
