pub mod chunker;
pub mod normalizer;

pub use chunker::{Chunk, ChunkingConfig, ChunkingConfigError, TextChunker};
pub use normalizer::{decode_text, normalize_text};
