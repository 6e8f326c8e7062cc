use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PromptsConfig;
use crate::document::Chunk;
use crate::models::cards::{Card, ChunkFailureInfo};
use crate::models::chat::ChatMessage;
use crate::services::card_parser;
use crate::services::event_bus::{EventBus, GenerationEvent};
use crate::services::llm_service::LlmProvider;

pub struct GenerationOutcome {
    pub cards: Vec<Card>,
    pub failures: Vec<ChunkFailureInfo>,
    pub chunk_count: usize,
}

/// Runs one LLM call per chunk and reassembles the results in chunk order.
///
/// Chunks are independent tasks: a failing chunk is recorded and the rest
/// still complete. Concurrency is bounded by config; `buffered` keeps the
/// output order equal to the input order whatever the completion order.
pub struct GenerationService {
    llm: Arc<dyn LlmProvider>,
    prompts: PromptsConfig,
    event_bus: Arc<EventBus>,
    concurrency: usize,
}

impl GenerationService {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        prompts: PromptsConfig,
        event_bus: Arc<EventBus>,
        concurrency: usize,
    ) -> Self {
        Self {
            llm,
            prompts,
            event_bus,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn generate(
        &self,
        session_id: Uuid,
        chunks: &[Chunk],
        cards_per_chunk: usize,
    ) -> GenerationOutcome {
        info!(
            "Starting generation: session={}, chunks={}, cards_per_chunk={}",
            session_id,
            chunks.len(),
            cards_per_chunk
        );

        self.event_bus.publish(
            session_id,
            GenerationEvent::RunStarted {
                chunk_count: chunks.len(),
            },
        );

        let chunk_futures: Vec<_> = chunks
            .iter()
            .map(|chunk| self.generate_for_chunk(session_id, chunk, cards_per_chunk))
            .collect();

        let results: Vec<Result<Vec<Card>, ChunkFailureInfo>> = stream::iter(chunk_futures)
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut cards = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(chunk_cards) => cards.extend(chunk_cards),
                Err(failure) => failures.push(failure),
            }
        }

        info!(
            "Generation finished: session={}, cards={}, failed_chunks={}",
            session_id,
            cards.len(),
            failures.len()
        );

        self.event_bus.publish(
            session_id,
            GenerationEvent::RunCompleted {
                cards_total: cards.len(),
                chunks_failed: failures.len(),
            },
        );

        GenerationOutcome {
            cards,
            failures,
            chunk_count: chunks.len(),
        }
    }

    async fn generate_for_chunk(
        &self,
        session_id: Uuid,
        chunk: &Chunk,
        cards_per_chunk: usize,
    ) -> Result<Vec<Card>, ChunkFailureInfo> {
        debug!(
            "Generating cards for chunk {} (~{} tokens)",
            chunk.index, chunk.token_estimate
        );

        let result = self.ask_for_cards(chunk, cards_per_chunk, false).await;

        let pairs = match result {
            Ok(pairs) if pairs.is_empty() => {
                // the model ignored the format; re-ask once with a stricter reminder
                debug!("Chunk {} parsed to zero cards, re-asking strictly", chunk.index);
                self.ask_for_cards(chunk, cards_per_chunk, true).await
            }
            other => other,
        }
        .map_err(|e| {
            warn!("Chunk {} failed: {}", chunk.index, e);
            self.event_bus.publish(
                session_id,
                GenerationEvent::ChunkFailed {
                    chunk_index: chunk.index,
                    error: e.to_string(),
                },
            );
            ChunkFailureInfo {
                chunk_index: chunk.index,
                error: e.to_string(),
            }
        })?;

        let cards: Vec<Card> = pairs
            .into_iter()
            .take(cards_per_chunk)
            .map(|(front, back)| Card {
                front,
                back,
                source_chunk: chunk.index,
            })
            .collect();

        self.event_bus.publish(
            session_id,
            GenerationEvent::ChunkCompleted {
                chunk_index: chunk.index,
                cards_created: cards.len(),
            },
        );

        Ok(cards)
    }

    async fn ask_for_cards(
        &self,
        chunk: &Chunk,
        cards_per_chunk: usize,
        strict: bool,
    ) -> Result<Vec<(String, String)>, crate::utils::ApiError> {
        let mut user_content = self
            .prompts
            .user_template
            .replace("{{CHUNK}}", &chunk.content)
            .replace("{{COUNT}}", &cards_per_chunk.to_string());

        if strict {
            user_content.push('\n');
            user_content.push_str(&self.prompts.strict_reminder);
        }

        let messages = vec![
            ChatMessage::system(self.prompts.system_prompt.clone()),
            ChatMessage::user(user_content),
        ];

        let raw = self.llm.generate(&messages).await?;
        Ok(card_parser::parse_cards(&raw))
    }
}
