use std::sync::Arc;
use std::time::Instant;

use axum::{extract::Extension, Json};
use tracing::info;

use crate::config::Settings;
use crate::document::TextChunker;
use crate::handlers::ingest::parse_session_id;
use crate::models::cards::{GenerateRequest, GenerateResponse};
use crate::services::{GenerationService, SessionStore};
use crate::utils::error::ApiError;

/// Chunk the session text and run one generation task per chunk. The
/// chunking config is validated before anything touches the LLM.
pub async fn generate_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Extension(generation_service): Extension<Arc<GenerationService>>,
    Extension(settings): Extension<Settings>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let start_time = Instant::now();

    let session_id = parse_session_id(&request.session_id)?;
    let text = store.text(session_id)?;

    let cards_per_chunk = request
        .cards_per_chunk
        .unwrap_or(settings.generation.cards_per_chunk);
    if cards_per_chunk == 0 {
        return Err(ApiError::BadRequest(
            "cards_per_chunk must be positive".to_string(),
        ));
    }

    let chunker = TextChunker::new(settings.chunking.clone())
        .map_err(|e| ApiError::ConfigError(e.to_string()))?;
    let chunks = chunker.chunk(&text);

    info!(
        "Generate request: session={}, chars={}, chunks={}",
        session_id,
        text.chars().count(),
        chunks.len()
    );

    let outcome = generation_service
        .generate(session_id, &chunks, cards_per_chunk)
        .await;

    store.replace_cards(session_id, outcome.cards.clone(), outcome.failures.clone())?;

    Ok(Json(GenerateResponse {
        session_id: session_id.to_string(),
        cards: outcome.cards,
        chunk_count: outcome.chunk_count,
        failed_chunks: outcome.failures,
        elapsed_ms: start_time.elapsed().as_millis() as u64,
    }))
}
