use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::models::cards::{Card, CardCreatedResponse, CardUpsertRequest, CardsResponse};
use crate::services::SessionStore;
use crate::utils::error::ApiError;

pub async fn list_cards_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CardsResponse>, ApiError> {
    let cards = store.cards(session_id)?;
    Ok(Json(CardsResponse {
        session_id: session_id.to_string(),
        cards,
    }))
}

pub async fn update_card_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path((session_id, index)): Path<(Uuid, usize)>,
    Json(request): Json<CardUpsertRequest>,
) -> Result<Json<Card>, ApiError> {
    let card = store.update_card(session_id, index, request.front, request.back)?;
    Ok(Json(card))
}

pub async fn delete_card_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> Result<StatusCode, ApiError> {
    store.delete_card(session_id, index)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn append_card_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CardUpsertRequest>,
) -> Result<(StatusCode, Json<CardCreatedResponse>), ApiError> {
    if request.front.trim().is_empty() || request.back.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "both card sides are required".to_string(),
        ));
    }

    let card = Card {
        front: request.front,
        back: request.back,
        source_chunk: 0,
    };
    let index = store.append_card(session_id, card.clone())?;

    Ok((StatusCode::CREATED, Json(CardCreatedResponse { index, card })))
}

pub async fn clear_session_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    store.clear(session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
