use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use crate::export;
use crate::models::cards::{validate_cards, ExportNotice};
use crate::services::SessionStore;
use crate::utils::error::ApiError;

pub async fn export_csv_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let cards = store.cards(session_id)?;

    if cards.is_empty() {
        // nothing to export is a notice, not a failure
        return Ok(Json(ExportNotice {
            message: "no cards to export yet".to_string(),
        })
        .into_response());
    }

    validate_cards(&cards).map_err(ApiError::BadRequest)?;

    let body = export::to_csv(&cards)?;
    info!("Exporting {} cards as CSV (session={})", cards.len(), session_id);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"flashcards.csv\"",
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn export_anki_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let cards = store.cards(session_id)?;

    if cards.is_empty() {
        return Ok(Json(ExportNotice {
            message: "no cards to export yet".to_string(),
        })
        .into_response());
    }

    validate_cards(&cards).map_err(ApiError::BadRequest)?;

    let body = export::to_anki_txt(&cards);
    info!(
        "Exporting {} cards as Anki text (session={})",
        cards.len(),
        session_id
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"flashcards.txt\"",
            ),
        ],
        body,
    )
        .into_response())
}
