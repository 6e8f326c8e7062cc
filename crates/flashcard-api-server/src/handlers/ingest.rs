use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart},
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::document::{decode_text, normalize_text};
use crate::models::cards::{IngestRequest, IngestResponse, UploadResponse};
use crate::services::SessionStore;
use crate::utils::error::ApiError;
use crate::utils::token_estimator::estimate_tokens;

/// Pasted text: normalize it and park it in a session for generation.
pub async fn paste_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Extension(settings): Extension<Settings>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let text = normalize_text(&request.text);
    if text.is_empty() {
        return Err(ApiError::BadRequest(
            "no text content after cleanup".to_string(),
        ));
    }

    let char_count = text.chars().count();
    let token_estimate = estimate_tokens(&text, settings.chunking.chars_per_token);

    let session_id = match request.session_id {
        Some(raw) => {
            let id = parse_session_id(&raw)?;
            store.replace_text(id, text)?;
            id
        }
        None => store.create(text),
    };

    info!(
        "Ingested pasted text: session={}, chars={}, ~{} tokens",
        session_id, char_count, token_estimate
    );

    Ok(Json(IngestResponse {
        session_id: session_id.to_string(),
        char_count,
        token_estimate,
    }))
}

/// Uploaded plain-text file. Binary formats are out of scope: the client is
/// expected to extract text before it gets here.
pub async fn upload_handler(
    Extension(store): Extension<Arc<SessionStore>>,
    Extension(settings): Extension<Settings>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    info!("File upload request received");

    let mut file_data: Option<Vec<u8>> = None;
    let mut filename: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        if field_name == "file" {
            filename = field.file_name().map(|s| s.to_string());
            file_data = Some(
                field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {}", e)))?
                    .to_vec(),
            );
        }
    }

    let file_data = file_data.ok_or_else(|| ApiError::BadRequest("file required".to_string()))?;
    let filename = filename.ok_or_else(|| ApiError::BadRequest("filename required".to_string()))?;

    check_plain_text_extension(&filename)?;

    let (raw_text, encoding) = decode_text(&file_data);
    debug!(
        "Decoded {} as {} ({} bytes)",
        filename,
        encoding.name(),
        file_data.len()
    );

    let text = normalize_text(&raw_text);
    if text.is_empty() {
        return Err(ApiError::BadRequest(
            "no text content found in file".to_string(),
        ));
    }

    let char_count = text.chars().count();
    let token_estimate = estimate_tokens(&text, settings.chunking.chars_per_token);
    let session_id = store.create(text);

    info!(
        "Ingested upload {}: session={}, chars={}, ~{} tokens",
        filename, session_id, char_count, token_estimate
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "File ingested".to_string(),
        session_id: session_id.to_string(),
        filename,
        char_count,
        token_estimate,
    }))
}

pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid session id: {}", raw)))
}

fn check_plain_text_extension(filename: &str) -> Result<(), ApiError> {
    let extension = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("txt") | Some("md") | Some("markdown") | Some("text") | None => Ok(()),
        Some(other) => Err(ApiError::BadRequest(format!(
            "unsupported file type: {} (plain text only; extract binary documents upstream)",
            other
        ))),
    }
}
