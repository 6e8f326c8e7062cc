use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Extension, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing::info;

use flashcard_api_server::config::Settings;
use flashcard_api_server::handlers;
use flashcard_api_server::services::{EventBus, GenerationService, LlmService, SessionStore};

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,flashcard_api_server=debug".to_string()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .init();

    info!("🚀 Starting Flashcard API Server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");

    // Chunking knobs are validated up front so a bad config fails at boot,
    // not halfway through the first generation run
    settings
        .chunking
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid chunking config: {}", e))?;

    // Initialize services
    let session_store = Arc::new(SessionStore::new(settings.session.max_sessions));
    let event_bus = Arc::new(EventBus::new(EVENT_BUS_CAPACITY));
    let llm_service = Arc::new(LlmService::new(settings.llm.clone()));

    let generation_service = Arc::new(GenerationService::new(
        llm_service.clone(),
        settings.prompts.clone(),
        event_bus.clone(),
        settings.generation.concurrency,
    ));

    info!("✅ Services initialized");

    // Build router
    let app = build_router(
        session_store,
        generation_service,
        event_bus,
        settings.clone(),
    );

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(
    session_store: Arc<SessionStore>,
    generation_service: Arc<GenerationService>,
    event_bus: Arc<EventBus>,
    settings: Settings,
) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::readiness_check));

    let api_routes = Router::new()
        .route("/api/ingest", post(handlers::ingest::paste_handler))
        .route("/api/upload", post(handlers::ingest::upload_handler))
        .route("/api/generate", post(handlers::generate::generate_handler))
        .route(
            "/api/sessions/{id}/cards",
            get(handlers::cards::list_cards_handler).post(handlers::cards::append_card_handler),
        )
        .route(
            "/api/sessions/{id}/cards/{index}",
            put(handlers::cards::update_card_handler)
                .delete(handlers::cards::delete_card_handler),
        )
        .route(
            "/api/sessions/{id}/export/csv",
            get(handlers::export::export_csv_handler),
        )
        .route(
            "/api/sessions/{id}/export/anki",
            get(handlers::export::export_anki_handler),
        )
        .route(
            "/api/sessions/{id}",
            delete(handlers::cards::clear_session_handler),
        )
        .route("/api/events", get(handlers::events::events_handler));

    let max_upload = settings.server.max_upload_bytes;

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Shared state
        .layer(Extension(session_store))
        .layer(Extension(generation_service))
        .layer(Extension(event_bus))
        .layer(Extension(settings))
        // CORS
        .layer(
            CorsLayer::permissive()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Tracing
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false)),
        )
        // Body limit (uploads are plain text, keep it tight)
        .layer(DefaultBodyLimit::max(max_upload))
}
