pub mod card_parser;
pub mod event_bus;
pub mod generation_service;
pub mod llm_service;
pub mod session;

pub use event_bus::EventBus;
pub use generation_service::GenerationService;
pub use llm_service::{LlmProvider, LlmService};
pub use session::SessionStore;
