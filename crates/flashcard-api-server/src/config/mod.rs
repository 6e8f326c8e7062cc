pub mod settings;

pub use settings::{
    GenerationConfig, LlmConfig, PromptsConfig, ServerConfig, SessionConfig, Settings,
};
