pub mod config;
pub mod document;
pub mod export;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;
