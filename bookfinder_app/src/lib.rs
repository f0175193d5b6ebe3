pub mod app_config;
pub mod error;
pub mod image_resolver;
pub mod notifications;
pub mod persistence;
pub mod saved_books_store;
pub mod search_orchestrator;
pub mod shell;
