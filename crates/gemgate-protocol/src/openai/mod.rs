pub mod create_chat_completions;
pub mod create_completions;
pub mod error;
pub mod get_model;
pub mod list_models;
