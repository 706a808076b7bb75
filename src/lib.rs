pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod inference;
pub mod prompt;
pub mod relay;
pub mod types;
