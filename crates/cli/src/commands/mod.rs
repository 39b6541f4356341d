//! Subcommand implementations.

pub mod browse;
pub mod resolve;
pub mod routes;

use koshimart_storefront::config::ConfigError;
use koshimart_storefront::error::AppError;
use thiserror::Error;

/// Errors that end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    App(#[from] AppError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
