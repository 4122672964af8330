//! Error handling for the blelink CLI

use thiserror::Error;

use crate::config::ConfigError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Bluetooth error: {0}")]
    Ble(#[from] blelink_ble::BleError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] blelink_runtime::RuntimeError),

    #[error("No session configured; pass all four session arguments or set [session]")]
    MissingSession,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Hex decoding error: {0}")]
    HexDecoding(#[from] hex::FromHexError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
