//! blelink CLI library
//!
//! Argument parsing, layered configuration, the interactive prompt grammar
//! and the command handlers behind the `blelink` binary.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompt;

pub use cli::{Cli, Commands};
pub use config::{AppConfig, ConfigError};
pub use error::{CliError, Result};
