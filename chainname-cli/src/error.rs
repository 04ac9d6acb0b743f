//! CLI error type.

use chainname::config::ConfigError;
use chainname::consent::StoreError;

/// Errors that abort a CLI command.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration could not be loaded, saved or validated.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Consent state could not be read or written.
    #[error("consent error: {0}")]
    Consent(#[from] StoreError),

    /// Output could not be rendered.
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Result type for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
