use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] focus_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("{0} Pass --yes to confirm when not running interactively.")]
    ConfirmationRequired(String),
    #[error("Cancelled")]
    Cancelled,
    #[error(
        "Sync is not configured. Run `focus config init` + `focus auth login` to connect a Supabase project."
    )]
    SyncNotConfigured,
}
