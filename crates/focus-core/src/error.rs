//! Error types for focus-core

use thiserror::Error;

/// Result type alias using focus-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in focus-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// No authenticated identity is established
    #[error("Not signed in")]
    NotSignedIn,

    /// Network failure, remote rejection, or an unrecognized remote row
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Local blob store failure
    #[error("Local store error: {0}")]
    LocalStore(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means "no identity", as opposed to a transport failure.
    #[must_use]
    pub const fn is_not_signed_in(&self) -> bool {
        matches!(self, Self::NotSignedIn)
    }

    /// Whether this error came from the remote side of a reconciliation cycle.
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Remote(error.to_string())
    }
}
