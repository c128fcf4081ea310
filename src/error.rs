//! Error taxonomy for the install engine.
//!
//! Batch results from the multi-agent installer are never errors; partial
//! failure is reported through [`crate::skills::installer::BatchReport`].

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or incomplete descriptor (e.g. a payload that would end up
    /// with neither a command nor a url).
    #[error("invalid descriptor: {0}")]
    Descriptor(String),

    /// Registry type, remote transport kind, or adapter-specific header shape
    /// that cannot be installed.
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// The user canceled an input prompt before all required inputs were
    /// collected. Aborts the single operation, not a batch.
    #[error("input collection aborted: {0}")]
    PlaceholderResolution(String),

    /// The target CLI binary is missing or exited nonzero. Non-fatal: callers
    /// surface `manual_command` so the user can run the install by hand.
    #[error("the `{binary}` CLI is unavailable; run manually:\n  {manual_command}")]
    CliUnavailable {
        binary: String,
        manual_command: String,
    },

    /// Invalid local path, unsupported source syntax, or a failed clone.
    #[error("cannot resolve skill source: {0}")]
    SourceResolution(String),

    /// Skill install preconditions (missing workspace root, agent without a
    /// global directory, unknown agent id).
    #[error("{0}")]
    Skill(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
