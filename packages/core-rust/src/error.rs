//! Error type shared by the storage engine and its collaborators.

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the point store and its file layer.
///
/// The engine reports the kind and a message; whether an error is
/// recoverable is the caller's choice.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed input: identity text, filter JSON shape, regex pattern.
    #[error("parse error: {0}")]
    Parse(String),

    /// A lookup missed: dictionary index during decode, unknown series.
    #[error("not found: {0}")]
    NotFound(String),

    /// A caller broke an API contract (fetch-after-done, wrong record size).
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// File-system failure: open, seek, read, write, fsync, short read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Creating something that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A decoded record's timestamp field was zero: a sparse-file hole,
    /// not a legitimate epoch point.
    #[error("record has empty timestamp")]
    EmptyTimestamp,
}
