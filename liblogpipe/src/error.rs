//! Error types for the logging pipeline.

use std::io;
use std::path::PathBuf;

/// Result type for logging operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by loggers, writers and the template engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A message template and its argument list do not agree.
    #[error("malformed template at byte {pos}: {reason}")]
    MalformedTemplate {
        /// Byte offset of the offending directive.
        pos: usize,
        reason: String,
    },

    /// The ownership guard was asked to bind a second time.
    #[error("drain thread already bound to '{owner}'")]
    AlreadyBound { owner: String },

    /// A log file or its directory could not be opened.
    #[error("failed to open log file {}: {source}", path.display())]
    OpenFile { path: PathBuf, source: io::Error },

    /// The configuration file was present but could not be used.
    #[error("invalid logging config: {0}")]
    Config(String),

    /// Writing to or flushing a sink failed.
    #[error("log sink I/O error: {0}")]
    Io(#[from] io::Error),
}
