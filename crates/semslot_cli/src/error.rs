//! CLI error types.

use semslot_codec::CodecError;
use semslot_engine::SlotError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// A required setting was given neither as a flag nor in the source file.
    #[error("missing required setting `{0}` (flag, environment or --source)")]
    Missing(&'static str),

    /// A file named on the command line could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The source file is not valid JSON of the expected shape.
    #[error("invalid source file {}: {source}", path.display())]
    Source {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Output could not be encoded.
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// A version or bump argument is invalid.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The slot operation failed.
    #[error(transparent)]
    Slot(#[from] SlotError),
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
