//! Error types for docsync-reader.

use std::path::PathBuf;

use thiserror::Error;

use docsync_core::{ContentError, EntityRef, EntityRefError};

/// All errors a reader or its fixtures can surface to the consumer.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The content store failed with something other than "not found".
    #[error("failed to load content for {entity} at '{path}': {source}")]
    Content {
        entity: EntityRef,
        path: String,
        #[source]
        source: ContentError,
    },

    #[error("channel closed: {0}")]
    ChannelClosed(&'static str),

    /// YAML parse error on load, with the offending file.
    #[error("failed to parse {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid entity ref in {path}: {source}")]
    EntityRef {
        path: PathBuf,
        #[source]
        source: EntityRefError,
    },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("reader task failed: {0}")]
    Join(String),
}

/// Convenience constructor for [`ReaderError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ReaderError {
    ReaderError::Io {
        path: path.into(),
        source,
    }
}
