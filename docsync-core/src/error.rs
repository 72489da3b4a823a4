//! Error types for docsync-core.

use thiserror::Error;

/// A content store failure.
///
/// Carried inside [`crate::ReaderState`], so it is cheap to clone and compare.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// No published content exists for the entity/path. Recoverable: the
    /// reader folds it into a `CONTENT_NOT_FOUND` or `INITIAL_BUILD` state.
    #[error("not found: {reason}")]
    NotFound { reason: String },

    /// Transport or storage failure. Fatal for the reader that observed it.
    #[error("content unavailable: {reason}")]
    Unavailable { reason: String },
}

impl ContentError {
    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

/// A build-sync service failure; surfaces as the `ERROR` sync state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct BuildSyncError {
    pub message: String,
}

impl BuildSyncError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Entity reference parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityRefError {
    #[error("entity ref '{0}' has no kind; expected kind:namespace/name")]
    MissingKind(String),

    #[error("malformed entity ref '{0}'; expected kind:namespace/name")]
    Malformed(String),
}
