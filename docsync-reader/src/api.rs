//! Collaborator contracts consumed by the reader.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use docsync_core::{BuildSyncError, ContentError, EntityRef, SyncOutcome, SyncStatus};

/// Supplies previously published page content.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the body for `path` within `entity`'s documentation.
    ///
    /// Fails with [`ContentError::NotFound`] when nothing is published there.
    async fn fetch(&self, entity: &EntityRef, path: &str) -> Result<String, ContentError>;
}

/// Drives the remote build/publish pipeline for an entity.
#[async_trait]
pub trait BuildSyncService: Send + Sync {
    /// Run one sync. `reporter` may be called any number of times before the
    /// returned future settles.
    async fn sync(
        &self,
        entity: &EntityRef,
        reporter: StatusReporter,
    ) -> Result<SyncOutcome, BuildSyncError>;
}

/// Callback handed to [`BuildSyncService::sync`] for intermediate statuses.
///
/// The sink receives the status and, for [`SyncStatus::Error`], the failure
/// text when the service has one.
#[derive(Clone)]
pub struct StatusReporter {
    sink: Arc<dyn Fn(SyncStatus, Option<String>) + Send + Sync>,
}

impl StatusReporter {
    pub fn new(sink: impl Fn(SyncStatus, Option<String>) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// A reporter that drops every status.
    pub fn discard() -> Self {
        Self::new(|_, _| {})
    }

    pub fn report(&self, status: SyncStatus) {
        (self.sink)(status, None);
    }

    /// Report [`SyncStatus::Error`] along with what went wrong.
    pub fn report_error(&self, message: impl Into<String>) {
        (self.sink)(SyncStatus::Error, Some(message.into()));
    }
}

impl fmt::Debug for StatusReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusReporter").finish_non_exhaustive()
    }
}
