//! # docsync-reader
//!
//! Documentation freshness synchronization runtime.
//!
//! Call [`ReaderHandle::spawn`] with a [`ContentStore`] and a
//! [`BuildSyncService`] to observe one entity's page. The reader fetches the
//! published content and runs the build-sync concurrently, reconciling both
//! into a stream of [`docsync_core::ReaderState`] snapshots.

pub mod api;
pub mod config;
pub mod error;
pub mod fixture;
pub mod orchestrator;

pub use api::{BuildSyncService, ContentStore, StatusReporter};
pub use config::ReaderConfig;
pub use error::ReaderError;
pub use orchestrator::{ReaderHandle, ReaderUpdate};
