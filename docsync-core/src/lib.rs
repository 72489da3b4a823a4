//! docsync core library — domain types, reader state store, display-state
//! resolution.
//!
//! - [`types`] — entity identity, sync and display states
//! - [`error`] — [`ContentError`], [`BuildSyncError`], [`EntityRefError`]
//! - [`state`] — [`ReaderState`] and the pure [`reduce`] transition function
//! - [`resolve`] — [`resolve()`](resolve::resolve) and [`ReaderView`]

pub mod error;
pub mod resolve;
pub mod state;
pub mod types;

pub use error::{BuildSyncError, ContentError, EntityRefError};
pub use resolve::{resolve, ReaderView};
pub use state::{reduce, ContentUpdate, ReaderAction, ReaderState, UNKNOWN_BUILD_ERROR};
pub use types::{DisplayState, EntityRef, SyncOutcome, SyncState, SyncStatus};
