//! Display-state resolution.
//!
//! Precedence:
//! 1. An outstanding fetch always shows `CHECKING`.
//! 2. `BUILD_READY_RELOAD` shows `CHECKING`; the reload is already underway.
//! 3. Otherwise the sync state picks the variant, split by whether any content
//!    has been loaded.

use serde::Serialize;

use crate::state::ReaderState;
use crate::types::{DisplayState, SyncState};

/// Derive the display state. Total and pure.
pub fn resolve(
    content_loading: bool,
    content: Option<&str>,
    active_sync_state: SyncState,
) -> DisplayState {
    if content_loading {
        return DisplayState::Checking;
    }

    match (content.is_some(), active_sync_state) {
        (_, SyncState::BuildReadyReload) => DisplayState::Checking,

        (false, SyncState::Unset | SyncState::Checking) => DisplayState::Checking,
        (false, SyncState::Building) => DisplayState::InitialBuild,
        (
            false,
            SyncState::BuildReady
            | SyncState::BuildTimedOut
            | SyncState::UpToDate
            | SyncState::Error,
        ) => DisplayState::ContentNotFound,

        (true, SyncState::Unset | SyncState::Checking | SyncState::UpToDate) => {
            DisplayState::ContentFresh
        }
        (true, SyncState::Building) => DisplayState::ContentStaleRefreshing,
        (true, SyncState::BuildReady) => DisplayState::ContentStaleReady,
        (true, SyncState::BuildTimedOut) => DisplayState::ContentStaleTimeout,
        (true, SyncState::Error) => DisplayState::ContentStaleError,
    }
}

/// What the presentation layer reads after every state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReaderView {
    pub state: DisplayState,
    pub content: Option<String>,
    /// Empty unless a load or build error is known.
    pub error_message: String,
}

impl ReaderState {
    pub fn display_state(&self) -> DisplayState {
        resolve(
            self.content_loading,
            self.content.as_deref(),
            self.active_sync_state,
        )
    }

    /// Diagnostic text built from the content and sync errors.
    pub fn error_message(&self) -> String {
        let mut parts = Vec::new();
        if let Some(err) = &self.content_error {
            parts.push(format!("Load error: {err}"));
        }
        if let Some(err) = &self.sync_error {
            parts.push(format!("Build error: {err}"));
        }
        parts.join(" ")
    }

    pub fn view(&self) -> ReaderView {
        ReaderView {
            state: self.display_state(),
            content: self.content.clone(),
            error_message: self.error_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContentError;
    use rstest::rstest;

    #[rstest]
    #[case(false, None, SyncState::Unset, DisplayState::Checking)]
    #[case(false, None, SyncState::Checking, DisplayState::Checking)]
    #[case(false, None, SyncState::Building, DisplayState::InitialBuild)]
    #[case(false, None, SyncState::BuildReady, DisplayState::ContentNotFound)]
    #[case(false, None, SyncState::BuildReadyReload, DisplayState::Checking)]
    #[case(false, None, SyncState::BuildTimedOut, DisplayState::ContentNotFound)]
    #[case(false, None, SyncState::UpToDate, DisplayState::ContentNotFound)]
    #[case(false, None, SyncState::Error, DisplayState::ContentNotFound)]
    #[case(false, Some("asdf"), SyncState::Unset, DisplayState::ContentFresh)]
    #[case(false, Some("asdf"), SyncState::Checking, DisplayState::ContentFresh)]
    #[case(false, Some("asdf"), SyncState::Building, DisplayState::ContentStaleRefreshing)]
    #[case(false, Some("asdf"), SyncState::BuildReady, DisplayState::ContentStaleReady)]
    #[case(false, Some("asdf"), SyncState::BuildReadyReload, DisplayState::Checking)]
    #[case(false, Some("asdf"), SyncState::BuildTimedOut, DisplayState::ContentStaleTimeout)]
    #[case(false, Some("asdf"), SyncState::UpToDate, DisplayState::ContentFresh)]
    #[case(false, Some("asdf"), SyncState::Error, DisplayState::ContentStaleError)]
    fn resolution_table(
        #[case] content_loading: bool,
        #[case] content: Option<&str>,
        #[case] sync: SyncState,
        #[case] expected: DisplayState,
    ) {
        assert_eq!(resolve(content_loading, content, sync), expected);
    }

    #[test]
    fn loading_dominates_everything() {
        for content in [None, Some(""), Some("asdf")] {
            for sync in SyncState::ALL {
                assert_eq!(resolve(true, content, sync), DisplayState::Checking);
            }
        }
    }

    #[test]
    fn resolve_is_deterministic() {
        for loading in [false, true] {
            for content in [None, Some("x")] {
                for sync in SyncState::ALL {
                    assert_eq!(
                        resolve(loading, content, sync),
                        resolve(loading, content, sync)
                    );
                }
            }
        }
    }

    #[test]
    fn empty_body_counts_as_content() {
        assert_eq!(
            resolve(false, Some(""), SyncState::UpToDate),
            DisplayState::ContentFresh
        );
    }

    #[test]
    fn view_carries_empty_message_on_success() {
        let state = ReaderState {
            content: Some("my content".into()),
            active_sync_state: SyncState::UpToDate,
            ..ReaderState::new("/example")
        };
        assert_eq!(
            state.view(),
            ReaderView {
                state: DisplayState::ContentFresh,
                content: Some("my content".into()),
                error_message: String::new(),
            }
        );
    }

    #[test]
    fn view_joins_load_and_build_errors() {
        let state = ReaderState {
            content_error: Some(ContentError::not_found("Page Not Found")),
            active_sync_state: SyncState::Error,
            sync_error: Some("builder crashed".into()),
            ..ReaderState::new("/example")
        };
        let view = state.view();
        assert_eq!(view.state, DisplayState::ContentNotFound);
        assert_eq!(
            view.error_message,
            "Load error: not found: Page Not Found Build error: builder crashed"
        );
    }
}
