//! Reader state and its transitions.
//!
//! [`reduce`] never touches its input: every transition returns a new
//! [`ReaderState`], so snapshots handed to observers stay valid.

use serde::Serialize;

use crate::error::ContentError;
use crate::types::SyncState;

/// Failure text used when an `ERROR` sync state arrives without one.
pub const UNKNOWN_BUILD_ERROR: &str = "build-sync service reported an error";

/// Reconciled view of one documentation page and its build status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ReaderState {
    /// Sub-path within the document currently being viewed.
    pub path: String,
    /// Last successfully loaded content body.
    pub content: Option<String>,
    /// True while a fetch for the current entity/path is outstanding.
    pub content_loading: bool,
    #[serde(serialize_with = "serialize_error")]
    pub content_error: Option<ContentError>,
    pub active_sync_state: SyncState,
    /// Failure text reported with the `ERROR` sync state.
    pub sync_error: Option<String>,
}

impl ReaderState {
    /// Initial state for a freshly observed entity.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Not loading and the sync stream reached a terminal status.
    pub fn is_settled(&self) -> bool {
        !self.content_loading && self.active_sync_state.is_terminal()
    }
}

/// Payload of a `content` transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentUpdate {
    /// A fetch started; previous content and error are dropped.
    Loading,
    Loaded(String),
    Failed(ContentError),
}

/// The three transition events the store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderAction {
    Navigate {
        path: String,
    },
    Content(ContentUpdate),
    Sync {
        state: SyncState,
        error: Option<String>,
    },
}

impl ReaderAction {
    pub fn navigate(path: impl Into<String>) -> Self {
        Self::Navigate { path: path.into() }
    }

    pub fn sync(state: SyncState) -> Self {
        Self::Sync { state, error: None }
    }

    pub fn sync_failed(error: impl Into<String>) -> Self {
        Self::Sync {
            state: SyncState::Error,
            error: Some(error.into()),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ReaderAction::Navigate { .. } => "navigate",
            ReaderAction::Content(_) => "content",
            ReaderAction::Sync { .. } => "sync",
        }
    }
}

/// Apply one transition to `state`.
pub fn reduce(state: &ReaderState, action: ReaderAction) -> ReaderState {
    let mut next = state.clone();

    match action {
        ReaderAction::Navigate { path } => {
            next.path = path;
            consume_ready_signal(&mut next);
        }
        ReaderAction::Content(update) => {
            match update {
                ContentUpdate::Loading => {
                    next.content_loading = true;
                    next.content = None;
                    next.content_error = None;
                }
                ContentUpdate::Loaded(body) => {
                    next.content_loading = false;
                    next.content = Some(body);
                    next.content_error = None;
                }
                ContentUpdate::Failed(err) => {
                    next.content_loading = false;
                    next.content = None;
                    next.content_error = Some(err);
                }
            }
            consume_ready_signal(&mut next);
        }
        ReaderAction::Sync { state, error } => {
            let error = error.filter(|text| !text.trim().is_empty());
            next.active_sync_state = state;
            next.sync_error = match (state, error) {
                (SyncState::Error, None) => Some(UNKNOWN_BUILD_ERROR.to_string()),
                (_, error) => error,
            };
        }
    }

    next
}

// A pending "ready" signal is consumed by the fetch that navigation or a
// content load implies.
fn consume_ready_signal(state: &mut ReaderState) {
    if state.active_sync_state.is_ready_signal() {
        state.active_sync_state = SyncState::UpToDate;
    }
}

fn serialize_error<S>(error: &Option<ContentError>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn old_state() -> ReaderState {
        ReaderState {
            active_sync_state: SyncState::Checking,
            ..ReaderState::default()
        }
    }

    #[test]
    fn returns_a_copy_of_the_state() {
        let old = old_state();
        let next = reduce(&old, ReaderAction::navigate("/"));
        assert_eq!(
            next,
            ReaderState {
                path: "/".to_string(),
                ..old_state()
            }
        );
        assert_eq!(old, old_state(), "input state must be untouched");
    }

    #[rstest]
    #[case(ReaderAction::Content(ContentUpdate::Loading), SyncState::BuildReady)]
    #[case(ReaderAction::Content(ContentUpdate::Loading), SyncState::BuildReadyReload)]
    #[case(ReaderAction::navigate("/next"), SyncState::BuildReady)]
    #[case(ReaderAction::navigate("/next"), SyncState::BuildReadyReload)]
    fn content_and_navigate_consume_ready_signal(
        #[case] action: ReaderAction,
        #[case] before: SyncState,
    ) {
        let state = ReaderState {
            active_sync_state: before,
            ..old_state()
        };
        assert_eq!(
            reduce(&state, action).active_sync_state,
            SyncState::UpToDate
        );
    }

    #[rstest]
    fn sync_sets_state_exactly(
        #[values(SyncState::BuildReady, SyncState::BuildReadyReload, SyncState::Error)]
        before: SyncState,
        #[values(
            SyncState::Unset,
            SyncState::Building,
            SyncState::BuildReady,
            SyncState::BuildReadyReload
        )]
        after: SyncState,
    ) {
        let state = ReaderState {
            active_sync_state: before,
            ..old_state()
        };
        assert_eq!(
            reduce(&state, ReaderAction::sync(after)).active_sync_state,
            after
        );
    }

    #[rstest]
    #[case(SyncState::Building)]
    #[case(SyncState::BuildTimedOut)]
    #[case(SyncState::Error)]
    fn content_keeps_non_ready_sync_state(#[case] before: SyncState) {
        let state = ReaderState {
            active_sync_state: before,
            ..old_state()
        };
        let next = reduce(
            &state,
            ReaderAction::Content(ContentUpdate::Loaded("asdf".into())),
        );
        assert_eq!(next.active_sync_state, before);
    }

    #[test]
    fn content_loading_clears_content_and_error() {
        let state = ReaderState {
            content: Some("some-old-content".into()),
            content_error: Some(ContentError::not_found("gone")),
            ..old_state()
        };
        assert_eq!(
            reduce(&state, ReaderAction::Content(ContentUpdate::Loading)),
            ReaderState {
                content_loading: true,
                ..old_state()
            }
        );
    }

    #[test]
    fn content_loaded_sets_content() {
        let state = ReaderState {
            content_loading: true,
            content_error: Some(ContentError::not_found("gone")),
            ..old_state()
        };
        assert_eq!(
            reduce(
                &state,
                ReaderAction::Content(ContentUpdate::Loaded("asdf".into()))
            ),
            ReaderState {
                content: Some("asdf".into()),
                ..old_state()
            }
        );
    }

    #[test]
    fn content_failed_sets_error() {
        let state = ReaderState {
            content_loading: true,
            content: Some("asdf".into()),
            ..old_state()
        };
        let err = ContentError::not_found("Page Not Found");
        assert_eq!(
            reduce(
                &state,
                ReaderAction::Content(ContentUpdate::Failed(err.clone()))
            ),
            ReaderState {
                content_error: Some(err),
                ..old_state()
            }
        );
    }

    #[test]
    fn sync_updates_state_and_replaces_error() {
        let failed = reduce(&old_state(), ReaderAction::sync_failed("boom"));
        assert_eq!(failed.active_sync_state, SyncState::Error);
        assert_eq!(failed.sync_error.as_deref(), Some("boom"));

        let building = reduce(&failed, ReaderAction::sync(SyncState::Building));
        assert_eq!(
            building,
            ReaderState {
                active_sync_state: SyncState::Building,
                ..old_state()
            }
        );
    }

    #[rstest]
    #[case(ReaderAction::sync(SyncState::Error))]
    #[case(ReaderAction::sync_failed(""))]
    #[case(ReaderAction::sync_failed("  "))]
    fn error_without_text_gets_default_message(#[case] action: ReaderAction) {
        let failed = reduce(&old_state(), action);
        assert_eq!(failed.active_sync_state, SyncState::Error);
        assert_eq!(failed.sync_error.as_deref(), Some(UNKNOWN_BUILD_ERROR));
        assert_eq!(
            failed.view().error_message,
            format!("Build error: {UNKNOWN_BUILD_ERROR}")
        );
    }

    #[test]
    fn settled_requires_terminal_sync_and_no_fetch() {
        let mut state = ReaderState::new("/");
        assert!(!state.is_settled());
        state.active_sync_state = SyncState::UpToDate;
        assert!(state.is_settled());
        state.content_loading = true;
        assert!(!state.is_settled());
    }
}
