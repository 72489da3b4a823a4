//! Domain types for documentation freshness tracking.
//!
//! All types are serializable via serde; sync and display states use the
//! SCREAMING_SNAKE_CASE names the presentation layer renders.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EntityRefError;

// ---------------------------------------------------------------------------
// Entity identity
// ---------------------------------------------------------------------------

/// Namespace assumed when an entity reference omits one.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Stable identity of the documented entity whose content and build status
/// are tracked.
///
/// `kind` and `namespace` are normalized to lowercase; `name` is kept as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl EntityRef {
    pub fn new(
        kind: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into().to_ascii_lowercase(),
            namespace: namespace.into().to_ascii_lowercase(),
            name: name.into(),
        }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}

impl FromStr for EntityRef {
    type Err = EntityRefError;

    /// Parses `kind:namespace/name` or `kind:name`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, rest) = s
            .split_once(':')
            .ok_or_else(|| EntityRefError::MissingKind(s.to_string()))?;
        let (namespace, name) = match rest.split_once('/') {
            Some((namespace, name)) => (namespace, name),
            None => (DEFAULT_NAMESPACE, rest),
        };

        let kind = kind.trim();
        let namespace = namespace.trim();
        let name = name.trim();
        if kind.is_empty() {
            return Err(EntityRefError::MissingKind(s.to_string()));
        }
        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(EntityRefError::Malformed(s.to_string()));
        }
        Ok(Self::new(kind, namespace, name))
    }
}

// ---------------------------------------------------------------------------
// Sync states
// ---------------------------------------------------------------------------

/// Last status reported by the build-sync stream, as held by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncState {
    /// Nothing reported yet.
    #[default]
    #[serde(rename = "")]
    Unset,
    Checking,
    Building,
    BuildReady,
    /// A newer build exists and the content must be fetched again right away.
    BuildReadyReload,
    BuildTimedOut,
    UpToDate,
    Error,
}

impl SyncState {
    pub const ALL: [SyncState; 8] = [
        SyncState::Unset,
        SyncState::Checking,
        SyncState::Building,
        SyncState::BuildReady,
        SyncState::BuildReadyReload,
        SyncState::BuildTimedOut,
        SyncState::UpToDate,
        SyncState::Error,
    ];

    /// `BUILD_READY` and `BUILD_READY_RELOAD` are consumed by the next
    /// navigation or content load.
    pub fn is_ready_signal(self) -> bool {
        matches!(self, SyncState::BuildReady | SyncState::BuildReadyReload)
    }

    /// True once the sync stream has nothing more to say for this epoch.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SyncState::UpToDate
                | SyncState::BuildReady
                | SyncState::BuildTimedOut
                | SyncState::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncState::Unset => "",
            SyncState::Checking => "CHECKING",
            SyncState::Building => "BUILDING",
            SyncState::BuildReady => "BUILD_READY",
            SyncState::BuildReadyReload => "BUILD_READY_RELOAD",
            SyncState::BuildTimedOut => "BUILD_TIMED_OUT",
            SyncState::UpToDate => "UP_TO_DATE",
            SyncState::Error => "ERROR",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intermediate status a build-sync service may report before it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStatus {
    Checking,
    Building,
    BuildReady,
    BuildTimedOut,
    Error,
}

impl From<SyncStatus> for SyncState {
    fn from(status: SyncStatus) -> Self {
        match status {
            SyncStatus::Checking => SyncState::Checking,
            SyncStatus::Building => SyncState::Building,
            SyncStatus::BuildReady => SyncState::BuildReady,
            SyncStatus::BuildTimedOut => SyncState::BuildTimedOut,
            SyncStatus::Error => SyncState::Error,
        }
    }
}

/// Terminal result of one build-sync invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Published content was already up to date.
    Cached,
    /// A newer build was published.
    Updated,
    /// The backend gave up waiting for the build.
    TimedOut,
}

impl From<SyncOutcome> for SyncState {
    fn from(outcome: SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Cached => SyncState::UpToDate,
            SyncOutcome::Updated => SyncState::BuildReady,
            SyncOutcome::TimedOut => SyncState::BuildTimedOut,
        }
    }
}

// ---------------------------------------------------------------------------
// Display state
// ---------------------------------------------------------------------------

/// The single state the presentation layer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayState {
    Checking,
    InitialBuild,
    ContentNotFound,
    ContentFresh,
    ContentStaleRefreshing,
    ContentStaleReady,
    ContentStaleTimeout,
    ContentStaleError,
}

impl DisplayState {
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayState::Checking => "CHECKING",
            DisplayState::InitialBuild => "INITIAL_BUILD",
            DisplayState::ContentNotFound => "CONTENT_NOT_FOUND",
            DisplayState::ContentFresh => "CONTENT_FRESH",
            DisplayState::ContentStaleRefreshing => "CONTENT_STALE_REFRESHING",
            DisplayState::ContentStaleReady => "CONTENT_STALE_READY",
            DisplayState::ContentStaleTimeout => "CONTENT_STALE_TIMEOUT",
            DisplayState::ContentStaleError => "CONTENT_STALE_ERROR",
        }
    }
}

impl fmt::Display for DisplayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
