//! Reference collaborators: a filesystem content store and scripted doubles.
//!
//! # Filesystem layout
//!
//! ```text
//! <root>/
//!   <namespace>/
//!     <kind>/
//!       <name>/
//!         index.html            (entity root, path "" or "/")
//!         <path>/index.html     (one per page)
//! ```
//!
//! # Sync script format
//!
//! ```yaml
//! entities:
//!   "component:default/backstage":
//!     steps:
//!       - { after_ms: 0, status: BUILDING }
//!       - { after_ms: 500, status: ERROR, message: publisher offline }
//!     settle_after_ms: 1500
//!     outcome: updated
//! ```

use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docsync_core::{BuildSyncError, ContentError, EntityRef, SyncOutcome, SyncStatus};

use crate::api::{BuildSyncService, ContentStore, StatusReporter};
use crate::error::{io_err, ReaderError};

/// Page file name within each path directory.
pub const PAGE_FILE: &str = "index.html";

/// Strip leading and trailing `/` so `"/example/"` and `"example"` address the
/// same page.
pub fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}

// ---------------------------------------------------------------------------
// 1. Filesystem content store
// ---------------------------------------------------------------------------

/// Serves published pages from a directory tree.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<namespace>/<kind>/<name>/<path>/index.html`, or `None` when
    /// `path` would leave the entity directory.
    pub fn page_path(&self, entity: &EntityRef, path: &str) -> Option<PathBuf> {
        let relative = Path::new(normalize_path(path));
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(
            self.root
                .join(&entity.namespace)
                .join(&entity.kind)
                .join(&entity.name)
                .join(relative)
                .join(PAGE_FILE),
        )
    }
}

#[async_trait]
impl ContentStore for FsContentStore {
    async fn fetch(&self, entity: &EntityRef, path: &str) -> Result<String, ContentError> {
        let Some(page) = self.page_path(entity, path) else {
            return Err(ContentError::not_found(format!(
                "path '{path}' is outside the documentation of {entity}"
            )));
        };

        match tokio::fs::read_to_string(&page).await {
            Ok(body) => Ok(body),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ContentError::not_found(
                format!("no published page for {entity} at '{path}'"),
            )),
            Err(err) => Err(ContentError::unavailable(format!(
                "{}: {err}",
                page.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Scripted content store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ScriptedResponse {
    delay: Duration,
    result: Result<String, ContentError>,
}

/// In-memory content store answering from per-(entity, path) queues.
///
/// Responses are consumed in order; the last one repeats.
#[derive(Debug, Default)]
pub struct ScriptedContentStore {
    responses: Mutex<HashMap<(EntityRef, String), VecDeque<ScriptedResponse>>>,
    calls: Mutex<Vec<(EntityRef, String)>>,
}

impl ScriptedContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an immediate response.
    pub fn respond(
        self,
        entity: &EntityRef,
        path: &str,
        result: Result<String, ContentError>,
    ) -> Self {
        self.respond_after(entity, path, Duration::ZERO, result)
    }

    /// Queue a response delivered after `delay`.
    pub fn respond_after(
        self,
        entity: &EntityRef,
        path: &str,
        delay: Duration,
        result: Result<String, ContentError>,
    ) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((entity.clone(), normalize_path(path).to_string()))
            .or_default()
            .push_back(ScriptedResponse { delay, result });
        self
    }

    /// Every `(entity, path)` fetched so far, in call order.
    pub fn calls(&self) -> Vec<(EntityRef, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn next_response(&self, entity: &EntityRef, path: &str) -> Option<ScriptedResponse> {
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let queue = responses.get_mut(&(entity.clone(), normalize_path(path).to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl ContentStore for ScriptedContentStore {
    async fn fetch(&self, entity: &EntityRef, path: &str) -> Result<String, ContentError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((entity.clone(), path.to_string()));

        let Some(response) = self.next_response(entity, path) else {
            return Err(ContentError::not_found(format!(
                "no content for {entity} at '{path}'"
            )));
        };
        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        response.result
    }
}

// ---------------------------------------------------------------------------
// 3. Scripted build-sync service
// ---------------------------------------------------------------------------

/// One intermediate status, reported `after_ms` after the previous step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStep {
    #[serde(default)]
    pub after_ms: u64,
    pub status: SyncStatus,
    /// Failure text sent with an `ERROR` status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScriptedOutcome {
    #[default]
    Cached,
    Updated,
    TimedOut,
    Error,
}

/// How one entity's build-sync plays out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SyncScript {
    #[serde(default)]
    pub steps: Vec<SyncStep>,
    /// Delay between the last step and the terminal outcome.
    #[serde(default)]
    pub settle_after_ms: u64,
    #[serde(default)]
    pub outcome: ScriptedOutcome,
    /// Failure text when `outcome` is `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SyncScript {
    pub fn settles(outcome: ScriptedOutcome) -> Self {
        Self {
            outcome,
            ..Self::default()
        }
    }

    pub fn after_ms(mut self, settle_after_ms: u64) -> Self {
        self.settle_after_ms = settle_after_ms;
        self
    }

    pub fn step(mut self, after_ms: u64, status: SyncStatus) -> Self {
        self.steps.push(SyncStep {
            after_ms,
            status,
            message: None,
        });
        self
    }

    pub fn step_error(mut self, after_ms: u64, message: impl Into<String>) -> Self {
        self.steps.push(SyncStep {
            after_ms,
            status: SyncStatus::Error,
            message: Some(message.into()),
        });
        self
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: ScriptedOutcome::Error,
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    fn result(&self) -> Result<SyncOutcome, BuildSyncError> {
        match self.outcome {
            ScriptedOutcome::Cached => Ok(SyncOutcome::Cached),
            ScriptedOutcome::Updated => Ok(SyncOutcome::Updated),
            ScriptedOutcome::TimedOut => Ok(SyncOutcome::TimedOut),
            ScriptedOutcome::Error => Err(BuildSyncError::new(
                self.error_message
                    .clone()
                    .unwrap_or_else(|| "build failed".to_string()),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SyncScriptFile {
    #[serde(default)]
    entities: HashMap<String, SyncScript>,
}

/// Build-sync double that replays a [`SyncScript`] per entity. Entities
/// without a script settle as `cached` immediately.
#[derive(Debug, Default)]
pub struct ScriptedBuildSync {
    scripts: HashMap<EntityRef, SyncScript>,
    calls: Mutex<Vec<EntityRef>>,
}

impl ScriptedBuildSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, entity: &EntityRef, script: SyncScript) -> Self {
        self.scripts.insert(entity.clone(), script);
        self
    }

    /// Load scripts from a YAML file (see the module docs for the format).
    pub fn load_at(path: &Path) -> Result<Self, ReaderError> {
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let file: SyncScriptFile =
            serde_yaml::from_str(&contents).map_err(|source| ReaderError::Config {
                path: path.to_path_buf(),
                source,
            })?;

        let mut service = Self::new();
        for (key, script) in file.entities {
            let entity: EntityRef = key.parse().map_err(|source| ReaderError::EntityRef {
                path: path.to_path_buf(),
                source,
            })?;
            service.scripts.insert(entity, script);
        }
        Ok(service)
    }

    pub fn calls(&self) -> Vec<EntityRef> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl BuildSyncService for ScriptedBuildSync {
    async fn sync(
        &self,
        entity: &EntityRef,
        reporter: StatusReporter,
    ) -> Result<SyncOutcome, BuildSyncError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entity.clone());

        let Some(script) = self.scripts.get(entity) else {
            return Ok(SyncOutcome::Cached);
        };
        for step in &script.steps {
            if step.after_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.after_ms)).await;
            }
            match (&step.status, &step.message) {
                (SyncStatus::Error, Some(message)) => reporter.report_error(message.clone()),
                (status, _) => reporter.report(*status),
            }
        }
        if script.settle_after_ms > 0 {
            tokio::time::sleep(Duration::from_millis(script.settle_after_ms)).await;
        }
        script.result()
    }
}
