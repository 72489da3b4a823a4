//! Reader runtime: one driver task per observed entity, fed by content fetch,
//! build-sync, and threshold-timer tasks.
//!
//! Every message lands on a single inbox and is applied in arrival order.
//! Work started for an epoch carries that epoch's number; the driver drops
//! anything tagged with an older one, and the epoch's [`CancellationToken`]
//! stops its tasks early where the collaborator future can simply be dropped.

use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use docsync_core::{
    reduce, BuildSyncError, ContentError, ContentUpdate, EntityRef, ReaderAction, ReaderState,
    ReaderView, SyncOutcome, SyncState, SyncStatus,
};

use crate::api::{BuildSyncService, ContentStore, StatusReporter};
use crate::config::ReaderConfig;
use crate::error::ReaderError;

/// One published state, or the fatal error that ended the reader.
pub type ReaderUpdate = Result<Arc<ReaderState>, ReaderError>;

enum Message {
    Navigate(String),
    Observe(EntityRef, String),
    Event { epoch: u64, event: Event },
}

enum Event {
    ContentSettled {
        fetch: u64,
        result: Result<String, ContentError>,
    },
    SyncStatus(SyncStatus, Option<String>),
    SyncSettled(Result<SyncOutcome, BuildSyncError>),
    BuildingThreshold,
}

impl Event {
    fn kind(&self) -> &'static str {
        match self {
            Event::ContentSettled { .. } => "content_settled",
            Event::SyncStatus(..) => "sync_status",
            Event::SyncSettled(_) => "sync_settled",
            Event::BuildingThreshold => "building_threshold",
        }
    }
}

/// Consumer side of a running reader.
///
/// Dropping the handle ends the current epoch and stops the driver.
pub struct ReaderHandle {
    inbox: mpsc::UnboundedSender<Message>,
    updates: broadcast::Receiver<Arc<ReaderState>>,
    current: watch::Receiver<Arc<ReaderState>>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<Result<(), ReaderError>>>,
}

impl ReaderHandle {
    /// Start observing `entity` at `path` on the current tokio runtime.
    ///
    /// Returns immediately; content fetch and build-sync run in the background.
    pub fn spawn(
        store: Arc<dyn ContentStore>,
        service: Arc<dyn BuildSyncService>,
        config: ReaderConfig,
        entity: EntityRef,
        path: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = broadcast::channel(config.update_buffer.max(1));
        let initial = Arc::new(ReaderState::new(path.clone()));
        let (current_tx, current_rx) = watch::channel(initial.clone());
        let shutdown = CancellationToken::new();

        let driver = Driver {
            store,
            service,
            config,
            entity: entity.clone(),
            state: initial,
            epoch: 0,
            fetch: 0,
            reloads: 0,
            epoch_token: CancellationToken::new(),
            fetch_token: CancellationToken::new(),
            inbox: inbox_tx.clone(),
            updates: updates_tx,
            current: current_tx,
        };
        let task = tokio::spawn(driver.run(entity, path, inbox_rx, shutdown.clone()));

        Self {
            inbox: inbox_tx,
            updates: updates_rx,
            current: current_rx,
            shutdown,
            task: Some(task),
        }
    }

    /// Latest published state.
    pub fn current(&self) -> Arc<ReaderState> {
        self.current.borrow().clone()
    }

    pub fn view(&self) -> ReaderView {
        self.current().view()
    }

    /// Move within the current document. The sync stream is left running.
    pub fn navigate(&self, path: impl Into<String>) -> Result<(), ReaderError> {
        self.inbox
            .send(Message::Navigate(path.into()))
            .map_err(|_| ReaderError::ChannelClosed("reader inbox"))
    }

    /// Observe another entity (starts a new epoch) or, for the same entity,
    /// navigate to `path`.
    pub fn observe(&self, entity: EntityRef, path: impl Into<String>) -> Result<(), ReaderError> {
        self.inbox
            .send(Message::Observe(entity, path.into()))
            .map_err(|_| ReaderError::ChannelClosed("reader inbox"))
    }

    /// Next published state, in order.
    ///
    /// Only the latest `update_buffer` states are retained for a consumer that
    /// falls behind; older ones are skipped. A fatal error is yielded once as
    /// the final item; `None` afterwards.
    pub async fn next(&mut self) -> Option<ReaderUpdate> {
        loop {
            match self.updates.recv().await {
                Ok(state) => return Some(Ok(state)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "reader consumer lagged, skipping old states");
                }
                Err(RecvError::Closed) => break,
            }
        }
        match self.join().await {
            Ok(()) => None,
            Err(err) => Some(Err(err)),
        }
    }

    /// End the current epoch and wait for the driver to exit.
    pub async fn stop(mut self) -> Result<(), ReaderError> {
        self.shutdown.cancel();
        self.join().await
    }

    async fn join(&mut self) -> Result<(), ReaderError> {
        match self.task.take() {
            Some(task) => task
                .await
                .map_err(|err| ReaderError::Join(err.to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Owns the reader state; the only place transitions are applied.
struct Driver {
    store: Arc<dyn ContentStore>,
    service: Arc<dyn BuildSyncService>,
    config: ReaderConfig,
    entity: EntityRef,
    state: Arc<ReaderState>,
    epoch: u64,
    /// Sequence of the latest content fetch; older completions are stale.
    fetch: u64,
    /// Reload-on-ready refetches spent in this epoch.
    reloads: u32,
    epoch_token: CancellationToken,
    fetch_token: CancellationToken,
    inbox: mpsc::UnboundedSender<Message>,
    updates: broadcast::Sender<Arc<ReaderState>>,
    current: watch::Sender<Arc<ReaderState>>,
}

impl Driver {
    async fn run(
        mut self,
        entity: EntityRef,
        path: String,
        mut inbox: mpsc::UnboundedReceiver<Message>,
        shutdown: CancellationToken,
    ) -> Result<(), ReaderError> {
        self.start_epoch(entity, path);

        let result = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break Ok(()),
                message = inbox.recv() => {
                    // The driver holds a sender itself, so the inbox never closes.
                    let Some(message) = message else { break Ok(()) };
                    if let Err(err) = self.handle(message) {
                        break Err(err);
                    }
                }
            }
        };

        self.epoch_token.cancel();
        match &result {
            Ok(()) => tracing::debug!(epoch = self.epoch, entity = %self.entity, "reader stopped"),
            Err(err) => tracing::warn!(epoch = self.epoch, entity = %self.entity, error = %err, "reader failed"),
        }
        result
    }

    fn handle(&mut self, message: Message) -> Result<(), ReaderError> {
        match message {
            Message::Navigate(path) => self.navigate(path),
            Message::Observe(entity, path) => {
                if entity == self.entity {
                    self.navigate(path);
                } else {
                    self.start_epoch(entity, path);
                }
            }
            Message::Event { epoch, event } => {
                if epoch != self.epoch {
                    tracing::debug!(
                        epoch,
                        current = self.epoch,
                        event = event.kind(),
                        "discarding event from superseded epoch",
                    );
                } else {
                    self.handle_event(event)?;
                }
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<(), ReaderError> {
        match event {
            Event::ContentSettled { fetch, result } => {
                if fetch != self.fetch {
                    tracing::debug!(fetch, current = self.fetch, "discarding superseded fetch");
                    return Ok(());
                }
                match result {
                    Ok(body) => self.dispatch(ReaderAction::Content(ContentUpdate::Loaded(body))),
                    Err(err) if err.is_not_found() => {
                        self.dispatch(ReaderAction::Content(ContentUpdate::Failed(err)))
                    }
                    Err(source) => {
                        return Err(ReaderError::Content {
                            entity: self.entity.clone(),
                            path: self.state.path.clone(),
                            source,
                        })
                    }
                }
            }
            Event::SyncStatus(SyncStatus::Error, message) => {
                tracing::debug!(epoch = self.epoch, ?message, "build sync reported an error");
                self.dispatch(ReaderAction::Sync {
                    state: SyncState::Error,
                    error: message,
                });
            }
            Event::SyncStatus(status, _) => self.apply_sync(status.into()),
            Event::SyncSettled(Ok(SyncOutcome::Updated))
                if self.reloads > 0 && self.state.content.is_some() =>
            {
                // The page was already refetched for this build.
                tracing::debug!(epoch = self.epoch, "build sync settled after reload");
                self.dispatch(ReaderAction::sync(SyncState::UpToDate));
            }
            Event::SyncSettled(Ok(outcome)) => {
                tracing::debug!(epoch = self.epoch, ?outcome, "build sync settled");
                self.apply_sync(outcome.into());
            }
            Event::SyncSettled(Err(err)) => {
                tracing::debug!(epoch = self.epoch, error = %err, "build sync failed");
                self.dispatch(ReaderAction::sync_failed(err.to_string()));
            }
            Event::BuildingThreshold => {
                // Only stand in for a service that has not reported anything
                // more specific yet.
                if self.state.active_sync_state == SyncState::Checking {
                    self.dispatch(ReaderAction::sync(SyncState::Building));
                }
            }
        }
        Ok(())
    }

    fn apply_sync(&mut self, state: SyncState) {
        let reload = state == SyncState::BuildReady
            && self.state.content.is_none()
            && self.reloads < self.config.reload_attempts;
        if !reload {
            self.dispatch(ReaderAction::sync(state));
            return;
        }

        self.reloads += 1;
        tracing::debug!(epoch = self.epoch, reloads = self.reloads, "build ready before content, reloading");
        self.dispatch(ReaderAction::sync(SyncState::BuildReadyReload));
        self.start_fetch();
    }

    fn navigate(&mut self, path: String) {
        if path == self.state.path {
            return;
        }
        self.dispatch(ReaderAction::navigate(path));
        self.start_fetch();
    }

    fn start_epoch(&mut self, entity: EntityRef, path: String) {
        self.epoch_token.cancel();
        self.epoch_token = CancellationToken::new();
        self.epoch += 1;
        self.entity = entity;
        self.reloads = 0;
        self.state = Arc::new(ReaderState::new(path));
        self.publish();

        tracing::info!(
            epoch = self.epoch,
            entity = %self.entity,
            path = %self.state.path,
            "observing entity",
        );
        self.start_fetch();
        self.start_sync();
    }

    fn start_fetch(&mut self) {
        self.fetch_token.cancel();
        self.fetch_token = self.epoch_token.child_token();
        self.fetch += 1;
        self.dispatch(ReaderAction::Content(ContentUpdate::Loading));

        let (epoch, fetch) = (self.epoch, self.fetch);
        let store = self.store.clone();
        let entity = self.entity.clone();
        let path = self.state.path.clone();
        let token = self.fetch_token.clone();
        let inbox = self.inbox.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = store.fetch(&entity, &path) => result,
            };
            let _ = inbox.send(Message::Event {
                epoch,
                event: Event::ContentSettled { fetch, result },
            });
        });
    }

    fn start_sync(&mut self) {
        self.dispatch(ReaderAction::sync(SyncState::Checking));

        let epoch = self.epoch;
        let service = self.service.clone();
        let entity = self.entity.clone();
        let token = self.epoch_token.clone();
        let inbox = self.inbox.clone();
        let threshold = self.config.building_threshold();
        let reporter = {
            let inbox = inbox.clone();
            StatusReporter::new(move |status, message| {
                let _ = inbox.send(Message::Event {
                    epoch,
                    event: Event::SyncStatus(status, message),
                });
            })
        };

        tokio::spawn(async move {
            let sync = service.sync(&entity, reporter);
            tokio::pin!(sync);
            let timer = tokio::time::sleep(threshold);
            tokio::pin!(timer);
            let mut threshold_passed = false;

            let result = loop {
                tokio::select! {
                    _ = token.cancelled() => return,
                    result = &mut sync => break result,
                    _ = &mut timer, if !threshold_passed => {
                        threshold_passed = true;
                        let _ = inbox.send(Message::Event { epoch, event: Event::BuildingThreshold });
                    }
                }
            };
            let _ = inbox.send(Message::Event {
                epoch,
                event: Event::SyncSettled(result),
            });
        });
    }

    fn dispatch(&mut self, action: ReaderAction) {
        let kind = action.kind();
        let next = reduce(&self.state, action);
        tracing::debug!(
            epoch = self.epoch,
            action = kind,
            sync = %next.active_sync_state,
            display = %next.display_state(),
            "applied transition",
        );
        self.state = Arc::new(next);
        self.publish();
    }

    fn publish(&self) {
        self.current.send_replace(self.state.clone());
        // Fails only once the handle is gone.
        let _ = self.updates.send(self.state.clone());
    }
}
