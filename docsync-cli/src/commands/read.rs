use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use docsync_core::{DisplayState, EntityRef, ReaderView};
use docsync_reader::fixture::{FsContentStore, ScriptedBuildSync};
use docsync_reader::{ReaderConfig, ReaderHandle};
use serde::Serialize;
use tokio::time::Instant;

use super::display_label;

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Entity reference, `kind:namespace/name` or `kind:name`.
    pub entity: EntityRef,

    /// Page path within the entity's documentation.
    #[arg(long, default_value = "/")]
    pub path: String,

    /// Directory holding published pages as `<namespace>/<kind>/<name>/<path>/index.html`.
    #[arg(long)]
    pub content_root: PathBuf,

    /// YAML file scripting the build-sync per entity. Without it every sync
    /// resolves as `cached`.
    #[arg(long)]
    pub sync_script: Option<PathBuf>,

    /// Reader configuration (YAML).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Give up if the page has not settled within this many milliseconds.
    #[arg(long, default_value_t = 30_000)]
    pub timeout_ms: u64,

    /// Print every state change as a JSON line.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ViewLine<'a> {
    elapsed_ms: u128,
    #[serde(flatten)]
    view: &'a ReaderView,
}

impl ReadArgs {
    pub fn run(self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start tokio runtime")?;
        runtime.block_on(self.read())
    }

    async fn read(self) -> Result<()> {
        let config = match &self.config {
            Some(path) => ReaderConfig::load_at(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => ReaderConfig::default(),
        };
        let build_sync = match &self.sync_script {
            Some(path) => ScriptedBuildSync::load_at(path)
                .with_context(|| format!("failed to load sync script {}", path.display()))?,
            None => ScriptedBuildSync::new(),
        };
        tracing::debug!(?config, entity = %self.entity, path = %self.path, "starting reader");

        let store = FsContentStore::new(self.content_root.clone());
        let mut handle = ReaderHandle::spawn(
            Arc::new(store),
            Arc::new(build_sync),
            config,
            self.entity.clone(),
            self.path.clone(),
        );

        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.timeout_ms);
        let mut last: Option<(DisplayState, String)> = None;
        let mut view = handle.view();
        self.emit(&view, started, &mut last)?;

        let mut settled = handle.current().is_settled();
        while !settled {
            let update = match tokio::time::timeout_at(deadline, handle.next()).await {
                Ok(Some(update)) => update,
                Ok(None) => break,
                Err(_) => bail!(
                    "{} did not settle within {}ms (last state {})",
                    self.entity,
                    self.timeout_ms,
                    view.state
                ),
            };
            let state = update.with_context(|| format!("reader for {} failed", self.entity))?;
            view = state.view();
            self.emit(&view, started, &mut last)?;
            settled = state.is_settled();
        }

        handle.stop().await.context("reader did not stop cleanly")?;

        if !self.json {
            if let Some(content) = &view.content {
                println!();
                println!("{content}");
            }
        }
        Ok(())
    }

    /// Print a view if its state or error differs from the last one printed.
    fn emit(
        &self,
        view: &ReaderView,
        started: Instant,
        last: &mut Option<(DisplayState, String)>,
    ) -> Result<()> {
        let key = (view.state, view.error_message.clone());
        if last.as_ref() == Some(&key) {
            return Ok(());
        }
        *last = Some(key);

        let elapsed_ms = started.elapsed().as_millis();
        if self.json {
            let line = serde_json::to_string(&ViewLine { elapsed_ms, view })
                .context("failed to serialize view")?;
            println!("{line}");
        } else if view.error_message.is_empty() {
            println!("{:>6}ms  {}", elapsed_ms, display_label(view.state));
        } else {
            println!(
                "{:>6}ms  {}  {}",
                elapsed_ms,
                display_label(view.state),
                view.error_message.dimmed()
            );
        }
        Ok(())
    }
}
